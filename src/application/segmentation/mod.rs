//! 分割策略编排
//!
//! - sliding_window: 滑动窗口 LLM 分割
//! - micro_merge: 微分块后 LLM 合并
//! - assembler: 顶层章节装配器

mod assembler;
mod micro_merge;
mod sliding_window;

pub use assembler::{AssemblerConfig, ChapterAssembler, SplitStrategy};
pub use micro_merge::{MicroMergeConfig, MicroMergeSplitter};
pub use sliding_window::{SlidingWindowConfig, SlidingWindowSplitter};
