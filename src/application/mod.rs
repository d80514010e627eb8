//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（ChapterLlmPort、ProgressSink、PacingPolicy）
//! - segmentation: 分割策略与章节装配
//! - error: 应用层错误定义

pub mod error;
pub mod ports;
pub mod segmentation;

pub use error::SegmentationError;

pub use ports::{
    // LLM client
    ChapterLlmPort,
    ChunkMergeResponse,
    ChunkSnippet,
    LlmError,
    WindowSegment,
    WindowSplitResponse,
    // Pacing
    IntervalPacing,
    NoPacing,
    PacingPolicy,
    // Progress
    NullProgress,
    ProgressSink,
    TracingProgress,
};

pub use segmentation::{
    AssemblerConfig, ChapterAssembler, MicroMergeConfig, MicroMergeSplitter, SlidingWindowConfig,
    SlidingWindowSplitter, SplitStrategy,
};
