//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod llm_client;
mod pacing;
mod progress;

pub use llm_client::{
    ChapterLlmPort, ChunkMergeResponse, ChunkSnippet, LlmError, WindowSegment,
    WindowSplitResponse,
};
pub use pacing::{IntervalPacing, NoPacing, PacingPolicy};
pub use progress::{NullProgress, ProgressSink, TracingProgress};
