//! Chapter LLM Port - 章节边界判定服务抽象
//!
//! 定义外部文本生成服务的抽象接口，具体实现在 infrastructure/adapters 层。
//! 服务被视为不可信、可失败的黑盒：响应经过类型化解析，
//! 结构性非法的部分由策略层逐项过滤，调用失败由回退逻辑兜底。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// LLM 调用错误
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Empty response")]
    EmptyResponse,
}

/// 微分块摘要：发送给 LLM 的单块描述（只含首尾片段，控制请求体积）
#[derive(Debug, Clone, Serialize)]
pub struct ChunkSnippet {
    /// 全局微分块索引
    pub index: usize,
    /// 块首片段
    pub head: String,
    /// 块尾片段（块长不超过 snippet 长度时为空）
    pub tail: String,
    /// 块总字节数
    pub chars: usize,
}

/// 滑动窗口分割响应
///
/// start/end 是窗口字符串内的 0 基字节偏移，end 开区间；
/// 模型不回传正文，正文由本地切片恢复。
/// 字段用 i64 宽松解析，越界/负值在策略层逐项过滤而非整体拒绝
#[derive(Debug, Clone, Deserialize)]
pub struct WindowSplitResponse {
    #[serde(default)]
    pub segments: Vec<WindowSegment>,
    /// 窗口尾部歧义开始的偏移；无歧义时等于窗口长度
    #[serde(default)]
    pub leftover_from: Option<i64>,
}

/// 窗口内的单个章节片段
#[derive(Debug, Clone, Deserialize)]
pub struct WindowSegment {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub start: i64,
    #[serde(default)]
    pub end: i64,
}

/// 微分块合并响应
///
/// chapters 中每个内层数组是一组连续的微分块索引
#[derive(Debug, Clone, Deserialize)]
pub struct ChunkMergeResponse {
    #[serde(default)]
    pub chapters: Vec<Vec<i64>>,
    /// 置信度下降处的索引；此后的块留待下一批重试
    #[serde(default)]
    pub leftover_from_index: Option<i64>,
}

/// Chapter LLM Port
///
/// 外部章节边界判定服务的抽象接口。
/// 引擎同一时刻只发起一个调用，逐批/逐窗等待完成。
#[async_trait]
pub trait ChapterLlmPort: Send + Sync {
    /// 滑动窗口分割：请求窗口内完整章节的索引范围
    async fn split_window(&self, window: &str) -> Result<WindowSplitResponse, LlmError>;

    /// 微分块合并：请求一批块摘要的连续分组
    async fn merge_chunks(&self, batch: &[ChunkSnippet]) -> Result<ChunkMergeResponse, LlmError>;
}
