//! Fake LLM Client - 用于测试的章节判定客户端
//!
//! 不访问任何外部服务；按预设模式或脚本化响应序列应答，
//! 用于驱动停滞/回退路径和策略单元测试

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::application::ports::{
    ChapterLlmPort, ChunkMergeResponse, ChunkSnippet, LlmError, WindowSplitResponse,
};

/// 脚本化的窗口分割应答
pub enum ScriptedSplit {
    Response(WindowSplitResponse),
    Error,
}

/// 脚本化的合并应答
pub enum ScriptedMerge {
    Response(ChunkMergeResponse),
    Error,
}

enum Mode {
    /// 每次调用都失败
    AlwaysError,
    /// 永远整窗不确定（leftover = 0，无任何分组/分段）
    NeverConfident,
    /// 永远确认整窗但不产出任何分段/分组（leftover = 窗口末尾）
    AlwaysEmpty,
    /// 依次消费脚本化应答，耗尽后失败
    Scripted,
}

/// Fake LLM Client
pub struct FakeLlmClient {
    mode: Mode,
    splits: Mutex<VecDeque<ScriptedSplit>>,
    merges: Mutex<VecDeque<ScriptedMerge>>,
}

impl FakeLlmClient {
    pub fn always_error() -> Self {
        Self::with_mode(Mode::AlwaysError)
    }

    pub fn never_confident() -> Self {
        Self::with_mode(Mode::NeverConfident)
    }

    pub fn always_empty() -> Self {
        Self::with_mode(Mode::AlwaysEmpty)
    }

    pub fn scripted_splits(responses: Vec<ScriptedSplit>) -> Self {
        Self {
            mode: Mode::Scripted,
            splits: Mutex::new(responses.into()),
            merges: Mutex::new(VecDeque::new()),
        }
    }

    pub fn scripted_merges(responses: Vec<ScriptedMerge>) -> Self {
        Self {
            mode: Mode::Scripted,
            splits: Mutex::new(VecDeque::new()),
            merges: Mutex::new(responses.into()),
        }
    }

    fn with_mode(mode: Mode) -> Self {
        Self {
            mode,
            splits: Mutex::new(VecDeque::new()),
            merges: Mutex::new(VecDeque::new()),
        }
    }
}

#[async_trait]
impl ChapterLlmPort for FakeLlmClient {
    async fn split_window(&self, window: &str) -> Result<WindowSplitResponse, LlmError> {
        tracing::debug!(window_len = window.len(), "FakeLlmClient split_window");
        match self.mode {
            Mode::AlwaysError => Err(LlmError::ServiceError("fake failure".to_string())),
            Mode::NeverConfident => Ok(WindowSplitResponse {
                segments: Vec::new(),
                leftover_from: Some(0),
            }),
            Mode::AlwaysEmpty => Ok(WindowSplitResponse {
                segments: Vec::new(),
                leftover_from: None,
            }),
            Mode::Scripted => match self.splits.lock().unwrap().pop_front() {
                Some(ScriptedSplit::Response(resp)) => Ok(resp),
                Some(ScriptedSplit::Error) => {
                    Err(LlmError::ServiceError("scripted failure".to_string()))
                }
                None => Err(LlmError::ServiceError("script exhausted".to_string())),
            },
        }
    }

    async fn merge_chunks(&self, batch: &[ChunkSnippet]) -> Result<ChunkMergeResponse, LlmError> {
        tracing::debug!(batch_len = batch.len(), "FakeLlmClient merge_chunks");
        match self.mode {
            Mode::AlwaysError => Err(LlmError::ServiceError("fake failure".to_string())),
            Mode::NeverConfident => Ok(ChunkMergeResponse {
                chapters: Vec::new(),
                leftover_from_index: Some(0),
            }),
            Mode::AlwaysEmpty => Ok(ChunkMergeResponse {
                chapters: Vec::new(),
                leftover_from_index: None,
            }),
            Mode::Scripted => match self.merges.lock().unwrap().pop_front() {
                Some(ScriptedMerge::Response(resp)) => Ok(resp),
                Some(ScriptedMerge::Error) => {
                    Err(LlmError::ServiceError("scripted failure".to_string()))
                }
                None => Err(LlmError::ServiceError("script exhausted".to_string())),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_always_error() {
        let client = FakeLlmClient::always_error();
        assert!(client.split_window("본문").await.is_err());
        assert!(client.merge_chunks(&[]).await.is_err());
    }

    #[tokio::test]
    async fn test_never_confident_leftover_zero() {
        let client = FakeLlmClient::never_confident();
        let resp = client.split_window("본문").await.unwrap();
        assert!(resp.segments.is_empty());
        assert_eq!(resp.leftover_from, Some(0));
    }

    #[tokio::test]
    async fn test_scripted_exhaustion_errors() {
        let client = FakeLlmClient::scripted_splits(vec![ScriptedSplit::Error]);
        assert!(client.split_window("a").await.is_err());
        assert!(client.split_window("b").await.is_err());
    }
}
