//! 应用层错误定义

use thiserror::Error;

/// 分割错误
///
/// 外部服务失败不会出现在这里：瞬时失败由批/窗回退逻辑就地吸收，
/// 结构性非法响应逐项过滤。只有真正无法恢复的内部状态才会上浮。
#[derive(Debug, Error)]
pub enum SegmentationError {
    /// 内部不变量被破坏
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SegmentationError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}
