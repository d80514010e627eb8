//! Novseg - 小说章节边界分割引擎
//!
//! 架构设计: Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Segmentation: 纯文本分割逻辑（规范化、模式检测、长度分割、微分块）
//!
//! 应用层 (application/):
//! - Ports: 端口定义（ChapterLlmPort、ProgressSink、PacingPolicy）
//! - Segmentation: 分割策略编排（滑动窗口、微分块合并、章节装配）
//!
//! 基础设施层 (infrastructure/):
//! - Adapters: LLM Client（HTTP / Fake）

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
