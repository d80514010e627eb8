//! 适配器实现 - 端口的具体实现

pub mod llm;
