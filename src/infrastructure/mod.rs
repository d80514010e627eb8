//! 基础设施层 - 外部服务适配器

pub mod adapters;
