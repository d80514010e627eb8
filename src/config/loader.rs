//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `NOVSEG_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `NOVSEG_SEGMENTATION__STRATEGY=sliding_window`
/// - `NOVSEG_SEGMENTATION__LLM_ONLY=false`
/// - `NOVSEG_SEGMENTATION__DEBUG_MAX_CHAPTERS=5`
/// - `NOVSEG_LLM__URL=http://llm-proxy:8000`
///
/// # 返回
/// - `Ok(AppConfig)` - 成功加载的配置
/// - `Err(ConfigError)` - 加载失败
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 首先设置默认值（最低优先级）
    builder = builder
        .set_default("segmentation.strategy", "micro_merge")?
        .set_default("segmentation.min_chapter_length", 8000)?
        .set_default("segmentation.max_chapter_length", 14000)?
        .set_default("segmentation.lookahead", 4000)?
        .set_default("segmentation.min_gap", 800)?
        .set_default("segmentation.llm_only", true)?
        .set_default("segmentation.enforce_min_length", false)?
        .set_default("segmentation.debug_max_chapters", 0)?
        .set_default("window.approx_tokens_per_call", 4000)?
        .set_default("window.chars_per_token", 3)?
        .set_default("window.max_input_chars", 0)?
        .set_default("window.max_stall", 2)?
        .set_default("window.max_iterations", 1000)?
        .set_default("merge.target_size", 1600)?
        .set_default("merge.hard_max_size", 2400)?
        .set_default("merge.batch_size", 18)?
        .set_default("merge.snippet_len", 300)?
        .set_default("llm.url", "https://api.openai.com")?
        .set_default("llm.api_key", "")?
        .set_default("llm.model", "gpt-4o")?
        .set_default("llm.timeout_secs", 120)?
        .set_default("llm.max_retries", 0)?
        .set_default("llm.pause_every", 10)?
        .set_default("llm.pause_ms", 1000)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 添加配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        // 搜索默认配置文件
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 添加环境变量（最高优先级）
    // 前缀: NOVSEG_
    // 层级分隔符: __ (双下划线)
    // 例如: NOVSEG_LLM__URL=http://llm-proxy:8000
    // 注意: 环境变量名会被转换为小写
    builder = builder.add_source(
        Environment::with_prefix("NOVSEG")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    // 4. 构建配置
    let config = builder.build()?;

    // 5. 反序列化为 AppConfig
    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    // 6. 验证配置
    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    // 验证策略名
    use crate::application::segmentation::SplitStrategy;
    if SplitStrategy::from_name(&config.segmentation.strategy).is_none() {
        return Err(ConfigError::ValidationError(format!(
            "Unknown segmentation strategy: {}",
            config.segmentation.strategy
        )));
    }

    // 验证 LLM URL
    if config.llm.url.is_empty() {
        return Err(ConfigError::ValidationError(
            "LLM URL cannot be empty".to_string(),
        ));
    }

    // 验证长度区间
    if config.segmentation.max_chapter_length == 0 {
        return Err(ConfigError::ValidationError(
            "Max chapter length cannot be 0".to_string(),
        ));
    }

    // 验证微分块参数
    if config.merge.hard_max_size == 0 || config.merge.batch_size == 0 {
        return Err(ConfigError::ValidationError(
            "Merge hard_max_size and batch_size cannot be 0".to_string(),
        ));
    }

    // 验证窗口参数
    if config.window.chars_per_token == 0 || config.window.max_iterations == 0 {
        return Err(ConfigError::ValidationError(
            "Window chars_per_token and max_iterations cannot be 0".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Strategy: {}", config.segmentation.strategy);
    tracing::info!(
        "Chapter Length: {} - {} bytes",
        config.segmentation.min_chapter_length,
        config.segmentation.max_chapter_length
    );
    tracing::info!("LLM Only: {}", config.segmentation.llm_only);
    tracing::info!("Enforce Min Length: {}", config.segmentation.enforce_min_length);
    if config.segmentation.debug_max_chapters > 0 {
        tracing::info!("Debug Max Chapters: {}", config.segmentation.debug_max_chapters);
    }
    tracing::info!("LLM URL: {}", config.llm.url);
    tracing::info!("LLM Model: {}", config.llm.model);
    tracing::info!("LLM Timeout: {}s", config.llm.timeout_secs);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_validation_passes_for_valid_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_unknown_strategy() {
        let mut config = AppConfig::default();
        config.segmentation.strategy = "quantum".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_llm_url() {
        let mut config = AppConfig::default();
        config.llm.url = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_batch_size() {
        let mut config = AppConfig::default();
        config.merge.batch_size = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_config_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[segmentation]\nstrategy = \"sliding_window\"\nllm_only = false\n\n[llm]\nurl = \"http://llm-proxy:8000\"\nmodel = \"gpt-4o-mini\""
        )
        .unwrap();

        let config = load_config_from_path(Some(&path)).unwrap();
        assert_eq!(config.segmentation.strategy, "sliding_window");
        assert!(!config.segmentation.llm_only);
        assert_eq!(config.llm.url, "http://llm-proxy:8000");
        assert_eq!(config.llm.model, "gpt-4o-mini");
        // 未覆盖的键保持默认
        assert_eq!(config.merge.batch_size, 18);
    }
}
