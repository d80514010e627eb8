//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;

use crate::application::segmentation::{
    AssemblerConfig, MicroMergeConfig, SlidingWindowConfig, SplitStrategy,
};
use crate::domain::segmentation::{LengthSplitConfig, MicroChunkConfig, DEFAULT_MIN_GAP};

/// 应用主配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// 分割配置
    #[serde(default)]
    pub segmentation: SegmentationConfig,

    /// 滑动窗口策略配置
    #[serde(default)]
    pub window: WindowConfig,

    /// 微分块合并策略配置
    #[serde(default)]
    pub merge: MergeConfig,

    /// LLM 服务配置
    #[serde(default)]
    pub llm: LlmConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            segmentation: SegmentationConfig::default(),
            window: WindowConfig::default(),
            merge: MergeConfig::default(),
            llm: LlmConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl AppConfig {
    /// 折算为装配器配置
    ///
    /// llm_only 同时下沉到滑动窗口策略，
    /// 启发式长度分割参数下沉为窗口兜底配置
    pub fn assembler_config(&self) -> AssemblerConfig {
        let seg = &self.segmentation;
        let fallback = LengthSplitConfig {
            min_length: seg.min_chapter_length,
            max_length: seg.max_chapter_length,
            lookahead: seg.lookahead,
        };

        AssemblerConfig {
            strategy: SplitStrategy::from_name(&seg.strategy)
                .unwrap_or(SplitStrategy::MicroMerge),
            min_chapter_length: seg.min_chapter_length,
            max_chapter_length: seg.max_chapter_length,
            lookahead: seg.lookahead,
            min_gap: seg.min_gap,
            llm_only: seg.llm_only,
            enforce_min_length: seg.enforce_min_length,
            debug_max_chapters: seg.debug_max_chapters,
            window: SlidingWindowConfig {
                approx_tokens_per_call: self.window.approx_tokens_per_call,
                chars_per_token: self.window.chars_per_token,
                max_input_chars: if self.window.max_input_chars == 0 {
                    None
                } else {
                    Some(self.window.max_input_chars)
                },
                max_stall: self.window.max_stall,
                max_iterations: self.window.max_iterations,
                llm_only: seg.llm_only,
                fallback,
            },
            merge: MicroMergeConfig {
                chunk: MicroChunkConfig {
                    target_size: self.merge.target_size,
                    hard_max_size: self.merge.hard_max_size,
                },
                batch_size: self.merge.batch_size,
                snippet_len: self.merge.snippet_len,
            },
        }
    }
}

/// 分割配置
#[derive(Debug, Clone, Deserialize)]
pub struct SegmentationConfig {
    /// 分割策略
    /// 可选: micro_merge, sliding_window, heuristic
    #[serde(default = "default_strategy")]
    pub strategy: String,

    /// 单章最小字节数
    #[serde(default = "default_min_chapter_length")]
    pub min_chapter_length: usize,

    /// 单章最大字节数（启发式长度分割用）
    #[serde(default = "default_max_chapter_length")]
    pub max_chapter_length: usize,

    /// 长度分割回扫窗口（字节）
    #[serde(default = "default_lookahead")]
    pub lookahead: usize,

    /// 边界候选最小间距（字节）
    #[serde(default = "default_min_gap")]
    pub min_gap: usize,

    /// LLM-only：策略失败时不强制分割，全文成为一章
    #[serde(default = "default_llm_only")]
    pub llm_only: bool,

    /// 是否执行最小长度合并
    #[serde(default)]
    pub enforce_min_length: bool,

    /// 调试：章节数上限，0 不限制
    #[serde(default)]
    pub debug_max_chapters: usize,
}

fn default_strategy() -> String {
    "micro_merge".to_string()
}

fn default_min_chapter_length() -> usize {
    8000
}

fn default_max_chapter_length() -> usize {
    14000
}

fn default_lookahead() -> usize {
    4000
}

fn default_min_gap() -> usize {
    DEFAULT_MIN_GAP
}

fn default_llm_only() -> bool {
    true
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            min_chapter_length: default_min_chapter_length(),
            max_chapter_length: default_max_chapter_length(),
            lookahead: default_lookahead(),
            min_gap: default_min_gap(),
            llm_only: default_llm_only(),
            enforce_min_length: false,
            debug_max_chapters: 0,
        }
    }
}

/// 滑动窗口策略配置
#[derive(Debug, Clone, Deserialize)]
pub struct WindowConfig {
    /// 每次调用的近似 token 预算
    #[serde(default = "default_tokens_per_call")]
    pub approx_tokens_per_call: usize,

    /// token 折算字节数
    #[serde(default = "default_chars_per_token")]
    pub chars_per_token: usize,

    /// 输入上限（字节），0 不限制
    #[serde(default)]
    pub max_input_chars: usize,

    /// 连续无进展轮次上限
    #[serde(default = "default_max_stall")]
    pub max_stall: usize,

    /// 窗口循环轮次上限
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
}

fn default_tokens_per_call() -> usize {
    4000
}

fn default_chars_per_token() -> usize {
    3
}

fn default_max_stall() -> usize {
    2
}

fn default_max_iterations() -> usize {
    1000
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            approx_tokens_per_call: default_tokens_per_call(),
            chars_per_token: default_chars_per_token(),
            max_input_chars: 0,
            max_stall: default_max_stall(),
            max_iterations: default_max_iterations(),
        }
    }
}

/// 微分块合并策略配置
#[derive(Debug, Clone, Deserialize)]
pub struct MergeConfig {
    /// 微分块目标字节数
    #[serde(default = "default_target_size")]
    pub target_size: usize,

    /// 微分块硬上限字节数
    #[serde(default = "default_hard_max_size")]
    pub hard_max_size: usize,

    /// 每批送审的分块数
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// 片段首尾摘要长度（字节）
    #[serde(default = "default_snippet_len")]
    pub snippet_len: usize,
}

fn default_target_size() -> usize {
    1600
}

fn default_hard_max_size() -> usize {
    2400
}

fn default_batch_size() -> usize {
    18
}

fn default_snippet_len() -> usize {
    300
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            target_size: default_target_size(),
            hard_max_size: default_hard_max_size(),
            batch_size: default_batch_size(),
            snippet_len: default_snippet_len(),
        }
    }
}

/// LLM 服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// LLM 服务基础 URL
    #[serde(default = "default_llm_url")]
    pub url: String,

    /// API Key
    #[serde(default)]
    pub api_key: String,

    /// 模型名
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    /// 最大重试次数
    #[serde(default)]
    pub max_retries: u32,

    /// 每多少次调用暂停一次，0 不暂停
    #[serde(default = "default_pause_every")]
    pub pause_every: usize,

    /// 暂停时长（毫秒）
    #[serde(default = "default_pause_ms")]
    pub pause_ms: u64,
}

fn default_llm_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o".to_string()
}

fn default_llm_timeout() -> u64 {
    120
}

fn default_pause_every() -> usize {
    10
}

fn default_pause_ms() -> u64 {
    1000
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            url: default_llm_url(),
            api_key: String::new(),
            model: default_llm_model(),
            timeout_secs: default_llm_timeout(),
            max_retries: 0,
            pause_every: default_pause_every(),
            pause_ms: default_pause_ms(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.segmentation.strategy, "micro_merge");
        assert_eq!(config.segmentation.min_chapter_length, 8000);
        assert_eq!(config.merge.batch_size, 18);
        assert_eq!(config.llm.url, "https://api.openai.com");
    }

    #[test]
    fn test_assembler_config_mapping() {
        let config = AppConfig::default();
        let assembler = config.assembler_config();
        assert_eq!(assembler.strategy, SplitStrategy::MicroMerge);
        assert!(assembler.llm_only);
        assert!(assembler.window.llm_only);
        assert_eq!(assembler.window.max_input_chars, None);
        assert_eq!(assembler.merge.chunk.target_size, 1600);
    }

    #[test]
    fn test_assembler_config_zero_cap_means_unlimited() {
        let mut config = AppConfig::default();
        config.window.max_input_chars = 200_000;
        assert_eq!(
            config.assembler_config().window.max_input_chars,
            Some(200_000)
        );
    }

    #[test]
    fn test_unknown_strategy_falls_back_to_micro_merge() {
        let mut config = AppConfig::default();
        config.segmentation.strategy = "quantum".to_string();
        assert_eq!(
            config.assembler_config().strategy,
            SplitStrategy::MicroMerge
        );
    }
}
