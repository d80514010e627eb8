//! Novseg - 小说章节分割引擎
//!
//! 读取一个小说 TXT 文件，按配置的策略切分为章节并打印摘要：
//! - Domain: 规范化、模式检测、长度分割、微分块
//! - Application: 分割策略、章节装配、端口
//! - Infrastructure: LLM 适配器

use std::sync::Arc;

use novseg::application::ports::{IntervalPacing, NoPacing, PacingPolicy, TracingProgress};
use novseg::application::segmentation::ChapterAssembler;
use novseg::config::{load_config, print_config};
use novseg::infrastructure::adapters::llm::{HttpLlmClient, HttpLlmClientConfig};
// use novseg::infrastructure::adapters::llm::FakeLlmClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 初始化日志
    let log_filter = format!("{},novseg={}", config.log.level, config.log.level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter)),
        )
        .init();

    tracing::info!("Novseg - 小说章节分割引擎");
    print_config(&config);

    let input_path = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("Usage: novseg <novel.txt>"))?;
    let raw_text = tokio::fs::read_to_string(&input_path).await?;
    tracing::info!(path = %input_path, bytes = raw_text.len(), "Novel loaded");

    // 创建 HTTP LLM 客户端
    let llm_config = HttpLlmClientConfig {
        base_url: config.llm.url.clone(),
        api_key: config.llm.api_key.clone(),
        model: config.llm.model.clone(),
        timeout_secs: config.llm.timeout_secs,
        max_retries: config.llm.max_retries,
    };
    let llm = Arc::new(HttpLlmClient::new(llm_config)?);

    // // 创建 Fake LLM 客户端（测试用，每轮整窗不确定）
    // let llm = Arc::new(FakeLlmClient::never_confident());

    // 调用节流
    let pacing: Arc<dyn PacingPolicy> = if config.llm.pause_every > 0 {
        Arc::new(IntervalPacing {
            every: config.llm.pause_every,
            pause_ms: config.llm.pause_ms,
        })
    } else {
        Arc::new(NoPacing)
    };

    let assembler = ChapterAssembler::new(llm, pacing, config.assembler_config());
    let chapters = assembler.assemble(&raw_text, &TracingProgress).await?;

    tracing::info!(chapters = chapters.len(), "Segmentation complete");
    for chapter in &chapters {
        let preview: String = chapter.content.chars().take(40).collect();
        tracing::info!(
            number = chapter.number,
            chars = chapter.char_count(),
            preview = %preview.replace('\n', " "),
            "Chapter"
        );
    }

    Ok(())
}
