//! LLM 适配器 - ChapterLlmPort 的具体实现

mod fake_llm_client;
mod http_llm_client;

pub use fake_llm_client::{FakeLlmClient, ScriptedMerge, ScriptedSplit};
pub use http_llm_client::{HttpLlmClient, HttpLlmClientConfig};
