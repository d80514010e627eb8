//! HTTP LLM Client - 调用 OpenAI 兼容的 Chat Completions 服务
//!
//! 实现 ChapterLlmPort trait，通过 HTTP 调用外部文本生成服务
//!
//! 外部 API:
//! POST {base_url}/v1/chat/completions
//! Request: {"model": "...", "messages": [...], "response_format": {"type": "json_object"}}
//! Response: choices[0].message.content 为 JSON 字符串，再按请求类型二次解析

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::{
    ChapterLlmPort, ChunkMergeResponse, ChunkSnippet, LlmError, WindowSplitResponse,
};

/// Chat 消息
#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

/// Chat Completions 请求体
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

/// Chat Completions 响应体（只取需要的字段）
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// HTTP LLM 客户端配置
#[derive(Debug, Clone)]
pub struct HttpLlmClientConfig {
    /// 服务基础 URL
    pub base_url: String,
    /// API Key（Bearer）
    pub api_key: String,
    /// 模型名
    pub model: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
    /// 重试次数
    pub max_retries: u32,
}

impl Default for HttpLlmClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            api_key: String::new(),
            model: "gpt-4o".to_string(),
            timeout_secs: 120,
            max_retries: 0,
        }
    }
}

impl HttpLlmClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// HTTP LLM 客户端
///
/// 同一时刻只发出一个请求，由调用方（策略循环）保证串行
pub struct HttpLlmClient {
    client: Client,
    config: HttpLlmClientConfig,
}

impl HttpLlmClient {
    /// 创建新的 HTTP LLM 客户端
    pub fn new(config: HttpLlmClientConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.config.base_url)
    }

    /// 发送一次 JSON-object 模式的 chat 请求，返回 content 字符串
    async fn request_json(&self, system: &str, user: String) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let mut last_error = LlmError::ServiceError("no attempt made".to_string());
        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tracing::debug!(attempt, "Retrying LLM request");
            }

            match self.send_once(&request).await {
                Ok(content) => return Ok(content),
                Err(err) => last_error = err,
            }
        }

        Err(last_error)
    }

    async fn send_once(&self, request: &ChatRequest) -> Result<String, LlmError> {
        tracing::debug!(
            url = %self.completions_url(),
            model = %self.config.model,
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout
                } else if e.is_connect() {
                    LlmError::NetworkError(format!("Cannot connect to LLM service: {}", e))
                } else {
                    LlmError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::ServiceError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if content.is_empty() {
            return Err(LlmError::EmptyResponse);
        }

        Ok(content)
    }
}

const SPLIT_SYSTEM_PROMPT: &str = "당신은 소설 텍스트의 챕터 경계를 식별하는 전문가입니다.\n\
     정확한 인덱스만 반환하고, 본문을 재출력하지 마세요.";

const SPLIT_RULES: &str = "주어진 소설 텍스트 창(window)에서 완전하게 끝나는 챕터만 찾아 분리하세요.\n\
     반드시 JSON으로만 응답하고, 본문 텍스트를 재출력하지 마세요.\n\n\
     규칙:\n\
     - segments: 창 내부에서 완전한 챕터 경계만 포함한 배열입니다. 각 항목은 {title, start, end}를 가져야 합니다.\n\
     - start, end는 창 문자열에 대한 0-기반 바이트 오프셋이며, [start, end) 구간입니다.\n\
     - segments는 서로 겹치지 않고, 오름차순이어야 합니다.\n\
     - leftover_from: 창의 끝부분이 애매하여 다음 창에 더 많은 컨텍스트가 필요하다면, 애매함이 시작되는 오프셋을 지정합니다.\n\
       애매한 꼬리가 없다면 leftover_from는 창 길이로 설정하세요.\n\n\
     반환 형식(JSON): {\"segments\": [{\"title\": string, \"start\": number, \"end\": number}], \"leftover_from\": number}";

const MERGE_SYSTEM_PROMPT: &str =
    "당신은 소설 챕터 경계 병합 전문가입니다. JSON만 반환합니다.";

const MERGE_RULES: &str = "아래 마이크로 텍스트 조각들의 순서를 고려하여 문맥이 강하게 연결되는 연속 구간들을 '챕터'로 묶으세요.\n\
     - 각 조각은 index로 식별됩니다.\n\
     - 인접한 조각들만 묶을 수 있습니다(순서 유지).\n\
     - 확신이 없으면 앞쪽으로만 최대한 묶고, 애매한 꼬리는 leftover_from_index 이후로 넘기세요.\n\
     반환 형식(JSON): {\"chapters\": [[i, i+1, ...], ...], \"leftover_from_index\": number}";

#[async_trait]
impl ChapterLlmPort for HttpLlmClient {
    async fn split_window(&self, window: &str) -> Result<WindowSplitResponse, LlmError> {
        let user = format!("{}\n\n[창 시작]\n{}\n[창 끝]", SPLIT_RULES, window);
        let content = self.request_json(SPLIT_SYSTEM_PROMPT, user).await?;

        let parsed: WindowSplitResponse = serde_json::from_str(&content)
            .map_err(|e| LlmError::InvalidResponse(format!("Bad split response: {}", e)))?;

        tracing::debug!(
            segments = parsed.segments.len(),
            leftover_from = ?parsed.leftover_from,
            "Window split response parsed"
        );
        Ok(parsed)
    }

    async fn merge_chunks(&self, batch: &[ChunkSnippet]) -> Result<ChunkMergeResponse, LlmError> {
        let input = serde_json::to_string(batch)
            .map_err(|e| LlmError::InvalidResponse(format!("Snippet encoding failed: {}", e)))?;
        let user = format!("{}\n\n입력: {}", MERGE_RULES, input);
        let content = self.request_json(MERGE_SYSTEM_PROMPT, user).await?;

        let parsed: ChunkMergeResponse = serde_json::from_str(&content)
            .map_err(|e| LlmError::InvalidResponse(format!("Bad merge response: {}", e)))?;

        tracing::debug!(
            groups = parsed.chapters.len(),
            leftover_from_index = ?parsed.leftover_from_index,
            "Chunk merge response parsed"
        );
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = HttpLlmClientConfig::default();
        assert_eq!(config.base_url, "https://api.openai.com");
        assert_eq!(config.timeout_secs, 120);
        assert_eq!(config.max_retries, 0);
    }

    #[test]
    fn test_config_builder() {
        let config = HttpLlmClientConfig::new("http://llm-proxy:8000")
            .with_model("gpt-4o-mini")
            .with_timeout(60);
        assert_eq!(config.base_url, "http://llm-proxy:8000");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn test_split_response_parsing() {
        let content = r#"{"segments": [{"title": "1장", "start": 0, "end": 120}], "leftover_from": 300}"#;
        let parsed: WindowSplitResponse = serde_json::from_str(content).unwrap();
        assert_eq!(parsed.segments.len(), 1);
        assert_eq!(parsed.segments[0].start, 0);
        assert_eq!(parsed.segments[0].end, 120);
        assert_eq!(parsed.leftover_from, Some(300));
    }

    #[test]
    fn test_split_response_missing_fields_lenient() {
        // 缺字段/负值在反序列化阶段放行，由策略层逐项过滤
        let parsed: WindowSplitResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.segments.is_empty());
        assert_eq!(parsed.leftover_from, None);

        let parsed: WindowSplitResponse =
            serde_json::from_str(r#"{"segments": [{"start": -3, "end": 10}]}"#).unwrap();
        assert_eq!(parsed.segments[0].start, -3);
    }

    #[test]
    fn test_merge_response_parsing() {
        let content = r#"{"chapters": [[0,1,2],[3,4]], "leftover_from_index": 5}"#;
        let parsed: ChunkMergeResponse = serde_json::from_str(content).unwrap();
        assert_eq!(parsed.chapters.len(), 2);
        assert_eq!(parsed.leftover_from_index, Some(5));
    }
}
