//! 章节装配器
//!
//! 顶层编排：选择分割策略、兜底回退、最小长度合并、
//! 调试上限截断、序号装配与进度上报

use std::sync::Arc;

use uuid::Uuid;

use crate::application::error::SegmentationError;
use crate::application::ports::{ChapterLlmPort, PacingPolicy, ProgressSink};
use crate::domain::segmentation::{
    normalize_text, split_at_candidates, split_by_length, BoundaryPatterns, ChapterSegment,
    LengthSplitConfig, DEFAULT_MIN_GAP,
};

use super::micro_merge::{MicroMergeConfig, MicroMergeSplitter};
use super::sliding_window::{SlidingWindowConfig, SlidingWindowSplitter};

/// 分割策略选择
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitStrategy {
    /// 微分块后 LLM 合并（默认）
    MicroMerge,
    /// 滑动窗口 LLM 分割
    SlidingWindow,
    /// 纯启发式（模式检测 → 长度分割），不调用 LLM
    Heuristic,
}

impl SplitStrategy {
    /// 从配置字符串解析，未知值返回 None
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "micro_merge" => Some(Self::MicroMerge),
            "sliding_window" => Some(Self::SlidingWindow),
            "heuristic" => Some(Self::Heuristic),
            _ => None,
        }
    }
}

/// 装配器配置
#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    /// 主策略
    pub strategy: SplitStrategy,
    /// 单章最小字节数
    pub min_chapter_length: usize,
    /// 单章最大字节数（启发式长度分割用）
    pub max_chapter_length: usize,
    /// 长度分割回扫窗口
    pub lookahead: usize,
    /// 边界候选最小间距
    pub min_gap: usize,
    /// LLM-only：策略失败时不强制分割，全文成为一章
    pub llm_only: bool,
    /// 是否执行最小长度合并（独立开关，与策略选择无关）
    pub enforce_min_length: bool,
    /// 调试：章节数上限，0 不限制
    pub debug_max_chapters: usize,
    /// 滑动窗口策略参数
    pub window: SlidingWindowConfig,
    /// 微分块合并策略参数
    pub merge: MicroMergeConfig,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            strategy: SplitStrategy::MicroMerge,
            min_chapter_length: 8000,
            max_chapter_length: 14000,
            lookahead: 4000,
            min_gap: DEFAULT_MIN_GAP,
            llm_only: true,
            enforce_min_length: false,
            debug_max_chapters: 0,
            window: SlidingWindowConfig::default(),
            merge: MicroMergeConfig::default(),
        }
    }
}

impl AssemblerConfig {
    fn length_split_config(&self) -> LengthSplitConfig {
        LengthSplitConfig {
            min_length: self.min_chapter_length,
            max_length: self.max_chapter_length,
            lookahead: self.lookahead,
        }
    }
}

/// 章节装配器
///
/// (text, config, collaborator) 的纯函数式编排，
/// 无进程级单例；每次调用独占自己的窗口/批次状态
pub struct ChapterAssembler {
    llm: Arc<dyn ChapterLlmPort>,
    pacing: Arc<dyn PacingPolicy>,
    config: AssemblerConfig,
}

impl ChapterAssembler {
    pub fn new(
        llm: Arc<dyn ChapterLlmPort>,
        pacing: Arc<dyn PacingPolicy>,
        config: AssemblerConfig,
    ) -> Self {
        Self {
            llm,
            pacing,
            config,
        }
    }

    /// 将原始文本装配为 1 起始编号的章节列表
    ///
    /// 规范化后为空的输入返回空列表（非错误）。
    /// 无论外部服务表现如何，返回的章节拼接总是无损覆盖输入
    pub async fn assemble(
        &self,
        raw_text: &str,
        progress: &dyn ProgressSink,
    ) -> Result<Vec<ChapterSegment>, SegmentationError> {
        let run_id = Uuid::new_v4();
        let text = normalize_text(raw_text);
        if text.is_empty() {
            tracing::info!(run_id = %run_id, "Empty input after normalization");
            return Ok(Vec::new());
        }

        tracing::info!(
            run_id = %run_id,
            strategy = ?self.config.strategy,
            text_len = text.len(),
            "Chapter assembly started"
        );

        let mut bodies = match self.config.strategy {
            SplitStrategy::MicroMerge => {
                let splitter = MicroMergeSplitter::new(
                    self.llm.clone(),
                    self.pacing.clone(),
                    self.config.merge.clone(),
                );
                splitter.split(&text, progress).await
            }
            SplitStrategy::SlidingWindow => {
                let splitter = SlidingWindowSplitter::new(
                    self.llm.clone(),
                    self.pacing.clone(),
                    self.config.window.clone(),
                );
                splitter.split(&text, progress).await
            }
            SplitStrategy::Heuristic => self.heuristic_split(&text),
        };

        // 主策略一无所获时的兜底
        if bodies.is_empty() {
            if self.config.llm_only {
                // 不发明边界：全文一章
                tracing::info!(run_id = %run_id, "Primary strategy yielded nothing, whole text as one chapter");
                bodies = vec![text.clone()];
            } else {
                tracing::info!(run_id = %run_id, "Primary strategy yielded nothing, falling back to heuristics");
                bodies = self.heuristic_split(&text);
            }
        }

        if self.config.enforce_min_length {
            bodies = ensure_min_length(bodies, self.config.min_chapter_length);
        }

        if self.config.debug_max_chapters > 0 {
            bodies.truncate(self.config.debug_max_chapters);
        }

        let total = bodies.len();
        let chapters: Vec<ChapterSegment> = bodies
            .into_iter()
            .enumerate()
            .map(|(i, content)| {
                let number = i + 1;
                progress.report(
                    number,
                    total,
                    &format!("챕터 {} 준비 완료 ({}자)", number, content.chars().count()),
                );
                ChapterSegment { number, content }
            })
            .collect();

        tracing::info!(
            run_id = %run_id,
            chapters = chapters.len(),
            "Chapter assembly finished"
        );

        Ok(chapters)
    }

    /// 启发式分割：模式检测优先，失败走长度分割
    fn heuristic_split(&self, text: &str) -> Vec<String> {
        let patterns = BoundaryPatterns::new();
        let candidates = patterns.detect_boundaries(text, self.config.min_gap);
        let chapters = split_at_candidates(text, &candidates);
        if !chapters.is_empty() {
            return chapters;
        }
        split_by_length(text, &self.config.length_split_config())
    }
}

/// 合并相邻片段，使每段满足最小长度
///
/// 末尾不足最小长度的残段并入前一章；
/// 全文总长不超过最小值时收敛为单章
fn ensure_min_length(segments: Vec<String>, minimum: usize) -> Vec<String> {
    if segments.is_empty() {
        return Vec::new();
    }

    let total: usize = segments.iter().map(|s| s.len()).sum();
    if total <= minimum {
        let joined = segments.join("\n\n");
        let joined = joined.trim();
        return if joined.is_empty() {
            Vec::new()
        } else {
            vec![joined.to_string()]
        };
    }

    let mut merged: Vec<String> = Vec::new();
    let mut buffer = String::new();

    for seg in segments {
        if buffer.is_empty() {
            buffer = seg;
        } else {
            buffer.push_str("\n\n");
            buffer.push_str(&seg);
        }

        if buffer.len() >= minimum {
            merged.push(std::mem::take(&mut buffer));
        }
    }

    if !buffer.is_empty() {
        match merged.last_mut() {
            Some(last) if buffer.len() < minimum => {
                last.push_str("\n\n");
                last.push_str(&buffer);
            }
            _ => merged.push(buffer),
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{NoPacing, NullProgress, ProgressSink};
    use crate::infrastructure::adapters::llm::FakeLlmClient;
    use std::sync::Mutex;

    fn assembler(client: FakeLlmClient, config: AssemblerConfig) -> ChapterAssembler {
        ChapterAssembler::new(Arc::new(client), Arc::new(NoPacing), config)
    }

    fn strip_whitespace(s: &str) -> String {
        s.chars().filter(|c| !c.is_whitespace()).collect()
    }

    struct RecordingProgress {
        events: Mutex<Vec<(usize, usize)>>,
    }

    impl ProgressSink for RecordingProgress {
        fn report(&self, current: usize, total: usize, _message: &str) {
            self.events.lock().unwrap().push((current, total));
        }
    }

    #[tokio::test]
    async fn test_empty_input_returns_empty_list() {
        let a = assembler(FakeLlmClient::always_error(), AssemblerConfig::default());
        let chapters = a.assemble("   \n\n  ", &NullProgress).await.unwrap();
        assert!(chapters.is_empty());
    }

    #[tokio::test]
    async fn test_numbering_dense_from_one() {
        let a = assembler(
            FakeLlmClient::always_error(),
            AssemblerConfig {
                strategy: SplitStrategy::Heuristic,
                min_chapter_length: 10,
                max_chapter_length: 100,
                lookahead: 50,
                min_gap: 0,
                ..Default::default()
            },
        );
        let text = "Chapter 1\n첫 번째 내용.\n\nChapter 2\n두 번째 내용.\n\nChapter 3\n세 번째 내용.";
        let chapters = a.assemble(text, &NullProgress).await.unwrap();

        assert_eq!(chapters.len(), 3);
        for (i, ch) in chapters.iter().enumerate() {
            assert_eq!(ch.number, i + 1);
        }
    }

    #[tokio::test]
    async fn test_heuristic_without_headings_uses_length_split() {
        let a = assembler(
            FakeLlmClient::always_error(),
            AssemblerConfig {
                strategy: SplitStrategy::Heuristic,
                min_chapter_length: 2000,
                max_chapter_length: 6000,
                lookahead: 1000,
                ..Default::default()
            },
        );
        let text = "밋밋한 서술이 이어진다. ".repeat(1000);
        let chapters = a.assemble(&text, &NullProgress).await.unwrap();

        assert!(chapters.len() > 1);
        let joined: String = chapters.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(strip_whitespace(&joined), strip_whitespace(&normalize_text(&text)));
    }

    #[tokio::test]
    async fn test_llm_only_whole_text_when_strategy_empty() {
        // always_empty：每轮确认整窗但不给任何段 → 整窗进位，最终停滞收尾为单章
        let a = assembler(
            FakeLlmClient::always_empty(),
            AssemblerConfig {
                strategy: SplitStrategy::SlidingWindow,
                llm_only: true,
                ..Default::default()
            },
        );
        let text = "본문 문장. ".repeat(3000);
        let chapters = a.assemble(&text, &NullProgress).await.unwrap();

        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].number, 1);
        assert_eq!(
            strip_whitespace(&chapters[0].content),
            strip_whitespace(&text)
        );
    }

    #[tokio::test]
    async fn test_non_llm_only_falls_back_to_heuristics() {
        let a = assembler(
            FakeLlmClient::always_empty(),
            AssemblerConfig {
                strategy: SplitStrategy::SlidingWindow,
                llm_only: false,
                min_chapter_length: 2000,
                max_chapter_length: 6000,
                lookahead: 1000,
                ..Default::default()
            },
        );
        let text = "긴 이야기가 계속된다. ".repeat(1500);
        let chapters = a.assemble(&text, &NullProgress).await.unwrap();

        assert!(chapters.len() > 1);
    }

    #[tokio::test]
    async fn test_debug_cap_truncates() {
        let a = assembler(
            FakeLlmClient::always_error(),
            AssemblerConfig {
                strategy: SplitStrategy::Heuristic,
                min_chapter_length: 500,
                max_chapter_length: 1500,
                lookahead: 400,
                debug_max_chapters: 2,
                ..Default::default()
            },
        );
        let text = "조각난 이야기. ".repeat(2000);
        let chapters = a.assemble(&text, &NullProgress).await.unwrap();
        assert_eq!(chapters.len(), 2);
    }

    #[tokio::test]
    async fn test_progress_monotonic() {
        let progress = RecordingProgress {
            events: Mutex::new(Vec::new()),
        };
        let a = assembler(
            FakeLlmClient::always_error(),
            AssemblerConfig {
                strategy: SplitStrategy::Heuristic,
                min_chapter_length: 500,
                max_chapter_length: 1500,
                lookahead: 400,
                ..Default::default()
            },
        );
        let text = "진행 상황 테스트 문장. ".repeat(1000);
        a.assemble(&text, &progress).await.unwrap();

        let events = progress.events.lock().unwrap();
        assert!(!events.is_empty());
        assert!(events.windows(2).all(|w| w[0].0 <= w[1].0));
    }

    #[test]
    fn test_ensure_min_length_convergence() {
        let segments: Vec<String> = (0..10).map(|_| "가".repeat(300)).collect();
        let merged = ensure_min_length(segments, 1000);
        assert!(merged.iter().all(|s| s.len() >= 1000));
    }

    #[test]
    fn test_ensure_min_length_total_below_minimum_single_chapter() {
        let segments = vec!["짧다.".to_string(), "더 짧다.".to_string()];
        let merged = ensure_min_length(segments, 10_000);
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn test_ensure_min_length_tail_merged_into_previous() {
        let segments = vec!["가".repeat(1200), "나".repeat(1200), "다".repeat(60)];
        let merged = ensure_min_length(segments, 1000);
        assert_eq!(merged.len(), 2);
        assert!(merged[1].contains(&"다".repeat(20)));
    }

    #[test]
    fn test_ensure_min_length_empty() {
        assert!(ensure_min_length(Vec::new(), 100).is_empty());
    }

    #[test]
    fn test_strategy_from_name() {
        assert_eq!(
            SplitStrategy::from_name("micro_merge"),
            Some(SplitStrategy::MicroMerge)
        );
        assert_eq!(
            SplitStrategy::from_name("sliding_window"),
            Some(SplitStrategy::SlidingWindow)
        );
        assert_eq!(
            SplitStrategy::from_name("heuristic"),
            Some(SplitStrategy::Heuristic)
        );
        assert_eq!(SplitStrategy::from_name("unknown"), None);
    }
}
