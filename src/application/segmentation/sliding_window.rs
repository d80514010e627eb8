//! 滑动窗口 LLM 分割策略
//!
//! 单遍遍历：用 token 预算构造大文本窗口，前一窗未决的尾部（carryover）
//! 前缀到下一窗；模型只返回窗口内的索引范围，正文由本地切片恢复，
//! 保证逐字节保真。无进展（停滞）连续达到阈值后安全回退。

use std::sync::Arc;

use crate::application::ports::{ChapterLlmPort, PacingPolicy, ProgressSink};
use crate::domain::segmentation::{floor_char_boundary, split_by_length, LengthSplitConfig};

/// 滑动窗口策略配置
#[derive(Debug, Clone)]
pub struct SlidingWindowConfig {
    /// 每次调用的 token 预算（按 chars_per_token 换算为字节）
    pub approx_tokens_per_call: usize,
    /// 每 token 近似字节数
    pub chars_per_token: usize,
    /// 输入长度上限（调试用，None 不限制）
    pub max_input_chars: Option<usize>,
    /// 连续停滞多少轮后放弃本策略
    pub max_stall: usize,
    /// 迭代硬上限（最终安全网）
    pub max_iterations: usize,
    /// LLM-only：停滞/失败时不发明边界，剩余文本整体成章
    pub llm_only: bool,
    /// 非 LLM-only 模式下回退用的长度分割配置
    pub fallback: LengthSplitConfig,
}

impl Default for SlidingWindowConfig {
    fn default() -> Self {
        Self {
            approx_tokens_per_call: 4000,
            chars_per_token: 3,
            max_input_chars: None,
            max_stall: 2,
            max_iterations: 1000,
            llm_only: true,
            fallback: LengthSplitConfig::default(),
        }
    }
}

impl SlidingWindowConfig {
    /// 单窗字节数：token 预算换算，下限 8000
    fn chunk_chars(&self) -> usize {
        (self.approx_tokens_per_call * self.chars_per_token.max(1)).max(8000)
    }
}

/// 一次分割调用期间的窗口状态，调用结束即销毁
struct WindowState {
    /// 原文中已消费到的位置（字节，字符边界）
    cursor: usize,
    /// 上一窗最后确认边界之后的未决尾部
    carryover: String,
    /// 连续停滞计数
    stall_count: usize,
}

/// 滑动窗口分割器
pub struct SlidingWindowSplitter {
    llm: Arc<dyn ChapterLlmPort>,
    pacing: Arc<dyn PacingPolicy>,
    config: SlidingWindowConfig,
}

impl SlidingWindowSplitter {
    pub fn new(
        llm: Arc<dyn ChapterLlmPort>,
        pacing: Arc<dyn PacingPolicy>,
        config: SlidingWindowConfig,
    ) -> Self {
        Self {
            llm,
            pacing,
            config,
        }
    }

    /// 分割全文为章节正文列表
    ///
    /// 总是返回对输入的完整无损覆盖；外部服务完全不配合时，
    /// 在 O(文本长度/窗口大小) 次调用内经由停滞回退收尾
    pub async fn split(&self, text: &str, progress: &dyn ProgressSink) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }

        // 调试用输入截断
        let text = match self.config.max_input_chars {
            Some(cap) if cap > 0 && text.len() > cap => &text[..floor_char_boundary(text, cap)],
            _ => text,
        };

        let chunk_chars = self.config.chunk_chars();
        let text_len = text.len();
        let total_windows_est = text_len.div_ceil(chunk_chars).max(1);

        let mut chapters: Vec<String> = Vec::new();
        let mut state = WindowState {
            cursor: 0,
            carryover: String::new(),
            stall_count: 0,
        };
        let mut iterations = 0usize;
        let mut processed_windows = 0usize;

        while state.cursor < text_len || !state.carryover.is_empty() {
            iterations += 1;
            if iterations > self.config.max_iterations {
                // 异常情况下的安全终止：剩余文本整体成章
                let remainder = format!("{}{}", state.carryover, &text[state.cursor..]);
                let remainder = remainder.trim();
                if !remainder.is_empty() {
                    chapters.push(remainder.to_string());
                }
                state.carryover.clear();
                tracing::warn!(iterations, "Sliding window hit iteration cap, emitting remainder");
                break;
            }

            let slice_end = floor_char_boundary(text, (state.cursor + chunk_chars).min(text_len));
            let window = format!("{}{}", state.carryover, &text[state.cursor..slice_end]);
            if window.is_empty() {
                break;
            }

            processed_windows += 1;
            progress.report(
                processed_windows,
                total_windows_est,
                &format!("윈도우 {}/{} 처리 중", processed_windows, total_windows_est),
            );

            let prev_chapter_count = chapters.len();
            let prev_carry_len = state.carryover.len();

            match self.llm.split_window(&window).await {
                Ok(response) => {
                    let leftover_from = clamp_leftover(response.leftover_from, window.len());
                    let leftover_from = floor_char_boundary(&window, leftover_from);

                    // 段落校验：窗口内、不重叠、升序、且全部位于 leftover 之前
                    let mut last_end = 0usize;
                    for seg in &response.segments {
                        if seg.start < 0 || seg.end < 0 {
                            continue;
                        }
                        let start = floor_char_boundary(&window, seg.start as usize);
                        let end = floor_char_boundary(&window, seg.end as usize);
                        if start < end && end <= leftover_from && start >= last_end {
                            let chapter = window[start..end].trim();
                            if !chapter.is_empty() {
                                chapters.push(chapter.to_string());
                                last_end = end;
                            }
                        }
                    }

                    // 最后一个已接受段之后的窗口尾部全部进位：
                    // 未被声明的文本不丢弃，带着更多上下文进入下一窗
                    state.carryover = window[last_end..].to_string();
                    state.cursor = slice_end;

                    if state.cursor >= text_len && state.carryover.trim().is_empty() {
                        break;
                    }

                    // 停滞：无新章节 + carryover 未缩短 + 原文已耗尽
                    let no_new_chapters = chapters.len() == prev_chapter_count;
                    let no_carry_shrink = state.carryover.len() >= prev_carry_len;
                    let no_more_source = state.cursor >= text_len;
                    if no_new_chapters && no_carry_shrink && no_more_source {
                        state.stall_count += 1;
                    } else {
                        state.stall_count = 0;
                    }

                    if state.stall_count >= self.config.max_stall {
                        let remainder = format!("{}{}", state.carryover, &text[state.cursor..]);
                        let remainder = remainder.trim();
                        if !remainder.is_empty() {
                            if self.config.llm_only {
                                tracing::info!(
                                    stall_count = state.stall_count,
                                    "Stalled in LLM-only mode, emitting remainder as one chapter"
                                );
                                chapters.push(remainder.to_string());
                            } else {
                                tracing::info!(
                                    stall_count = state.stall_count,
                                    "Stalled, falling back to length-based split"
                                );
                                chapters.extend(split_by_length(remainder, &self.config.fallback));
                            }
                        }
                        state.carryover.clear();
                        break;
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "LLM window split failed");
                    if self.config.llm_only {
                        // 不发明边界：整窗成章
                        let chapter = window.trim();
                        if !chapter.is_empty() {
                            chapters.push(chapter.to_string());
                        }
                        state.carryover.clear();
                    } else {
                        // 长度分割整窗，首段成章，其余并入下一窗
                        let parts = split_by_length(&window, &self.config.fallback);
                        let mut parts = parts.into_iter();
                        if let Some(first) = parts.next() {
                            chapters.push(first);
                        }
                        state.carryover = parts.collect::<Vec<_>>().join("\n\n");
                    }
                    state.cursor = slice_end;
                }
            }

            self.pacing.pause(processed_windows).await;
        }

        // 循环退出后残留的 carryover 收尾成章
        let tail = state.carryover.trim();
        if !tail.is_empty() {
            chapters.push(tail.to_string());
        }

        chapters
    }
}

/// leftover 越界/缺失/为负时回落到窗口长度
fn clamp_leftover(leftover: Option<i64>, window_len: usize) -> usize {
    match leftover {
        Some(v) if v >= 0 => (v as usize).min(window_len),
        _ => window_len,
    }
}
