//! 微分块合并策略
//!
//! 先把全文切成与章节语义无关的微分块，再逐批询问 LLM
//! 哪些相邻块的文脉强连接、应并为同一章节。
//! 批尾置信度不足的块（leftover）带着更多上下文在下一批重试。

use std::collections::HashSet;
use std::sync::Arc;

use crate::application::ports::{ChapterLlmPort, ChunkSnippet, PacingPolicy, ProgressSink};
use crate::domain::segmentation::{
    floor_char_boundary, micro_split, BoundaryGroup, MicroChunkConfig,
};

/// 微分块合并策略配置
#[derive(Debug, Clone)]
pub struct MicroMergeConfig {
    /// 微分块参数
    pub chunk: MicroChunkConfig,
    /// 每次请求包含的块数
    pub batch_size: usize,
    /// 每块发送的首/尾片段字节数（控制请求体积）
    pub snippet_len: usize,
}

impl Default for MicroMergeConfig {
    fn default() -> Self {
        Self {
            chunk: MicroChunkConfig::default(),
            batch_size: 18,
            snippet_len: 300,
        }
    }
}

/// 微分块合并分割器
pub struct MicroMergeSplitter {
    llm: Arc<dyn ChapterLlmPort>,
    pacing: Arc<dyn PacingPolicy>,
    config: MicroMergeConfig,
}

impl MicroMergeSplitter {
    pub fn new(
        llm: Arc<dyn ChapterLlmPort>,
        pacing: Arc<dyn PacingPolicy>,
        config: MicroMergeConfig,
    ) -> Self {
        Self {
            llm,
            pacing,
            config,
        }
    }

    /// 分割全文为章节正文列表
    pub async fn split(&self, text: &str, progress: &dyn ProgressSink) -> Vec<String> {
        let micro = micro_split(text, &self.config.chunk);
        if micro.is_empty() {
            return Vec::new();
        }

        let groups = self.merge_groups(&micro, progress).await;
        if groups.is_empty() {
            // 完全没有分组结果：全文成为一章
            let whole = text.trim();
            return if whole.is_empty() {
                Vec::new()
            } else {
                vec![whole.to_string()]
            };
        }

        // 索引组还原为章节正文；已被占用的索引不再重复使用
        let mut chapters: Vec<String> = Vec::new();
        let mut used: HashSet<usize> = HashSet::new();
        for group in &groups {
            let parts: Vec<&str> = group
                .indices()
                .iter()
                .filter(|&&idx| idx < micro.len() && used.insert(idx))
                .map(|&idx| micro[idx].as_str())
                .collect();
            if !parts.is_empty() {
                chapters.push(parts.join("\n\n"));
            }
        }

        // 未被任何组覆盖的残余块追加为最后一章
        let leftovers: Vec<&str> = (0..micro.len())
            .filter(|idx| !used.contains(idx))
            .map(|idx| micro[idx].as_str())
            .collect();
        if !leftovers.is_empty() {
            chapters.push(leftovers.join("\n\n"));
        }

        chapters.retain(|c| !c.trim().is_empty());
        chapters
    }

    /// 逐批询问 LLM，计算边界组
    ///
    /// carry_start 单调推进：推进到 leftover_from_index（重试不确定的尾部）
    /// 或批末尾。调用失败时整批降级为单个边界组，保证管线总能终止且不丢文本。
    pub async fn merge_groups(
        &self,
        chunks: &[String],
        progress: &dyn ProgressSink,
    ) -> Vec<BoundaryGroup> {
        if chunks.is_empty() {
            return Vec::new();
        }

        let batch_size = self.config.batch_size.max(1);
        let n = chunks.len();
        let total_batches = n.div_ceil(batch_size).max(1);

        let mut groups: Vec<BoundaryGroup> = Vec::new();
        let mut carry_start_idx = 0usize;
        let mut batch_no = 0usize;

        while carry_start_idx < n {
            batch_no += 1;
            let end_idx = (carry_start_idx + batch_size).min(n);

            progress.report(
                batch_no,
                total_batches,
                &format!("병합 배치 {}/{}", batch_no, total_batches),
            );

            let snippets: Vec<ChunkSnippet> = (carry_start_idx..end_idx)
                .map(|i| make_snippet(i, &chunks[i], self.config.snippet_len))
                .collect();

            match self.llm.merge_chunks(&snippets).await {
                Ok(response) => {
                    let leftover_from = match response.leftover_from_index {
                        Some(v) if v >= 0 && (v as usize) > carry_start_idx => {
                            (v as usize).min(end_idx)
                        }
                        // 缺失、为负或不推进：视为整批处理完
                        _ => end_idx,
                    };

                    // 组校验：批范围内、连续升序、跨组不重复声明
                    let mut claimed: HashSet<usize> = HashSet::new();
                    for raw in &response.chapters {
                        if raw.is_empty() || raw.iter().any(|&x| x < 0) {
                            continue;
                        }
                        let mut safe: Vec<usize> = raw.iter().map(|&x| x as usize).collect();
                        safe.sort_unstable();
                        if !safe.iter().all(|&x| carry_start_idx <= x && x < end_idx) {
                            continue;
                        }
                        if safe.iter().any(|x| claimed.contains(x)) {
                            continue;
                        }
                        if let Some(group) = BoundaryGroup::try_new(safe) {
                            claimed.extend(group.indices().iter().copied());
                            groups.push(group);
                        }
                    }

                    carry_start_idx = leftover_from;
                }
                Err(err) => {
                    tracing::warn!(
                        error = %err,
                        batch_no,
                        "LLM chunk merge failed, keeping batch as one group"
                    );
                    let fallback: Vec<usize> = (carry_start_idx..end_idx).collect();
                    if let Some(group) = BoundaryGroup::try_new(fallback) {
                        groups.push(group);
                    }
                    carry_start_idx = end_idx;
                }
            }

            self.pacing.pause(batch_no).await;
        }

        // 响应内的分组顺序不可信，按文本顺序重排
        groups.sort_by_key(|g| g.first());
        groups
    }
}

/// 构造单块摘要（首/尾片段按字符边界截断）
fn make_snippet(index: usize, chunk: &str, snippet_len: usize) -> ChunkSnippet {
    let head_end = floor_char_boundary(chunk, snippet_len);
    let tail = if chunk.len() > snippet_len {
        let tail_start = floor_char_boundary(chunk, chunk.len() - snippet_len);
        chunk[tail_start..].to_string()
    } else {
        String::new()
    };
    ChunkSnippet {
        index,
        head: chunk[..head_end].to_string(),
        tail,
        chars: chunk.len(),
    }
}
