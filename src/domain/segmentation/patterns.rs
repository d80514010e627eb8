//! 章节边界模式检测
//!
//! 扫描规范化文本中行锚定的标题模式与场景分隔符，
//! 产出排序、去重、最小间距过滤后的边界候选列表

use regex::Regex;

use super::types::{BoundaryCandidate, BoundarySource};

/// 边界候选最小间距（字节）
///
/// 间距内的后续候选被并入较早的候选，避免在连续短标记上过度碎片化
pub const DEFAULT_MIN_GAP: usize = 800;

/// 编译好的边界模式集合
///
/// 标题模式覆盖韩文（프롤로그/에필로그/제N장·화·부/파트N/챕터N）与
/// 英文（Chapter N / PART N / 罗马数字章节）；
/// 场景分隔符为弱边界（---、***、===、markdown 标题、装饰符号行）
pub struct BoundaryPatterns {
    heading: Regex,
    scene: Regex,
    paragraph_break: Regex,
    sentence_break: Regex,
}

impl BoundaryPatterns {
    pub fn new() -> Self {
        Self {
            heading: Regex::new(
                r"(?im)^[ \t]*(?:프롤로그|에필로그|제[ \t]*\d+[ \t]*(?:장|화|부)|\d+[ \t]*(?:장|화|부)|파트[ \t]*\d+|PART[ \t]*\d+|Chapter[ \t]*(?:\d+|[IVXLCDM]+)|챕터[ \t]*\d+)[ \t]*$",
            )
            .expect("heading pattern"),
            scene: Regex::new(
                r"(?m)^[ \t]*(?:-{3,}|\*{3,}|={3,}|#{1,6}[ \t]+.+|[◇■※○◆]+)[ \t]*$",
            )
            .expect("scene pattern"),
            paragraph_break: Regex::new(r"\n{2,}").expect("paragraph pattern"),
            sentence_break: Regex::new(r"[.!?。！？][ \t]*\n").expect("sentence pattern"),
        }
    }

    /// 标题模式（强边界）
    pub fn heading(&self) -> &Regex {
        &self.heading
    }

    /// 场景分隔符（弱边界）
    pub fn scene(&self) -> &Regex {
        &self.scene
    }

    /// 段落边界（连续 2+ 换行）
    pub fn paragraph_break(&self) -> &Regex {
        &self.paragraph_break
    }

    /// 句末标点后紧跟换行
    pub fn sentence_break(&self) -> &Regex {
        &self.sentence_break
    }

    /// 检测文本中的边界候选
    ///
    /// 返回按偏移升序、去重、且满足 min_gap 最小间距的候选列表。
    /// 空输入返回空列表，从不失败。
    pub fn detect_boundaries(&self, text: &str, min_gap: usize) -> Vec<BoundaryCandidate> {
        if text.is_empty() {
            return Vec::new();
        }

        let mut candidates: Vec<BoundaryCandidate> = self
            .heading
            .find_iter(text)
            .map(|m| BoundaryCandidate {
                offset: m.start(),
                source: BoundarySource::Heading,
            })
            .chain(self.scene.find_iter(text).map(|m| BoundaryCandidate {
                offset: m.start(),
                source: BoundarySource::SceneBreak,
            }))
            .collect();

        candidates.sort_by_key(|c| c.offset);
        candidates.dedup_by_key(|c| c.offset);

        // 间距过滤：过近的候选并入较早的那个
        let mut filtered: Vec<BoundaryCandidate> = Vec::with_capacity(candidates.len());
        for cand in candidates {
            match filtered.last() {
                Some(last) if cand.offset - last.offset < min_gap => continue,
                _ => filtered.push(cand),
            }
        }

        filtered
    }
}

impl Default for BoundaryPatterns {
    fn default() -> Self {
        Self::new()
    }
}

/// 按边界候选切割文本
///
/// 少于 2 个候选时返回空（交由调用方走长度分割）：
/// 单个候选不足以构成有意义的章节划分
pub fn split_at_candidates(text: &str, candidates: &[BoundaryCandidate]) -> Vec<String> {
    if candidates.len() < 2 {
        return Vec::new();
    }

    let mut chapters = Vec::with_capacity(candidates.len());
    for (i, cand) in candidates.iter().enumerate() {
        let end = candidates
            .get(i + 1)
            .map(|next| next.offset)
            .unwrap_or(text.len());
        let segment = text[cand.offset..end].trim();
        if !segment.is_empty() {
            chapters.push(segment.to_string());
        }
    }
    chapters
}
