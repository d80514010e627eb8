//! 长度边界分割
//!
//! 在 [min_length, max_length] 约束下切割文本，优先选择叙事上有意义的
//! 边界（标题 > 场景分隔/段落边界/句末换行 > 回扫句末标点），
//! 全部落空才在 max_length 处硬切

use super::patterns::BoundaryPatterns;
use super::{floor_char_boundary, normalize_text};

/// 句末标点（回扫用）
const SENTENCE_TERMINALS: &[char] = &['.', '!', '?', '。', '！', '？'];

/// 长度分割配置
#[derive(Debug, Clone)]
pub struct LengthSplitConfig {
    /// 单章最小字节数
    pub min_length: usize,
    /// 单章最大字节数
    pub max_length: usize,
    /// 边界搜索回扫窗口（字节）
    pub lookahead: usize,
}

impl Default for LengthSplitConfig {
    fn default() -> Self {
        Self {
            min_length: 8000,
            max_length: 14000,
            lookahead: 4000,
        }
    }
}

impl LengthSplitConfig {
    /// 返回修正后的 (min, max)：min 超过 max 时钳制为 max
    ///
    /// 配置错误静默修正而非拒绝，可用性优先
    fn clamped(&self) -> (usize, usize) {
        let max = self.max_length.max(1);
        let min = self.min_length.min(max);
        (min, max)
    }
}

/// 按长度约束分割文本
///
/// 每段长度落在 [min_length, max_length]，最后一段可能更短。
/// 切割点搜索顺序：
/// 1. lookahead 窗口内最早的标题模式
/// 2. 场景分隔符 / 段落边界 / 句末标点+换行中最早的一个
/// 3. 从窗口末尾向前回扫最近的句末标点
/// 4. 都没有则在 max_length 处硬切（对齐字符边界）
pub fn split_by_length(text: &str, config: &LengthSplitConfig) -> Vec<String> {
    let text = normalize_text(text);
    if text.is_empty() {
        return Vec::new();
    }

    let (min_length, max_length) = config.clamped();
    let patterns = BoundaryPatterns::new();
    let text_len = text.len();

    let mut chapters: Vec<String> = Vec::new();
    let mut cursor = 0usize;

    while cursor < text_len {
        // 剩余不足 max_length：整段收尾
        if text_len - cursor <= max_length {
            let segment = text[cursor..].trim();
            if !segment.is_empty() {
                chapters.push(segment.to_string());
            }
            break;
        }

        let search_start = floor_char_boundary(&text, cursor + min_length.max(1));
        let search_end = floor_char_boundary(&text, cursor + max_length);
        let window = &text[search_start..search_end];

        let mut cut = find_cut_point(&patterns, &text, window, search_start, search_end, cursor, config.lookahead);

        // 切点必须严格推进并落在字符边界上
        // （极小 min_length 下搜索窗口可能退化到游标处）
        if cut <= cursor {
            cut = cursor + 1;
        }
        while cut < text_len && !text.is_char_boundary(cut) {
            cut += 1;
        }

        let segment = text[cursor..cut].trim();
        if !segment.is_empty() {
            chapters.push(segment.to_string());
        }
        cursor = cut;
    }

    chapters
}

/// 在搜索窗口内确定切割点（绝对字节偏移）
fn find_cut_point(
    patterns: &BoundaryPatterns,
    text: &str,
    window: &str,
    search_start: usize,
    search_end: usize,
    cursor: usize,
    lookahead: usize,
) -> usize {
    // 1) 标题模式优先
    if let Some(m) = patterns.heading().find(window) {
        return search_start + m.start();
    }

    // 2) 场景分隔符 / 段落边界在匹配起点切，句末+换行在匹配终点切
    let mut candidates: Vec<usize> = Vec::new();
    if let Some(m) = patterns.scene().find(window) {
        candidates.push(m.start());
    }
    if let Some(m) = patterns.paragraph_break().find(window) {
        candidates.push(m.start());
    }
    if let Some(m) = patterns.sentence_break().find(window) {
        candidates.push(m.end());
    }
    if let Some(&earliest) = candidates.iter().min() {
        return search_start + earliest;
    }

    // 3) 回扫：窗口末尾向前 lookahead 范围内最近的句末标点，切在标点之后
    let backscan_start = floor_char_boundary(text, search_end.saturating_sub(lookahead).max(cursor));
    let back_region = &text[backscan_start..search_end];
    if let Some((idx, ch)) = back_region
        .char_indices()
        .filter(|(_, c)| SENTENCE_TERMINALS.contains(c))
        .last()
    {
        return backscan_start + idx + ch.len_utf8();
    }

    // 4) 硬切
    search_end
}
