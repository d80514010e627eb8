//! 文本分割领域逻辑
//!
//! 纯函数实现，不依赖任何 I/O：
//! - normalizer: 文本规范化
//! - patterns: 边界模式检测
//! - length_split: 长度边界分割
//! - micro_chunk: 微分块

mod length_split;
mod micro_chunk;
mod normalizer;
mod patterns;
mod types;

pub use length_split::{split_by_length, LengthSplitConfig};
pub use micro_chunk::{micro_split, MicroChunkConfig};
pub use normalizer::normalize_text;
pub use patterns::{split_at_candidates, BoundaryPatterns, DEFAULT_MIN_GAP};
pub use types::{BoundaryCandidate, BoundaryGroup, BoundarySource, ChapterSegment};

/// 将字节索引向前（向 0 方向）对齐到最近的字符边界
///
/// LLM 返回的窗口内索引不保证落在 UTF-8 字符边界上，
/// 切片前必须对齐，否则会 panic
pub fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}
