//! Domain Layer - 领域层
//!
//! 章节分割限界上下文：纯文本分割逻辑，无 I/O 依赖

pub mod segmentation;

pub use segmentation::{
    micro_split, normalize_text, split_at_candidates, split_by_length, BoundaryCandidate,
    BoundaryGroup, BoundaryPatterns, BoundarySource, ChapterSegment, LengthSplitConfig,
    MicroChunkConfig,
};
