//! 分割领域值对象

/// 边界候选来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundarySource {
    /// 章节标题模式（"Chapter N"、"제N장" 等）
    Heading,
    /// 弱场景分隔符（---、***、装饰符号等）
    SceneBreak,
}

/// 边界候选：原文中可能开始新章节的字节偏移
///
/// 偏移始终落在字符边界上（来自行锚定的模式匹配）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryCandidate {
    pub offset: usize,
    pub source: BoundarySource,
}

/// 章节片段：一段连续的章节正文，装配时赋予 1 起始的稠密序号
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterSegment {
    /// 序号（1 起始，按原文顺序稠密递增）
    pub number: usize,
    /// 章节正文
    pub content: String,
}

impl ChapterSegment {
    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }
}

/// 边界组：构成一个章节的微分块索引（连续且升序）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryGroup {
    indices: Vec<usize>,
}

impl BoundaryGroup {
    /// 从索引列表构造边界组
    ///
    /// 索引必须非空、升序且连续（i+1 紧跟 i），否则返回 None
    pub fn try_new(indices: Vec<usize>) -> Option<Self> {
        if indices.is_empty() {
            return None;
        }
        if !indices.windows(2).all(|w| w[0] + 1 == w[1]) {
            return None;
        }
        Some(Self { indices })
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn first(&self) -> usize {
        self.indices[0]
    }

    pub fn last(&self) -> usize {
        self.indices[self.indices.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_group_accepts_contiguous() {
        let group = BoundaryGroup::try_new(vec![3, 4, 5]).unwrap();
        assert_eq!(group.first(), 3);
        assert_eq!(group.last(), 5);
    }

    #[test]
    fn test_boundary_group_rejects_gap() {
        assert!(BoundaryGroup::try_new(vec![1, 3]).is_none());
    }

    #[test]
    fn test_boundary_group_rejects_descending() {
        assert!(BoundaryGroup::try_new(vec![2, 1]).is_none());
    }

    #[test]
    fn test_boundary_group_rejects_empty() {
        assert!(BoundaryGroup::try_new(vec![]).is_none());
    }

    #[test]
    fn test_boundary_group_singleton() {
        assert!(BoundaryGroup::try_new(vec![7]).is_some());
    }
}
