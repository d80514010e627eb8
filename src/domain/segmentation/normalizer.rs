//! 文本规范化
//!
//! 去除空白行并收敛连续空行，为后续分割提供稳定输入

/// 规范化原始文本
///
/// 处理步骤：
/// 1. 每行去除首尾空白
/// 2. 丢弃只含空白的行
/// 3. 3 个及以上连续换行收敛为 2 个（保留段落边界）
///
/// 幂等：对已规范化的文本再次调用是 no-op
pub fn normalize_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut result = String::with_capacity(text.len());
    let mut blank_run = 0usize;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            blank_run += 1;
            continue;
        }

        if !result.is_empty() {
            // 原文中的空行保留为一个段落边界（双换行）
            if blank_run > 0 {
                result.push_str("\n\n");
            } else {
                result.push('\n');
            }
        }
        blank_run = 0;
        result.push_str(trimmed);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize_text(""), "");
        assert_eq!(normalize_text("   \n\t\n  "), "");
    }

    #[test]
    fn test_trims_lines_and_drops_blank_lines() {
        let text = "  第一行  \n\n   \n  第二行\t\n";
        assert_eq!(normalize_text(text), "第一行\n\n第二行");
    }

    #[test]
    fn test_collapses_blank_runs_to_paragraph_break() {
        let text = "甲\n\n\n\n\n乙";
        assert_eq!(normalize_text(text), "甲\n\n乙");
    }

    #[test]
    fn test_idempotent() {
        let text = "제1장\n\n본문 내용이다.\n다음 줄.\n\n\n끝.";
        let once = normalize_text(text);
        let twice = normalize_text(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_single_newlines_preserved() {
        let text = "하나\n둘\n셋";
        assert_eq!(normalize_text(text), "하나\n둘\n셋");
    }
}
