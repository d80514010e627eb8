//! 微分块
//!
//! 与章节语义无关的小粒度分块（约 1600-2400 字节），
//! 段落/句子边界优先，是"微分块-合并"策略的第一阶段

use regex::Regex;

use super::floor_char_boundary;

/// 微分块配置
#[derive(Debug, Clone)]
pub struct MicroChunkConfig {
    /// 软目标大小（字节），到达后在段落边界 flush
    pub target_size: usize,
    /// 硬上限（字节），到达后强制在句子边界或原地切断
    pub hard_max_size: usize,
}

impl Default for MicroChunkConfig {
    fn default() -> Self {
        Self {
            target_size: 1600,
            hard_max_size: 2400,
        }
    }
}

/// 将文本切成微分块序列
///
/// 单次前向遍历：按空行分段落累积到缓冲区；
/// - 缓冲达到 hard_max_size：在硬上限窗口内找最后一个句末
///   （且须越过 target_size 的中点），找不到就在上限处切断
/// - 缓冲达到 target_size：在当前段落边界 flush
///
/// 块序列拼接（忽略段落连接空白）等于原文，无丢失无重叠
pub fn micro_split(text: &str, config: &MicroChunkConfig) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let paragraph_split = Regex::new(r"\n{2,}").expect("paragraph pattern");
    let sentence_end = Regex::new(r"[.!?。！？]\s+").expect("sentence pattern");

    let hard_max = config.hard_max_size.max(1);
    let target = config.target_size.min(hard_max).max(1);

    let mut chunks: Vec<String> = Vec::new();
    let mut buffer = String::new();

    let flush = |chunks: &mut Vec<String>, piece: &str| {
        let trimmed = piece.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }
    };

    for para in paragraph_split.split(text) {
        let para = para.trim();
        if para.is_empty() {
            continue;
        }

        if buffer.is_empty() {
            buffer.push_str(para);
        } else {
            buffer.push_str("\n\n");
            buffer.push_str(para);
        }

        // 超过硬上限：优先句子边界切断
        while buffer.len() >= hard_max {
            let window_end = floor_char_boundary(&buffer, hard_max);
            let window = &buffer[..window_end];

            let last_sentence_end = sentence_end.find_iter(window).last().map(|m| m.end());
            let mut cut = match last_sentence_end {
                Some(end) if end >= target / 2 => end,
                _ => window_end,
            };
            if cut == 0 {
                // 硬上限小于首字符宽度的退化配置：至少前进一个字符
                cut = buffer
                    .chars()
                    .next()
                    .map(|c| c.len_utf8())
                    .unwrap_or(buffer.len());
            }

            flush(&mut chunks, &buffer[..cut]);
            buffer.drain(..cut);
        }

        // 到达软目标：在段落边界 flush
        if buffer.len() >= target {
            flush(&mut chunks, &buffer);
            buffer.clear();
        }
    }

    if !buffer.is_empty() {
        flush(&mut chunks, &buffer);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip_whitespace(s: &str) -> String {
        s.chars().filter(|c| !c.is_whitespace()).collect()
    }

    fn paragraph_text(total: usize) -> String {
        let para = "낡은 등불이 흔들리는 골목 끝에서 그는 발걸음을 멈췄다. \
                    누군가 자신의 이름을 부른 것 같았기 때문이다.";
        let mut s = String::new();
        while s.len() < total {
            s.push_str(para);
            s.push_str("\n\n");
        }
        s
    }

    #[test]
    fn test_empty_input() {
        assert!(micro_split("", &MicroChunkConfig::default()).is_empty());
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = micro_split("한 문단짜리 짧은 글.", &MicroChunkConfig::default());
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_no_chunk_exceeds_hard_max() {
        let text = paragraph_text(10_000);
        let config = MicroChunkConfig {
            target_size: 1600,
            hard_max_size: 2400,
        };
        let chunks = micro_split(&text, &config);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.len() <= 2400, "chunk too long: {}", chunk.len());
        }
    }

    #[test]
    fn test_lossless_reassembly() {
        let text = paragraph_text(10_000);
        let chunks = micro_split(&text, &MicroChunkConfig::default());
        let joined = chunks.join("\n\n");
        assert_eq!(strip_whitespace(&joined), strip_whitespace(&text));
    }

    #[test]
    fn test_hard_cut_on_unbroken_run() {
        // 既无句末也无段落的长字符流：在硬上限处切断
        let text = "가".repeat(3000);
        let config = MicroChunkConfig {
            target_size: 1600,
            hard_max_size: 2400,
        };
        let chunks = micro_split(&text, &config);
        assert!(chunks.len() >= 2);
        assert!(chunks.iter().all(|c| c.len() <= 2400));
        assert_eq!(strip_whitespace(&chunks.concat()), strip_whitespace(&text));
    }

    #[test]
    fn test_chunks_are_ordered_partition() {
        let text = paragraph_text(8_000);
        let chunks = micro_split(&text, &MicroChunkConfig::default());
        let original = strip_whitespace(&text);
        let mut cursor = 0;
        for chunk in &chunks {
            let piece = strip_whitespace(chunk);
            assert_eq!(&original[cursor..cursor + piece.len()], piece);
            cursor += piece.len();
        }
        assert_eq!(cursor, original.len());
    }
}
