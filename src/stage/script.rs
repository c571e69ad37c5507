use crate::stage::{Stage, StageResult};

/// Keeps only tokens made entirely of CJK Unified Ideographs.
///
/// The range check is exclusive on both ends, so U+4E00 and U+9FFF themselves
/// are rejected. An empty token has no offending character and is kept.
pub struct RemoveNonChinese;

pub fn is_chinese_token(token: &str) -> bool {
    token.chars().all(|c| '\u{4e00}' < c && c < '\u{9fff}')
}

impl Stage for RemoveNonChinese {
    fn name(&self) -> &'static str {
        "remove_non_chinese"
    }

    fn apply(&mut self, mut tokens: Vec<String>) -> StageResult<Vec<String>> {
        tokens.retain(|t| is_chinese_token(t));
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_han_tokens() {
        let tokens = ["学习", "hello", "汽车2", "。", "国家"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let out = RemoveNonChinese.apply(tokens).unwrap();
        assert_eq!(out, vec!["学习".to_string(), "国家".to_string()]);
    }

    #[test]
    fn range_bounds_are_exclusive() {
        assert!(!is_chinese_token("\u{4e00}"));
        assert!(is_chinese_token("\u{4e01}"));
        assert!(!is_chinese_token("\u{9fff}"));
        assert!(is_chinese_token("\u{9ffe}"));
    }

    #[test]
    fn empty_token_is_kept() {
        assert!(is_chinese_token(""));
    }
}
