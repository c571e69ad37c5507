//! Stopword filtering.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use crate::error::Result;
use crate::stage::{Stage, StageResult};

/// Read-only set of tokens to remove. Shared across workers through an `Arc`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopwordSet {
    words: HashSet<String>,
}

impl StopwordSet {
    pub fn from_list<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words.into_iter().map(Into::into).collect(),
        }
    }

    /// Load a JSON array of strings (the stopwords-iso layout).
    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await?;
        let words: Vec<String> = serde_json::from_str(&raw)?;
        Ok(Self::from_list(words))
    }

    /// Load one stopword per line; blank lines are ignored.
    pub async fn from_lines_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await?;
        Ok(Self::from_list(
            raw.lines().map(str::trim).filter(|l| !l.is_empty()),
        ))
    }

    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(token)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

pub struct RemoveStopwords {
    words: Arc<StopwordSet>,
}

impl RemoveStopwords {
    pub fn new(words: Arc<StopwordSet>) -> Self {
        Self { words }
    }
}

impl Stage for RemoveStopwords {
    fn name(&self) -> &'static str {
        "remove_stopwords"
    }

    fn apply(&mut self, mut tokens: Vec<String>) -> StageResult<Vec<String>> {
        tokens.retain(|t| !self.words.contains(t));
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn removes_exact_matches_only() {
        let mut stage = RemoveStopwords::new(Arc::new(StopwordSet::from_list(["the", "的"])));
        let out = stage.apply(doc(&["a", "the", "The", "dog", "的"])).unwrap();
        assert_eq!(out, doc(&["a", "The", "dog"]));
    }

    #[test]
    fn all_stopwords_leave_an_empty_document() {
        let mut stage = RemoveStopwords::new(Arc::new(StopwordSet::from_list(["the"])));
        assert!(stage.apply(doc(&["the", "the"])).unwrap().is_empty());
    }

    #[test]
    fn empty_set_is_identity() {
        let mut stage = RemoveStopwords::new(Arc::new(StopwordSet::default()));
        assert_eq!(stage.apply(doc(&["x", "y"])).unwrap(), doc(&["x", "y"]));
    }

    #[tokio::test]
    async fn loads_json_array() {
        let path = std::env::temp_dir().join(format!("corpuspipe-sw-{}.json", std::process::id()));
        tokio::fs::write(&path, r#"["的", "了", "the"]"#).await.unwrap();
        let set = StopwordSet::from_json_file(&path).await.unwrap();
        tokio::fs::remove_file(&path).await.unwrap();
        assert_eq!(set.len(), 3);
        assert!(set.contains("了"));
    }

    #[tokio::test]
    async fn rejects_non_array_json() {
        let path = std::env::temp_dir().join(format!("corpuspipe-sw-bad-{}.json", std::process::id()));
        tokio::fs::write(&path, r#"{"the": 1}"#).await.unwrap();
        let res = StopwordSet::from_json_file(&path).await;
        tokio::fs::remove_file(&path).await.unwrap();
        assert!(matches!(res, Err(crate::error::Error::Json(_))));
    }

    #[tokio::test]
    async fn loads_line_file() {
        let path = std::env::temp_dir().join(format!("corpuspipe-sw-{}.txt", std::process::id()));
        tokio::fs::write(&path, "的\n\n 了 \nthe\n").await.unwrap();
        let set = StopwordSet::from_lines_file(&path).await.unwrap();
        tokio::fs::remove_file(&path).await.unwrap();
        assert_eq!(set, StopwordSet::from_list(["的", "了", "the"]));
    }
}
