//! Word segmentation.
//!
//! The real segmenter (a dictionary-driven Chinese word cutter) is an external
//! collaborator plugged in through [`Segmenter`]. Two reference cutters ship
//! with the crate: [`CjkUnigramSegmenter`] and [`WhitespaceSegmenter`].

use std::sync::Arc;

use crate::stage::{Stage, StageResult};

/// Cuts one phrase into tokens. Must be safe to call from several workers.
pub trait Segmenter: Send + Sync {
    fn cut(&self, phrase: &str) -> Vec<String>;
}

impl<F> Segmenter for F
where
    F: Fn(&str) -> Vec<String> + Send + Sync,
{
    fn cut(&self, phrase: &str) -> Vec<String> {
        self(phrase)
    }
}

/// Splits on Unicode whitespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceSegmenter;

impl Segmenter for WhitespaceSegmenter {
    fn cut(&self, phrase: &str) -> Vec<String> {
        phrase.split_whitespace().map(str::to_owned).collect()
    }
}

/// Every Han or Kana character becomes its own token; any other run of
/// non-whitespace characters stays together as one token.
#[derive(Debug, Clone, Copy, Default)]
pub struct CjkUnigramSegmenter;

#[inline(always)]
pub fn is_cjk_han_or_kana(c: char) -> bool {
    matches!(c as u32,
        0x4E00..=0x9FFF   | // Unified
        0x3400..=0x4DBF   | // Ext A
        0x20000..=0x2A6DF | // Ext B
        0x2A700..=0x2EBEF | // Ext C-F
        0x30000..=0x323AF | // Ext G-H
        0xF900..=0xFAFF   | // Compatibility
        0x2F00..=0x2FDF   | // Kangxi radicals
        0x3040..=0x309F   | // Hiragana
        0x30A0..=0x30FF   | // Katakana
        0x31F0..=0x31FF     // Katakana phonetic extensions
    )
}

impl Segmenter for CjkUnigramSegmenter {
    fn cut(&self, phrase: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut run = String::new();

        for ch in phrase.chars() {
            if ch.is_whitespace() || is_cjk_han_or_kana(ch) {
                if !run.is_empty() {
                    out.push(std::mem::take(&mut run));
                }
                if !ch.is_whitespace() {
                    out.push(ch.to_string());
                }
            } else {
                run.push(ch);
            }
        }
        if !run.is_empty() {
            out.push(run);
        }
        out
    }
}

pub struct Segment {
    segmenter: Arc<dyn Segmenter>,
}

impl Segment {
    pub fn new(segmenter: Arc<dyn Segmenter>) -> Self {
        Self { segmenter }
    }
}

impl Stage for Segment {
    fn name(&self) -> &'static str {
        "segment"
    }

    fn apply(&mut self, tokens: Vec<String>) -> StageResult<Vec<String>> {
        let mut out = Vec::with_capacity(tokens.len());
        for phrase in &tokens {
            out.extend(self.segmenter.cut(phrase));
        }
        Ok(out)
    }
}
