//! Script conversion (e.g. traditional → simplified Chinese).
//!
//! Converters wrap external state that is not safe to call concurrently, so
//! [`ScriptConverter`] is `Send` but deliberately not `Sync`, and stages only
//! ever hold a [`ConverterFactory`]. Each worker's [`ConvertScript`] builds its
//! private converter the first time it is applied.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::stage::{Stage, StageError, StageResult};

pub trait ScriptConverter: Send {
    fn convert(&mut self, token: &str) -> StageResult<String>;
}

type BoxFactory = Arc<dyn Fn() -> StageResult<Box<dyn ScriptConverter>> + Send + Sync>;

/// Constructs one converter per worker.
#[derive(Clone)]
pub struct ConverterFactory(BoxFactory);

impl ConverterFactory {
    pub fn new<F, C>(f: F) -> Self
    where
        F: Fn() -> StageResult<C> + Send + Sync + 'static,
        C: ScriptConverter + 'static,
    {
        Self(Arc::new(move || {
            f().map(|c| Box::new(c) as Box<dyn ScriptConverter>)
        }))
    }

    /// A factory that hands every worker its own copy of `table`.
    pub fn from_table(table: ConversionTable) -> Self {
        let table = Arc::new(table);
        Self::new(move || Ok(TableConverter::new(Arc::clone(&table))))
    }

    pub fn build(&self) -> StageResult<Box<dyn ScriptConverter>> {
        (self.0)()
    }
}

impl fmt::Debug for ConverterFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ConverterFactory")
    }
}

/// Phrase and character mappings, matched longest-first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionTable {
    entries: HashMap<String, String>,
    max_key_chars: usize,
}

impl ConversionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, from: impl Into<String>, to: impl Into<String>) {
        let from = from.into();
        if from.is_empty() {
            return;
        }
        self.max_key_chars = self.max_key_chars.max(from.chars().count());
        self.entries.insert(from, to.into());
    }

    /// Parse OpenCC dictionary text: `source<TAB>target [alternatives...]`.
    ///
    /// Only the first target is used. Blank lines and `#` comments are skipped.
    pub fn parse_opencc(text: &str) -> StageResult<Self> {
        let mut table = Self::new();
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let (from, rest) = line.split_once('\t').ok_or_else(|| {
                StageError::new(format!("dictionary line {}: missing tab", lineno + 1))
            })?;
            let to = rest.split_whitespace().next().ok_or_else(|| {
                StageError::new(format!("dictionary line {}: missing target", lineno + 1))
            })?;
            table.insert(from, to);
        }
        Ok(table)
    }

    pub async fn from_opencc_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await?;
        Self::parse_opencc(&raw).map_err(|e| Error::config(e.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forward maximum matching: at each position take the longest key.
    pub fn convert(&self, text: &str) -> String {
        if self.entries.is_empty() {
            return text.to_owned();
        }
        let chars: Vec<(usize, char)> = text.char_indices().collect();
        let mut out = String::with_capacity(text.len());
        let mut i = 0;

        while i < chars.len() {
            let start = chars[i].0;
            let longest = self.max_key_chars.min(chars.len() - i);
            let mut matched = false;

            for n in (1..=longest).rev() {
                let end = chars.get(i + n).map_or(text.len(), |&(b, _)| b);
                if let Some(to) = self.entries.get(&text[start..end]) {
                    out.push_str(to);
                    i += n;
                    matched = true;
                    break;
                }
            }
            if !matched {
                out.push(chars[i].1);
                i += 1;
            }
        }
        out
    }
}

/// Table-driven converter. Holds a per-worker memo, which is why it is not
/// shared.
pub struct TableConverter {
    table: Arc<ConversionTable>,
    memo: HashMap<String, String>,
}

impl TableConverter {
    const MEMO_LIMIT: usize = 64 * 1024;

    pub fn new(table: Arc<ConversionTable>) -> Self {
        Self {
            table,
            memo: HashMap::new(),
        }
    }
}

impl ScriptConverter for TableConverter {
    fn convert(&mut self, token: &str) -> StageResult<String> {
        if let Some(hit) = self.memo.get(token) {
            return Ok(hit.clone());
        }
        let converted = self.table.convert(token);
        if self.memo.len() >= Self::MEMO_LIMIT {
            self.memo.clear();
        }
        self.memo.insert(token.to_owned(), converted.clone());
        Ok(converted)
    }
}

/// Maps every token through this worker's private converter.
pub struct ConvertScript {
    factory: ConverterFactory,
    converter: Option<Box<dyn ScriptConverter>>,
}

impl ConvertScript {
    pub fn new(factory: ConverterFactory) -> Self {
        Self {
            factory,
            converter: None,
        }
    }
}

impl Stage for ConvertScript {
    fn name(&self) -> &'static str {
        "convert_script"
    }

    fn apply(&mut self, tokens: Vec<String>) -> StageResult<Vec<String>> {
        let converter = match &mut self.converter {
            Some(c) => c,
            slot @ None => slot.insert(self.factory.build()?),
        };
        tokens.iter().map(|t| converter.convert(t)).collect()
    }
}
