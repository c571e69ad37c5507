//! Token-sequence transformations and the closed list of stage variants.
//!
//! A [`Stage`] turns one document's tokens into new tokens. Stages are `Send`
//! so a worker can own them, but they are never required to be `Sync`: a
//! pipeline is built per worker and never shared.
//!
//! [`StageSpec`] is the canonical, cloneable description a worker builds its
//! private stages from. Shareable variants carry their read-only state behind
//! an `Arc`; [`StageSpec::ConvertScript`] carries only a factory, so each
//! worker constructs its own converter.

pub mod convert;
pub mod registry;
pub mod script;
pub mod segment;
pub mod stopwords;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use self::convert::{ConvertScript, ConverterFactory};
use self::script::RemoveNonChinese;
use self::segment::{Segment, Segmenter};
use self::stopwords::{RemoveStopwords, StopwordSet};

/// Failure raised by a stage or an external collaborator it wraps.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct StageError(pub String);

impl StageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

pub type StageResult<T> = std::result::Result<T, StageError>;

/// One step of a pipeline.
pub trait Stage: Send {
    /// Name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Transform a whole document. The returned vector is fully materialized.
    fn apply(&mut self, tokens: Vec<String>) -> StageResult<Vec<String>>;
}

/// Static name of a stage variant, as it appears in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    ConvertScript,
    Segment,
    RemoveNonChinese,
    RemoveStopwords,
}

impl StageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StageKind::ConvertScript => "convert_script",
            StageKind::Segment => "segment",
            StageKind::RemoveNonChinese => "remove_non_chinese",
            StageKind::RemoveStopwords => "remove_stopwords",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical description of a stage; cloned into every worker.
#[derive(Clone)]
pub enum StageSpec {
    RemoveStopwords(Arc<StopwordSet>),
    RemoveNonChinese,
    Segment(Arc<dyn Segmenter>),
    ConvertScript(ConverterFactory),
}

impl StageSpec {
    pub fn remove_stopwords(words: StopwordSet) -> Self {
        Self::RemoveStopwords(Arc::new(words))
    }

    pub fn segment<S: Segmenter + 'static>(segmenter: S) -> Self {
        Self::Segment(Arc::new(segmenter))
    }

    pub fn kind(&self) -> StageKind {
        match self {
            StageSpec::RemoveStopwords(_) => StageKind::RemoveStopwords,
            StageSpec::RemoveNonChinese => StageKind::RemoveNonChinese,
            StageSpec::Segment(_) => StageKind::Segment,
            StageSpec::ConvertScript(_) => StageKind::ConvertScript,
        }
    }

    /// Whether one built instance could safely serve several workers.
    pub fn is_shareable(&self) -> bool {
        !matches!(self, StageSpec::ConvertScript(_))
    }

    /// Build a fresh stage instance for the calling worker.
    pub fn build(&self) -> Box<dyn Stage> {
        match self {
            StageSpec::RemoveStopwords(words) => Box::new(RemoveStopwords::new(Arc::clone(words))),
            StageSpec::RemoveNonChinese => Box::new(RemoveNonChinese),
            StageSpec::Segment(segmenter) => Box::new(Segment::new(Arc::clone(segmenter))),
            StageSpec::ConvertScript(factory) => Box::new(ConvertScript::new(factory.clone())),
        }
    }
}

impl fmt::Debug for StageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageSpec::RemoveStopwords(words) => f
                .debug_struct("RemoveStopwords")
                .field("words", &words.len())
                .finish(),
            other => f.write_str(other.kind().as_str()),
        }
    }
}
