use std::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Part of a parallel run that produced a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// The producer feeding documents into the intake queue.
    Intake,
    /// Worker `n` (zero-based).
    Worker(usize),
    /// The single writer draining the outtake queue.
    Writer,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Intake => f.write_str("intake"),
            Phase::Worker(id) => write!(f, "worker {id}"),
            Phase::Writer => f.write_str("writer"),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("stage `{stage}` failed on document #{seq}: {message}")]
    Stage {
        stage: &'static str,
        seq: u64,
        message: String,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{origin} line {line}: {message}")]
    Decode {
        origin: &'static str,
        line: u64,
        message: String,
    },

    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("{queue} queue closed")]
    QueueClosed { queue: &'static str },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("processor has already run")]
    AlreadyRan,

    #[error("{phase} failed: {source}")]
    Phase {
        phase: Phase,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub fn stage(stage: &'static str, seq: u64, message: impl Into<String>) -> Self {
        Self::Stage {
            stage,
            seq,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub(crate) fn in_phase(self, phase: Phase) -> Self {
        match self {
            already @ Error::Phase { .. } => already,
            other => Self::Phase {
                phase,
                source: Box::new(other),
            },
        }
    }

    /// The phase this error was attributed to, if any.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Error::Phase { phase, .. } => Some(*phase),
            _ => None,
        }
    }

    /// The error with any phase wrapper removed.
    pub fn root(&self) -> &Error {
        match self {
            Error::Phase { source, .. } => source.root(),
            other => other,
        }
    }

    /// True when this error only reports that a peer went away.
    ///
    /// A worker that finds the outtake queue closed is reacting to a writer
    /// failure; the writer's error is the one worth surfacing.
    pub(crate) fn is_consequential(&self) -> bool {
        matches!(self.root(), Error::QueueClosed { .. })
    }
}
