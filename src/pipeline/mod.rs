//! Pipeline composition and the parallel executor.

pub mod cancel;
pub mod chain;
pub mod config;
pub mod processor;
pub mod queue;
pub mod state;
pub mod writer;

pub(crate) mod worker;
