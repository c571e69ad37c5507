use std::fmt;

/// Lifecycle of a [`Processor`](crate::pipeline::processor::Processor).
///
/// A run walks `Idle → QueuesReady → WorkersRunning → Draining → Done`
/// without skipping steps. `Done` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessorState {
    Idle,
    QueuesReady,
    WorkersRunning,
    /// Workers have stopped; the writer is emptying the outtake queue.
    Draining,
    Done,
    Failed,
}

impl ProcessorState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ProcessorState::Done | ProcessorState::Failed)
    }

    /// The state a successful run moves to next.
    pub fn next(self) -> Option<ProcessorState> {
        match self {
            ProcessorState::Idle => Some(ProcessorState::QueuesReady),
            ProcessorState::QueuesReady => Some(ProcessorState::WorkersRunning),
            ProcessorState::WorkersRunning => Some(ProcessorState::Draining),
            ProcessorState::Draining => Some(ProcessorState::Done),
            ProcessorState::Done | ProcessorState::Failed => None,
        }
    }

    /// Whether `to` is a legal transition from `self`.
    pub fn can_advance_to(self, to: ProcessorState) -> bool {
        match to {
            ProcessorState::Failed => !self.is_terminal() && self != ProcessorState::Idle,
            other => self.next() == Some(other),
        }
    }
}

impl fmt::Display for ProcessorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProcessorState::Idle => "idle",
            ProcessorState::QueuesReady => "queues_ready",
            ProcessorState::WorkersRunning => "workers_running",
            ProcessorState::Draining => "draining",
            ProcessorState::Done => "done",
            ProcessorState::Failed => "failed",
        };
        f.write_str(name)
    }
}
