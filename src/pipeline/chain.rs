use crate::error::{Error, Result};
use crate::stage::{Stage, StageKind, StageSpec};

/// Canonical, shareable ordered list of stage descriptions.
///
/// Every worker calls [`PipelineSpec::build`] to get its own [`Pipeline`].
#[derive(Debug, Clone, Default)]
pub struct PipelineSpec {
    stages: Vec<StageSpec>,
}

impl PipelineSpec {
    pub fn new(stages: Vec<StageSpec>) -> Self {
        Self { stages }
    }

    /// Append a stage; it runs after every stage already in the spec.
    pub fn then(mut self, stage: StageSpec) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn stages(&self) -> &[StageSpec] {
        &self.stages
    }

    pub fn kinds(&self) -> Vec<StageKind> {
        self.stages.iter().map(StageSpec::kind).collect()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn build(&self) -> Pipeline {
        Pipeline {
            stages: self.stages.iter().map(StageSpec::build).collect(),
        }
    }
}

/// One worker's private chain of stages.
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn from_stages(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// Thread `tokens` through every stage in order.
    ///
    /// `seq` only labels the error if a stage fails.
    pub fn apply(&mut self, seq: u64, tokens: Vec<String>) -> Result<Vec<String>> {
        let mut current = tokens;
        for stage in &mut self.stages {
            current = stage
                .apply(current)
                .map_err(|e| Error::stage(stage.name(), seq, e.0))?;
        }
        Ok(current)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }
}
