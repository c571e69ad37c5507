use std::sync::Arc;

use crate::error::{Error, Result};
use crate::pipeline::chain::PipelineSpec;
use crate::stage::convert::ConverterFactory;
use crate::stage::segment::Segmenter;
use crate::stage::stopwords::StopwordSet;
use crate::stage::{StageKind, StageSpec};

/// Collaborators the configurable stages need, resolved by [`StageKind`].
#[derive(Default, Clone)]
pub struct StageRegistry {
    segmenter: Option<Arc<dyn Segmenter>>,
    converter: Option<ConverterFactory>,
    stopwords: Option<Arc<StopwordSet>>,
}

impl StageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segmenter<S: Segmenter + 'static>(mut self, segmenter: S) -> Self {
        self.segmenter = Some(Arc::new(segmenter));
        self
    }

    pub fn converter(mut self, factory: ConverterFactory) -> Self {
        self.converter = Some(factory);
        self
    }

    pub fn stopwords(mut self, words: StopwordSet) -> Self {
        self.stopwords = Some(Arc::new(words));
        self
    }

    pub fn spec_for(&self, kind: StageKind) -> Result<StageSpec> {
        let missing = |what: &str| Error::config(format!("stage `{kind}` needs a {what}"));
        Ok(match kind {
            StageKind::RemoveNonChinese => StageSpec::RemoveNonChinese,
            StageKind::Segment => StageSpec::Segment(Arc::clone(
                self.segmenter.as_ref().ok_or_else(|| missing("segmenter"))?,
            )),
            StageKind::ConvertScript => StageSpec::ConvertScript(
                self.converter
                    .clone()
                    .ok_or_else(|| missing("converter factory"))?,
            ),
            StageKind::RemoveStopwords => StageSpec::RemoveStopwords(Arc::clone(
                self.stopwords.as_ref().ok_or_else(|| missing("stopword set"))?,
            )),
        })
    }

    /// Resolve an ordered list of stage names into a pipeline spec.
    pub fn resolve(&self, kinds: &[StageKind]) -> Result<PipelineSpec> {
        kinds
            .iter()
            .map(|&kind| self.spec_for(kind))
            .collect::<Result<Vec<_>>>()
            .map(PipelineSpec::new)
    }
}
