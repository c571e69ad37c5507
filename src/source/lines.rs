use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};

use crate::error::Result;
use crate::source::DocumentSource;
use crate::Document;

/// One document per line of a UTF-8 text file, tokens split on whitespace.
///
/// The file is opened on the first pull. A blank line yields an empty
/// document rather than being skipped, so line counts are preserved.
pub struct LineSource {
    path: PathBuf,
    lines: Option<Lines<BufReader<File>>>,
    whole_line: bool,
}

impl LineSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lines: None,
            whole_line: false,
        }
    }

    /// Emit each line as a single-token document instead of splitting it.
    ///
    /// Useful when a segmentation stage does the splitting.
    pub fn whole_line(mut self, yes: bool) -> Self {
        self.whole_line = yes;
        self
    }
}

#[async_trait]
impl DocumentSource for LineSource {
    async fn next_document(&mut self) -> Result<Option<Document>> {
        let lines = match &mut self.lines {
            Some(lines) => lines,
            slot @ None => {
                let file = File::open(&self.path).await?;
                slot.insert(BufReader::new(file).lines())
            }
        };

        let Some(line) = lines.next_line().await? else {
            return Ok(None);
        };
        let line = line.trim_end_matches('\r');

        let doc = if self.whole_line {
            vec![line.to_owned()]
        } else {
            line.split_whitespace().map(str::to_owned).collect()
        };
        Ok(Some(doc))
    }

    fn source_name(&self) -> &'static str {
        "line_source"
    }
}
