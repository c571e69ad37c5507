use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use crate::error::{Error, Result};
use crate::source::DocumentSource;
use crate::Document;

const DEFAULT_MAX_LINE_BYTES: usize = 16 * 1024 * 1024;
const DEFAULT_READ_CHUNK_BYTES: usize = 64 * 1024;
const DEFAULT_FIELD: &str = "content";

/// One JSON object per line; a string field becomes a one-token document.
///
/// News dumps store a whole article body in one field, so the document is the
/// unsegmented text and a `segment` stage is expected downstream.
pub struct NdjsonSource {
    path: PathBuf,
    field: String,
    read_chunk_bytes: usize,
    max_line_bytes: usize,
    allow_empty_lines: bool,
    state: Option<ReadState>,
}

struct ReadState {
    file: File,
    read_buf: Vec<u8>,
    pending: Vec<u8>,
    line_no: u64,
    eof: bool,
}

impl NdjsonSource {
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            field: DEFAULT_FIELD.to_owned(),
            read_chunk_bytes: DEFAULT_READ_CHUNK_BYTES,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
            allow_empty_lines: false,
            state: None,
        }
    }

    /// JSON field holding the document text. Defaults to `content`.
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    pub fn read_chunk_bytes(mut self, n: usize) -> Self {
        self.read_chunk_bytes = n.max(1);
        self
    }

    pub fn max_line_bytes(mut self, n: usize) -> Self {
        self.max_line_bytes = n;
        self
    }

    /// Whether blank lines should be ignored instead of rejected.
    pub fn allow_empty_lines(mut self, yes: bool) -> Self {
        self.allow_empty_lines = yes;
        self
    }

    fn decode(&self, line_no: u64, line: &[u8]) -> Result<Document> {
        let decode_err = |message: String| Error::Decode {
            origin: "ndjson",
            line: line_no,
            message,
        };

        let value: Value = serde_json::from_slice(line)
            .map_err(|e| decode_err(format!("{e} (preview: {:?})", preview(line))))?;
        match value.get(&self.field) {
            Some(Value::String(text)) => Ok(vec![text.clone()]),
            Some(_) => Err(decode_err(format!("field `{}` is not a string", self.field))),
            None => Err(decode_err(format!("missing field `{}`", self.field))),
        }
    }
}

impl ReadState {
    /// Pull the next complete line out of `pending`, reading more as needed.
    async fn next_line(&mut self, max_line_bytes: usize) -> Result<Option<Vec<u8>>> {
        loop {
            if let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
                let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
                line.pop();
                self.line_no += 1;
                return Ok(Some(strip_cr(line)));
            }
            if self.pending.len() > max_line_bytes {
                return Err(Error::Decode {
                    origin: "ndjson",
                    line: self.line_no + 1,
                    message: format!(
                        "line exceeded max_line_bytes ({} > {max_line_bytes})",
                        self.pending.len()
                    ),
                });
            }
            if self.eof {
                if self.pending.is_empty() {
                    return Ok(None);
                }
                self.line_no += 1;
                return Ok(Some(strip_cr(std::mem::take(&mut self.pending))));
            }

            let n = self.file.read(&mut self.read_buf).await?;
            if n == 0 {
                self.eof = true;
            } else {
                self.pending.extend_from_slice(&self.read_buf[..n]);
            }
        }
    }
}

#[async_trait]
impl DocumentSource for NdjsonSource {
    async fn next_document(&mut self) -> Result<Option<Document>> {
        if self.state.is_none() {
            let file = File::open(&self.path).await?;
            self.state = Some(ReadState {
                file,
                read_buf: vec![0_u8; self.read_chunk_bytes],
                pending: Vec::new(),
                line_no: 0,
                eof: false,
            });
        }

        let max_line_bytes = self.max_line_bytes;
        loop {
            let Some(state) = self.state.as_mut() else {
                return Ok(None);
            };
            let Some(line) = state.next_line(max_line_bytes).await? else {
                return Ok(None);
            };
            let line_no = state.line_no;

            if line.iter().all(u8::is_ascii_whitespace) {
                if self.allow_empty_lines {
                    continue;
                }
                return Err(Error::Decode {
                    origin: "ndjson",
                    line: line_no,
                    message: "empty line".to_owned(),
                });
            }
            return self.decode(line_no, &line).map(Some);
        }
    }

    fn source_name(&self) -> &'static str {
        "ndjson_source"
    }
}

fn strip_cr(mut line: Vec<u8>) -> Vec<u8> {
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    line
}

fn preview(line: &[u8]) -> String {
    const PREVIEW_LEN: usize = 80;
    let text = String::from_utf8_lossy(line);
    let mut short = text.chars().take(PREVIEW_LEN).collect::<String>();
    if text.chars().count() > PREVIEW_LEN {
        short.push_str("...");
    }
    short
}
