//! Newline-delimited JSON decoding for streamed generation replies.
//!
//! The service writes one JSON object per line; network chunks may split a
//! line (or a multi-byte character) anywhere, so bytes are buffered until a
//! newline arrives.

use robocni_core::TransportError;
use serde::Deserialize;

/// Upper bound on a single buffered line.
const MAX_LINE_BYTES: usize = 1024 * 1024;

/// One decoded line of the reply stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GenerateFragment {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub done: bool,
    /// Set by the server instead of `response` when generation fails mid-stream.
    #[serde(default)]
    pub error: Option<String>,
}

/// Incremental decoder for a newline-delimited JSON body.
#[derive(Debug, Default)]
pub struct NdjsonDecoder {
    buffer: Vec<u8>,
}

impl NdjsonDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every fragment completed by it.
    ///
    /// Blank lines are skipped. A line that is not a valid fragment fails the
    /// whole reply.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<GenerateFragment>, TransportError> {
        self.buffer.extend_from_slice(chunk);

        let mut fragments = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(fragment) = decode_line(&line)? {
                fragments.push(fragment);
            }
        }

        if self.buffer.len() > MAX_LINE_BYTES {
            return Err(TransportError::MalformedFragment(format!(
                "line exceeds {MAX_LINE_BYTES} bytes without a newline"
            )));
        }
        Ok(fragments)
    }

    /// Decode a final line that was not newline-terminated.
    pub fn finish(self) -> Result<Option<GenerateFragment>, TransportError> {
        decode_line(&self.buffer)
    }

    pub fn has_buffered_data(&self) -> bool {
        !self.buffer.iter().all(u8::is_ascii_whitespace)
    }
}

fn decode_line(line: &[u8]) -> Result<Option<GenerateFragment>, TransportError> {
    let text = String::from_utf8_lossy(line);
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }

    let fragment: GenerateFragment = serde_json::from_str(text)
        .map_err(|e| TransportError::MalformedFragment(format!("{e}: {text}")))?;
    if let Some(error) = &fragment.error {
        return Err(TransportError::Body(error.clone()));
    }
    Ok(Some(fragment))
}
