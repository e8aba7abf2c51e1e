//! SSE (Server-Sent Events) decoder for OpenAI-compatible chat streams.
//!
//! Turns raw response bytes into content deltas. Handles the `data: `
//! prefix, `[DONE]` termination, lines split across chunk boundaries, and
//! empty keep-alive lines.

use serde_json::Value;

/// Incremental decoder yielding the `choices[0].delta.content` strings of a
/// chat-completions stream.
///
/// # Example
///
/// ```
/// use product_recommender::backend::sse::DeltaDecoder;
///
/// let mut decoder = DeltaDecoder::new();
/// let data = b"data: {\"choices\":[{\"delta\":{\"content\":\"Hello\"}}]}\n\ndata: [DONE]\n\n";
/// assert_eq!(decoder.decode(data), vec!["Hello".to_string()]);
/// assert!(decoder.is_done());
/// ```
#[derive(Debug, Default)]
pub struct DeltaDecoder {
    buffer: String,
    done: bool,
}

impl DeltaDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the `[DONE]` terminator has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed raw bytes and return every complete, non-empty content delta.
    pub fn decode(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.push_str(&String::from_utf8_lossy(chunk));

        let mut deltas = Vec::new();
        while let Some(pos) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=pos).collect();
            if let Some(delta) = self.decode_line(&line) {
                deltas.push(delta);
            }
        }
        deltas
    }

    /// Decode whatever is left in the buffer once the stream has ended.
    pub fn flush(&mut self) -> Vec<String> {
        let remaining = std::mem::take(&mut self.buffer);
        remaining
            .lines()
            .filter_map(|line| self.decode_line(line))
            .collect()
    }

    fn decode_line(&mut self, line: &str) -> Option<String> {
        let data = line
            .trim()
            .strip_prefix("data:")
            .map(str::trim)?;

        if data == "[DONE]" {
            self.done = true;
            return None;
        }

        let value: Value = serde_json::from_str(data).ok()?;
        value
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("delta"))
            .and_then(|d| d.get("content"))
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}
