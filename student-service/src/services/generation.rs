//! Client for an Ollama-compatible `/api/generate` endpoint.
//!
//! The backend answers with newline-delimited JSON fragments
//! (`{"response": "...", "done": false}`). Fragments are concatenated in
//! arrival order until one arrives with `done` set; whatever follows is
//! dropped. Failures never escape as errors: callers always get a string,
//! either the generated text or a description of what went wrong.

use crate::config::GenerationSettings;
use futures::StreamExt;
use metrics::{counter, histogram};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

/// Room left for JSON framing around a fragment before an unterminated line
/// counts as oversized.
const LINE_HEADROOM: usize = 1024;

#[derive(Debug, thiserror::Error)]
enum GenerationError {
    #[error("request to generation backend failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("generation backend returned {0}: {1}")]
    Status(StatusCode, String),

    #[error("{0}")]
    Stream(String),

    #[error("generation gate closed")]
    GateClosed,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

/// One line of the streamed body. Missing fields decode to their defaults.
#[derive(Debug, Deserialize)]
struct Fragment {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
}

/// Progress of stream consumption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamState {
    Reading,
    Done,
    Failed(String),
}

impl StreamState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StreamState::Reading)
    }
}

/// Splits raw body chunks into lines and folds fragments into one string.
#[derive(Debug)]
pub struct FragmentAggregator {
    text: String,
    pending: Vec<u8>,
    /// Prefix of `pending` already known to hold no newline.
    scanned: usize,
    max_bytes: usize,
    state: StreamState,
}

impl FragmentAggregator {
    pub fn new(max_bytes: usize) -> Self {
        Self {
            text: String::new(),
            pending: Vec::new(),
            scanned: 0,
            max_bytes,
            state: StreamState::Reading,
        }
    }

    pub fn state(&self) -> &StreamState {
        &self.state
    }

    /// Feed a chunk of the response body. Chunks may split lines anywhere.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> &StreamState {
        if self.state.is_terminal() {
            return &self.state;
        }

        self.pending.extend_from_slice(chunk);

        while let Some(offset) = self.pending[self.scanned..]
            .iter()
            .position(|b| *b == b'\n')
        {
            let newline = self.scanned + offset;
            let line: Vec<u8> = self.pending.drain(..=newline).collect();
            self.scanned = 0;
            self.push_line(&line);
            if self.state.is_terminal() {
                return &self.state;
            }
        }
        self.scanned = self.pending.len();

        if self.pending.len() > self.max_bytes + LINE_HEADROOM {
            self.fail(format!(
                "generation response line exceeded {} bytes",
                self.max_bytes
            ));
        }

        &self.state
    }

    /// Decode one line. Blank lines are skipped.
    pub fn push_line(&mut self, line: &[u8]) -> &StreamState {
        if self.state.is_terminal() {
            return &self.state;
        }

        let line = line.trim_ascii();
        if line.is_empty() {
            return &self.state;
        }

        let fragment: Fragment = match serde_json::from_slice(line) {
            Ok(fragment) => fragment,
            Err(e) => {
                self.fail(format!("failed to decode response line: {}", e));
                return &self.state;
            }
        };

        if self.text.len() + fragment.response.len() > self.max_bytes {
            self.fail(format!(
                "generation response exceeded {} bytes",
                self.max_bytes
            ));
            return &self.state;
        }

        self.text.push_str(&fragment.response);
        if fragment.done {
            self.state = StreamState::Done;
        }

        &self.state
    }

    pub fn fail(&mut self, message: String) {
        if !self.state.is_terminal() {
            self.state = StreamState::Failed(message);
        }
    }

    /// Flush a trailing unterminated line and yield the text or the failure.
    ///
    /// A body that ends without a `done` fragment still yields what arrived.
    fn finish(mut self) -> Result<String, GenerationError> {
        if !self.state.is_terminal() && !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            self.scanned = 0;
            self.push_line(&rest);
        }

        match self.state {
            StreamState::Failed(message) => Err(GenerationError::Stream(message)),
            StreamState::Reading | StreamState::Done => Ok(self.text),
        }
    }

    /// Same as `finish`, with failures rendered as their message.
    pub fn into_output(self) -> String {
        self.finish().unwrap_or_else(|e| e.to_string())
    }
}

/// Streaming generation client with a timeout, a response size cap and a
/// bound on concurrent outbound calls.
#[derive(Clone)]
pub struct GenerationClient {
    client: Client,
    settings: GenerationSettings,
    permits: Arc<Semaphore>,
}

impl GenerationClient {
    pub fn new(settings: GenerationSettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(settings.timeout()).build()?;
        let permits = Arc::new(Semaphore::new(settings.max_concurrent.max(1)));

        Ok(Self {
            client,
            settings,
            permits,
        })
    }

    /// Model used by [`GenerationClient::generate`].
    pub fn model(&self) -> &str {
        &self.settings.model
    }

    /// Generate with the configured model.
    pub async fn generate(&self, prompt: &str) -> String {
        self.generate_with_model(&self.settings.model, prompt).await
    }

    /// Send `prompt` to `model` and return the assembled text, or a message
    /// describing the failure.
    pub async fn generate_with_model(&self, model: &str, prompt: &str) -> String {
        let started = Instant::now();
        let result = self.stream_generate(model, prompt).await;
        let elapsed = started.elapsed();

        histogram!("generation_duration_seconds").record(elapsed.as_secs_f64());

        match result {
            Ok(text) => {
                counter!("generation_requests_total", "outcome" => "ok").increment(1);
                tracing::debug!(
                    model = %model,
                    output_len = text.len(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Generation completed"
                );
                text
            }
            Err(e) => {
                counter!("generation_requests_total", "outcome" => "error").increment(1);
                tracing::warn!(model = %model, error = %e, "Generation failed");
                e.to_string()
            }
        }
    }

    async fn stream_generate(&self, model: &str, prompt: &str) -> Result<String, GenerationError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| GenerationError::GateClosed)?;

        tracing::debug!(
            url = %self.settings.url,
            model = %model,
            prompt_len = prompt.len(),
            "Sending generation request"
        );

        let response = self
            .client
            .post(&self.settings.url)
            .json(&GenerateRequest { model, prompt })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status(status, body));
        }

        let mut aggregator = FragmentAggregator::new(self.settings.max_response_bytes);
        let mut body = response.bytes_stream();

        while let Some(chunk) = body.next().await {
            match chunk {
                Ok(bytes) => {
                    if aggregator.push_chunk(&bytes).is_terminal() {
                        break;
                    }
                }
                Err(e) => {
                    aggregator.fail(format!("error reading response: {}", e));
                    break;
                }
            }
        }

        aggregator.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAP: usize = 1024;

    fn aggregate(chunks: &[&str]) -> String {
        let mut aggregator = FragmentAggregator::new(CAP);
        for chunk in chunks {
            if aggregator.push_chunk(chunk.as_bytes()).is_terminal() {
                break;
            }
        }
        aggregator.into_output()
    }

    #[test]
    fn two_line_stream_concatenates_fragments() {
        let output = aggregate(&[
            "{\"response\":\"A\",\"done\":false}\n",
            "{\"response\":\"B\",\"done\":true}\n",
        ]);
        assert_eq!(output, "AB");
    }

    #[test]
    fn lines_split_across_chunks_are_reassembled() {
        let output = aggregate(&[
            "{\"respon",
            "se\":\"Hel\",\"done\":false}\n{\"response\":\"lo\"",
            ",\"done\":true}\n",
        ]);
        assert_eq!(output, "Hello");
    }

    #[test]
    fn stops_at_done_and_ignores_the_rest() {
        let mut aggregator = FragmentAggregator::new(CAP);
        aggregator.push_chunk(b"{\"response\":\"A\",\"done\":true}\nnot json at all\n");

        assert_eq!(aggregator.state(), &StreamState::Done);
        assert_eq!(aggregator.into_output(), "A");
    }

    #[test]
    fn malformed_line_fails_with_message() {
        let mut aggregator = FragmentAggregator::new(CAP);
        aggregator.push_chunk(b"{\"response\":\"A\",\"done\":false}\n{oops\n");

        assert!(matches!(aggregator.state(), StreamState::Failed(_)));
        let output = aggregator.into_output();
        assert!(output.starts_with("failed to decode response line"));
    }

    #[test]
    fn blank_lines_are_skipped() {
        let output = aggregate(&[
            "{\"response\":\"A\",\"done\":false}\r\n",
            "\n",
            "{\"response\":\"B\",\"done\":true}\r\n",
        ]);
        assert_eq!(output, "AB");
    }

    #[test]
    fn trailing_line_without_newline_is_processed() {
        let output = aggregate(&[
            "{\"response\":\"A\",\"done\":false}\n",
            "{\"response\":\"B\",\"done\":true}",
        ]);
        assert_eq!(output, "AB");
    }

    #[test]
    fn end_of_body_without_done_keeps_accumulated_text() {
        let output = aggregate(&["{\"response\":\"partial\",\"done\":false}\n"]);
        assert_eq!(output, "partial");
    }

    #[test]
    fn missing_fields_default() {
        let output = aggregate(&["{\"response\":\"x\"}\n", "{\"done\":true}\n"]);
        assert_eq!(output, "x");
    }

    #[test]
    fn exceeding_size_cap_fails() {
        let mut aggregator = FragmentAggregator::new(4);
        aggregator.push_chunk(b"{\"response\":\"abc\",\"done\":false}\n");
        aggregator.push_chunk(b"{\"response\":\"de\",\"done\":false}\n");

        assert_eq!(
            aggregator.into_output(),
            "generation response exceeded 4 bytes"
        );
    }

    #[test]
    fn oversized_unterminated_line_fails() {
        let mut aggregator = FragmentAggregator::new(8);
        let mut line = b"{\"response\":\"".to_vec();
        line.extend(std::iter::repeat(b'x').take(8 + LINE_HEADROOM));
        let state = aggregator.push_chunk(&line);

        assert_eq!(
            state,
            &StreamState::Failed("generation response line exceeded 8 bytes".to_string())
        );
    }

    #[test]
    fn fragment_at_cap_fits_while_line_is_unterminated() {
        let mut aggregator = FragmentAggregator::new(10);

        let state = aggregator.push_chunk(b"{\"response\":\"0123456789\",\"done\":true}");
        assert_eq!(state, &StreamState::Reading);

        let state = aggregator.push_chunk(b"\n");
        assert_eq!(state, &StreamState::Done);
        assert_eq!(aggregator.into_output(), "0123456789");
    }

    #[test]
    fn long_line_fed_byte_by_byte_is_assembled() {
        let text = "y".repeat(4096);
        let line = format!(
            "{{\"response\":\"{}\",\"done\":false}}\n{{\"response\":\"!\",\"done\":true}}\n",
            text
        );

        let mut aggregator = FragmentAggregator::new(8192);
        for byte in line.as_bytes() {
            if aggregator.push_chunk(std::slice::from_ref(byte)).is_terminal() {
                break;
            }
        }

        assert_eq!(aggregator.state(), &StreamState::Done);
        assert_eq!(aggregator.into_output(), format!("{}!", text));
    }

    #[test]
    fn read_error_wins_over_accumulated_text() {
        let mut aggregator = FragmentAggregator::new(CAP);
        aggregator.push_chunk(b"{\"response\":\"A\",\"done\":false}\n");
        aggregator.fail("error reading response: connection reset".to_string());

        assert_eq!(
            aggregator.into_output(),
            "error reading response: connection reset"
        );
    }
}
