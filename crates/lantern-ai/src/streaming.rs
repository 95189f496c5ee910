//! Server-Sent Events (SSE) streaming parser.
//!
//! OpenAI-compatible inference servers stream completions as SSE. Events
//! are parsed lazily: nothing is read from the body until the consumer
//! polls for the next event.

use futures_util::stream::{self, BoxStream, StreamExt};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio_util::io::StreamReader;

use crate::AiError;

/// A single SSE event parsed from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// The event type, when the server names one.
    pub event: Option<String>,
    /// The event data (usually a JSON string).
    pub data: String,
}

struct ParserState<R> {
    lines: Lines<R>,
    event: Option<String>,
    data: String,
    done: bool,
}

impl<R> ParserState<R> {
    fn take_event(&mut self) -> SseEvent {
        SseEvent {
            event: self.event.take(),
            data: std::mem::take(&mut self.data),
        }
    }

    fn push_field(&mut self, line: &str) {
        if let Some(event_type) = line.strip_prefix("event:") {
            self.event = Some(event_type.trim_start().to_string());
        } else if let Some(data) = line.strip_prefix("data:") {
            let data = data.strip_prefix(' ').unwrap_or(data);
            if !self.data.is_empty() {
                self.data.push('\n');
            }
            self.data.push_str(data);
        }
        // id:, retry:, and ":" comments are ignored
    }
}

/// Turn a streaming HTTP response body into a lazy stream of SSE events.
pub fn sse_events(response: reqwest::Response) -> BoxStream<'static, Result<SseEvent, AiError>> {
    let byte_stream = Box::pin(
        response
            .bytes_stream()
            .map(|result| result.map_err(std::io::Error::other)),
    );
    sse_from_reader(BufReader::new(StreamReader::new(byte_stream)))
}

/// Parse SSE events from any buffered async reader.
pub fn sse_from_reader<R>(reader: R) -> BoxStream<'static, Result<SseEvent, AiError>>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let state = ParserState {
        lines: reader.lines(),
        event: None,
        data: String::new(),
        done: false,
    };

    stream::unfold(state, |mut state| async move {
        if state.done {
            return None;
        }
        loop {
            match state.lines.next_line().await {
                Ok(Some(line)) => {
                    if line.is_empty() {
                        // Blank line ends an event
                        if !state.data.is_empty() {
                            let event = state.take_event();
                            return Some((Ok(event), state));
                        }
                        state.event = None;
                        continue;
                    }
                    state.push_field(&line);
                }
                Ok(None) => {
                    state.done = true;
                    if state.data.is_empty() {
                        return None;
                    }
                    let event = state.take_event();
                    return Some((Ok(event), state));
                }
                Err(e) => {
                    state.done = true;
                    return Some((Err(AiError::NetworkError(e.to_string())), state));
                }
            }
        }
    })
    .boxed()
}
