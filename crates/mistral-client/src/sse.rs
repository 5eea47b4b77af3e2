use std::collections::BTreeMap;

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use mistral_types::{ChatEvent, StreamChunk, Usage};

use crate::error::{MistralClientError, Result};

/// Incremental decoder for the chat-completion event stream
///
/// Events are `data: <json>` lines separated by a blank line; the stream
/// ends with `data: [DONE]`. Bytes are buffered until an event is complete,
/// so chunk boundaries may fall anywhere, including inside a UTF-8 sequence.
#[derive(Debug)]
struct SseDecoder {
    buffer: Vec<u8>,
    /// Bytes of `buffer` already searched for a separator
    scanned: usize,
    /// Number of choices the request asked for
    choices: usize,
    /// Finish reason per choice index
    finished: BTreeMap<u32, String>,
    /// Latest usage report
    usage: Option<Usage>,
    /// `Done` was emitted
    done: bool,
    /// `[DONE]` was seen, ignore anything after it
    closed: bool,
}

impl SseDecoder {
    fn new(choices: usize) -> Self {
        Self {
            buffer: Vec::new(),
            scanned: 0,
            choices: choices.max(1),
            finished: BTreeMap::new(),
            usage: None,
            done: false,
            closed: false,
        }
    }

    fn feed(&mut self, bytes: &[u8]) -> Vec<Result<ChatEvent>> {
        let mut events = Vec::new();

        if self.closed {
            return events;
        }

        self.buffer.extend_from_slice(bytes);

        while let Some((end, separator)) = find_event_end(&self.buffer, self.scanned) {
            let raw: Vec<u8> = self.buffer.drain(..end + separator).collect();
            self.scanned = 0;
            let block = String::from_utf8_lossy(&raw[..end]);

            for line in block.lines() {
                let Some(data) = line.strip_prefix("data:") else {
                    continue;
                };

                let data = data.trim();
                if data == "[DONE]" {
                    self.finish(&mut events);
                    self.closed = true;
                    self.buffer.clear();
                    return events;
                }

                match serde_json::from_str::<StreamChunk>(data) {
                    Ok(chunk) => self.apply(&chunk, &mut events),
                    Err(e) => {
                        tracing::warn!("unparseable stream chunk: {e}");
                        events.push(Err(MistralClientError::Parse(format!(
                            "failed to parse stream chunk: {e}"
                        ))));
                    }
                }
            }
        }

        self.scanned = self.buffer.len();

        events
    }

    fn apply(&mut self, chunk: &StreamChunk, events: &mut Vec<Result<ChatEvent>>) {
        if self.done {
            return;
        }

        events.extend(chunk.deltas().map(Ok));

        for (index, reason) in chunk.finishes() {
            self.finished.entry(index).or_insert_with(|| reason.to_owned());
        }
        if chunk.usage.is_some() {
            self.usage.clone_from(&chunk.usage);
        }

        if self.finished.len() >= self.choices {
            self.finish(events);
        }
    }

    /// Emit the single `Done` event if it has not gone out yet
    fn finish(&mut self, events: &mut Vec<Result<ChatEvent>>) {
        if self.done {
            return;
        }
        self.done = true;

        events.push(Ok(ChatEvent::Done {
            finish_reason: self.finished.values().next().cloned(),
            usage: self.usage.take(),
        }));
    }
}

/// Position and length of the first blank-line separator at or after `from`
///
/// The search backs up three bytes so a separator split across two feeds is
/// still found.
fn find_event_end(buffer: &[u8], from: usize) -> Option<(usize, usize)> {
    (from.saturating_sub(3)..buffer.len()).find_map(|i| {
        let rest = &buffer[i..];
        if rest.starts_with(b"\r\n\r\n") {
            Some((i, 4))
        } else if rest.starts_with(b"\n\n") {
            Some((i, 2))
        } else {
            None
        }
    })
}

/// Parse a byte stream of SSE data into `ChatEvent`s
///
/// `choices` is the number of completions requested; `Done` is emitted once
/// that many choices have finished, or at `[DONE]`.
pub fn parse_sse_stream<S>(byte_stream: S, choices: usize) -> impl Stream<Item = Result<ChatEvent>>
where
    S: Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Send + 'static,
{
    byte_stream
        .scan(SseDecoder::new(choices), |decoder, result| {
            let events = match result {
                Ok(bytes) => decoder.feed(&bytes),
                Err(e) => vec![Err(MistralClientError::Http(e))],
            };

            std::future::ready(Some(events))
        })
        .flat_map(stream::iter)
}
