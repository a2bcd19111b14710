use crate::error::TransportError;
use crate::logging::emit_record_parse_error;
use crate::types::{ChatEvent, WireRecord};
use bytes::Bytes;
use futures::{stream, Stream, StreamExt};
use std::collections::VecDeque;
use std::pin::Pin;

/// Every record line starts with this prefix, followed by one JSON object.
pub const RECORD_PREFIX: &str = "data: ";

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;
pub type EventStream = Pin<Box<dyn Stream<Item = Result<ChatEvent, TransportError>> + Send>>;

/// Turns arbitrarily split byte chunks into events.
///
/// Bytes are buffered raw and only decoded once a full line is available, so
/// the output does not depend on where the transport split the input.
#[derive(Default)]
pub struct RecordDecoder {
    buffer: Vec<u8>,
    /// Bytes of `buffer` already searched for a newline.
    scanned: usize,
}

impl RecordDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk; returns the events completed by it, in order.
    pub fn process(&mut self, chunk: &[u8]) -> Vec<ChatEvent> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();
        let mut start = 0;
        let mut search_from = self.scanned;

        while let Some(offset) = self.buffer[search_from..]
            .iter()
            .position(|byte| *byte == b'\n')
        {
            let end = search_from + offset;
            if let Some(payload) = record_payload(&self.buffer[start..end]) {
                match decode_payload(&payload) {
                    Ok(Some(event)) => events.push(event),
                    Ok(None) => tracing::debug!(data = %payload, "ignoring unknown record type"),
                    Err(error) => emit_record_parse_error(&payload, &error),
                }
            }
            start = end + 1;
            search_from = start;
        }

        if start > 0 {
            self.buffer.drain(..start);
        }
        self.scanned = self.buffer.len();

        events
    }

    /// End of data: decode a final unterminated record if it is complete,
    /// drop it otherwise. Leaves the decoder empty.
    pub fn finish(&mut self) -> Vec<ChatEvent> {
        let rest = std::mem::take(&mut self.buffer);
        self.scanned = 0;
        let Some(payload) = record_payload(&rest) else {
            return Vec::new();
        };
        match decode_payload(&payload) {
            Ok(event) => event.into_iter().collect(),
            Err(error) => {
                tracing::debug!(%error, data = %payload, "discarding incomplete trailing record");
                Vec::new()
            }
        }
    }

    /// Drop buffered bytes without decoding them.
    pub fn discard(&mut self) {
        self.buffer.clear();
        self.scanned = 0;
    }

    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }
}

fn record_payload(line: &[u8]) -> Option<String> {
    let line = String::from_utf8_lossy(line);
    let line = line.strip_suffix('\r').unwrap_or(&line);
    line.strip_prefix(RECORD_PREFIX).map(str::to_string)
}

fn decode_payload(payload: &str) -> Result<Option<ChatEvent>, serde_json::Error> {
    let record: WireRecord = serde_json::from_str(payload)?;
    Ok(record.into_event())
}

struct DecodeState {
    source: Option<ByteStream>,
    decoder: RecordDecoder,
    ready: VecDeque<ChatEvent>,
}

/// Lazily decode a byte stream into events.
///
/// The returned stream ends after the source ends (flushing a final
/// unterminated record) or right after yielding the first transport error.
pub fn decode_stream(source: ByteStream) -> EventStream {
    let state = DecodeState {
        source: Some(source),
        decoder: RecordDecoder::new(),
        ready: VecDeque::new(),
    };

    Box::pin(stream::unfold(state, |mut state| async move {
        loop {
            if let Some(event) = state.ready.pop_front() {
                return Some((Ok(event), state));
            }

            let Some(source) = state.source.as_mut() else {
                return None;
            };
            match source.next().await {
                Some(Ok(chunk)) => {
                    let events = state.decoder.process(&chunk);
                    state.ready.extend(events);
                }
                Some(Err(error)) => {
                    state.source = None;
                    state.decoder.discard();
                    return Some((Err(error), state));
                }
                None => {
                    state.source = None;
                    let events = state.decoder.finish();
                    state.ready.extend(events);
                }
            }
        }
    }))
}
