use crate::api::client::MockStreamProducer;
use crate::api::stream::ByteStream;
use crate::error::TransportError;
use bytes::Bytes;
use futures::{stream, StreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One scripted piece of a mock response body.
#[derive(Clone)]
pub enum MockChunk {
    Data(String),
    /// The connection drops at this point.
    Reset,
    /// The body stays open from here on without sending anything.
    Stall,
}

impl From<String> for MockChunk {
    fn from(value: String) -> Self {
        MockChunk::Data(value)
    }
}

impl From<&str> for MockChunk {
    fn from(value: &str) -> Self {
        MockChunk::Data(value.to_string())
    }
}

/// Replays scripted bodies, one per request. Chunks are delivered exactly as
/// given, with no framing added, so tests control every split point.
#[derive(Clone)]
pub struct MockChatClient {
    responses: Arc<Mutex<Vec<Vec<MockChunk>>>>,
    requests: Arc<Mutex<Vec<String>>>,
    open_bodies: Arc<AtomicUsize>,
    peak_open_bodies: Arc<AtomicUsize>,
}

/// Held by a mock body until it is dropped.
struct OpenBody(Arc<AtomicUsize>);

impl Drop for OpenBody {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockChatClient {
    pub fn new<C: Into<MockChunk>>(responses: Vec<Vec<C>>) -> Self {
        let responses = responses
            .into_iter()
            .map(|chunks| chunks.into_iter().map(Into::into).collect())
            .collect();
        Self {
            responses: Arc::new(Mutex::new(responses)),
            requests: Arc::new(Mutex::new(Vec::new())),
            open_bodies: Arc::new(AtomicUsize::new(0)),
            peak_open_bodies: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Bodies handed out and not yet dropped.
    pub fn open_bodies(&self) -> usize {
        self.open_bodies.load(Ordering::SeqCst)
    }

    /// Most bodies that were ever open at the same time.
    pub fn peak_open_bodies(&self) -> usize {
        self.peak_open_bodies.load(Ordering::SeqCst)
    }

    /// Messages received so far, in request order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl MockStreamProducer for MockChatClient {
    fn create_mock_stream(&self, message: &str) -> Result<ByteStream, TransportError> {
        self.requests.lock().unwrap().push(message.to_string());

        let mut responses_guard = self.responses.lock().unwrap();
        if responses_guard.is_empty() {
            return Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "MockChatClient: No more responses configured",
            )));
        }
        let chunks = responses_guard.remove(0);

        let mut items: Vec<Result<Bytes, TransportError>> = Vec::new();
        let mut stalls = false;
        for chunk in chunks {
            match chunk {
                MockChunk::Data(text) => items.push(Ok(Bytes::from(text))),
                MockChunk::Reset => items.push(Err(TransportError::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "MockChatClient: connection reset",
                )))),
                MockChunk::Stall => {
                    stalls = true;
                    break;
                }
            }
        }

        let open = self.open_bodies.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_open_bodies.fetch_max(open, Ordering::SeqCst);
        let guard = OpenBody(Arc::clone(&self.open_bodies));
        let body = stream::iter(items).map(move |item| {
            let _open = &guard;
            item
        });

        if stalls {
            Ok(Box::pin(body.chain(stream::pending())))
        } else {
            Ok(Box::pin(body))
        }
    }
}
