use super::stream::ByteStream;
use crate::config::Config;
use crate::error::TransportError;
use crate::logging::emit_debug_payload;
use crate::types::ChatRequest;
use anyhow::Result;
use futures::StreamExt;
use reqwest::Url;
use std::net::IpAddr;
#[cfg(test)]
use std::sync::Arc;

#[cfg(test)]
pub trait MockStreamProducer: Send + Sync {
    fn create_mock_stream(&self, message: &str) -> Result<ByteStream, TransportError>;
}

#[derive(Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    stream_url: String,
    debug_payload: bool,
    #[cfg(test)]
    mock_stream_producer: Option<Arc<dyn MockStreamProducer>>,
}

impl ChatClient {
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            http: reqwest::Client::new(),
            stream_url: config.stream_url(),
            debug_payload: config.debug_payload,
            #[cfg(test)]
            mock_stream_producer: None,
        })
    }

    #[cfg(test)]
    pub fn new_mock(mock_producer: Arc<dyn MockStreamProducer>) -> Self {
        Self {
            http: reqwest::Client::new(),
            stream_url: "http://localhost:8000/chat/stream".to_string(),
            debug_payload: false,
            mock_stream_producer: Some(mock_producer),
        }
    }

    pub fn stream_url(&self) -> &str {
        &self.stream_url
    }

    /// POST the message and hand back the raw response body.
    ///
    /// A non-2xx status is an error here; failures while reading the body
    /// surface as `TransportError::Body` items of the returned stream.
    pub async fn open_stream(&self, message: &str) -> Result<ByteStream, TransportError> {
        #[cfg(test)]
        {
            if let Some(producer) = &self.mock_stream_producer {
                return producer.create_mock_stream(message);
            }
        }

        let request_url = self.stream_url.clone();
        let payload = ChatRequest { message };
        if self.debug_payload {
            match serde_json::to_value(&payload) {
                Ok(value) => emit_debug_payload(&request_url, &value),
                Err(error) => tracing::debug!(%error, "cannot serialise request payload"),
            }
        }

        let response = self
            .http
            .post(&request_url)
            .header("content-type", "application/json")
            .header("accept", "text/event-stream")
            .json(&payload)
            .send()
            .await
            .map_err(|error| map_request_error(error, &request_url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: request_url,
                status,
            });
        }
        tracing::debug!(url = %request_url, %status, "chat stream opened");

        let stream = response
            .bytes_stream()
            .map(|item| item.map_err(|source| TransportError::Body { source }));
        Ok(Box::pin(stream))
    }
}

fn map_request_error(error: reqwest::Error, request_url: &str) -> TransportError {
    if error.is_connect() && is_loopback_url(request_url) {
        tracing::warn!(url = request_url, "local chat backend is not reachable; is it running?");
    }
    TransportError::Request {
        url: request_url.to_string(),
        source: error,
    }
}

fn is_loopback_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    let host = host.trim_start_matches('[').trim_end_matches(']');
    host.eq_ignore_ascii_case("localhost")
        || host
            .parse::<IpAddr>()
            .is_ok_and(|ip| ip.is_loopback() || ip.is_unspecified())
}
