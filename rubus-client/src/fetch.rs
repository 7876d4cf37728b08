//! The fetch controller (§4.5): owns one open session to the server and
//! serializes outstanding requests, at most one in flight per session.

use std::time::Duration;

use rubus_wire::frame::{read_response, write_request};
use rubus_wire::{BinaryConverter, FetchedPieces, MediaId, RequestHeader, ResponseType};
use tokio::io::BufReader;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use crate::error::{FetchingException, RubusException};

/// Either protocol-level failure the controller can surface (§4.5, §7).
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error(transparent)]
    Rubus(#[from] RubusException),
    #[error(transparent)]
    Fetching(#[from] FetchingException),
}

/// Default read timeout, applied per request (§4.5, §9 Open Question
/// decisions: 10 seconds).
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Owns one `TcpStream` to the server. Requests serialize behind an async
/// mutex, matching "single-threaded per session: serializes outstanding
/// requests (at most one in flight)".
pub struct FetchController {
    stream: Mutex<BufReader<TcpStream>>,
    authentication_token: Option<String>,
    read_timeout: Duration,
}

impl FetchController {
    pub fn new(stream: TcpStream, authentication_token: Option<String>) -> Self {
        Self::with_timeout(stream, authentication_token, DEFAULT_READ_TIMEOUT)
    }

    pub fn with_timeout(
        stream: TcpStream,
        authentication_token: Option<String>,
        read_timeout: Duration,
    ) -> Self {
        Self {
            stream: Mutex::new(BufReader::new(stream)),
            authentication_token,
            read_timeout,
        }
    }

    pub async fn fetch(
        &self,
        id: MediaId,
        offset: u32,
        count: u32,
    ) -> Result<FetchedPieces, FetchError> {
        let header =
            RequestHeader::fetch(id, offset, count, self.authentication_token.clone());
        let mut stream = self.stream.lock().await;

        write_request(&mut *stream, &header)
            .await
            .map_err(|e| FetchingException(e.to_string()))?;

        let (response, body) = tokio::time::timeout(self.read_timeout, read_response(&mut *stream))
            .await
            .map_err(|_| FetchingException("read timed out".to_string()))?
            .map_err(|e| FetchingException(e.to_string()))?;

        if response.response_type != ResponseType::Ok {
            return Err(RubusException(response.response_type).into());
        }

        FetchedPieces::decode(&body).map_err(|e| FetchingException(e.to_string()).into())
    }
}
