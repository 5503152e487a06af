use futures::stream::{self, StreamExt};
use page_mirror::{ChunkStream, Response, Transport, TransportError};
use std::cell::RefCell;
use std::collections::HashMap;

enum Reply {
    Body(Vec<u8>),
    /// Sends these bytes, then the connection drops.
    Broken(Vec<u8>),
    Unreachable,
}

/// In-memory transport: known URLs answer 200, everything else 500/404.
#[derive(Default)]
pub struct FakeTransport {
    replies: HashMap<String, Reply>,
    requests: RefCell<Vec<String>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, body: impl AsRef<[u8]>) -> Self {
        self.replies.insert(url.to_string(), Reply::Body(body.as_ref().to_vec()));
        self
    }

    pub fn broken_after(mut self, url: &str, partial: impl AsRef<[u8]>) -> Self {
        self.replies.insert(url.to_string(), Reply::Broken(partial.as_ref().to_vec()));
        self
    }

    pub fn unreachable(mut self, url: &str) -> Self {
        self.replies.insert(url.to_string(), Reply::Unreachable);
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

fn connection_reset() -> TransportError {
    TransportError::Stream("connection reset".to_string())
}

impl Transport for FakeTransport {
    async fn get(&self, url: &str) -> Result<Response, TransportError> {
        self.requests.borrow_mut().push(url.to_string());
        match self.replies.get(url) {
            Some(Reply::Body(body)) => Ok(Response {
                success: true,
                status: 200,
                body: body.clone(),
            }),
            Some(Reply::Broken(_)) | Some(Reply::Unreachable) => Err(connection_reset()),
            None => Ok(Response {
                success: false,
                status: 500,
                body: Vec::new(),
            }),
        }
    }

    async fn get_streaming(&self, url: &str) -> Result<ChunkStream, TransportError> {
        self.requests.borrow_mut().push(url.to_string());

        // Deliver in small pieces so chunked writes are exercised.
        let chunks: Vec<Result<Vec<u8>, TransportError>> = match self.replies.get(url) {
            Some(Reply::Body(body)) => body.chunks(3).map(|chunk| Ok(chunk.to_vec())).collect(),
            Some(Reply::Broken(partial)) => partial
                .chunks(3)
                .map(|chunk| Ok(chunk.to_vec()))
                .chain(std::iter::once(Err(connection_reset())))
                .collect(),
            Some(Reply::Unreachable) => return Err(connection_reset()),
            None => {
                return Err(TransportError::Status {
                    url: url.to_string(),
                    status: 404,
                })
            }
        };
        Ok(stream::iter(chunks).boxed())
    }
}
