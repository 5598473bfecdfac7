//! tweetstream-http
//!
//! Adapts an already-sent `reqwest::Response` into a `ByteSource` so it can be
//! handed to `tweetstream::Streamer::open`. Building the request (URL, auth,
//! filter parameters) stays with the caller.
#![warn(missing_docs)]

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{Response, StatusCode};
use tweetstream_core::{ByteSource, StreamError};

/// Streaming response body backed by `reqwest`.
///
/// Dropping the body drops the response, which releases the connection.
#[derive(Debug)]
pub struct HttpBody {
    status: StatusCode,
    headers: HeaderMap,
    resp: Response,
}

impl HttpBody {
    /// Wrap a response after checking its status.
    ///
    /// # Errors
    /// Returns `StreamError::Status` for a non-2xx status. The response body is
    /// read into the error message, so rate-limit and auth explanations from the
    /// server are not lost.
    pub async fn from_response(resp: Response) -> Result<Self, StreamError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            #[cfg(feature = "tracing")]
            tracing::warn!(status = status.as_u16(), "stream request rejected");
            let message = if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("unexpected status").to_string()
            } else {
                body
            };
            return Err(StreamError::status(status.as_u16(), message));
        }
        Ok(Self {
            status,
            headers: resp.headers().clone(),
            resp,
        })
    }

    /// Status of the response.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers, e.g. for rate-limit inspection.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

#[async_trait]
impl ByteSource for HttpBody {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, StreamError> {
        self.resp.chunk().await.map_err(|e| {
            #[cfg(feature = "tracing")]
            tracing::debug!(error = %e, "body read failed");
            StreamError::transport(e)
        })
    }
}
