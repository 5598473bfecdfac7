use async_trait::async_trait;
use bytes::Bytes;
use tweetstream_types::StreamError;

/// A readable, already-open response body.
///
/// Implementations yield body chunks in order. Chunk boundaries carry no
/// meaning; records may be split across any number of chunks.
#[async_trait]
pub trait ByteSource: Send {
    /// Return the next chunk, `Ok(None)` at clean end of body, or a transport error.
    ///
    /// # Errors
    /// Returns `StreamError::Transport` when the underlying read fails.
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, StreamError>;
}

#[async_trait]
impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, StreamError> {
        (**self).next_chunk().await
    }
}
