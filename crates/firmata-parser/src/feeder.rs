use std::io::{ErrorKind, Read};

use bytes::BytesMut;
use tracing::{debug, warn};

use crate::error::{ParserError, Result};
use crate::parser::Parser;

/// Default number of bytes requested from the stream per read.
pub const DEFAULT_CHUNK_SIZE: usize = 256;

/// Configuration for stream feeders.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Maximum bytes read from the stream per call. Default: 256.
    pub chunk_size: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Feeds bytes from any `Read` stream into a [`Parser`].
///
/// Chunk boundaries are invisible to the parser: messages split across
/// reads are reassembled byte by byte.
pub struct ByteFeeder<T> {
    inner: T,
    buf: BytesMut,
    config: FeedConfig,
    fed: u64,
}

impl<T: Read> ByteFeeder<T> {
    /// Create a feeder with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FeedConfig::default())
    }

    /// Create a feeder with explicit configuration.
    pub fn with_config(inner: T, config: FeedConfig) -> Self {
        let chunk_size = config.chunk_size.max(1);
        Self {
            inner,
            buf: BytesMut::zeroed(chunk_size),
            config,
            fed: 0,
        }
    }

    /// Read one chunk (blocking) and feed it.
    ///
    /// Returns the number of bytes fed, or
    /// `Err(ParserError::ConnectionClosed)` at end of stream.
    pub fn feed_chunk(&mut self, parser: &mut Parser<'_>) -> Result<usize> {
        loop {
            let read = match self.inner.read(&mut self.buf[..]) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(ParserError::Io(err)),
            };

            if read == 0 {
                if parser.is_parsing_message() {
                    warn!(state = ?parser.state(), "stream ended mid-message");
                }
                return Err(ParserError::ConnectionClosed);
            }

            parser.feed_all(&self.buf[..read]);
            self.fed += read as u64;
            return Ok(read);
        }
    }

    /// Feed until end of stream. Returns the total bytes fed by this call.
    pub fn feed_to_end(&mut self, parser: &mut Parser<'_>) -> Result<u64> {
        let start = self.fed;
        loop {
            match self.feed_chunk(parser) {
                Ok(_) => {}
                Err(ParserError::ConnectionClosed) => {
                    debug!(bytes = self.fed - start, "stream drained");
                    return Ok(self.fed - start);
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Total bytes fed since construction.
    pub fn bytes_fed(&self) -> u64 {
        self.fed
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the feeder and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current feeder configuration.
    pub fn config(&self) -> &FeedConfig {
        &self.config
    }
}

#[cfg(feature = "async")]
pub use self::nonblocking::AsyncByteFeeder;

#[cfg(feature = "async")]
mod nonblocking {
    use bytes::BytesMut;
    use tokio::io::{AsyncRead, AsyncReadExt};
    use tracing::{debug, warn};

    use super::FeedConfig;
    use crate::error::{ParserError, Result};
    use crate::parser::Parser;

    /// Feeds bytes from a `tokio` `AsyncRead` into a [`Parser`].
    ///
    /// Only the read awaits; each chunk is fed synchronously.
    pub struct AsyncByteFeeder<T> {
        inner: T,
        buf: BytesMut,
        config: FeedConfig,
        fed: u64,
    }

    impl<T: AsyncRead + Unpin> AsyncByteFeeder<T> {
        pub fn new(inner: T) -> Self {
            Self::with_config(inner, FeedConfig::default())
        }

        pub fn with_config(inner: T, config: FeedConfig) -> Self {
            let chunk_size = config.chunk_size.max(1);
            Self {
                inner,
                buf: BytesMut::zeroed(chunk_size),
                config,
                fed: 0,
            }
        }

        /// Read one chunk and feed it. `Err(ParserError::ConnectionClosed)`
        /// at end of stream.
        pub async fn feed_chunk(&mut self, parser: &mut Parser<'_>) -> Result<usize> {
            let read = self.inner.read(&mut self.buf[..]).await?;
            if read == 0 {
                if parser.is_parsing_message() {
                    warn!(state = ?parser.state(), "stream ended mid-message");
                }
                return Err(ParserError::ConnectionClosed);
            }

            parser.feed_all(&self.buf[..read]);
            self.fed += read as u64;
            Ok(read)
        }

        /// Feed until end of stream. Returns the total bytes fed by this call.
        pub async fn feed_to_end(&mut self, parser: &mut Parser<'_>) -> Result<u64> {
            let start = self.fed;
            loop {
                match self.feed_chunk(parser).await {
                    Ok(_) => {}
                    Err(ParserError::ConnectionClosed) => {
                        debug!(bytes = self.fed - start, "stream drained");
                        return Ok(self.fed - start);
                    }
                    Err(err) => return Err(err),
                }
            }
        }

        pub fn bytes_fed(&self) -> u64 {
            self.fed
        }

        pub fn into_inner(self) -> T {
            self.inner
        }

        pub fn config(&self) -> &FeedConfig {
            &self.config
        }
    }
}
