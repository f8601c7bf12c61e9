//! Reading streamed reply bodies.
//!
//! The chat endpoint answers with raw UTF-8 text delivered in arbitrary
//! chunks.  This module turns a byte stream into a stream of decoded text
//! fragments and folds such a stream into the complete reply while handing
//! every fragment to a callback.
//!
//! The byte stream is owned by the read loop and dropped as soon as the loop
//! ends, whether that is end of data, a transport error, an idle timeout or a
//! cancellation.

use std::pin::Pin;
use std::time::{Duration, Instant};

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::decoder::Utf8Decoder;
use crate::error::{Error, Result};
use crate::observability::{
    STREAM_BYTES, STREAM_CANCELLED, STREAM_CHUNKS, STREAM_DURATION, STREAM_ERRORS,
    STREAM_TIMEOUTS,
};

/// A boxed stream of raw body chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// A boxed stream of decoded reply fragments.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Limits applied while reading a reply body.
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// Longest wait for the next chunk; `None` waits forever.
    pub idle_timeout: Option<Duration>,
    /// Token that stops the read loop when cancelled.
    pub cancel: Option<CancellationToken>,
}

impl ReadOptions {
    /// Sets the idle timeout.
    pub fn with_idle_timeout(mut self, idle_timeout: Option<Duration>) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Sets the cancellation token.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

struct ReadState {
    bytes: Option<ByteStream>,
    decoder: Utf8Decoder,
    options: ReadOptions,
    started: Instant,
}

impl ReadState {
    /// Drops the byte stream and records how long it was open.
    fn release(&mut self) {
        if self.bytes.take().is_some() {
            STREAM_DURATION.add(self.started.elapsed().as_secs_f64());
        }
    }
}

/// Decode a byte stream into a stream of text fragments.
///
/// Empty fragments (for example a chunk holding only the first byte of a
/// multi-byte character) are not yielded.  After the first error the stream
/// ends.
pub fn decode_stream(bytes: ByteStream, options: ReadOptions) -> TextStream {
    let state = ReadState {
        bytes: Some(bytes),
        decoder: Utf8Decoder::new(),
        options,
        started: Instant::now(),
    };

    Box::pin(stream::unfold(state, |mut state| async move {
        loop {
            let bytes = state.bytes.as_mut()?;
            match next_chunk(bytes, &state.options).await {
                Some(Ok(chunk)) => {
                    STREAM_BYTES.count(chunk.len() as u64);
                    let text = state.decoder.decode(&chunk);
                    if text.is_empty() {
                        continue;
                    }
                    STREAM_CHUNKS.click();
                    return Some((Ok(text), state));
                }
                Some(Err(err)) => {
                    if err.is_cancelled() {
                        STREAM_CANCELLED.click();
                    } else if err.is_timeout() {
                        STREAM_TIMEOUTS.click();
                    } else {
                        STREAM_ERRORS.click();
                    }
                    state.release();
                    return Some((Err(err), state));
                }
                None => {
                    state.release();
                    let tail = state.decoder.finish();
                    if tail.is_empty() {
                        return None;
                    }
                    return Some((Ok(tail), state));
                }
            }
        }
    }))
}

/// Wait for the next chunk, honouring the idle timeout and cancellation.
async fn next_chunk(bytes: &mut ByteStream, options: &ReadOptions) -> Option<Result<Bytes>> {
    let next = async {
        match options.idle_timeout {
            Some(limit) => match tokio::time::timeout(limit, bytes.next()).await {
                Ok(item) => item,
                Err(_) => Some(Err(Error::timeout(
                    "no data received from chat endpoint",
                    Some(limit.as_secs_f64()),
                ))),
            },
            None => bytes.next().await,
        }
    };

    match &options.cancel {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => Some(Err(Error::cancelled("reply stream cancelled"))),
            item = next => item,
        },
        None => next.await,
    }
}

/// Drain a fragment stream into the full reply.
///
/// `on_chunk` sees every fragment in arrival order before it is appended to
/// the reply.  On error the fragments already delivered stay delivered; the
/// partial reply is discarded.
pub async fn collect_reply<S, F>(mut fragments: S, mut on_chunk: F) -> Result<String>
where
    S: Stream<Item = Result<String>> + Unpin,
    F: FnMut(&str),
{
    let mut reply = String::new();
    while let Some(fragment) = fragments.next().await {
        let fragment = fragment?;
        on_chunk(&fragment);
        reply.push_str(&fragment);
    }
    Ok(reply)
}

/// Decode `bytes` and collect the reply in one step.
///
/// # Examples
///
/// ```
/// # tokio_test::block_on(async {
/// use bytes::Bytes;
/// use futures::stream;
/// use folio::stream::{ByteStream, ReadOptions, read_reply};
///
/// // "¡Hola!" with the two-byte "¡" split across chunks.
/// let body: ByteStream = Box::pin(stream::iter(vec![
///     Ok::<_, folio::Error>(Bytes::from_static(b"\xc2")),
///     Ok(Bytes::from_static(b"\xa1Hola!")),
/// ]));
/// let mut seen = Vec::new();
/// let reply = read_reply(body, ReadOptions::default(), |chunk| seen.push(chunk.to_string()))
///     .await
///     .unwrap();
/// assert_eq!(reply, "¡Hola!");
/// assert_eq!(seen, vec!["¡Hola!"]);
/// # });
/// ```
pub async fn read_reply<F>(bytes: ByteStream, options: ReadOptions, on_chunk: F) -> Result<String>
where
    F: FnMut(&str),
{
    collect_reply(decode_stream(bytes, options), on_chunk).await
}
