//! Streaming line reassembly.
//!
//! The completion service streams text in fragments with arbitrary
//! boundaries. [`Reassembler`] buffers them and releases a candidate each
//! time a newline completes a line; [`candidate_stream`] wraps a provider
//! chunk stream so candidates can be consumed as they arrive.
//!
//! Whatever is still buffered is flushed as a final candidate only when the
//! response completes explicitly. A dropped stream or a transport error
//! discards it.

use crate::cleanup::LineCleanup;
use autoline_core::error::ProviderError;
use autoline_core::provider::StreamChunk;
use futures::stream::{self, Stream, StreamExt};
use std::collections::VecDeque;
use tracing::{debug, trace};

#[derive(Debug, Default)]
pub struct Reassembler {
    buffer: String,
    cleanup: LineCleanup,
}

impl Reassembler {
    pub fn new(cleanup: LineCleanup) -> Self {
        Self {
            buffer: String::new(),
            cleanup,
        }
    }

    /// Append a fragment; returns every line it completed, cleaned.
    pub fn push(&mut self, fragment: &str) -> Vec<String> {
        self.buffer.push_str(fragment);

        let mut lines = Vec::new();
        while let Some(newline) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=newline).collect();
            if let Some(candidate) = self.emit(&line[..newline]) {
                lines.push(candidate);
            }
        }
        lines
    }

    /// Release the buffered remainder as a final candidate.
    pub fn flush(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        self.emit(&rest)
    }

    pub fn finish(mut self) -> Option<String> {
        self.flush()
    }

    /// Drop the buffered remainder without emitting it.
    pub fn discard(&mut self) {
        if !self.buffer.is_empty() {
            debug!(bytes = self.buffer.len(), "Discarding partial line");
        }
        self.buffer.clear();
    }

    pub fn pending(&self) -> &str {
        &self.buffer
    }

    fn emit(&self, raw: &str) -> Option<String> {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        if raw.trim().is_empty() {
            return None;
        }

        let cleaned = self.cleanup.apply(raw);
        trace!(raw, cleaned = %cleaned, "Response line");
        if cleaned.trim().is_empty() {
            None
        } else {
            Some(cleaned)
        }
    }
}

struct StreamState<S> {
    chunks: S,
    reassembler: Reassembler,
    ready: VecDeque<String>,
    ended: bool,
}

/// Turn a provider chunk stream into a stream of candidates.
///
/// - A `done` chunk flushes the buffer and ends the stream; later chunks are
///   ignored.
/// - An `Err` is yielded once, the buffer is discarded and the stream ends.
/// - A source that ends without `done` yields
///   [`ProviderError::StreamInterrupted`].
pub fn candidate_stream<S>(
    chunks: S,
    cleanup: LineCleanup,
) -> impl Stream<Item = Result<String, ProviderError>>
where
    S: Stream<Item = Result<StreamChunk, ProviderError>> + Unpin,
{
    let state = StreamState {
        chunks,
        reassembler: Reassembler::new(cleanup),
        ready: VecDeque::new(),
        ended: false,
    };

    stream::unfold(state, |mut st| async move {
        loop {
            if let Some(line) = st.ready.pop_front() {
                return Some((Ok(line), st));
            }
            if st.ended {
                return None;
            }

            match st.chunks.next().await {
                Some(Ok(chunk)) => {
                    if let Some(text) = chunk.content.as_deref() {
                        st.ready.extend(st.reassembler.push(text));
                    }
                    if chunk.done {
                        st.ready.extend(st.reassembler.flush());
                        st.ended = true;
                    }
                }
                Some(Err(e)) => {
                    st.reassembler.discard();
                    st.ended = true;
                    return Some((Err(e), st));
                }
                None => {
                    st.reassembler.discard();
                    st.ended = true;
                    return Some((
                        Err(ProviderError::StreamInterrupted(
                            "response ended before completion".into(),
                        )),
                        st,
                    ));
                }
            }
        }
    })
}
