//! Response capture.
//!
//! `CaptureBody` wraps the real response body. Every frame is passed through
//! unmodified and in order; data frames are also copied into a
//! `ResponseCapture` that keeps at most `limit` bytes. Bytes past the limit
//! are still forwarded, only the copy is capped.
//!
//! When the stream ends, errors, or is dropped early, the finish callback
//! runs exactly once with the final `ResponseSnapshot`.

use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Bytes;
use axum::http::StatusCode;
use bytes::BytesMut;
use http_body::{Body as HttpBody, Frame, SizeHint};

/// How the response stream finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// Every frame was delivered.
    Complete,
    /// The inner body returned an error, which was passed on to the client.
    Error,
    /// The body was dropped before it finished (client went away).
    Aborted,
}

impl StreamEnd {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamEnd::Complete => "complete",
            StreamEnd::Error => "error",
            StreamEnd::Aborted => "aborted",
        }
    }
}

/// Bounded accumulator for response bytes.
#[derive(Debug)]
pub struct ResponseCapture {
    limit: usize,
    retained: BytesMut,
    bytes_written: u64,
}

impl ResponseCapture {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            retained: BytesMut::new(),
            bytes_written: 0,
        }
    }

    /// Account for one forwarded chunk.
    pub fn record(&mut self, chunk: &[u8]) {
        let room = self.limit.saturating_sub(self.retained.len());
        let keep = room.min(chunk.len());
        self.retained.extend_from_slice(&chunk[..keep]);
        self.bytes_written += chunk.len() as u64;
    }

    pub fn retained(&self) -> &[u8] {
        &self.retained
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn is_truncated(&self) -> bool {
        self.bytes_written > self.retained.len() as u64
    }

    fn take_snapshot(&mut self, status: StatusCode, end: StreamEnd) -> ResponseSnapshot {
        ResponseSnapshot {
            status,
            bytes_written: self.bytes_written,
            retained: std::mem::take(&mut self.retained).freeze(),
            end,
        }
    }
}

/// Final, read-only state of one response.
#[derive(Debug, Clone)]
pub struct ResponseSnapshot {
    pub status: StatusCode,
    /// Total bytes forwarded to the client.
    pub bytes_written: u64,
    /// Logged copy, capped at the capture limit.
    pub retained: Bytes,
    pub end: StreamEnd,
}

impl ResponseSnapshot {
    pub fn is_truncated(&self) -> bool {
        self.bytes_written > self.retained.len() as u64
    }
}

/// Callback receiving the snapshot once the response is finished.
pub type OnFinish = Box<dyn FnOnce(ResponseSnapshot) + Send + 'static>;

/// Response body wrapper that tees data frames into a [`ResponseCapture`].
pub struct CaptureBody<B: HttpBody> {
    inner: B,
    status: StatusCode,
    capture: ResponseCapture,
    on_finish: Option<OnFinish>,
}

impl<B: HttpBody> CaptureBody<B> {
    pub fn new(inner: B, status: StatusCode, limit: usize, on_finish: OnFinish) -> Self {
        Self {
            inner,
            status,
            capture: ResponseCapture::new(limit),
            on_finish: Some(on_finish),
        }
    }

    pub fn capture(&self) -> &ResponseCapture {
        &self.capture
    }

    fn finish(&mut self, end: StreamEnd) {
        if let Some(on_finish) = self.on_finish.take() {
            on_finish(self.capture.take_snapshot(self.status, end));
        }
    }
}

impl<B> HttpBody for CaptureBody<B>
where
    B: HttpBody<Data = Bytes> + Unpin,
{
    type Data = Bytes;
    type Error = B::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = &mut *self;
        match Pin::new(&mut this.inner).poll_frame(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Some(Ok(frame))) => {
                if let Some(data) = frame.data_ref() {
                    this.capture.record(data);
                }
                // hyper stops polling once the body reports its end
                if this.inner.is_end_stream() {
                    this.finish(StreamEnd::Complete);
                }
                Poll::Ready(Some(Ok(frame)))
            }
            Poll::Ready(Some(Err(err))) => {
                this.finish(StreamEnd::Error);
                Poll::Ready(Some(Err(err)))
            }
            Poll::Ready(None) => {
                this.finish(StreamEnd::Complete);
                Poll::Ready(None)
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl<B: HttpBody> Drop for CaptureBody<B> {
    fn drop(&mut self) {
        let end = if self.inner.is_end_stream() {
            StreamEnd::Complete
        } else {
            StreamEnd::Aborted
        };
        self.finish(end);
    }
}
