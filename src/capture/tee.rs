//! Request body tee.
//!
//! # Responsibilities
//! - Read the single-use request body and keep a copy for logging
//! - Hand the downstream handler a fresh body replaying the same bytes
//!
//! # Design Decisions
//! - No reliance on Content-Length; frames are pulled until end of stream
//! - At most `capture_limit` bytes (plus the frame that crossed it) are buffered.
//!   Longer bodies replay the buffered prefix followed by the unread remainder
//!   of the original stream
//! - A read error ends capture; the replay body then holds only what was read
//! - Trailers are not replayed

use axum::body::{Body, Bytes};
use axum::http::Request;
use bytes::BytesMut;
use futures_util::{stream, StreamExt};
use http_body_util::BodyExt;

/// How the tee finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeeOutcome {
    /// The whole body was read and buffered.
    Complete,
    /// The body was longer than the capture limit; only a prefix was buffered.
    Overflow,
    /// Reading failed part way; the captured bytes are all the handler will see.
    Partial,
}

/// Logged copy of a request body.
#[derive(Debug, Clone)]
pub struct CapturedRequestBody {
    pub bytes: Bytes,
    pub outcome: TeeOutcome,
}

impl CapturedRequestBody {
    pub fn empty() -> Self {
        Self {
            bytes: Bytes::new(),
            outcome: TeeOutcome::Complete,
        }
    }

    /// Whether the original body continued past the captured bytes.
    pub fn is_truncated(&self) -> bool {
        self.outcome == TeeOutcome::Overflow
    }
}

/// Result of teeing a body: the logged copy and the replacement stream.
pub struct TeedBody {
    pub captured: CapturedRequestBody,
    pub replay: Body,
}

/// Buffer `body` for logging and build a body that replays it from offset zero.
pub async fn tee_body(body: Body, capture_limit: usize) -> TeedBody {
    let mut buf = BytesMut::new();
    tee_body_into(body, capture_limit, &mut buf).await
}

/// Like [`tee_body`], but reads into a caller-owned buffer.
///
/// If the returned future is dropped mid-read, `buf` holds every byte read
/// so far. On return the bytes have moved into the result and `buf` is empty.
pub async fn tee_body_into(mut body: Body, capture_limit: usize, buf: &mut BytesMut) -> TeedBody {
    loop {
        let frame = body.frame().await;
        match frame {
            None => {
                let bytes = buf.split().freeze();
                return TeedBody {
                    captured: CapturedRequestBody {
                        bytes: bytes.clone(),
                        outcome: TeeOutcome::Complete,
                    },
                    replay: Body::from(bytes),
                };
            }
            Some(Ok(frame)) => {
                let Ok(data) = frame.into_data() else {
                    continue;
                };
                buf.extend_from_slice(&data);

                if buf.len() > capture_limit {
                    let prefix = buf.split().freeze();
                    let head = stream::once({
                        let prefix = prefix.clone();
                        async move { Ok::<Bytes, axum::Error>(prefix) }
                    });
                    let replay = Body::from_stream(head.chain(body.into_data_stream()));
                    return TeedBody {
                        captured: CapturedRequestBody {
                            bytes: prefix,
                            outcome: TeeOutcome::Overflow,
                        },
                        replay,
                    };
                }
            }
            Some(Err(err)) => {
                tracing::warn!(
                    error = %err,
                    bytes_read = buf.len(),
                    "Request body read failed, replaying partial body"
                );
                let bytes = buf.split().freeze();
                return TeedBody {
                    captured: CapturedRequestBody {
                        bytes: bytes.clone(),
                        outcome: TeeOutcome::Partial,
                    },
                    replay: Body::from(bytes),
                };
            }
        }
    }
}

/// Tee the body of `req` in place. Returns the rebuilt request and the logged copy.
pub async fn tee_request(req: Request<Body>, capture_limit: usize) -> (Request<Body>, CapturedRequestBody) {
    let (parts, body) = req.into_parts();
    let teed = tee_body(body, capture_limit).await;
    (Request::from_parts(parts, teed.replay), teed.captured)
}
