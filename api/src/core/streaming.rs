//! Relays a completion [`TextStream`] as a chunked `text/plain` body.
//!
//! Chunks are forwarded as they arrive. An upstream error after the first
//! byte aborts the body (the connection ends without a terminating chunk).
//! A client that goes away drops the body, which drops the upstream response.

use std::{
    io,
    pin::Pin,
    task::{Context, Poll},
};

use ai_llm_service::TextStream;
use axum::{
    body::Body,
    http::{HeaderValue, header},
    response::Response,
};
use bytes::Bytes;
use futures::{Stream, StreamExt, ready};
use tracing::{debug, error};

pub const TEXT_PLAIN_UTF8: &str = "text/plain; charset=utf-8";

struct RelayStream {
    inner: TextStream,
    request_id: String,
    chunks: usize,
    finished: bool,
}

impl Stream for RelayStream {
    type Item = Result<Bytes, io::Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }
        loop {
            match ready!(self.inner.poll_next_unpin(cx)) {
                Some(Ok(text)) if text.is_empty() => continue,
                Some(Ok(text)) => {
                    self.chunks += 1;
                    return Poll::Ready(Some(Ok(Bytes::from(text))));
                }
                Some(Err(e)) => {
                    self.finished = true;
                    error!(request_id = %self.request_id, chunks = self.chunks, error = %e, "completion stream failed mid-response");
                    return Poll::Ready(Some(Err(io::Error::other(e.to_string()))));
                }
                None => {
                    self.finished = true;
                    debug!(request_id = %self.request_id, chunks = self.chunks, "completion stream finished");
                    return Poll::Ready(None);
                }
            }
        }
    }
}

impl Drop for RelayStream {
    fn drop(&mut self) {
        if !self.finished {
            debug!(request_id = %self.request_id, chunks = self.chunks, "client disconnected; upstream stream dropped");
        }
    }
}

/// 200 response streaming `stream` as UTF-8 text.
pub fn text_stream_response(stream: TextStream, request_id: &str) -> Response {
    let relay = RelayStream {
        inner: stream,
        request_id: request_id.to_string(),
        chunks: 0,
        finished: false,
    };
    let mut res = Response::new(Body::from_stream(relay));
    res.headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN_UTF8));
    res
}

#[cfg(test)]
mod tests {
    use ai_llm_service::AiLlmError;
    use futures::stream;
    use http_body_util::BodyExt;

    use super::*;

    #[tokio::test]
    async fn forwards_chunks_in_order_and_skips_empty_ones() {
        let chunks = vec![Ok("Hel".to_string()), Ok(String::new()), Ok("lo".to_string())];
        let res = text_stream_response(stream::iter(chunks).boxed(), "req-1");

        assert_eq!(res.headers()[header::CONTENT_TYPE], TEXT_PLAIN_UTF8);
        let body = res.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"Hello");
    }

    #[tokio::test]
    async fn upstream_error_aborts_the_body() {
        let chunks = vec![Ok("partial".to_string()), Err(AiLlmError::EmptyConversation)];
        let res = text_stream_response(stream::iter(chunks).boxed(), "req-2");

        assert!(res.into_body().collect().await.is_err());
    }
}
