//! Incremental decoders for streamed completions.
//!
//! Both wire formats are line oriented:
//! - OpenAI / Azure OpenAI: Server-Sent Events, `data: {json}` lines and a
//!   final `data: [DONE]`.
//! - Ollama: newline-delimited JSON objects, the last one has `"done": true`.
//!
//! Network chunks do not respect line (or UTF-8) boundaries, so bytes are
//! buffered until a full line is available.

use std::{collections::VecDeque, pin::Pin};

use bytes::Bytes;
use futures::{Stream, StreamExt, stream};
use serde::Deserialize;

use crate::{
    completion::TextStream,
    config::llm_provider::LlmProvider,
    error_handler::{AiLlmError, ProviderError, ProviderErrorKind},
};

/// One decoded line.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct Frame {
    pub text: Option<String>,
    pub done: bool,
}

#[derive(Debug, Default)]
struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            lines.push(
                String::from_utf8_lossy(&line[..pos])
                    .trim_end_matches('\r')
                    .to_string(),
            );
        }
        lines
    }

    /// Remaining bytes once the body ended without a trailing newline.
    fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buf);
        let line = String::from_utf8_lossy(&rest).trim_end_matches('\r').to_string();
        (!line.trim().is_empty()).then_some(line)
    }
}

struct DecodeState<S, F> {
    body: Pin<Box<S>>,
    lines: LineBuffer,
    pending: VecDeque<Result<String, AiLlmError>>,
    parse: F,
    finished: bool,
}

impl<S, F> DecodeState<S, F>
where
    F: FnMut(&str) -> Result<Frame, AiLlmError>,
{
    fn feed(&mut self, lines: Vec<String>) {
        for line in lines {
            if self.finished {
                break;
            }
            match (self.parse)(&line) {
                Ok(frame) => {
                    if let Some(text) = frame.text {
                        if !text.is_empty() {
                            self.pending.push_back(Ok(text));
                        }
                    }
                    if frame.done {
                        self.finished = true;
                    }
                }
                Err(e) => {
                    self.pending.push_back(Err(e));
                    self.finished = true;
                }
            }
        }
    }
}

/// Turns a byte stream into a [`TextStream`] using a per-line parser.
///
/// Text chunks keep their arrival order; the first error ends the stream.
pub(crate) fn decode_lines<S, E, F>(body: S, parse: F) -> TextStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<AiLlmError> + Send + 'static,
    F: FnMut(&str) -> Result<Frame, AiLlmError> + Send + 'static,
{
    let state = DecodeState {
        body: Box::pin(body),
        lines: LineBuffer::default(),
        pending: VecDeque::new(),
        parse,
        finished: false,
    };

    stream::unfold(state, |mut st| async move {
        loop {
            if let Some(item) = st.pending.pop_front() {
                if item.is_err() {
                    st.pending.clear();
                    st.finished = true;
                }
                return Some((item, st));
            }
            if st.finished {
                return None;
            }
            match st.body.next().await {
                Some(Ok(bytes)) => {
                    let lines = st.lines.push(&bytes);
                    st.feed(lines);
                }
                Some(Err(e)) => {
                    st.finished = true;
                    return Some((Err(e.into()), st));
                }
                None => {
                    let rest = st.lines.finish();
                    st.feed(rest.into_iter().collect());
                    st.finished = true;
                }
            }
        }
    })
    .boxed()
}

/* ==========================
OpenAI / Azure SSE
========================== */

#[derive(Debug, Deserialize)]
struct SseChunk {
    #[serde(default)]
    choices: Vec<SseChoice>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct SseChoice {
    #[serde(default)]
    delta: Option<SseDelta>,
}

#[derive(Debug, Deserialize)]
struct SseDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Parses one SSE line of a `/chat/completions` stream.
///
/// Comments, `event:`/`id:` fields and blank separators are skipped. Azure
/// sends a first chunk with empty `choices` (content filter results), which
/// yields no text.
pub(crate) fn openai_sse_frame(provider: LlmProvider, line: &str) -> Result<Frame, AiLlmError> {
    let Some(data) = line.strip_prefix("data:") else {
        return Ok(Frame::default());
    };
    let data = data.trim();
    if data.is_empty() {
        return Ok(Frame::default());
    }
    if data == "[DONE]" {
        return Ok(Frame {
            text: None,
            done: true,
        });
    }

    let chunk: SseChunk = serde_json::from_str(data).map_err(|e| {
        ProviderError::new(
            provider,
            ProviderErrorKind::Decode(format!("stream chunk: {e}")),
        )
    })?;

    if let Some(err) = chunk.error {
        return Err(ProviderError::new(provider, ProviderErrorKind::Upstream(err.to_string())).into());
    }

    let text = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta)
        .and_then(|d| d.content);

    Ok(Frame { text, done: false })
}

/* ==========================
Ollama NDJSON
========================== */

#[derive(Debug, Deserialize)]
struct NdjsonChunk {
    #[serde(default)]
    message: Option<NdjsonMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NdjsonMessage {
    #[serde(default)]
    content: String,
}

/// Parses one line of an Ollama `/api/chat` stream.
pub(crate) fn ollama_ndjson_frame(line: &str) -> Result<Frame, AiLlmError> {
    if line.trim().is_empty() {
        return Ok(Frame::default());
    }
    let chunk: NdjsonChunk = serde_json::from_str(line).map_err(|e| {
        ProviderError::new(
            LlmProvider::Ollama,
            ProviderErrorKind::Decode(format!("stream chunk: {e}")),
        )
    })?;
    if let Some(err) = chunk.error {
        return Err(ProviderError::new(LlmProvider::Ollama, ProviderErrorKind::Upstream(err)).into());
    }
    Ok(Frame {
        text: chunk.message.map(|m| m.content),
        done: chunk.done,
    })
}

#[cfg(test)]
mod tests {
    use futures::TryStreamExt;

    use super::*;

    fn body(parts: &[&[u8]]) -> impl Stream<Item = Result<Bytes, AiLlmError>> + Send + 'static {
        let owned: Vec<Result<Bytes, AiLlmError>> = parts
            .iter()
            .map(|p| Ok(Bytes::copy_from_slice(p)))
            .collect();
        stream::iter(owned)
    }

    #[tokio::test]
    async fn sse_reassembles_lines_split_across_chunks() {
        let raw = "data: {\"choices\":[]}\n\n\
                   data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n\
                   data: {\"choices\":[{\"delta\":{\"content\":\"Gré\"}}]}\n\n\
                   : keep-alive\n\
                   data: {\"choices\":[{\"delta\":{\"content\":\"etings\"}}]}\n\n\
                   data: [DONE]\n\n\
                   data: {\"choices\":[{\"delta\":{\"content\":\"ignored\"}}]}\n\n";
        let bytes = raw.as_bytes();
        // Split inside the two-byte `é` and inside a JSON object.
        let cut_a = raw.find('é').unwrap() + 1;
        let cut_b = cut_a + 30;
        let parts = [&bytes[..cut_a], &bytes[cut_a..cut_b], &bytes[cut_b..]];

        let chunks: Vec<String> = decode_lines(body(&parts), |l| {
            openai_sse_frame(LlmProvider::AzureOpenAI, l)
        })
        .try_collect()
        .await
        .unwrap();

        assert_eq!(chunks, vec!["Gré".to_string(), "etings".to_string()]);
    }

    #[tokio::test]
    async fn sse_error_event_terminates_stream() {
        let raw = "data: {\"choices\":[{\"delta\":{\"content\":\"partial\"}}]}\n\
                   data: {\"error\":{\"message\":\"content filtered\"}}\n\
                   data: {\"choices\":[{\"delta\":{\"content\":\"never\"}}]}\n";
        let items: Vec<Result<String, AiLlmError>> =
            decode_lines(body(&[raw.as_bytes()]), |l| {
                openai_sse_frame(LlmProvider::OpenAI, l)
            })
            .collect()
            .await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "partial");
        assert!(items[1].is_err());
    }

    #[tokio::test]
    async fn ndjson_stops_on_done_and_flushes_tail() {
        let raw = "{\"message\":{\"role\":\"assistant\",\"content\":\"Hel\"},\"done\":false}\n\
                   {\"message\":{\"role\":\"assistant\",\"content\":\"lo\"},\"done\":false}\n\
                   {\"message\":{\"role\":\"assistant\",\"content\":\"\"},\"done\":true}";
        let chunks: Vec<String> = decode_lines(body(&[raw.as_bytes()]), ollama_ndjson_frame)
            .try_collect()
            .await
            .unwrap();
        assert_eq!(chunks.concat(), "Hello");
    }

    #[test]
    fn ndjson_error_line_is_upstream_error() {
        let err = ollama_ndjson_frame("{\"error\":\"model not found\"}").unwrap_err();
        assert!(err.to_string().contains("model not found"));
    }
}
