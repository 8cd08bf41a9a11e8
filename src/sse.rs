//! Server-Sent Events (SSE) decoding for chat completion streams.
//!
//! This module turns the line-oriented body of a streaming
//! `/chat/completions` response into [`StreamFragment`]s. Lines that are not
//! `data:` fields are ignored, `data:` payloads that do not parse as a
//! [`StreamChunk`] are skipped, and decoding ends at `data: [DONE]`, at the
//! first non-null finish reason, or when the transport runs dry.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::error::{Error, Result};
use crate::observability::{
    STREAM_BYTES, STREAM_ERRORS, STREAM_FRAGMENTS, STREAM_LINES, STREAM_SKIPPED_EVENTS,
};
use crate::render::Renderer;
use crate::types::{StreamChunk, StreamEnd, StreamFragment};

/// Classification of a single line of the event stream.
#[derive(Debug)]
enum SseLine {
    /// Not a `data:` field.
    Ignored,
    /// `data: [DONE]`.
    Done,
    /// A `data:` payload of the expected shape.
    Chunk(StreamChunk),
    /// A `data:` payload that is not a chunk.
    Malformed,
}

fn parse_line(line: &str) -> SseLine {
    let Some(data) = line.strip_prefix("data:") else {
        return SseLine::Ignored;
    };
    let data = data.trim_start();
    if data == "[DONE]" {
        return SseLine::Done;
    }
    match serde_json::from_str::<StreamChunk>(data) {
        Ok(chunk) => SseLine::Chunk(chunk),
        Err(_) => SseLine::Malformed,
    }
}

/// Incremental decoder over a buffered response body.
///
/// Each call to [`StreamDecoder::next_fragment`] reads only as many lines as
/// it needs to produce the next fragment. Once an end marker has been
/// returned the reader is never touched again, so whatever follows a
/// terminal line stays unread.
pub struct StreamDecoder<R> {
    reader: R,
    line: Vec<u8>,
    reply: String,
    pending_end: Option<StreamEnd>,
    ended: Option<StreamEnd>,
}

impl<R: AsyncBufRead + Unpin> StreamDecoder<R> {
    /// Creates a decoder over the given reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: Vec::new(),
            reply: String::new(),
            pending_end: None,
            ended: None,
        }
    }

    /// Decode the next fragment.
    ///
    /// Returns `Text` for every non-empty content delta of the first choice
    /// and `End` once the stream is over. A finish reason that arrives with
    /// text yields the text first and the end marker on the following call.
    ///
    /// # Errors
    ///
    /// Returns a streaming error if reading the underlying transport fails.
    /// The decoder should be dropped after an error.
    pub async fn next_fragment(&mut self) -> Result<StreamFragment> {
        if let Some(end) = &self.ended {
            return Ok(StreamFragment::End(end.clone()));
        }
        if let Some(end) = self.pending_end.take() {
            return Ok(self.finish(end));
        }

        loop {
            self.line.clear();
            let read = self
                .reader
                .read_until(b'\n', &mut self.line)
                .await
                .map_err(|e| {
                    STREAM_ERRORS.click();
                    Error::streaming(format!("error reading stream: {e}"), Some(Box::new(e)))
                })?;
            if read == 0 {
                return Ok(self.finish(StreamEnd::Eof));
            }
            STREAM_LINES.click();
            STREAM_BYTES.count(read as u64);

            let parsed = parse_line(String::from_utf8_lossy(&self.line).trim());
            let chunk = match parsed {
                SseLine::Ignored => continue,
                SseLine::Malformed => {
                    STREAM_SKIPPED_EVENTS.click();
                    continue;
                }
                SseLine::Done => return Ok(self.finish(StreamEnd::Done)),
                SseLine::Chunk(chunk) => chunk,
            };

            let Some(choice) = chunk.first_choice() else {
                continue;
            };
            let text = choice.text().to_owned();
            self.reply.push_str(&text);

            if let Some(reason) = choice.finish_reason.clone() {
                if text.is_empty() {
                    return Ok(self.finish(StreamEnd::Finished(reason)));
                }
                self.pending_end = Some(StreamEnd::Finished(reason));
            }
            if !text.is_empty() {
                STREAM_FRAGMENTS.click();
                return Ok(StreamFragment::Text(text));
            }
        }
    }

    /// The assistant text decoded so far.
    pub fn accumulated(&self) -> &str {
        &self.reply
    }

    /// Why the stream ended, if it has.
    pub fn end(&self) -> Option<&StreamEnd> {
        self.ended.as_ref()
    }

    /// Consume the decoder and return the assembled reply.
    pub fn into_reply(self) -> String {
        self.reply
    }

    fn finish(&mut self, end: StreamEnd) -> StreamFragment {
        self.ended = Some(end.clone());
        StreamFragment::End(end)
    }
}

/// Decode a whole response body, rendering each fragment as it arrives.
///
/// Returns the full assistant reply, which is empty when the server sent no
/// content.
///
/// # Errors
///
/// Returns a streaming error if the transport fails mid-stream; whatever
/// text was decoded before the failure is discarded.
pub async fn decode_stream<R>(reader: R, renderer: &mut dyn Renderer) -> Result<String>
where
    R: AsyncBufRead + Unpin,
{
    let mut decoder = StreamDecoder::new(reader);
    loop {
        match decoder.next_fragment().await? {
            StreamFragment::Text(text) => renderer.print_text(&text),
            StreamFragment::End(_) => return Ok(decoder.into_reply()),
        }
    }
}
