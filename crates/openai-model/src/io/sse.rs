use super::{ByteSource, SourceError};

#[derive(Debug, PartialEq, Eq)]
pub enum SseError {
    Source(SourceError),
    InvalidPayload,
}

/// Decodes server-sent events from a byte source.
///
/// Only the subset the chat-completions endpoint emits is handled:
/// `data:` fields separated by blank lines, plus comment lines that
/// are skipped. Events may be split across chunks at any byte.
pub struct Sse {
    buf: String,
    // Bytes of an incomplete UTF-8 character at the chunk boundary.
    pending: Vec<u8>,
    source: ByteSource,
}

impl Sse {
    #[inline]
    pub fn new(source: ByteSource) -> Self {
        Self {
            buf: String::new(),
            pending: Vec::new(),
            source,
        }
    }

    pub async fn next_event(&mut self) -> Result<Option<String>, SseError> {
        loop {
            if let Some(event) = self.try_parse_event()? {
                return Ok(Some(event));
            }

            // Not enough buffered data for a full event, pull more.
            let Some(bytes) =
                self.source.next_chunk().await.map_err(SseError::Source)?
            else {
                return Ok(None);
            };
            // A chunk may end in the middle of a multi-byte character,
            // so decode only up to the last complete one and keep the
            // rest for the next chunk.
            self.pending.extend_from_slice(&bytes);
            let text = take_valid_prefix(&mut self.pending)?;
            self.buf.push_str(&text);
        }
    }

    fn try_parse_event(&mut self) -> Result<Option<String>, SseError> {
        loop {
            // An event ends with a blank line. Normalizing CRLF is not
            // needed for the providers we talk to.
            let Some(end_idx) = self.buf.find("\n\n") else {
                return Ok(None);
            };
            let field = self.buf[..end_idx].to_owned();
            self.buf.drain(..end_idx + 2);

            // Comments keep the connection alive, skip them.
            if field.starts_with(':') {
                continue;
            }

            let Some(data) = field.strip_prefix("data:") else {
                return Err(SseError::InvalidPayload);
            };
            return Ok(Some(data.strip_prefix(' ').unwrap_or(data).to_owned()));
        }
    }
}

/// Takes the longest valid UTF-8 prefix out of `pending`, leaving an
/// incomplete trailing character (if any) behind. Bytes that can never
/// become valid UTF-8 are an error.
fn take_valid_prefix(pending: &mut Vec<u8>) -> Result<String, SseError> {
    match String::from_utf8(std::mem::take(pending)) {
        Ok(text) => Ok(text),
        Err(err) => {
            let utf8_err = err.utf8_error();
            if utf8_err.error_len().is_some() {
                return Err(SseError::InvalidPayload);
            }
            let mut bytes = err.into_bytes();
            *pending = bytes.split_off(utf8_err.valid_up_to());
            String::from_utf8(bytes).map_err(|_| SseError::InvalidPayload)
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn sse_from(chunks: &[&'static [u8]]) -> Sse {
        Sse::new(ByteSource::from_chunks(
            chunks.iter().map(|c| Bytes::from_static(c)),
        ))
    }

    #[tokio::test]
    async fn test_whole_events() {
        let mut sse = sse_from(&[b"data: hello\n\n", b"data: bye\n\n"]);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "hello");
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "bye");
        assert_eq!(sse.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_split_mid_event() {
        let mut sse = sse_from(&[b"data:", b" hel", b"lo\n", b"\n"]);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "hello");
        assert_eq!(sse.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_split_mid_character() {
        // "é" is 0xC3 0xA9; the chunk boundary falls between the two
        // bytes.
        let mut sse = sse_from(&[b"data: h\xc3", b"\xa9llo\n\n"]);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "héllo");
        assert_eq!(sse.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_invalid_bytes_are_an_error() {
        let mut sse = sse_from(&[b"data: \xff\n\n"]);
        assert_eq!(
            sse.next_event().await.unwrap_err(),
            SseError::InvalidPayload
        );
    }

    #[tokio::test]
    async fn test_comments_are_skipped() {
        let mut sse = sse_from(&[b": keep-alive\n\ndata: hello\n\n"]);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_invalid_field() {
        let mut sse = sse_from(&[b"event: foo\n\n"]);
        assert_eq!(
            sse.next_event().await.unwrap_err(),
            SseError::InvalidPayload
        );

        // An incomplete trailing event is silently discarded.
        let mut sse = sse_from(&[b"data: hello\n"]);
        assert_eq!(sse.next_event().await.unwrap(), None);
    }
}
