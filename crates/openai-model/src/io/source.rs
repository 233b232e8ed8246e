#[cfg(test)]
use std::collections::VecDeque;

use bytes::Bytes;
use reqwest::Response;

#[derive(Debug, PartialEq, Eq)]
pub struct SourceError;

/// A pull-based source of raw byte chunks.
///
/// In production this wraps a streaming HTTP response; tests feed a
/// queue of preset chunks to exercise arbitrary split points.
pub enum ByteSource {
    Response(Response),
    #[cfg(test)]
    Preset(VecDeque<Bytes>),
}

impl ByteSource {
    pub fn from_response(response: Response) -> Self {
        ByteSource::Response(response)
    }

    #[cfg(test)]
    pub fn from_chunks<I: IntoIterator<Item = Bytes>>(chunks: I) -> Self {
        ByteSource::Preset(chunks.into_iter().collect())
    }

    #[inline]
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>, SourceError> {
        match self {
            ByteSource::Response(response) => {
                response.chunk().await.map_err(|_| SourceError)
            }
            #[cfg(test)]
            ByteSource::Preset(chunks) => Ok(chunks.pop_front()),
        }
    }
}
