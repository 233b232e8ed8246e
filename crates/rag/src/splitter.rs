use std::collections::VecDeque;

const DEFAULT_CHUNK_SIZE: usize = 1000;
const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Separators tried in order, from the most to the least meaningful.
const SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

/// A contiguous piece of the source text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    /// The chunk text, with trailing whitespace removed.
    pub text: String,
    /// Byte offset of the chunk start in the source text.
    pub start_offset: usize,
}

/// Splits text into overlapping chunks along natural boundaries.
///
/// The text is first broken at paragraph breaks, then at line breaks,
/// then at spaces, until every piece fits the chunk size; adjacent
/// pieces are then merged back together greedily, carrying a tail of
/// the previous chunk into the next one as overlap.
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    /// Creates a splitter with the default chunk size and overlap.
    #[inline]
    pub fn new() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }

    /// Overrides the maximum chunk size, in bytes.
    #[inline]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Overrides how many bytes of a chunk are repeated at the start of
    /// the next one.
    #[inline]
    pub fn with_chunk_overlap(mut self, chunk_overlap: usize) -> Self {
        self.chunk_overlap = chunk_overlap;
        self
    }

    /// Splits `text` into chunks.
    pub fn split(&self, text: &str) -> Vec<Chunk> {
        let mut pieces = Vec::new();
        self.split_into_pieces(text, 0, &SEPARATORS, &mut pieces);
        let chunks = self.merge_pieces(pieces);
        debug!("split {} bytes into {} chunks", text.len(), chunks.len());
        chunks
    }

    /// Recursively breaks `text` into pieces no larger than the chunk
    /// size. Separators stay attached to the preceding piece, so the
    /// pieces concatenate back to the original text and their offsets
    /// stay valid.
    fn split_into_pieces<'a>(
        &self,
        text: &'a str,
        offset: usize,
        separators: &[&str],
        out: &mut Vec<(usize, &'a str)>,
    ) {
        if text.len() <= self.chunk_size {
            if !text.is_empty() {
                out.push((offset, text));
            }
            return;
        }

        let Some((sep, rest)) = separators.split_first() else {
            // Nothing left to split on, cut at character boundaries.
            let mut start = 0;
            while start < text.len() {
                let mut end = (start + self.chunk_size).min(text.len());
                while end < text.len() && !text.is_char_boundary(end) {
                    end += 1;
                }
                out.push((offset + start, &text[start..end]));
                start = end;
            }
            return;
        };

        if !text.contains(sep) {
            self.split_into_pieces(text, offset, rest, out);
            return;
        }

        let mut start = 0;
        while let Some(pos) = text[start..].find(sep) {
            let end = start + pos + sep.len();
            self.emit_piece(&text[start..end], offset + start, rest, out);
            start = end;
        }
        if start < text.len() {
            self.emit_piece(&text[start..], offset + start, rest, out);
        }
    }

    fn emit_piece<'a>(
        &self,
        piece: &'a str,
        offset: usize,
        rest: &[&str],
        out: &mut Vec<(usize, &'a str)>,
    ) {
        if piece.len() <= self.chunk_size {
            out.push((offset, piece));
        } else {
            self.split_into_pieces(piece, offset, rest, out);
        }
    }

    /// Greedily joins consecutive pieces into chunks, keeping a tail of
    /// each emitted chunk as the overlap of the next one.
    fn merge_pieces(&self, pieces: Vec<(usize, &str)>) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut window: VecDeque<(usize, &str)> = VecDeque::new();
        let mut window_len = 0usize;

        for (offset, piece) in pieces {
            if window_len + piece.len() > self.chunk_size && !window.is_empty()
            {
                push_chunk(&mut chunks, &window);
                while window_len > self.chunk_overlap
                    || (window_len + piece.len() > self.chunk_size
                        && window_len > 0)
                {
                    match window.pop_front() {
                        Some((_, dropped)) => window_len -= dropped.len(),
                        None => break,
                    }
                }
            }
            window.push_back((offset, piece));
            window_len += piece.len();
        }
        push_chunk(&mut chunks, &window);
        chunks
    }
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self::new()
    }
}

fn push_chunk(chunks: &mut Vec<Chunk>, window: &VecDeque<(usize, &str)>) {
    let Some((start_offset, _)) = window.front() else {
        return;
    };
    let text: String = window.iter().map(|(_, piece)| *piece).collect();
    let text = text.trim_end().to_owned();
    if !text.is_empty() {
        chunks.push(Chunk {
            text,
            start_offset: *start_offset,
        });
    }
}
