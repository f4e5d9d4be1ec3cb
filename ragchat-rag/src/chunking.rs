//! Document chunking strategies.
//!
//! This module provides the [`Chunker`] trait and two implementations:
//!
//! - [`RecursiveChunker`] — splits on paragraph, line, then word boundaries
//!   and merges the pieces back up to the size limit with overlap
//! - [`FixedSizeChunker`] — splits by character count with configurable overlap
//!
//! Sizes are measured in characters (Unicode scalar values). Every chunk is a
//! contiguous slice of its document and records its character offset under
//! [`START_INDEX_KEY`], so the source text can be rebuilt from the chunks.

use crate::document::{CHUNK_INDEX_KEY, Chunk, Document, START_INDEX_KEY};

/// A strategy for splitting documents into chunks.
///
/// Implementations produce [`Chunk`]s with text and metadata but no embeddings.
/// Embeddings are attached later by the pipeline.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    ///
    /// Returns an empty `Vec` if the document has empty text.
    /// Each returned chunk has an empty embedding vector.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

/// Split every document in order, concatenating the resulting chunks.
pub fn split_documents(chunker: &dyn Chunker, documents: &[Document]) -> Vec<Chunk> {
    documents.iter().flat_map(|doc| chunker.chunk(doc)).collect()
}

fn make_chunk(document: &Document, index: usize, text: &str, char_start: usize) -> Chunk {
    let mut metadata = document.metadata.clone();
    metadata.insert(CHUNK_INDEX_KEY.to_string(), index.to_string());
    metadata.insert(START_INDEX_KEY.to_string(), char_start.to_string());
    Chunk {
        id: format!("{}_{index}", document.id),
        text: text.to_string(),
        embedding: Vec::new(),
        metadata,
        document_id: document.id.clone(),
    }
}

/// Splits text into fixed-size chunks by character count with configurable overlap.
///
/// Chunk IDs are generated as `{document_id}_{chunk_index}`. Each chunk inherits
/// the parent document's metadata plus `chunk_index` and `start_index` fields.
///
/// # Example
///
/// ```rust,ignore
/// use ragchat_rag::FixedSizeChunker;
///
/// let chunker = FixedSizeChunker::new(256, 50);
/// let chunks = chunker.chunk(&document);
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` — maximum number of characters per chunk
    /// * `chunk_overlap` — number of overlapping characters between consecutive chunks
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap }
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        let text = &document.text;
        if text.is_empty() || self.chunk_size == 0 {
            return Vec::new();
        }

        let offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        let total = offsets.len();
        let byte_at = |char_pos: usize| offsets.get(char_pos).copied().unwrap_or(text.len());
        let step = self.chunk_size.saturating_sub(self.chunk_overlap).max(1);

        let mut chunks = Vec::new();
        let mut start = 0;
        loop {
            let end = (start + self.chunk_size).min(total);
            let slice = &text[byte_at(start)..byte_at(end)];
            chunks.push(make_chunk(document, chunks.len(), slice, start));
            if end == total {
                break;
            }
            start += step;
        }

        chunks
    }
}

/// Separators tried in order, coarsest first.
const SEPARATORS: &[&str] = &["\n\n", "\n", " "];

/// Splits text hierarchically: paragraphs → lines → words → characters.
///
/// Text is first cut into pieces no longer than `chunk_size`, using the
/// coarsest separator that appears in an over-long span. Separators stay
/// attached to the preceding piece. Pieces are then merged greedily into
/// chunks of at most `chunk_size` characters; each chunk after the first
/// starts by repeating trailing pieces of the previous one, up to
/// `chunk_overlap` characters.
///
/// # Example
///
/// ```rust,ignore
/// use ragchat_rag::RecursiveChunker;
///
/// let chunker = RecursiveChunker::new(1000, 200);
/// let chunks = chunker.chunk(&document);
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` — maximum number of characters per chunk
    /// * `chunk_overlap` — target number of overlapping characters between consecutive chunks
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap }
    }
}

/// A contiguous slice of the source text.
#[derive(Debug, Clone, Copy)]
struct Span {
    start: usize,
    end: usize,
    char_start: usize,
    chars: usize,
}

/// Cut `span` into pieces of at most `chunk_size` characters.
fn split_span(text: &str, span: Span, chunk_size: usize, separators: &[&str], out: &mut Vec<Span>) {
    if span.chars <= chunk_size {
        out.push(span);
        return;
    }

    let slice = &text[span.start..span.end];
    let Some(level) = separators.iter().position(|sep| slice.contains(sep)) else {
        split_by_chars(text, span, chunk_size, out);
        return;
    };
    let separator = separators[level];
    let remaining = &separators[level + 1..];

    let mut start = span.start;
    let mut char_start = span.char_start;
    while start < span.end {
        let end = match text[start..span.end].find(separator) {
            Some(pos) => start + pos + separator.len(),
            None => span.end,
        };
        let chars = text[start..end].chars().count();
        split_span(text, Span { start, end, char_start, chars }, chunk_size, remaining, out);
        start = end;
        char_start += chars;
    }
}

fn split_by_chars(text: &str, span: Span, chunk_size: usize, out: &mut Vec<Span>) {
    let mut start = span.start;
    let mut char_start = span.char_start;
    let mut chars = 0;
    for (offset, _) in text[span.start..span.end].char_indices() {
        if chars == chunk_size {
            let end = span.start + offset;
            out.push(Span { start, end, char_start, chars });
            start = end;
            char_start += chars;
            chars = 0;
        }
        chars += 1;
    }
    if chars > 0 {
        out.push(Span { start, end: span.end, char_start, chars });
    }
}

/// Merge contiguous pieces into overlapping chunk spans.
fn merge_pieces(pieces: &[Span], chunk_size: usize, chunk_overlap: usize) -> Vec<Span> {
    let mut merged = Vec::new();
    let mut i = 0;
    while i < pieces.len() {
        let mut j = i;
        let mut total = pieces[i].chars;
        while j + 1 < pieces.len() && total + pieces[j + 1].chars <= chunk_size {
            j += 1;
            total += pieces[j].chars;
        }
        merged.push(Span {
            start: pieces[i].start,
            end: pieces[j].end,
            char_start: pieces[i].char_start,
            chars: total,
        });
        if j + 1 >= pieces.len() {
            break;
        }

        // Walk back from the next unconsumed piece while the carried-over
        // tail stays within the overlap and the next chunk can still fit it.
        let next = pieces[j + 1].chars;
        let mut k = j + 1;
        let mut carried = 0;
        while k - 1 > i {
            let c = pieces[k - 1].chars;
            if carried + c > chunk_overlap || carried + c + next > chunk_size {
                break;
            }
            carried += c;
            k -= 1;
        }
        i = k;
    }
    merged
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        let text = &document.text;
        if text.is_empty() || self.chunk_size == 0 {
            return Vec::new();
        }

        let whole = Span { start: 0, end: text.len(), char_start: 0, chars: text.chars().count() };
        let mut pieces = Vec::new();
        split_span(text, whole, self.chunk_size, SEPARATORS, &mut pieces);

        merge_pieces(&pieces, self.chunk_size, self.chunk_overlap)
            .into_iter()
            .enumerate()
            .map(|(i, span)| make_chunk(document, i, &text[span.start..span.end], span.char_start))
            .collect()
    }
}
