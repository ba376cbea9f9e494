//! Word-boundary chunking of streamed assistant text.
//!
//! Model output arrives as arbitrary text deltas; the UI wants small chunks
//! that break on word boundaries so the typewriter rendering never splits a
//! word mid-screen. [`word_chunks`] slices one delta, [`chunk_deltas`] lifts
//! that over a whole stream while keeping the running position.
//!
//! Lengths and positions are byte counts of the emitted content.
//!
//! ```rust
//! use medstream::chunk::{word_chunks, DEFAULT_CHUNK_SIZE};
//!
//! let chunks = word_chunks("Patient presents with chest pain", DEFAULT_CHUNK_SIZE, 0);
//!
//! assert!(chunks.len() > 1);
//! assert!(chunks.last().unwrap().is_word_boundary);
//! ```

use futures_util::{stream, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Target chunk width used by the streaming endpoints when the caller does
/// not pick one.
pub const DEFAULT_CHUNK_SIZE: usize = 8;

/// One slice of streamed content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamChunk {
    /// The text of this slice.
    pub content: String,
    /// Byte offset of this slice within the emitted stream.
    pub position: usize,
    /// Byte length of `content`.
    pub length: usize,
    /// Whether the slice ends at a word boundary.
    pub is_word_boundary: bool,
    /// Caller-attached annotations (model name, emit timestamp, ...), if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl StreamChunk {
    /// Build a chunk with `length` derived from the content.
    pub fn new(content: impl Into<String>, position: usize) -> Self {
        let content = content.into();
        let length = content.len();
        Self {
            content,
            position,
            length,
            is_word_boundary: false,
            metadata: None,
        }
    }

    /// Mark whether this chunk ends at a word boundary.
    pub fn with_word_boundary(mut self, is_word_boundary: bool) -> Self {
        self.is_word_boundary = is_word_boundary;
        self
    }

    /// Attach annotations to this chunk.
    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Slice `text` into word-level chunks of at most `max_size` bytes.
///
/// Words are split on single spaces with the separators kept attached to the
/// accumulating chunk. A chunk is flushed when appending the next word would
/// push it past `max_size`; the separator in front of the word that forced
/// the flush is consumed, so the next chunk starts directly on the word.
/// The final remainder is always flushed and always reports a word boundary.
/// Positions start at `start_position` and advance by each emitted chunk's
/// length.
///
/// Empty input produces no chunks. A single word wider than `max_size` is
/// emitted whole — chunks never split inside a word.
pub fn word_chunks(text: &str, max_size: usize, start_position: usize) -> Vec<StreamChunk> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut position = start_position;
    let mut current = String::new();

    for (i, word) in text.split(' ').enumerate() {
        let with_space = if i == 0 {
            word.to_string()
        } else {
            format!(" {word}")
        };

        if !current.is_empty() && current.len() + with_space.len() > max_size {
            let length = current.len();
            let is_word_boundary = current.ends_with(' ') || current.ends_with('\n');
            chunks.push(StreamChunk {
                content: std::mem::take(&mut current),
                position,
                length,
                is_word_boundary,
                metadata: None,
            });
            position += length;
            current = with_space.trim_start().to_string();
        } else {
            current.push_str(&with_space);
        }
    }

    if !current.is_empty() {
        let length = current.len();
        chunks.push(StreamChunk {
            content: current,
            position,
            length,
            is_word_boundary: true,
            metadata: None,
        });
    }

    chunks
}

/// Re-chunk a stream of text deltas on word boundaries.
///
/// Applies [`word_chunks`] to every delta and threads the running position
/// across them, so chunk positions are cumulative over the whole stream even
/// when deltas arrive mid-sentence.
pub fn chunk_deltas<S>(deltas: S, max_size: usize) -> impl Stream<Item = StreamChunk>
where
    S: Stream<Item = String>,
{
    let mut position = 0usize;
    deltas.flat_map(move |delta| {
        let chunks = word_chunks(&delta, max_size, position);
        position += chunks.iter().map(|c| c.length).sum::<usize>();
        stream::iter(chunks)
    })
}
