//! # Chunker
//!
//! Splits one or more parallel input sequences into aligned, fixed-size chunks.
//!
//! Every element is tagged with the index of the source it came from and the
//! sources are concatenated in order (source 0 entirely before source 1, and so
//! on). That tagged stream is cut into windows of `size` elements and each
//! window is regrouped by source, so a chunk carries one sub-sequence per
//! source. A source with nothing in a window gets an empty sub-sequence; only
//! the last chunk may hold fewer than `size` elements.
//!
//! Chunks are produced lazily: nothing is pulled from a source until the chunk
//! that needs it is requested, and the sequence can only be consumed once.
//!
//! ```rust
//! use twbulk::chunker::chunks;
//!
//! let ids = vec![1, 2, 3];
//! let more = vec![4, 5];
//! let produced: Vec<_> = chunks(vec![ids, more], 2)
//!     .unwrap()
//!     .map(|chunk| chunk.into_components())
//!     .collect();
//!
//! assert_eq!(
//!     produced,
//!     vec![
//!         vec![vec![1, 2], vec![]],
//!         vec![vec![3], vec![4]],
//!         vec![vec![], vec![5]],
//!     ]
//! );
//! ```

use std::iter::FusedIterator;

use crate::error::{BulkError, Result};

/// One window of the tagged concatenation, regrouped by source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk<T> {
    components: Vec<Vec<T>>,
}

impl<T> Chunk<T> {
    /// Elements of `source` in this chunk, in their original order.
    ///
    /// Sources out of range and sources absent from this window both yield an
    /// empty slice.
    pub fn component(&self, source: usize) -> &[T] {
        self.components.get(source).map_or(&[], Vec::as_slice)
    }

    pub fn components(&self) -> &[Vec<T>] {
        &self.components
    }

    pub fn into_components(self) -> Vec<Vec<T>> {
        self.components
    }

    pub fn source_count(&self) -> usize {
        self.components.len()
    }

    /// Combined element count across all sources.
    pub fn len(&self) -> usize {
        self.components.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.components.iter().all(Vec::is_empty)
    }
}

/// Lazy iterator over the chunks of N parallel sources.
#[derive(Debug)]
pub struct Chunks<I: Iterator> {
    sources: Vec<I>,
    current: usize,
    size: usize,
}

/// Chunk `sources` into windows of `size` elements.
///
/// Fails with [`BulkError::Configuration`] when `size` is zero. Zero total
/// elements produce no chunks at all.
pub fn chunks<S>(sources: Vec<S>, size: usize) -> Result<Chunks<S::IntoIter>>
where
    S: IntoIterator,
{
    if size == 0 {
        return Err(BulkError::configuration("chunk size must be at least 1"));
    }

    Ok(Chunks {
        sources: sources.into_iter().map(IntoIterator::into_iter).collect(),
        current: 0,
        size,
    })
}

impl<I: Iterator> Iterator for Chunks<I> {
    type Item = Chunk<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        let source_count = self.sources.len();
        let mut components: Vec<Vec<I::Item>> = (0..source_count).map(|_| Vec::new()).collect();
        let mut taken = 0;

        while taken < self.size && self.current < source_count {
            match self.sources[self.current].next() {
                Some(element) => {
                    components[self.current].push(element);
                    taken += 1;
                }
                // exhausted sources are never polled again
                None => self.current += 1,
            }
        }

        if taken == 0 {
            None
        } else {
            Some(Chunk { components })
        }
    }
}

impl<I: Iterator> FusedIterator for Chunks<I> {}
