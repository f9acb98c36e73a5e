//! Read-only adapter over a [`MemoryIndex`]
//!
//! Exposes the standard fields / terms / postings contract an external
//! query engine consumes: field enumeration in name order, a term
//! cursor with exact and ceiling seek over the lexicographically
//! sorted dictionary, positional (and offset) replay of each term's
//! posting chain, and a cached per-field norm. Everything reports the
//! one synthetic document, id 0.

use std::cell::RefCell;

use crate::pool::SliceReader;
use crate::scoring::{FieldNormState, Similarity};
use crate::{DocId, MATCH_DOC};

use super::{FieldIndex, MemoryIndex};

/// Cursor seek outcome, mirroring the usual term-enum contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekStatus {
    /// Positioned on the exact term.
    Found,
    /// Positioned on the smallest term greater than the target.
    NotFound,
    /// No term is greater than or equal to the target.
    End,
}

struct CachedNorm {
    field: String,
    similarity: usize,
    value: f32,
}

/// Read view bound to one index snapshot.
///
/// Creating a view is free; it borrows the index, so ingestion is
/// statically excluded while any view is alive.
pub struct IndexView<'a> {
    index: &'a MemoryIndex,
    norm_cache: RefCell<Option<CachedNorm>>,
}

impl<'a> IndexView<'a> {
    pub(crate) fn new(index: &'a MemoryIndex) -> Self {
        Self {
            index,
            norm_cache: RefCell::new(None),
        }
    }

    /// Always 1: a memory index holds exactly one document.
    pub fn doc_count(&self) -> u32 {
        1
    }

    /// Field names in ascending order.
    pub fn fields(&self) -> impl Iterator<Item = &'a str> {
        self.index.sorted_field_names().iter().map(|s| s.as_str())
    }

    /// The terms of one field, or `None` if the field was never
    /// published.
    pub fn terms(&self, field: &str) -> Option<TermsView<'a>> {
        Some(TermsView {
            index: self.index,
            field: self.index.field(field)?,
        })
    }

    /// The field's norm under `similarity`, computed once and cached
    /// by (field, similarity identity).
    pub fn norm(&self, field: &str, similarity: &dyn Similarity) -> Option<f32> {
        let field_index = self.index.field(field)?;
        let similarity_id = similarity as *const dyn Similarity as *const () as usize;

        if let Some(cached) = self.norm_cache.borrow().as_ref()
            && cached.field == field
            && cached.similarity == similarity_id
        {
            return Some(cached.value);
        }

        let state = FieldNormState {
            num_tokens: field_index.num_tokens,
            num_overlap_tokens: field_index.num_overlap_tokens,
            boost: field_index.boost,
        };
        let value = similarity.compute_norm(&state);
        *self.norm_cache.borrow_mut() = Some(CachedNorm {
            field: field.to_string(),
            similarity: similarity_id,
            value,
        });
        Some(value)
    }
}

/// Term-level view of one field.
pub struct TermsView<'a> {
    index: &'a MemoryIndex,
    field: &'a FieldIndex,
}

impl<'a> TermsView<'a> {
    /// Number of distinct terms in the field.
    pub fn len(&self) -> usize {
        self.field.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.field.terms.is_empty()
    }

    /// Always 1 (single document).
    pub fn doc_count(&self) -> u32 {
        1
    }

    /// One document per term, so this equals the term count.
    pub fn sum_doc_freq(&self) -> u64 {
        self.field.terms.len() as u64
    }

    /// Sum of all term frequencies in the field.
    pub fn sum_total_term_freq(&self) -> u64 {
        self.field.sum_total_term_freq
    }

    /// A cursor over the terms in byte-wise lexicographic order.
    pub fn cursor(&self) -> TermCursor<'a> {
        TermCursor {
            index: self.index,
            field: self.field,
            sorted: self.field.terms.sorted_ordinals(self.index.byte_pool()),
            next_index: 0,
            current: None,
        }
    }
}

/// Cursor over one field's sorted terms.
///
/// Starts unpositioned; position with [`next`](Self::next),
/// [`seek_exact`](Self::seek_exact) or [`seek_ceil`](Self::seek_ceil)
/// before reading term state.
pub struct TermCursor<'a> {
    index: &'a MemoryIndex,
    field: &'a FieldIndex,
    sorted: &'a [u32],
    next_index: usize,
    current: Option<usize>,
}

impl<'a> TermCursor<'a> {
    /// Advance to the next term in sorted order.
    pub fn next(&mut self) -> Option<&'a [u8]> {
        if self.next_index >= self.sorted.len() {
            self.current = None;
            return None;
        }
        self.current = Some(self.next_index);
        self.next_index += 1;
        Some(self.term())
    }

    /// Position on the exact term, if present.
    pub fn seek_exact(&mut self, target: &[u8]) -> bool {
        match self.field.terms.binary_search(self.index.byte_pool(), target) {
            Ok(index) => {
                self.current = Some(index);
                self.next_index = index + 1;
                true
            }
            Err(_) => {
                self.current = None;
                false
            }
        }
    }

    /// Position on the smallest term `>= target`.
    pub fn seek_ceil(&mut self, target: &[u8]) -> SeekStatus {
        match self.field.terms.binary_search(self.index.byte_pool(), target) {
            Ok(index) => {
                self.current = Some(index);
                self.next_index = index + 1;
                SeekStatus::Found
            }
            Err(index) if index < self.sorted.len() => {
                self.current = Some(index);
                self.next_index = index + 1;
                SeekStatus::NotFound
            }
            Err(_) => {
                self.current = None;
                self.next_index = self.sorted.len();
                SeekStatus::End
            }
        }
    }

    /// The current term's bytes.
    ///
    /// # Panics
    ///
    /// Panics if the cursor is not positioned on a term.
    pub fn term(&self) -> &'a [u8] {
        self.field.terms.term(self.index.byte_pool(), self.ord())
    }

    /// Always 1: every present term occurs in the one document.
    pub fn doc_freq(&self) -> u32 {
        1
    }

    /// The current term's occurrence count.
    ///
    /// # Panics
    ///
    /// Panics if the cursor is not positioned on a term.
    pub fn freq(&self) -> u32 {
        self.field.terms.freq(self.ord())
    }

    /// Same as [`freq`](Self::freq), over the single document.
    pub fn total_term_freq(&self) -> u64 {
        self.freq() as u64
    }

    /// Replay the current term's postings in write order.
    ///
    /// # Panics
    ///
    /// Panics if the cursor is not positioned on a term.
    pub fn postings(&self) -> PostingsIter<'a> {
        let ord = self.ord();
        let mut reader = SliceReader::new();
        reader.reset(self.field.terms.slice_start(ord), self.field.terms.slice_end(ord));
        PostingsIter {
            index: self.index,
            reader,
        }
    }

    fn ord(&self) -> u32 {
        let index = self.current.expect("cursor is not positioned on a term");
        self.sorted[index]
    }
}

/// One occurrence of a term in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    /// Token position, counted across all values of the field.
    pub position: i32,
    /// Character offsets, when the index stores them.
    pub offset: Option<(i32, i32)>,
}

/// Iterator replaying one term's posting chain.
pub struct PostingsIter<'a> {
    index: &'a MemoryIndex,
    reader: SliceReader,
}

impl PostingsIter<'_> {
    /// The document every posting belongs to.
    pub fn doc_id(&self) -> DocId {
        MATCH_DOC
    }
}

impl Iterator for PostingsIter<'_> {
    type Item = Posting;

    fn next(&mut self) -> Option<Posting> {
        if self.reader.is_end() {
            return None;
        }
        let pool = self.index.int_pool();
        let position = self.reader.read(pool);
        let offset = if self.index.stores_offsets() {
            let start = self.reader.read(pool);
            let end = self.reader.read(pool);
            Some((start, end))
        } else {
            None
        };
        Some(Posting { position, offset })
    }
}
