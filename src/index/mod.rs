//! The single-document memory index
//!
//! [`MemoryIndex`] owns a map of field name to [`FieldIndex`] plus the
//! two block arenas every field shares: term bytes go to the
//! [`ByteArena`], postings to the [`IntArena`]. Ingestion is the only
//! mutation path; [`MemoryIndex::reset`] clears everything and
//! recycles arena blocks within a configured budget so an instance can
//! chew through a stream of documents.
//!
//! Reads go through [`IndexView`], a borrow of the index created with
//! [`MemoryIndex::view`].

mod view;

pub use view::{IndexView, Posting, PostingsIter, SeekStatus, TermCursor, TermsView};

#[cfg(test)]
mod tests;

use std::cell::OnceCell;
use std::mem::size_of;

use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::pool::{BYTE_BLOCK_SIZE, ByteArena, INT_BLOCK_SIZE, IntArena, SliceWriter};
use crate::terms::{TermDictionary, TermSlot};
use crate::tokens::TokenStream;

/// Everything indexed for one field name.
pub struct FieldIndex {
    pub(crate) terms: TermDictionary,
    pub(crate) num_tokens: u32,
    pub(crate) num_overlap_tokens: u32,
    pub(crate) boost: f32,
    pub(crate) sum_total_term_freq: u64,
    pub(crate) last_position: i32,
    pub(crate) last_offset: i32,
}

impl FieldIndex {
    /// Total tokens ingested into this field.
    pub fn num_tokens(&self) -> u32 {
        self.num_tokens
    }

    /// Tokens that arrived with a zero position increment.
    pub fn num_overlap_tokens(&self) -> u32 {
        self.num_overlap_tokens
    }

    /// Accumulated multiplicative boost.
    pub fn boost(&self) -> f32 {
        self.boost
    }

    /// Sum of all term frequencies; equals `num_tokens`.
    pub fn sum_total_term_freq(&self) -> u64 {
        self.sum_total_term_freq
    }
}

/// Published scalar state of a field, snapshotted before a resuming
/// ingestion so a failed call can put it back.
#[derive(Clone, Copy)]
struct FieldState {
    num_tokens: u32,
    num_overlap_tokens: u32,
    boost: f32,
    sum_total_term_freq: u64,
    last_position: i32,
    last_offset: i32,
}

impl FieldState {
    fn of(field: &FieldIndex) -> Self {
        Self {
            num_tokens: field.num_tokens,
            num_overlap_tokens: field.num_overlap_tokens,
            boost: field.boost,
            sum_total_term_freq: field.sum_total_term_freq,
            last_position: field.last_position,
            last_offset: field.last_offset,
        }
    }

    fn restore(self, terms: TermDictionary) -> FieldIndex {
        FieldIndex {
            terms,
            num_tokens: self.num_tokens,
            num_overlap_tokens: self.num_overlap_tokens,
            boost: self.boost,
            sum_total_term_freq: self.sum_total_term_freq,
            last_position: self.last_position,
            last_offset: self.last_offset,
        }
    }
}

/// Coarse size breakdown, for memory-sensitive callers.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexStats {
    pub num_fields: usize,
    pub num_terms: usize,
    pub num_postings: u64,
    pub byte_arena_bytes: usize,
    pub int_arena_bytes: usize,
    pub estimated_memory_bytes: usize,
}

/// High-throughput single-document in-memory inverted index.
///
/// Each instance holds at most one logical document. Fields are added
/// with [`add_field`](Self::add_field) and friends; adding to the same
/// field name again appends, emulating a multi-valued field. Reads go
/// through [`view`](Self::view). Instances are not thread-safe; wrap
/// in external synchronization if shared.
pub struct MemoryIndex {
    fields: FxHashMap<String, FieldIndex>,
    /// Field names sorted ascending; lazily computed on demand.
    sorted_fields: OnceCell<Vec<String>>,
    byte_pool: ByteArena,
    int_pool: IntArena,
    store_offsets: bool,
}

impl Default for MemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryIndex {
    /// An index recording positions only.
    pub fn new() -> Self {
        Self::with_options(false, 0)
    }

    /// An index that also records the start/end character offsets of
    /// every token, for highlighting-style consumers.
    pub fn with_offsets(store_offsets: bool) -> Self {
        Self::with_options(store_offsets, 0)
    }

    /// Full construction: `max_reused_bytes` bounds how much arena
    /// storage [`reset`](Self::reset) keeps alive for the next
    /// document, split evenly between the byte and int pools.
    pub fn with_options(store_offsets: bool, max_reused_bytes: usize) -> Self {
        let max_byte_blocks = (max_reused_bytes / 2) / BYTE_BLOCK_SIZE;
        let max_int_blocks = (max_reused_bytes - max_byte_blocks * BYTE_BLOCK_SIZE)
            / (INT_BLOCK_SIZE * size_of::<i32>());
        Self {
            fields: FxHashMap::default(),
            sorted_fields: OnceCell::new(),
            byte_pool: ByteArena::new(max_byte_blocks),
            int_pool: IntArena::new(max_int_blocks),
            store_offsets,
        }
    }

    /// Whether token offsets are recorded alongside positions.
    pub fn stores_offsets(&self) -> bool {
        self.store_offsets
    }

    /// Ingest a token stream under `field_name` with a neutral boost
    /// and default gaps (position gap 0, offset gap 1).
    pub fn add_field<S: TokenStream>(&mut self, field_name: &str, stream: S) -> Result<()> {
        self.add_field_with(field_name, stream, 1.0, 0, 1)
    }

    /// Convenience: split `text` on whitespace (lowercased, stripped
    /// of punctuation) and ingest it under `field_name`.
    pub fn add_text(&mut self, field_name: &str, text: &str) -> Result<()> {
        self.add_field(field_name, crate::tokens::TextTokenStream::new(text))
    }

    /// Ingest a token stream under `field_name`.
    ///
    /// If the field already exists the stream appends to it: positions
    /// continue from the last recorded position plus `position_gap`,
    /// offsets from the last offset plus `offset_gap`, and `boost`
    /// multiplies into the field's accumulated boost. This is how
    /// repeated calls emulate a multi-valued field.
    ///
    /// A call whose stream yields no tokens leaves any previously
    /// published state for the field untouched. A stream error aborts
    /// the call: the error is surfaced, the field's published state is
    /// kept as it was, and the stream is dropped either way.
    pub fn add_field_with<S: TokenStream>(
        &mut self,
        field_name: &str,
        stream: S,
        boost: f32,
        position_gap: u32,
        offset_gap: u32,
    ) -> Result<()> {
        if field_name.is_empty() {
            return Err(Error::InvalidArgument(
                "field name must not be empty".to_string(),
            ));
        }
        if !boost.is_finite() || boost <= 0.0 {
            return Err(Error::InvalidArgument(format!(
                "boost must be greater than 0, got {boost}"
            )));
        }

        let (mut terms, prev) = match self.fields.remove(field_name) {
            Some(field) => {
                let state = FieldState::of(&field);
                (field.terms, Some(state))
            }
            None => (TermDictionary::new(), None),
        };
        self.sorted_fields.take();

        let mut num_tokens = prev.map_or(0, |p| p.num_tokens);
        let mut num_overlap_tokens = prev.map_or(0, |p| p.num_overlap_tokens);
        let mut sum_total_term_freq = prev.map_or(0, |p| p.sum_total_term_freq);
        let boost = boost * prev.map_or(1.0, |p| p.boost);
        let mut pos: i32 = prev.map_or(-1, |p| p.last_position + position_gap as i32);
        let offset_base: i32 = prev.map_or(0, |p| p.last_offset + offset_gap as i32);

        let mut tokens_this_call = 0u32;
        let mut last_token_end = 0i32;
        let mut writer = SliceWriter::new();

        let byte_pool = &mut self.byte_pool;
        let int_pool = &mut self.int_pool;
        let store_offsets = self.store_offsets;
        let mut stream = stream;

        let outcome: Result<()> = (|| {
            stream.begin().map_err(wrap_stream_err)?;
            while let Some(token) = stream.advance().map_err(wrap_stream_err)? {
                num_tokens += 1;
                tokens_this_call += 1;
                if token.position_increment == 0 {
                    num_overlap_tokens += 1;
                }
                pos += token.position_increment as i32;

                let ord = match terms.add_or_lookup(byte_pool, token.term)? {
                    TermSlot::Found(ord) => {
                        writer.resume(terms.slice_end(ord));
                        ord
                    }
                    TermSlot::Inserted(ord) => {
                        let start = writer.start_new_slice(int_pool);
                        terms.set_slice_start(ord, start);
                        ord
                    }
                };
                terms.bump_freq(ord);
                sum_total_term_freq += 1;

                writer.write(int_pool, pos);
                if store_offsets {
                    let (start, end) = token.offset.unwrap_or((0, 0));
                    writer.write(int_pool, start as i32 + offset_base);
                    writer.write(int_pool, end as i32 + offset_base);
                }
                if let Some((_, end)) = token.offset {
                    last_token_end = end as i32;
                }
                terms.set_slice_end(ord, writer.current_offset());
            }
            stream.end().map_err(wrap_stream_err)
        })();

        match outcome {
            Ok(()) => {
                if tokens_this_call > 0 {
                    trace!(field = field_name, num_tokens, "field published");
                    self.fields.insert(
                        field_name.to_string(),
                        FieldIndex {
                            terms,
                            num_tokens,
                            num_overlap_tokens,
                            boost,
                            sum_total_term_freq,
                            last_position: pos,
                            last_offset: offset_base + last_token_end,
                        },
                    );
                } else if let Some(state) = prev {
                    // Empty stream: put the field back exactly as it was.
                    self.fields.insert(field_name.to_string(), state.restore(terms));
                }
                Ok(())
            }
            Err(err) => {
                if let Some(state) = prev {
                    self.fields.insert(field_name.to_string(), state.restore(terms));
                }
                Err(err)
            }
        }
    }

    /// A read view over the current contents.
    pub fn view(&self) -> IndexView<'_> {
        IndexView::new(self)
    }

    /// Number of fields currently published.
    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    /// Drop all indexed state and recycle arena blocks within the
    /// configured reuse budget. Afterwards the instance behaves like a
    /// freshly constructed one.
    pub fn reset(&mut self) {
        self.fields.clear();
        self.sorted_fields.take();
        self.byte_pool.reset();
        self.int_pool.reset();
        debug!("memory index reset");
    }

    /// Best-effort estimate of the heap bytes held by this instance,
    /// for memory-sensitive caches and pools.
    pub fn memory_usage(&self) -> usize {
        let mut total = self.byte_pool.allocated_bytes() + self.int_pool.allocated_bytes();
        for (name, field) in &self.fields {
            total += name.len() + size_of::<FieldIndex>() + field.terms.memory_usage();
        }
        total
    }

    /// Current size statistics.
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            num_fields: self.fields.len(),
            num_terms: self.fields.values().map(|f| f.terms.len()).sum(),
            num_postings: self.fields.values().map(|f| f.sum_total_term_freq).sum(),
            byte_arena_bytes: self.byte_pool.allocated_bytes(),
            int_arena_bytes: self.int_pool.allocated_bytes(),
            estimated_memory_bytes: self.memory_usage(),
        }
    }

    pub(crate) fn field(&self, name: &str) -> Option<&FieldIndex> {
        self.fields.get(name)
    }

    pub(crate) fn byte_pool(&self) -> &ByteArena {
        &self.byte_pool
    }

    pub(crate) fn int_pool(&self) -> &IntArena {
        &self.int_pool
    }

    pub(crate) fn sorted_field_names(&self) -> &[String] {
        self.sorted_fields.get_or_init(|| {
            let mut names: Vec<String> = self.fields.keys().cloned().collect();
            names.sort_unstable();
            names
        })
    }
}

/// Stream failures surface as ingestion errors; everything else
/// (argument validation, term length) keeps its own variant.
fn wrap_stream_err(err: Error) -> Error {
    match err {
        Error::TokenStream(_) => err,
        other => Error::TokenStream(other.to_string()),
    }
}
