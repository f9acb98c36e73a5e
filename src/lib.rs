//! Matchbox - a single-document in-memory fulltext index
//!
//! One instance holds at most one logical document made of named fields.
//! Field text is ingested as a token stream and indexed on the fly into
//! per-field term dictionaries with positional (and optionally offset)
//! postings, so that arbitrary queries can be matched against the one
//! document without ever touching disk. Typical uses are streaming
//! matchmaking: routing, classification, publish-subscribe filtering,
//! highlighting candidate checks.
//!
//! Key properties:
//! - Block-arena storage: term bytes and postings live in pooled
//!   fixed-size blocks, never in per-term heap objects
//! - Postings are linked chains of growing slices, so a term's
//!   occurrence list can grow without knowing its final frequency
//! - A read-only [`IndexView`] exposes the standard fields / terms /
//!   postings contract (sorted enumeration, exact and ceiling seek,
//!   positional replay) for an external query engine
//! - [`MemoryIndex::reset`] recycles the arenas for the next document,
//!   bounded by a configurable reuse budget

pub mod error;
pub mod index;
pub mod pool;
pub mod scoring;
pub mod terms;
pub mod tokens;

pub use error::{Error, Result};
pub use index::{
    FieldIndex, IndexStats, IndexView, MemoryIndex, Posting, PostingsIter, SeekStatus, TermCursor,
    TermsView,
};
pub use pool::{ByteArena, IntArena, SliceReader, SliceWriter, TermRef};
pub use scoring::{ClassicSimilarity, FieldNormState, Similarity};
pub use terms::{TermDictionary, TermSlot};
pub use tokens::{CannedTokenStream, KeywordTokenStream, OwnedToken, TextTokenStream, Token, TokenStream};

pub type DocId = u32;
pub type Score = f32;

/// The id of the single synthetic document every posting reports.
pub const MATCH_DOC: DocId = 0;
