//! Block-pooled storage for term bytes and postings data
//!
//! Both arenas hand out fixed-size blocks and never individual
//! allocations. Handles into the pools are plain integers (block index
//! plus offset), so growing the backing `Vec` of blocks never
//! invalidates anything already written. `reset` returns blocks to a
//! bounded free list instead of freeing them, which lets one instance
//! index a stream of documents without re-allocating its working set.

mod bytes;
mod ints;

pub use bytes::{BYTE_BLOCK_SIZE, ByteArena, TermRef};
pub use ints::{INT_BLOCK_SIZE, IntArena, SliceReader, SliceWriter};
