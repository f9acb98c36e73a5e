//! Term dictionary over arena-resident bytes
//!
//! An open-addressing hash table mapping term bytes to a dense ordinal
//! assigned in first-seen order. Term bytes are written once into the
//! shared [`ByteArena`] and never copied; buckets hold ordinals, and
//! probing compares against the arena directly. Three parallel arrays
//! (slice start, slice end, frequency) grow in lockstep with the
//! ordinal space, so an ordinal handed out once stays a valid index
//! across any later growth.
//!
//! Lexicographic access is lazy: `sorted_ordinals` memoizes a
//! byte-wise sorted permutation of the ordinals and drops it whenever
//! a new term is inserted.

use std::cell::OnceCell;
use std::hash::Hasher;

use rustc_hash::FxHasher;

use crate::error::{Error, Result};
use crate::pool::{BYTE_BLOCK_SIZE, ByteArena, TermRef};

const DEFAULT_CAPACITY: usize = 16;

/// Result of an insert-or-find on the dictionary.
///
/// Callers use the distinction to either open a new posting chain
/// (first occurrence) or resume the existing one (repeat occurrence)
/// without a second lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermSlot {
    /// First occurrence; a fresh ordinal was assigned.
    Inserted(u32),
    /// The term was already present under this ordinal.
    Found(u32),
}

impl TermSlot {
    /// The ordinal regardless of which case applies.
    #[inline]
    pub fn ordinal(self) -> u32 {
        match self {
            TermSlot::Inserted(ord) | TermSlot::Found(ord) => ord,
        }
    }
}

/// Hash table from arena-resident term bytes to dense ordinals, with
/// per-ordinal postings bookkeeping.
pub struct TermDictionary {
    /// Open-addressing buckets; -1 marks an empty bucket, any other
    /// value is an ordinal.
    table: Vec<i32>,
    /// Term bytes per ordinal.
    refs: Vec<TermRef>,
    /// Hash per ordinal, kept so rehashing never re-reads the arena.
    hashes: Vec<u64>,
    /// Global start address of each term's posting chain.
    slice_start: Vec<u32>,
    /// Global end address (exclusive) of each term's posting chain.
    slice_end: Vec<u32>,
    /// Occurrence count of each term.
    freq: Vec<u32>,
    /// Memoized byte-wise sorted permutation of the ordinals.
    sorted: OnceCell<Vec<u32>>,
}

impl Default for TermDictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl TermDictionary {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let table_size = capacity.next_power_of_two().max(2);
        Self {
            table: vec![-1; table_size],
            refs: Vec::with_capacity(capacity),
            hashes: Vec::with_capacity(capacity),
            slice_start: Vec::with_capacity(capacity),
            slice_end: Vec::with_capacity(capacity),
            freq: Vec::with_capacity(capacity),
            sorted: OnceCell::new(),
        }
    }

    /// Number of distinct terms.
    #[inline]
    pub fn len(&self) -> usize {
        self.refs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    /// Insert `bytes` if unseen, appending them to the arena, or find
    /// the existing ordinal.
    pub fn add_or_lookup(&mut self, arena: &mut ByteArena, bytes: &[u8]) -> Result<TermSlot> {
        if bytes.len() > BYTE_BLOCK_SIZE {
            return Err(Error::TermTooLong {
                len: bytes.len(),
                max: BYTE_BLOCK_SIZE,
            });
        }

        let hash = hash_bytes(bytes);
        let mask = self.table.len() - 1;
        let mut bucket = hash as usize & mask;
        loop {
            let slot = self.table[bucket];
            if slot < 0 {
                break;
            }
            if arena.get(self.refs[slot as usize]) == bytes {
                return Ok(TermSlot::Found(slot as u32));
            }
            bucket = (bucket + 1) & mask;
        }

        let ord = self.refs.len() as u32;
        self.refs.push(arena.append(bytes));
        self.hashes.push(hash);
        self.slice_start.push(0);
        self.slice_end.push(0);
        self.freq.push(0);
        self.table[bucket] = ord as i32;
        self.sorted.take();

        // Rehash at half load so probe chains stay short.
        if self.refs.len() * 2 >= self.table.len() {
            self.rehash();
        }
        Ok(TermSlot::Inserted(ord))
    }

    /// The bytes of a term by ordinal.
    #[inline]
    pub fn term<'a>(&self, arena: &'a ByteArena, ord: u32) -> &'a [u8] {
        arena.get(self.refs[ord as usize])
    }

    #[inline]
    pub fn slice_start(&self, ord: u32) -> u32 {
        self.slice_start[ord as usize]
    }

    #[inline]
    pub fn slice_end(&self, ord: u32) -> u32 {
        self.slice_end[ord as usize]
    }

    #[inline]
    pub fn freq(&self, ord: u32) -> u32 {
        self.freq[ord as usize]
    }

    #[inline]
    pub(crate) fn set_slice_start(&mut self, ord: u32, addr: u32) {
        self.slice_start[ord as usize] = addr;
    }

    #[inline]
    pub(crate) fn set_slice_end(&mut self, ord: u32, addr: u32) {
        self.slice_end[ord as usize] = addr;
    }

    #[inline]
    pub(crate) fn bump_freq(&mut self, ord: u32) {
        self.freq[ord as usize] += 1;
    }

    /// All ordinals sorted by byte-wise lexicographic order of their
    /// term bytes. Memoized until the next insertion.
    pub fn sorted_ordinals(&self, arena: &ByteArena) -> &[u32] {
        self.sorted.get_or_init(|| {
            let mut ords: Vec<u32> = (0..self.refs.len() as u32).collect();
            ords.sort_unstable_by(|&a, &b| {
                arena
                    .get(self.refs[a as usize])
                    .cmp(arena.get(self.refs[b as usize]))
            });
            ords
        })
    }

    /// Binary search over the sorted ordinals.
    ///
    /// Returns `Ok(index)` into [`sorted_ordinals`](Self::sorted_ordinals)
    /// for an exact match, or `Err(insertion_point)` for the smallest
    /// index whose term is greater than the target (possibly one past
    /// the end).
    pub fn binary_search(
        &self,
        arena: &ByteArena,
        target: &[u8],
    ) -> std::result::Result<usize, usize> {
        let sorted = self.sorted_ordinals(arena);
        sorted.binary_search_by(|&ord| arena.get(self.refs[ord as usize]).cmp(target))
    }

    /// Rough heap footprint of the dictionary's own bookkeeping (the
    /// term bytes themselves are accounted by the arena).
    pub fn memory_usage(&self) -> usize {
        self.table.capacity() * size_of::<i32>()
            + self.refs.capacity() * size_of::<TermRef>()
            + self.hashes.capacity() * size_of::<u64>()
            + (self.slice_start.capacity() + self.slice_end.capacity() + self.freq.capacity())
                * size_of::<u32>()
            + self.sorted.get().map_or(0, |s| s.capacity() * size_of::<u32>())
    }

    fn rehash(&mut self) {
        let new_size = self.table.len() * 2;
        let mask = new_size - 1;
        let mut table = vec![-1i32; new_size];
        for (ord, &hash) in self.hashes.iter().enumerate() {
            let mut bucket = hash as usize & mask;
            while table[bucket] >= 0 {
                bucket = (bucket + 1) & mask;
            }
            table[bucket] = ord as i32;
        }
        self.table = table;
    }
}

use std::mem::size_of;

fn hash_bytes(bytes: &[u8]) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write(bytes);
    hasher.finish()
}
