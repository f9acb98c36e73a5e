//! Field norm computation
//!
//! Ranking formulas live in the query engine, not here; the index only
//! asks a [`Similarity`] for one normalization scalar per field, which
//! the read view caches. [`ClassicSimilarity`] is the reference
//! implementation used by the tests and by callers that do not bring
//! their own.

/// Per-field statistics handed to a [`Similarity`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldNormState {
    /// Total tokens ingested into the field.
    pub num_tokens: u32,
    /// Tokens with a zero position increment.
    pub num_overlap_tokens: u32,
    /// Accumulated multiplicative boost.
    pub boost: f32,
}

/// Computes a field's length-normalization value.
///
/// Implementations must be pure: the view caches the result per
/// (field, similarity) pair and only recomputes when either changes.
/// Identity is by reference, so pass the same instance for the cache
/// to hold.
pub trait Similarity {
    fn compute_norm(&self, state: &FieldNormState) -> f32;
}

/// The classic `boost / sqrt(length)` norm.
#[derive(Debug, Clone, Copy)]
pub struct ClassicSimilarity {
    /// Exclude overlapping tokens from the field length.
    pub discount_overlaps: bool,
}

impl Default for ClassicSimilarity {
    fn default() -> Self {
        Self {
            discount_overlaps: true,
        }
    }
}

impl Similarity for ClassicSimilarity {
    #[inline]
    fn compute_norm(&self, state: &FieldNormState) -> f32 {
        let length = if self.discount_overlaps {
            state.num_tokens.saturating_sub(state.num_overlap_tokens)
        } else {
            state.num_tokens
        };
        if length == 0 {
            return 0.0;
        }
        state.boost / (length as f32).sqrt()
    }
}
