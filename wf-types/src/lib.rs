//! Types shared by the wavefront aligner crates.
//!
//! - `Cost`, `Seq` and `Sequence` aliases.
//! - The `ScoringModel`, with its precomputed transition table.
//! - The run-length `Cigar`.
//! - The crate-wide `Error`.
//! - The `Aligner` trait.

pub mod cigar;
pub mod error;
pub mod scoring;

// Re-export types for convenience of `use wf_types::*;`.
pub use cigar::*;
pub use error::*;
pub use scoring::*;

/// Scores and penalties. Always non-negative for a valid model.
pub type Cost = i32;

/// A borrowed sequence.
pub type Seq<'a> = &'a [u8];

/// An owned sequence.
pub type Sequence = Vec<u8>;

pub fn seq_to_string(seq: Seq) -> String {
    String::from_utf8_lossy(seq).into_owned()
}

/// Aligns two sequences end-to-end. Implemented by the aligner crates and used
/// by the shared test harness.
pub trait Aligner {
    fn align(&mut self, a: Seq, b: Seq) -> Result<(Cost, Cigar)>;
}

/// Sequences longer than this can not be indexed by the `i32` offsets of the engine.
pub const MAX_SEQ_LEN: usize = (i32::MAX / 4) as usize;
