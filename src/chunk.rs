//! Splits a passed sub-batch into fixed-size request chunks.

use crate::vcf::VcfRecord;

/// A contiguous, ordered slice of a passed sub-batch sized for one HTTP
/// request.
pub type Chunk<'a> = &'a [VcfRecord];

/// Partition `records` into chunks of at most `max_chunk_size` records each.
///
/// The k-th chunk starts at index `k * max_chunk_size`; the last chunk may
/// be shorter. Order within and across chunks matches the input order (only
/// dispatch, not construction, is unordered; see the Request Dispatcher).
///
/// Returns an empty `Vec` for an empty input, never a chunk of length 0.
pub fn chunks(records: &[VcfRecord], max_chunk_size: usize) -> Vec<Chunk<'_>> {
    assert!(max_chunk_size > 0, "max_chunk_size must be at least 1");
    records.chunks(max_chunk_size).collect()
}
