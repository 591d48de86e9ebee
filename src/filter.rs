//! The filter chain applied to each batch before it is dispatched.
//!
//! Callers supply filters; this module only sequences them and partitions
//! each batch into kept and dropped records.

use crate::vcf::VcfRecord;

/// A single predicate a variant record must pass to continue through the
/// pipeline.
pub trait Filter: Send + Sync {
    /// Return `true` to keep the record, `false` to drop it.
    fn keep(&self, record: &VcfRecord) -> bool;

    /// A short name used in logging when a filter rejects records.
    fn name(&self) -> &str;
}

/// Keeps only records whose `FILTER` column is `PASS` or `.`.
pub struct PassFilter;

impl Filter for PassFilter {
    fn keep(&self, record: &VcfRecord) -> bool {
        record.filter == "PASS" || record.filter == "."
    }

    fn name(&self) -> &str {
        "pass"
    }
}

/// Keeps only records with `QUAL >= min_qual`. Records with no `QUAL`
/// value (`.`) are dropped, since there is nothing to compare.
pub struct QualFilter {
    pub min_qual: f64,
}

impl Filter for QualFilter {
    fn keep(&self, record: &VcfRecord) -> bool {
        matches!(record.quality, Some(q) if q >= self.min_qual)
    }

    fn name(&self) -> &str {
        "qual"
    }
}

/// Keeps only records whose chromosome is in an explicit allow-list.
pub struct RegionFilter {
    pub chromosomes: Vec<String>,
}

impl Filter for RegionFilter {
    fn keep(&self, record: &VcfRecord) -> bool {
        self.chromosomes.iter().any(|c| c == &record.chromosome)
    }

    fn name(&self) -> &str {
        "region"
    }
}

/// An ordered sequence of filters; a record must pass every stage to be
/// kept.
pub struct FilterChain {
    stages: Vec<Box<dyn Filter>>,
}

impl FilterChain {
    /// A chain with no filters keeps every record.
    pub fn empty() -> Self {
        Self { stages: Vec::new() }
    }

    /// Start building a chain.
    pub fn builder() -> FilterChainBuilder {
        FilterChainBuilder::new()
    }

    /// Split a batch into (kept, dropped) according to every stage in
    /// order, short-circuiting at the first failing filter per record.
    pub fn partition(&self, records: Vec<VcfRecord>) -> (Vec<VcfRecord>, Vec<VcfRecord>) {
        let mut kept = Vec::with_capacity(records.len());
        let mut dropped = Vec::new();
        for record in records {
            if self.stages.iter().all(|stage| stage.keep(&record)) {
                kept.push(record);
            } else {
                dropped.push(record);
            }
        }
        (kept, dropped)
    }
}

/// Builder for assembling a [`FilterChain`] from individual stages.
#[must_use = "builders do nothing unless you call .build()"]
pub struct FilterChainBuilder {
    stages: Vec<Box<dyn Filter>>,
}

impl FilterChainBuilder {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Append a filter stage to the end of the chain.
    pub fn stage(mut self, filter: Box<dyn Filter>) -> Self {
        self.stages.push(filter);
        self
    }

    pub fn build(self) -> FilterChain {
        FilterChain { stages: self.stages }
    }
}

impl Default for FilterChainBuilder {
    fn default() -> Self {
        Self::new()
    }
}
