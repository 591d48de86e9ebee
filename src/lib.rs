//! Variant Effect Annotator
//!
//! Annotates genomic variants read from a VCF file against a remote
//! variant-consequence web service, demultiplexing the returned annotations
//! into one output file per consequence-type category while maintaining
//! aggregate counts. Built for batch use on large VCF inputs.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use variant_effect_annotator::config::Config;
//! use variant_effect_annotator::pipeline::Pipeline;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (config, filter_chain) = Config::load(&PathBuf::from("effect-annotate.toml"))?;
//! let pipeline = Pipeline::builder(config, PathBuf::from("input.vcf"))
//!     .filter_chain(filter_chain)
//!     .build()?;
//! let summary = pipeline.run()?;
//! println!("processed {} batches", summary.batches_processed);
//! # Ok(())
//! # }
//! ```

pub mod chunk;
pub mod cli;
pub mod client;
pub mod config;
pub mod demux;
pub mod dispatch;
pub mod error;
pub mod filter;
pub mod pipeline;
pub mod queue;
pub mod response_parser;
pub mod vcf;
pub mod writer;

pub use client::{Client, ClientBuilder};
pub use config::Config;
pub use error::{AnnotatorError, ConfigError, DispatchError, VcfReadError};
pub use filter::{Filter, FilterChain, PassFilter, QualFilter, RegionFilter};
pub use pipeline::{Pipeline, PipelineBuilder, RunSummary};
pub use vcf::{VcfReader, VcfRecord};
