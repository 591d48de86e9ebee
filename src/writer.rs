//! The Filtered Writer: writes passed and failed sub-batches verbatim to
//! two companion VCF files.
//!
//! Only active when `output_filename` is configured. A buffered `File` is
//! opened at startup for each side, written to per batch, and flushed on
//! shutdown.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::AnnotatorError;
use crate::vcf::VcfRecord;

/// Writes the passed-record and failed-record companion VCF files for one
/// run.
pub struct FilteredWriter {
    passed: BufWriter<File>,
    passed_path: String,
    failed: BufWriter<File>,
    failed_path: String,
    header_written: bool,
}

impl FilteredWriter {
    /// Open `<output_directory>/<output_filename>` and
    /// `<output_directory>/<output_filename>.filtered`.
    pub fn open(output_directory: &Path, output_filename: &str) -> Result<Self, AnnotatorError> {
        let passed_path = output_directory.join(output_filename);
        let failed_path = output_directory.join(format!("{output_filename}.filtered"));

        let passed = File::create(&passed_path).map_err(|source| AnnotatorError::OutputOpen {
            path: passed_path.display().to_string(),
            source,
        })?;
        let failed = File::create(&failed_path).map_err(|source| AnnotatorError::OutputOpen {
            path: failed_path.display().to_string(),
            source,
        })?;

        Ok(Self {
            passed: BufWriter::new(passed),
            passed_path: passed_path.display().to_string(),
            failed: BufWriter::new(failed),
            failed_path: failed_path.display().to_string(),
            header_written: false,
        })
    }

    /// Write the VCF header to both files. Called once, before the first
    /// batch.
    pub fn write_header(&mut self, header: &[String]) -> Result<(), AnnotatorError> {
        for line in header {
            writeln!(self.passed, "{line}").map_err(|source| self.write_err(true, source))?;
            writeln!(self.failed, "{line}").map_err(|source| self.write_err(false, source))?;
        }
        self.header_written = true;
        Ok(())
    }

    /// Append one batch's passed and failed records, preserving intra-batch
    /// order.
    pub fn write_batch(&mut self, passed: &[VcfRecord], failed: &[VcfRecord]) -> Result<(), AnnotatorError> {
        debug_assert!(self.header_written, "header must be written before the first batch");
        for record in passed {
            writeln!(self.passed, "{}", record.raw_line).map_err(|source| self.write_err(true, source))?;
        }
        for record in failed {
            writeln!(self.failed, "{}", record.raw_line).map_err(|source| self.write_err(false, source))?;
        }
        Ok(())
    }

    /// Flush both buffered writers. Called at shutdown; also happens
    /// implicitly on drop, but explicit flushing lets errors surface.
    pub fn flush(&mut self) -> Result<(), AnnotatorError> {
        self.passed.flush().map_err(|source| self.write_err(true, source))?;
        self.failed.flush().map_err(|source| self.write_err(false, source))?;
        Ok(())
    }

    fn write_err(&self, passed_side: bool, source: std::io::Error) -> AnnotatorError {
        let path = if passed_side { &self.passed_path } else { &self.failed_path };
        AnnotatorError::OutputWrite {
            path: path.clone(),
            source,
        }
    }
}
