//! The Output Demultiplexer: routes each emitted response line to its
//! per-consequence-type file while maintaining counts, plus the combined
//! `all_variants.txt` output.
//!
//! The consequence-type table, counter table, and the `all_variants`/
//! `summary` handles are bundled into a single mutex-guarded value,
//! [`DemuxContext`], threaded explicitly through the worker pool rather than
//! held as process-wide globals. `all_variants` and `summary` are modeled
//! as dedicated fields rather than table entries, and the consequence-type
//! table is keyed once on a lowercased string.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::AnnotatorError;

struct TypeEntry {
    file: File,
    count: u64,
}

struct Shared {
    types: HashMap<String, TypeEntry>,
    all_variants: File,
}

/// Shared, mutex-guarded demultiplexing state for one run.
///
/// Cheap to clone (an `Arc` around the guarded state) so every dispatcher
/// task can hold its own handle.
#[derive(Clone)]
pub struct DemuxContext {
    shared: std::sync::Arc<Mutex<Shared>>,
    output_directory: PathBuf,
}

impl DemuxContext {
    /// Open `all_variants.txt` under `output_directory` and start with an
    /// empty consequence-type table.
    pub fn new(output_directory: impl AsRef<Path>) -> Result<Self, AnnotatorError> {
        let output_directory = output_directory.as_ref().to_path_buf();
        let all_variants_path = output_directory.join("all_variants.txt");
        let all_variants = open_append(&all_variants_path)?;

        Ok(Self {
            shared: std::sync::Arc::new(Mutex::new(Shared {
                types: HashMap::new(),
                all_variants,
            })),
            output_directory,
        })
    }

    /// Record one emitted response line.
    ///
    /// Always appends to `all_variants.txt`. If `consequence_type` is
    /// `None` (no `SO:` token found), the line is dropped from the per-type
    /// routing but still lands in the combined file.
    ///
    /// A file-open failure for a newly seen type is logged and the line is
    /// dropped for that type's bucket; the run continues.
    pub fn record(&self, line: &str, consequence_type: Option<&str>) {
        let mut shared = self.shared.lock();

        if let Err(err) = writeln!(shared.all_variants, "{line}") {
            tracing::error!(error = %err, "failed to append to all_variants.txt");
        }

        let Some(consequence_type) = consequence_type else {
            tracing::debug!("response line had no SO: token, dropping from per-type routing");
            return;
        };
        let key = consequence_type.to_lowercase();

        if !shared.types.contains_key(&key) {
            let path = self.output_directory.join(format!("{key}.txt"));
            match open_append(&path) {
                Ok(file) => {
                    shared.types.insert(key.clone(), TypeEntry { file, count: 0 });
                }
                Err(err) => {
                    tracing::error!(error = %err, type = %key, "failed to open per-type output file, dropping line");
                    return;
                }
            }
        }

        let entry = shared.types.get_mut(&key).expect("just inserted or already present");
        if let Err(err) = writeln!(entry.file, "{line}") {
            tracing::error!(error = %err, type = %key, "failed to append to per-type output file");
            return;
        }
        entry.count += 1;
    }

    /// Write `summary.txt`: one `<type>\t<count>\n` row per observed
    /// consequence type. Row order is unspecified.
    pub fn write_summary(&self) -> Result<(), AnnotatorError> {
        let shared = self.shared.lock();
        let summary_path = self.output_directory.join("summary.txt");
        let mut summary = open_truncate(&summary_path)?;
        for (consequence_type, entry) in shared.types.iter() {
            writeln!(summary, "{consequence_type}\t{}", entry.count)
                .map_err(|source| AnnotatorError::OutputWrite {
                    path: summary_path.display().to_string(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Snapshot of observed counts, used by tests and by the summary
    /// writer's caller for logging a final tally.
    pub fn counts(&self) -> HashMap<String, u64> {
        let shared = self.shared.lock();
        shared.types.iter().map(|(k, v)| (k.clone(), v.count)).collect()
    }
}

fn open_append(path: &Path) -> Result<File, AnnotatorError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| AnnotatorError::OutputOpen {
            path: path.display().to_string(),
            source,
        })
}

fn open_truncate(path: &Path) -> Result<File, AnnotatorError> {
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .map_err(|source| AnnotatorError::OutputOpen {
            path: path.display().to_string(),
            source,
        })
}
