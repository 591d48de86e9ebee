//! A minimal VCF reader providing the batched-read contract this pipeline
//! needs: not a full-fidelity genomics parser, just enough of each record
//! (chromosome, position, reference, alternate, and the raw line) to drive
//! the pipeline and let the Filtered Writer reproduce records byte-for-byte.

use crate::error::VcfReadError;
use std::io::{BufRead, BufReader};

/// A single VCF data-line record.
#[derive(Debug, Clone)]
pub struct VcfRecord {
    pub chromosome: String,
    pub position: u64,
    pub id: String,
    pub reference: String,
    pub alternate: String,
    pub quality: Option<f64>,
    pub filter: String,
    pub info: String,
    /// The line exactly as read from the file, minus the trailing newline.
    /// Used for write-back by the Filtered Writer.
    pub raw_line: String,
}

/// An ordered, bounded sequence of VCF records moving through the pipeline
/// as one unit.
pub type Batch = Vec<VcfRecord>;

/// Reads VCF records in bounded batches from a file.
///
/// Owns the file header (the leading `##`/`#CHROM` lines), captured once at
/// open time and available via [`VcfReader::header`].
pub struct VcfReader {
    reader: BufReader<std::fs::File>,
    header: Vec<String>,
    line_no: u64,
    /// The first data line, read while scanning past the header, held until
    /// the first `read_batch` call since `BufReader` has no cheap rewind.
    pending: Option<(String, u64)>,
}

impl VcfReader {
    /// Open a VCF file, capturing its header.
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, VcfReadError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| VcfReadError::Open {
            path: path.display().to_string(),
            source,
        })?;
        let mut reader = BufReader::new(file);
        let mut header = Vec::new();
        let mut line_no = 0u64;
        let mut pending = None;

        loop {
            let mut line = String::new();
            let bytes_read = reader.read_line(&mut line)?;
            if bytes_read == 0 {
                // Header-only (or empty) file.
                break;
            }
            line_no += 1;
            let trimmed = line.trim_end_matches(['\n', '\r']).to_string();
            if let Some(stripped) = trimmed.strip_prefix('#') {
                header.push(trimmed.clone());
                if !stripped.starts_with('#') {
                    // The `#CHROM...` column header line ends the header.
                    break;
                }
            } else {
                pending = Some((trimmed, line_no));
                break;
            }
        }

        Ok(Self {
            reader,
            header,
            line_no,
            pending,
        })
    }

    /// The captured VCF header lines, replayed verbatim by the Filtered
    /// Writer before the first record.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Read up to `batch_size` records, or fewer at EOF.
    ///
    /// Returns an empty `Vec` (not an error) once the file is exhausted.
    /// A batch may also come back shorter than `batch_size` at EOF.
    pub fn read_batch(&mut self, batch_size: usize) -> Result<Batch, VcfReadError> {
        let mut batch = Vec::with_capacity(batch_size);

        if let Some((pending_line, pending_line_no)) = self.pending.take() {
            if let Some(record) = self.parse_line(&pending_line, pending_line_no)? {
                batch.push(record);
            }
        }

        while batch.len() < batch_size {
            let mut line = String::new();
            let bytes_read = self.reader.read_line(&mut line)?;
            if bytes_read == 0 {
                break;
            }
            self.line_no += 1;
            let trimmed = line.trim_end_matches(['\n', '\r']);
            if trimmed.is_empty() {
                continue;
            }
            if let Some(record) = self.parse_line(trimmed, self.line_no)? {
                batch.push(record);
            }
        }

        Ok(batch)
    }

    fn parse_line(&self, line: &str, line_no: u64) -> Result<Option<VcfRecord>, VcfReadError> {
        if line.is_empty() {
            return Ok(None);
        }
        let mut fields = line.split('\t');
        let chromosome = fields.next().ok_or_else(|| VcfReadError::Malformed {
            line: line_no,
            reason: "missing CHROM column".to_string(),
        })?;
        let pos_str = fields.next().ok_or_else(|| VcfReadError::Malformed {
            line: line_no,
            reason: "missing POS column".to_string(),
        })?;
        let position = pos_str.parse::<u64>().map_err(|_| VcfReadError::Malformed {
            line: line_no,
            reason: format!("POS `{pos_str}` is not a valid integer"),
        })?;
        let id = fields.next().unwrap_or(".");
        let reference = fields.next().ok_or_else(|| VcfReadError::Malformed {
            line: line_no,
            reason: "missing REF column".to_string(),
        })?;
        let alternate = fields.next().ok_or_else(|| VcfReadError::Malformed {
            line: line_no,
            reason: "missing ALT column".to_string(),
        })?;
        let qual_str = fields.next().unwrap_or(".");
        let quality = if qual_str == "." {
            None
        } else {
            qual_str.parse::<f64>().ok()
        };
        let filter = fields.next().unwrap_or(".");
        let info = fields.next().unwrap_or(".");

        Ok(Some(VcfRecord {
            chromosome: chromosome.to_string(),
            position,
            id: id.to_string(),
            reference: reference.to_string(),
            alternate: alternate.to_string(),
            quality,
            filter: filter.to_string(),
            info: info.to_string(),
            raw_line: line.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_vcf(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("create temp vcf");
        file.write_all(contents.as_bytes()).expect("write temp vcf");
        file
    }

    #[test]
    fn captures_header_and_first_batch() {
        let file = write_vcf(
            "##fileformat=VCFv4.2\n\
             ##INFO=<ID=DP,Number=1,Type=Integer,Description=\"Depth\">\n\
             #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n\
             1\t100\trs1\tA\tG\t50.0\tPASS\tDP=10\n\
             1\t200\trs2\tC\tT\t.\t.\tDP=5\n",
        );
        let mut reader = VcfReader::open(file.path().to_str().unwrap()).unwrap();
        assert_eq!(reader.header().len(), 3);
        assert_eq!(reader.header()[2], "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO");

        let batch = reader.read_batch(10).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].chromosome, "1");
        assert_eq!(batch[0].position, 100);
        assert_eq!(batch[0].quality, Some(50.0));
        assert_eq!(batch[1].quality, None);
    }

    #[test]
    fn respects_batch_size_boundary() {
        let file = write_vcf(
            "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n\
             1\t1\t.\tA\tG\t.\t.\t.\n\
             1\t2\t.\tA\tG\t.\t.\t.\n\
             1\t3\t.\tA\tG\t.\t.\t.\n",
        );
        let mut reader = VcfReader::open(file.path().to_str().unwrap()).unwrap();

        let first = reader.read_batch(2).unwrap();
        assert_eq!(first.len(), 2);

        let second = reader.read_batch(2).unwrap();
        assert_eq!(second.len(), 1);

        let third = reader.read_batch(2).unwrap();
        assert!(third.is_empty());
    }

    #[test]
    fn rejects_malformed_position() {
        let file = write_vcf(
            "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n\
             1\tnotanumber\t.\tA\tG\t.\t.\t.\n",
        );
        let mut reader = VcfReader::open(file.path().to_str().unwrap()).unwrap();
        let err = reader.read_batch(10).unwrap_err();
        assert!(matches!(err, VcfReadError::Malformed { line: 2, .. }));
    }
}
