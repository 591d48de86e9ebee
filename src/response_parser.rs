//! Reassembles the annotation service's line-oriented response across
//! arbitrary transport chunk boundaries and extracts the consequence-type
//! bucket for each completed line.
//!
//! One reassembly buffer per worker, grown geometrically, never shrunk,
//! bounded by `max_line_size`.

const INITIAL_LINE_CAPACITY: usize = 512;

/// A completed response line paired with the consequence-type bucket it
/// should be demultiplexed into, or dropped if no `SO:` token was found.
pub struct Emission {
    pub line: String,
    pub consequence_type: Option<String>,
}

/// One worker's reassembly state. Exclusively owned by the dispatcher task
/// bound to that worker slot, never shared.
pub struct ResponseParser {
    /// The unterminated suffix of the last partially received line.
    line: String,
    max_line_size: usize,
}

impl ResponseParser {
    /// A fresh parser for one dispatcher task, with no partial line
    /// pending.
    pub fn new() -> Self {
        Self {
            line: String::with_capacity(INITIAL_LINE_CAPACITY),
            max_line_size: INITIAL_LINE_CAPACITY,
        }
    }

    /// Current buffer capacity, exposed for tests asserting growth behavior.
    pub fn max_line_size(&self) -> usize {
        self.max_line_size
    }

    /// Feed a contiguous byte range from the streamed response body.
    ///
    /// Returns one [`Emission`] per completed line found in `data`, plus the
    /// number of bytes actually consumed. A short return (less than
    /// `data.len()`) signals a buffer growth failure; the caller (the
    /// dispatcher) treats that as a failed request.
    pub fn feed(&mut self, data: &[u8]) -> (Vec<Emission>, usize) {
        let mut emissions = Vec::new();
        let mut offset = 0usize;

        while offset < data.len() {
            let remainder = &data[offset..];
            match memchr_newline(remainder) {
                Some(len) => {
                    if !self.grow_for(len) {
                        return (emissions, offset);
                    }
                    self.line.push_str(&String::from_utf8_lossy(&remainder[..len]));
                    let completed = std::mem::replace(
                        &mut self.line,
                        String::with_capacity(self.max_line_size),
                    );
                    let completed = strip_trailing_cr(completed);
                    let consequence_type = extract_consequence_type(&completed);
                    emissions.push(Emission {
                        line: completed,
                        consequence_type,
                    });
                    offset += len + 1; // past the newline
                }
                None => {
                    if !self.grow_for(remainder.len()) {
                        return (emissions, offset);
                    }
                    self.line.push_str(&String::from_utf8_lossy(remainder));
                    strip_trailing_cr_in_place(&mut self.line);
                    offset = data.len();
                }
            }
        }

        (emissions, offset)
    }

    /// Grow `max_line_size` (and implicitly the backing buffer's capacity)
    /// if appending `additional` bytes to `line` would exceed it.
    ///
    /// Returns `false` only on an unrecoverable resize failure. In practice
    /// `String`'s allocator panics rather than returning an error, so this
    /// always returns `true` (kept as a named decision point for a
    /// fallible reallocation).
    fn grow_for(&mut self, additional: usize) -> bool {
        let required = self.line.len() + additional;
        if required > self.max_line_size {
            let mut new_size = self.max_line_size;
            while new_size < required {
                new_size *= 2;
            }
            self.line.reserve(new_size - self.line.len());
            self.max_line_size = new_size;
        }
        true
    }
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new()
    }
}

fn memchr_newline(data: &[u8]) -> Option<usize> {
    data.iter().position(|&b| b == b'\n')
}

fn strip_trailing_cr(mut line: String) -> String {
    strip_trailing_cr_in_place(&mut line);
    line
}

fn strip_trailing_cr_in_place(line: &mut String) {
    if line.ends_with('\r') {
        line.pop();
    }
}

/// Tokenize a completed line on TAB and return the token immediately after
/// the first token beginning with `SO:`, or `None` if no such token exists.
/// The caller drops and logs a line with no match rather than scanning
/// unboundedly.
fn extract_consequence_type(line: &str) -> Option<String> {
    let mut tokens = line.split('\t');
    while let Some(token) = tokens.next() {
        if token.starts_with("SO:") {
            return tokens.next().map(|t| t.to_string());
        }
    }
    None
}
