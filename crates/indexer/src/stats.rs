use serde::{Deserialize, Serialize};

/// Statistics about one extraction run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractStats {
    /// Number of units extracted
    pub files: usize,

    /// Number of graph nodes produced
    pub nodes: usize,

    /// Number of relations produced
    pub relations: usize,

    /// Total lines of source seen
    pub total_lines: usize,

    /// Time taken in milliseconds
    pub time_ms: u64,

    /// Units skipped with the reason; skips are isolated and non-fatal
    pub errors: Vec<String>,
}

impl ExtractStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&mut self, lines: usize) {
        self.files += 1;
        self.total_lines += lines;
    }

    pub fn add_error(&mut self, error: String) {
        self.errors.push(error);
    }
}
