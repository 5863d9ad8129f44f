//! # Codegraph Indexer
//!
//! Project-level extraction for the codegraph symbol graph.
//!
//! ## Pipeline
//!
//! ```text
//! Directory
//!     │
//!     ├──> File Scanner (.gitignore aware)
//!     │      └─> Python units
//!     │
//!     ├──> Parser (tree-sitter, per unit)
//!     │      └─> Syntax trees
//!     │
//!     └──> codegraph-graph (isolated per unit)
//!            └─> merged qualified-name map
//! ```

mod error;
mod indexer;
mod scanner;
mod stats;

pub use error::{IndexerError, Result};
pub use indexer::{module_qualified_name, ExtractOutput, ProjectExtractor};
pub use scanner::FileScanner;
pub use stats::ExtractStats;
