use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexerError>;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Graph error: {0}")]
    Graph(#[from] codegraph_graph::GraphError),

    #[error("Invalid project path: {0}")]
    InvalidPath(String),

    #[error("Failed to load grammar: {0}")]
    Language(String),
}
