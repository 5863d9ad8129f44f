use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug)]
pub enum GraphError {
    /// The front-end produced no usable tree for a unit. The unit is skipped
    /// and reported; the run continues.
    #[error("unparseable unit: {0}")]
    UnparseableUnit(String),
}
