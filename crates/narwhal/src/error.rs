#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("edge #{edge} ({from} -> {to}) references unknown node `{missing}`")]
    UnknownNodeReference {
        edge: usize,
        from: String,
        to: String,
        missing: String,
    },
    #[error("edge #{edge} has invalid weight {weight} (must be finite and > 0)")]
    InvalidWeight { edge: usize, weight: f64 },
    #[error("node `{id}` appears more than once")]
    DuplicateNode { id: String },
    #[error("invalid layout configuration `{field}`: {reason}")]
    InvalidConfiguration { field: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
