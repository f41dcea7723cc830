use super::{instantiate::InstantiateErrorKind, resolve::ResolveErrorKind};

#[derive(thiserror::Error, Debug)]
pub enum WireErrorKind {
    #[error("No bean of type {type_name} found")]
    NoBean { type_name: String },
    #[error("Found {} beans of type {type_name}: {}", candidates.len(), candidates.join(", "))]
    Ambiguous { type_name: String, candidates: Vec<String> },
    #[error("Found cyclic dependency: {path}")]
    Cycle { path: String },
    #[error("{bean} isn't resolved")]
    NotResolved { bean: String },
    #[error("{bean} isn't wired")]
    NotWired { bean: String },
    #[error("{bean} can't be used as {expected}")]
    IncorrectType { bean: String, expected: &'static str },
    #[error("Instantiate {bean} failed: {source}")]
    Instantiate { bean: String, source: InstantiateErrorKind },
    #[error("Init {bean} failed: {source}")]
    Init { bean: String, source: anyhow::Error },
    #[error(transparent)]
    Resolve(#[from] ResolveErrorKind),
}
