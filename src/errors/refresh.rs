use super::{resolve::ResolveErrorKind, sort::SortErrorKind, wire::WireErrorKind};

#[derive(thiserror::Error, Debug)]
pub enum RefreshErrorKind {
    #[error(transparent)]
    Resolve(#[from] ResolveErrorKind),
    #[error("Ordering failed: {0}")]
    Sort(#[from] SortErrorKind),
    #[error("Configuration {name} failed: {source}")]
    Configuration { name: String, source: anyhow::Error },
    #[error("Wiring failed at {path}: {source}")]
    Wire { path: String, source: WireErrorKind },
}
