use super::export::ExportErrorKind;
use crate::any::TypeInfo;

#[derive(thiserror::Error, Debug)]
pub enum ResolveErrorKind {
    #[error("Condition of {bean} failed: {source}")]
    Condition { bean: String, source: anyhow::Error },
    #[error("{bean} does not implement {interface} interface")]
    NotImplemented { bean: String, interface: TypeInfo },
    #[error("Auto export of {bean} failed: {source}")]
    Export { bean: String, source: ExportErrorKind },
}

impl ResolveErrorKind {
    /// Errors that mean the declared object graph itself is invalid.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Condition { source, .. } => source.downcast_ref::<Self>().is_some_and(Self::is_fatal),
            Self::NotImplemented { .. } | Self::Export { .. } => true,
        }
    }
}
