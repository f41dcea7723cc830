mod export;
mod instantiate;
mod instantiator;
mod properties;
mod refresh;
mod resolve;
mod sort;
mod wire;

pub use export::ExportErrorKind;
pub use instantiate::InstantiateErrorKind;
pub use instantiator::InstantiatorErrorKind;
pub use properties::PropertiesErrorKind;
pub use refresh::RefreshErrorKind;
pub use resolve::ResolveErrorKind;
pub use sort::SortErrorKind;
pub use wire::WireErrorKind;
