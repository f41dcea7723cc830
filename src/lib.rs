#[macro_use]
pub(crate) mod macros;

pub(crate) mod any;
pub(crate) mod assembly;
pub(crate) mod bean;
pub mod composition;
pub mod cond;
pub(crate) mod configer;
pub(crate) mod container;
pub(crate) mod dependency_resolver;
pub(crate) mod destroyer;
pub(crate) mod errors;
pub(crate) mod facade;
pub(crate) mod inject;
pub(crate) mod injector;
pub(crate) mod instantiator;
pub(crate) mod pandora;
pub(crate) mod properties;
pub(crate) mod registry;
pub(crate) mod selector;
pub mod sort;
pub(crate) mod state;
pub(crate) mod supervisor;

pub use any::TypeInfo;
pub use assembly::Assembly;
pub use bean::{Bean, BeanDefinition, BeanMut, BeanStatus};
pub use composition::{Composite, Composition, Field};
pub use cond::Condition;
pub use configer::{ConfigMut, Configurer};
pub use container::Container;
pub use dependency_resolver::DependencyResolver;
pub use errors::{
    ExportErrorKind, InstantiateErrorKind, InstantiatorErrorKind, PropertiesErrorKind, RefreshErrorKind, ResolveErrorKind,
    SortErrorKind, WireErrorKind,
};
pub use facade::Facade;
pub use inject::{Inject, InjectAll};
pub use injector::{DefaultInjector, Injector};
pub use instantiator::Instantiator;
pub use pandora::Pandora;
pub use properties::{Format, Properties};
pub use selector::Selector;
pub use state::RefreshState;

pub use tokio_util::sync::CancellationToken;
