use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::{assembly::Assembly, dependency_resolver::DependencyResolver, errors::WireErrorKind, Properties};

/// The only bean providing `Dep`, concrete type or exported interface.
pub struct Inject<Dep: ?Sized>(pub Arc<Dep>);

impl<Dep: ?Sized + Send + Sync + 'static> DependencyResolver for Inject<Dep> {
    type Error = WireErrorKind;

    fn resolve(assembly: &mut Assembly<'_>) -> Result<Self, Self::Error> {
        assembly.get().map(Self)
    }
}

/// Every active bean providing `Dep`, in registration order.
pub struct InjectAll<Dep: ?Sized>(pub Vec<Arc<Dep>>);

impl<Dep: ?Sized + Send + Sync + 'static> DependencyResolver for InjectAll<Dep> {
    type Error = WireErrorKind;

    fn resolve(assembly: &mut Assembly<'_>) -> Result<Self, Self::Error> {
        assembly.get_all().map(Self)
    }
}

impl DependencyResolver for Properties {
    type Error = WireErrorKind;

    fn resolve(assembly: &mut Assembly<'_>) -> Result<Self, Self::Error> {
        Ok(assembly.properties().clone())
    }
}

impl DependencyResolver for CancellationToken {
    type Error = WireErrorKind;

    fn resolve(assembly: &mut Assembly<'_>) -> Result<Self, Self::Error> {
        Ok(assembly.context())
    }
}
