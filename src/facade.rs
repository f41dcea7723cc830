use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::{bean::BeanDefinition, errors::ResolveErrorKind, selector::Selector, Container, Properties};

/// Read-only view of a container that is being refreshed.
#[derive(Clone, Copy)]
pub struct Facade<'c> {
    container: &'c Container,
}

impl<'c> Facade<'c> {
    pub(crate) fn new(container: &'c Container) -> Self {
        Self { container }
    }

    #[inline]
    #[must_use]
    pub fn prop(&self, key: &str) -> Option<&'c str> {
        self.container.properties().get(key)
    }

    #[inline]
    #[must_use]
    pub fn has_prop(&self, key: &str) -> bool {
        self.container.properties().contains(key)
    }

    #[inline]
    #[must_use]
    pub fn properties(&self) -> &'c Properties {
        self.container.properties()
    }

    /// Active beans matching the selector. Unresolved candidates are resolved first.
    ///
    /// # Errors
    /// Returns [`ResolveErrorKind`] if resolving a candidate fails.
    #[inline]
    pub fn find(&self, selector: impl Into<Selector>) -> Result<Vec<Arc<BeanDefinition>>, ResolveErrorKind> {
        self.container.find(selector)
    }

    #[inline]
    #[must_use]
    pub fn context(&self) -> CancellationToken {
        self.container.context()
    }
}
