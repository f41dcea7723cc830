use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tokio_util::sync::CancellationToken;

use crate::{
    bean::{cast_instance, select_single, BeanDefinition},
    errors::WireErrorKind,
    registry::Registry,
    selector::Selector,
    Properties,
};

/// Runtime view of the container, injected as `Inject<Pandora>` once
/// [`Container::open_pandora`](crate::Container::open_pandora) is called.
///
/// Lookups answer from the indices built during refresh. Every bean is resolved before
/// the first one is wired, so a constructor already sees the final set of active beans,
/// but only beans that are wired can be fetched as instances.
/// Once the container is dropped, lookups find nothing.
pub struct Pandora {
    registry: Weak<Mutex<Registry>>,
    properties: Properties,
    context: CancellationToken,
}

impl Pandora {
    pub(crate) fn new(registry: Weak<Mutex<Registry>>, properties: Properties, context: CancellationToken) -> Self {
        Self {
            registry,
            properties,
            context,
        }
    }

    #[inline]
    #[must_use]
    pub fn prop(&self, key: &str) -> Option<&str> {
        self.properties.get(key)
    }

    #[inline]
    #[must_use]
    pub fn has_prop(&self, key: &str) -> bool {
        self.properties.contains(key)
    }

    #[inline]
    #[must_use]
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Context cancelled when the container closes.
    #[inline]
    #[must_use]
    pub fn context(&self) -> CancellationToken {
        self.context.clone()
    }

    #[must_use]
    pub fn find(&self, selector: impl Into<Selector>) -> Vec<Arc<BeanDefinition>> {
        let Some(registry) = self.registry.upgrade() else {
            return Vec::new();
        };
        let found = registry.lock().lookup(&selector.into());
        found
    }

    /// # Errors
    /// Returns [`WireErrorKind`] if there isn't exactly one bean providing `T` or it isn't wired yet.
    pub fn get<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>, WireErrorKind> {
        let bean = select_single::<T>(self.find(Selector::of::<T>()))?;
        cast_instance(&bean)
    }

    /// # Errors
    /// Returns [`WireErrorKind`] if there isn't exactly one bean providing `T` under the name or it isn't wired yet.
    pub fn get_named<T: ?Sized + Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>, WireErrorKind> {
        let bean = select_single::<T>(self.find(Selector::named::<T>(name)))?;
        cast_instance(&bean)
    }

    /// # Errors
    /// Returns [`WireErrorKind`] if one of the beans isn't wired yet.
    pub fn get_all<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Vec<Arc<T>>, WireErrorKind> {
        self.find(Selector::of::<T>()).iter().map(|bean| cast_instance(bean)).collect()
    }
}
