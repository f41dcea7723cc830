use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};
use tokio_util::sync::CancellationToken;

use crate::{
    bean::{cast_instance, select_single, BeanDefinition},
    destroyer::Destroyer,
    errors::{SortErrorKind, WireErrorKind},
    facade::Facade,
    selector::Selector,
    sort::sort_triple,
    Container, Properties,
};

/// Wiring context threaded through the injector.
///
/// Tracks the in-progress dependency path and collects destroyers together with
/// the order they must run in.
pub struct Assembly<'c> {
    container: &'c Container,
    stack: Vec<Arc<BeanDefinition>>,
    destroyers: Vec<Destroyer>,
    /// `(dependency, dependent)` for every direct dependency wired
    edges: BTreeSet<(String, String)>,
}

impl<'c> Assembly<'c> {
    pub(crate) fn new(container: &'c Container) -> Self {
        Self {
            container,
            stack: Vec::new(),
            destroyers: Vec::new(),
            edges: BTreeSet::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn facade(&self) -> Facade<'c> {
        Facade::new(self.container)
    }

    #[inline]
    #[must_use]
    pub fn properties(&self) -> &'c Properties {
        self.container.properties()
    }

    #[inline]
    #[must_use]
    pub fn context(&self) -> CancellationToken {
        self.container.context()
    }

    /// The only bean providing `T`, wired on demand.
    ///
    /// # Errors
    /// Returns [`WireErrorKind`] if there isn't exactly one bean or it can't be wired.
    pub fn get<T: ?Sized + Send + Sync + 'static>(&mut self) -> Result<Arc<T>, WireErrorKind> {
        let bean = select_single::<T>(self.container.find(Selector::of::<T>())?)?;
        self.wire_dependency(&bean)?;
        cast_instance(&bean)
    }

    /// # Errors
    /// Returns [`WireErrorKind`] if there isn't exactly one bean with the name or it can't be wired.
    pub fn get_named<T: ?Sized + Send + Sync + 'static>(&mut self, name: &str) -> Result<Arc<T>, WireErrorKind> {
        let bean = select_single::<T>(self.container.find(Selector::named::<T>(name))?)?;
        self.wire_dependency(&bean)?;
        cast_instance(&bean)
    }

    /// Every bean providing `T`, wired on demand.
    ///
    /// # Errors
    /// Returns [`WireErrorKind`] if one of the beans can't be wired.
    pub fn get_all<T: ?Sized + Send + Sync + 'static>(&mut self) -> Result<Vec<Arc<T>>, WireErrorKind> {
        let beans = self.container.find(Selector::of::<T>())?;
        let mut instances = Vec::with_capacity(beans.len());
        for bean in beans {
            self.wire_dependency(&bean)?;
            instances.push(cast_instance(&bean)?);
        }
        Ok(instances)
    }

    /// Wires `bean` with the container's injector.
    ///
    /// # Errors
    /// Returns [`WireErrorKind`] if the injector fails.
    pub fn wire(&mut self, bean: &Arc<BeanDefinition>) -> Result<(), WireErrorKind> {
        let container = self.container;
        container.injector().wire(bean, self)
    }

    fn wire_dependency(&mut self, bean: &Arc<BeanDefinition>) -> Result<(), WireErrorKind> {
        self.wire(bean)?;

        if let Some(dependent) = self.stack.last().filter(|dependent| !Arc::ptr_eq(dependent, bean)) {
            self.edges.insert((bean.id(), dependent.id()));
        }
        Ok(())
    }

    /// Pushes `bean` onto the in-progress path.
    #[inline]
    pub fn enter(&mut self, bean: &Arc<BeanDefinition>) {
        self.stack.push(bean.clone());
    }

    #[inline]
    pub fn leave(&mut self) {
        self.stack.pop();
    }

    /// Whether `bean` is somewhere on the in-progress path.
    #[must_use]
    pub fn is_entered(&self, bean: &Arc<BeanDefinition>) -> bool {
        self.stack.iter().any(|entered| Arc::ptr_eq(entered, bean))
    }

    /// In-progress path, outermost bean first.
    #[must_use]
    pub fn path(&self) -> String {
        self.stack.iter().map(|bean| bean.to_string()).collect::<Vec<_>>().join(" => ")
    }

    /// Records the destroyer of a freshly wired bean.
    pub fn add_destroyer(&mut self, bean: &Arc<BeanDefinition>) {
        if !bean.has_destroy() {
            return;
        }
        let destroyer = Destroyer::new(bean.clone());
        if self.destroyers.iter().all(|known| known.id() != destroyer.id()) {
            self.destroyers.push(destroyer);
        }
    }

    /// Destroyers ordered so that each one runs after every bean depending on it,
    /// directly or through beans without a destroyer.
    pub(crate) fn into_destroyers(mut self) -> Result<Vec<Destroyer>, SortErrorKind> {
        let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for (dependency, dependent) in &self.edges {
            dependents.entry(dependency.as_str()).or_default().push(dependent.as_str());
        }

        for destroyer in &mut self.destroyers {
            let mut pending = vec![destroyer.id().to_owned()];
            let mut seen = BTreeSet::new();
            while let Some(id) = pending.pop() {
                for dependent in dependents.get(id.as_str()).into_iter().flatten() {
                    if seen.insert(*dependent) {
                        pending.push((*dependent).to_owned());
                    }
                }
            }
            for dependent in seen {
                if dependent != destroyer.id() {
                    destroyer.run_after(dependent.to_owned());
                }
            }
        }
        sort_triple(self.destroyers)
    }
}
