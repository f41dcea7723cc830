use parking_lot::Mutex;
use std::{collections::BTreeSet, mem, path::Path, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span};

use crate::{
    assembly::Assembly,
    bean::{cast_instance, select_single, Bean, BeanDefinition, BeanMut, BeanStatus},
    composition::auto_export,
    configer::{ConfigMut, Configer, Configurer},
    dependency_resolver::DependencyResolver,
    destroyer::Destroyer,
    errors::{InstantiateErrorKind, InstantiatorErrorKind, PropertiesErrorKind, RefreshErrorKind, ResolveErrorKind, WireErrorKind},
    facade::Facade,
    injector::{DefaultInjector, Injector},
    instantiator::Instantiator,
    pandora::Pandora,
    registry::Registry,
    selector::Selector,
    sort::sort_triple,
    state::RefreshState,
    supervisor::Supervisor,
    Properties,
};

/// Bean container.
///
/// Beans and configuration functions are registered first, then [`Container::refresh`]
/// decides which beans are active, indexes them, runs configuration functions and wires every bean.
/// [`Container::close`] stops supervised tasks and runs destroyers.
pub struct Container {
    state: RefreshState,
    properties: Properties,
    pending: Vec<BeanDefinition>,
    registry: Arc<Mutex<Registry>>,
    configers: Vec<Configer>,
    destroyers: Mutex<Vec<Destroyer>>,
    injector: Box<dyn Injector>,
    supervisor: Supervisor,
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Container {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_injector(DefaultInjector)
    }

    /// Container that wires beans with a custom mechanism.
    #[must_use]
    pub fn with_injector(injector: impl Injector) -> Self {
        Self {
            state: RefreshState::Unrefreshed,
            properties: Properties::new(),
            pending: Vec::new(),
            registry: Arc::default(),
            configers: Vec::new(),
            destroyers: Mutex::new(Vec::new()),
            injector: Box::new(injector),
            supervisor: Supervisor::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> RefreshState {
        self.state
    }

    #[inline]
    #[must_use]
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// # Errors
    /// Returns [`PropertiesErrorKind`] if the file can't be read or parsed.
    ///
    /// # Panics
    /// Panics if refresh has already begun.
    #[track_caller]
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<(), PropertiesErrorKind> {
        self.state.expect_unrefreshed("load");
        self.properties.load(path)
    }

    /// # Panics
    /// Panics if refresh has already begun.
    #[track_caller]
    pub fn property(&mut self, key: impl Into<String>, value: impl ToString) {
        self.state.expect_unrefreshed("property");
        self.properties.set(key, value);
    }

    /// Registers a value built outside the container.
    ///
    /// # Panics
    /// Panics if refresh has already begun.
    #[track_caller]
    pub fn object<T: Send + Sync + 'static>(&mut self, value: T) -> BeanMut<'_, T> {
        self.register(Bean::object(value))
    }

    /// Registers a bean built by `instantiator` from the dependencies it asks for.
    ///
    /// # Panics
    /// Panics if refresh has already begun.
    #[track_caller]
    pub fn provide<Inst, Deps>(&mut self, instantiator: Inst) -> BeanMut<'_, Inst::Provides>
    where
        Inst: Instantiator<Deps>,
        Deps: DependencyResolver + 'static,
    {
        self.register(Bean::provide(instantiator))
    }

    /// # Panics
    /// Panics if refresh has already begun.
    #[track_caller]
    pub fn register<T: Send + Sync + 'static>(&mut self, bean: Bean<T>) -> BeanMut<'_, T> {
        self.state.expect_unrefreshed("register");
        self.pending.push(bean.into_definition());
        let last = self.pending.len() - 1;
        BeanMut::new(&mut self.pending[last])
    }

    /// Registers a [`Pandora`], giving beans a runtime view of this container.
    ///
    /// # Panics
    /// Panics if refresh has already begun.
    #[track_caller]
    pub fn open_pandora(&mut self) -> BeanMut<'_, Pandora> {
        let registry = Arc::downgrade(&self.registry);
        self.provide(move |properties: Properties, context: CancellationToken| {
            Ok::<_, InstantiateErrorKind>(Pandora::new(registry.clone(), properties, context))
        })
    }

    /// Registers a configuration function, run during refresh before beans are wired.
    ///
    /// # Panics
    /// Panics if refresh has already begun.
    #[track_caller]
    pub fn config<C, Deps>(&mut self, configurer: C) -> ConfigMut<'_>
    where
        C: Configurer<Deps>,
        Deps: DependencyResolver + 'static,
    {
        self.state.expect_unrefreshed("config");
        self.configers.push(Configer::new(configurer));
        let last = self.configers.len() - 1;
        ConfigMut::new(&mut self.configers[last])
    }

    /// Resolves, configures and wires the registered beans.
    ///
    /// # Errors
    /// Returns [`RefreshErrorKind`] if a condition, a configuration function or wiring fails,
    /// or if configuration functions can't be ordered.
    ///
    /// # Panics
    /// - Panics if called more than once.
    /// - Panics if two beans share an identity.
    /// - Panics if the declared graph is invalid: a declared export that isn't implemented,
    ///   or an invalid composition.
    pub fn refresh(&mut self) -> Result<(), RefreshErrorKind> {
        self.state.begin_refresh();

        let span = info_span!("refresh", beans = self.pending.len(), configs = self.configers.len());
        let _guard = span.enter();

        let definitions = mem::take(&mut self.pending);
        self.registry.lock().build_identity_index(definitions);

        match self.refresh_inner() {
            Ok(()) => {
                self.state.complete_refresh();
                info!("Container refreshed");
                Ok(())
            }
            Err(RefreshErrorKind::Resolve(err)) if err.is_fatal() => panic!("{err}"),
            Err(err) => {
                error!(%err, "Refresh failed");
                Err(err)
            }
        }
    }

    fn refresh_inner(&mut self) -> Result<(), RefreshErrorKind> {
        self.resolve_beans()?;
        debug!("Beans resolved");

        let configers = mem::take(&mut self.configers);
        let configers = self.resolve_configers(configers)?;

        let mut assembly = Assembly::new(self);
        Self::run_configers(configers, &mut assembly)?;
        debug!("Configurations applied");

        let beans = self.registry.lock().active().cloned().collect::<Vec<_>>();
        for bean in &beans {
            assembly.wire(bean).map_err(|source| {
                let path = assembly.path();
                error!(%path, "Wiring interrupted");
                RefreshErrorKind::Wire { path, source }
            })?;
        }
        debug!("Beans wired");

        let destroyers = assembly.into_destroyers()?;
        *self.destroyers.get_mut() = destroyers;
        Ok(())
    }

    fn resolve_beans(&self) -> Result<(), ResolveErrorKind> {
        let beans = self.registry.lock().beans().to_vec();
        for bean in &beans {
            self.resolve_bean(bean)?;
        }
        Ok(())
    }

    /// Decides whether `bean` is active and indexes it.
    /// A bean that is already being resolved is left alone, the caller sees it as missing.
    fn resolve_bean(&self, bean: &Arc<BeanDefinition>) -> Result<(), ResolveErrorKind> {
        if !bean.begin_resolving() {
            return Ok(());
        }

        let facade = Facade::new(self);
        for condition in bean.conditions() {
            let matched = condition.matches(&facade).map_err(|source| ResolveErrorKind::Condition {
                bean: bean.to_string(),
                source,
            })?;
            if !matched {
                self.registry.lock().remove(bean);
                bean.set_status(BeanStatus::Deleted);
                debug!(bean = %bean, "Condition not matched, bean deleted");
                return Ok(());
            }
        }

        let mut exports = BTreeSet::new();
        if let Some(composition) = bean.composition() {
            auto_export(&composition(), &mut exports).map_err(|source| ResolveErrorKind::Export {
                bean: bean.description(),
                source,
            })?;
        }
        exports.extend(bean.declared_exports().iter().copied());

        if let Some(interface) = exports.iter().find(|export| !bean.implements(export)) {
            return Err(ResolveErrorKind::NotImplemented {
                bean: bean.description(),
                interface: *interface,
            });
        }

        self.registry.lock().index(bean, &exports);
        bean.complete_resolving(exports);
        Ok(())
    }

    fn resolve_configers(&self, configers: Vec<Configer>) -> Result<Vec<Configer>, RefreshErrorKind> {
        let facade = Facade::new(self);

        let mut active = Vec::with_capacity(configers.len());
        'configers: for configer in configers {
            for condition in configer.conditions() {
                let matched = condition.matches(&facade).map_err(|source| ResolveErrorKind::Condition {
                    bean: configer.name().to_owned(),
                    source,
                })?;
                if !matched {
                    debug!(config = configer.name(), "Condition not matched, configuration skipped");
                    continue 'configers;
                }
            }
            active.push(configer);
        }

        Ok(sort_triple(active)?)
    }

    fn run_configers(configers: Vec<Configer>, assembly: &mut Assembly<'_>) -> Result<(), RefreshErrorKind> {
        for mut configer in configers {
            configer.run(assembly).map_err(|err| match err {
                InstantiatorErrorKind::Deps(source) => RefreshErrorKind::Wire {
                    path: configer.name().to_owned(),
                    source,
                },
                InstantiatorErrorKind::Factory(source) => RefreshErrorKind::Configuration {
                    name: configer.name().to_owned(),
                    source,
                },
            })?;
        }
        Ok(())
    }

    pub(crate) fn injector(&self) -> &dyn Injector {
        &*self.injector
    }

    /// Active beans matching the selector.
    ///
    /// While refreshing, unresolved candidates are resolved on demand and beans that are
    /// being resolved are skipped. Once refreshed, the answer comes from the indices.
    ///
    /// # Errors
    /// Returns [`ResolveErrorKind`] if resolving a candidate fails.
    ///
    /// # Panics
    /// Panics if refresh hasn't begun.
    #[track_caller]
    pub fn find(&self, selector: impl Into<Selector>) -> Result<Vec<Arc<BeanDefinition>>, ResolveErrorKind> {
        self.state.expect_refreshing("find");
        let selector = selector.into();

        if self.state == RefreshState::Refreshed {
            return Ok(self.registry.lock().lookup(&selector));
        }

        let candidates = self
            .registry
            .lock()
            .active()
            .filter(|bean| selector.may_match(bean))
            .cloned()
            .collect::<Vec<_>>();

        let mut found = Vec::new();
        for bean in candidates {
            if bean.status() == BeanStatus::Resolving {
                debug!(bean = %bean, %selector, "Bean is being resolved, skipped");
                continue;
            }
            self.resolve_bean(&bean)?;
            if bean.status() != BeanStatus::Deleted && selector.matches(&bean) {
                found.push(bean);
            }
        }
        Ok(found)
    }

    /// The only wired bean providing `T`.
    ///
    /// # Errors
    /// Returns [`WireErrorKind`] if there isn't exactly one bean providing `T`.
    ///
    /// # Panics
    /// Panics if the container isn't refreshed.
    #[track_caller]
    pub fn get<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>, WireErrorKind> {
        self.state.expect_refreshed("get");
        cast_instance(&*select_single::<T>(self.find(Selector::of::<T>())?)?)
    }

    /// # Errors
    /// Returns [`WireErrorKind`] if there isn't exactly one bean providing `T` under the name.
    ///
    /// # Panics
    /// Panics if the container isn't refreshed.
    #[track_caller]
    pub fn get_named<T: ?Sized + Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>, WireErrorKind> {
        self.state.expect_refreshed("get_named");
        cast_instance(&*select_single::<T>(self.find(Selector::named::<T>(name))?)?)
    }

    /// Every wired bean providing `T`.
    ///
    /// # Errors
    /// Returns [`WireErrorKind`] if one of the beans can't be viewed as `T`.
    ///
    /// # Panics
    /// Panics if the container isn't refreshed.
    #[track_caller]
    pub fn get_all<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Vec<Arc<T>>, WireErrorKind> {
        self.state.expect_refreshed("get_all");
        self.find(Selector::of::<T>())?.iter().map(|bean| cast_instance(bean)).collect()
    }

    /// Every registered bean, deleted ones included, in registration order.
    #[must_use]
    pub fn beans(&self) -> Vec<Arc<BeanDefinition>> {
        self.registry.lock().beans().to_vec()
    }

    /// Context cancelled when the container closes.
    #[inline]
    #[must_use]
    pub fn context(&self) -> CancellationToken {
        self.supervisor.context()
    }

    /// Runs `task` in the background. [`Container::close`] cancels its context and waits for it.
    #[inline]
    pub fn spawn<F>(&self, task: F)
    where
        F: FnOnce(CancellationToken) + Send + 'static,
    {
        self.supervisor.spawn(task);
    }

    /// Background tasks that haven't returned yet.
    #[inline]
    #[must_use]
    pub fn active_tasks(&self) -> usize {
        self.supervisor.active()
    }

    /// Cancels the context, waits for background tasks and runs destroyers.
    /// Destroyer failures are logged and don't stop the remaining destroyers.
    ///
    /// # Panics
    /// Panics if the container isn't refreshed.
    #[track_caller]
    pub fn close(&self) {
        self.state.expect_refreshed("close");

        let span = info_span!("close");
        let _guard = span.enter();

        self.supervisor.shutdown();
        info!("Background tasks exited");

        let destroyers = mem::take(&mut *self.destroyers.lock());
        for destroyer in &destroyers {
            match destroyer.run() {
                Ok(()) => debug!(bean = destroyer.id(), "Destroyed"),
                Err(err) => error!(bean = destroyer.id(), %err, "Destroy failed"),
            }
        }
        info!("Container closed");
    }
}
