use parking_lot::Mutex;
use std::{
    any::type_name,
    collections::{BTreeMap, BTreeSet},
    fmt::{self, Display, Formatter},
    marker::PhantomData,
    panic::Location,
    sync::Arc,
};

use crate::{
    any::{concrete_caster, interface_caster, Caster, RcAny, TypeInfo},
    assembly::Assembly,
    composition::{Composite, Composition},
    cond::Condition,
    dependency_resolver::DependencyResolver,
    errors::{InstantiatorErrorKind, WireErrorKind},
    instantiator::{boxed_instantiator_factory, BoxedFactory, Instantiator},
};

/// Per-bean progress. Only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BeanStatus {
    Default,
    Resolving,
    Resolved,
    Creating,
    Wired,
    Deleted,
}

pub(crate) enum Factory {
    Object(RcAny),
    Constructor(BoxedFactory),
}

type Hook = Box<dyn Fn(&RcAny) -> anyhow::Result<()> + Send + Sync>;

struct BeanState {
    status: BeanStatus,
    exports: BTreeSet<TypeInfo>,
    instance: Option<RcAny>,
}

/// A registered component: how to build it, when it's active and which types it's reachable by.
pub struct BeanDefinition {
    name: Option<String>,
    type_info: TypeInfo,
    location: &'static Location<'static>,
    factory: Factory,
    conditions: Vec<Box<dyn Condition>>,
    exports: BTreeSet<TypeInfo>,
    casters: BTreeMap<TypeInfo, Caster>,
    composition: Option<fn() -> Composition>,
    init: Option<Hook>,
    destroy: Option<Hook>,
    state: Mutex<BeanState>,
}

impl BeanDefinition {
    fn new<T: Send + Sync + 'static>(factory: Factory, location: &'static Location<'static>) -> Self {
        let type_info = TypeInfo::of::<T>();
        Self {
            name: None,
            type_info,
            location,
            factory,
            conditions: Vec::new(),
            exports: BTreeSet::new(),
            casters: BTreeMap::from([(type_info, concrete_caster::<T>())]),
            composition: None,
            init: None,
            destroy: None,
            state: Mutex::new(BeanState {
                status: BeanStatus::Default,
                exports: BTreeSet::new(),
                instance: None,
            }),
        }
    }

    /// Unique identity: `type:name` for named beans, `type@file:line` of the registration otherwise.
    #[must_use]
    pub fn id(&self) -> String {
        match &self.name {
            Some(name) => format!("{}:{name}", self.type_info.name),
            None => format!("{}@{}", self.type_info.name, self.location),
        }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn type_info(&self) -> TypeInfo {
        self.type_info
    }

    #[inline]
    #[must_use]
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    #[inline]
    #[must_use]
    pub fn status(&self) -> BeanStatus {
        self.state.lock().status
    }

    /// Interfaces the bean is indexed under. Empty until the bean is resolved.
    #[must_use]
    pub fn exports(&self) -> BTreeSet<TypeInfo> {
        self.state.lock().exports.clone()
    }

    #[inline]
    #[must_use]
    pub fn has_destroy(&self) -> bool {
        self.destroy.is_some()
    }

    #[must_use]
    pub fn description(&self) -> String {
        format!("{} ({})", self.id(), self.location)
    }

    /// Live instance viewed as `T`, the concrete type or one of the implemented interfaces.
    #[must_use]
    pub fn instance<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        let instance = self.state.lock().instance.clone()?;
        let caster = self.casters.get(&TypeInfo::of::<T>())?;
        caster(instance)?.downcast::<Arc<T>>().ok().map(|typed| *typed)
    }

    /// Builds the instance, runs its init hook and marks the bean wired.
    ///
    /// # Errors
    /// Returns [`WireErrorKind`] if a dependency can't be wired, or the constructor or the init hook fails.
    pub fn create(&self, assembly: &mut Assembly<'_>) -> Result<(), WireErrorKind> {
        self.set_status(BeanStatus::Creating);

        let instance = match &self.factory {
            Factory::Object(instance) => instance.clone(),
            Factory::Constructor(factory) => factory(assembly).map_err(|err| match err {
                InstantiatorErrorKind::Deps(err) => err,
                InstantiatorErrorKind::Factory(source) => WireErrorKind::Instantiate {
                    bean: self.to_string(),
                    source,
                },
            })?,
        };
        if let Some(init) = &self.init {
            init(&instance).map_err(|source| WireErrorKind::Init {
                bean: self.to_string(),
                source,
            })?;
        }

        let mut state = self.state.lock();
        state.instance = Some(instance);
        state.status = BeanStatus::Wired;
        Ok(())
    }

    pub(crate) fn conditions(&self) -> &[Box<dyn Condition>] {
        &self.conditions
    }

    pub(crate) fn declared_exports(&self) -> &BTreeSet<TypeInfo> {
        &self.exports
    }

    pub(crate) fn composition(&self) -> Option<fn() -> Composition> {
        self.composition
    }

    pub(crate) fn implements(&self, interface: &TypeInfo) -> bool {
        self.casters.contains_key(interface)
    }

    /// Whether the bean may be reachable by `type_info` once resolved.
    pub(crate) fn may_provide(&self, type_info: &TypeInfo) -> bool {
        self.type_info == *type_info || self.exports.contains(type_info) || self.composition.is_some()
    }

    pub(crate) fn provides(&self, type_info: &TypeInfo) -> bool {
        self.type_info == *type_info || self.state.lock().exports.contains(type_info)
    }

    pub(crate) fn provides_named(&self, type_name: &str) -> bool {
        self.type_info.matches_name(type_name) || self.state.lock().exports.iter().any(|export| export.matches_name(type_name))
    }

    /// Moves a fresh bean to [`BeanStatus::Resolving`]. `false` if resolution already started.
    pub(crate) fn begin_resolving(&self) -> bool {
        let mut state = self.state.lock();
        if state.status >= BeanStatus::Resolving {
            return false;
        }
        state.status = BeanStatus::Resolving;
        true
    }

    pub(crate) fn complete_resolving(&self, exports: BTreeSet<TypeInfo>) {
        let mut state = self.state.lock();
        state.exports = exports;
        state.status = BeanStatus::Resolved;
    }

    pub(crate) fn set_status(&self, status: BeanStatus) {
        self.state.lock().status = status;
    }

    pub(crate) fn destroy_instance(&self) -> anyhow::Result<()> {
        let Some(destroy) = &self.destroy else {
            return Ok(());
        };
        let instance = self.state.lock().instance.clone();
        match instance {
            Some(instance) => destroy(&instance),
            None => Ok(()),
        }
    }
}

impl Display for BeanDefinition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}

/// Typed bean descriptor before registration.
pub struct Bean<T> {
    definition: BeanDefinition,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> Bean<T> {
    /// Bean around a value built outside the container.
    #[track_caller]
    #[must_use]
    pub fn object(value: T) -> Self {
        Self {
            definition: BeanDefinition::new::<T>(Factory::Object(Arc::new(value)), Location::caller()),
            _marker: PhantomData,
        }
    }

    /// Bean built by `instantiator` from the dependencies it asks for.
    #[track_caller]
    #[must_use]
    pub fn provide<Inst, Deps>(instantiator: Inst) -> Self
    where
        Inst: Instantiator<Deps, Provides = T>,
        Deps: DependencyResolver + 'static,
    {
        Self {
            definition: BeanDefinition::new::<T>(
                Factory::Constructor(boxed_instantiator_factory(instantiator)),
                Location::caller(),
            ),
            _marker: PhantomData,
        }
    }

    pub(crate) fn into_definition(self) -> BeanDefinition {
        self.definition
    }
}

/// Chainable handle to a registered bean, valid until refresh.
pub struct BeanMut<'a, T> {
    definition: &'a mut BeanDefinition,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T: Send + Sync + 'static> BeanMut<'a, T> {
    pub(crate) fn new(definition: &'a mut BeanDefinition) -> Self {
        Self {
            definition,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn id(&self) -> String {
        self.definition.id()
    }

    #[inline]
    pub fn name(self, name: impl Into<String>) -> Self {
        self.definition.name = Some(name.into());
        self
    }

    /// Adds an activation condition. All conditions must match.
    #[inline]
    pub fn on(self, condition: impl Condition) -> Self {
        self.definition.conditions.push(Box::new(condition));
        self
    }

    /// Declares that the bean is reachable as interface `I`.
    /// The bean must also declare the implementation with [`Self::implements`].
    #[inline]
    pub fn export<I: ?Sized + 'static>(self) -> Self {
        self.definition.exports.insert(TypeInfo::of::<I>());
        self
    }

    /// Declares that `T` implements interface `I`, usually with `|bean| bean` as the cast.
    #[inline]
    pub fn implements<I>(self, cast: fn(Arc<T>) -> Arc<I>) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
    {
        self.definition.casters.insert(TypeInfo::of::<I>(), interface_caster(cast));
        self
    }

    /// Walks the declared composition of `T` for auto-exported interfaces.
    #[inline]
    pub fn composite(self) -> Self
    where
        T: Composite,
    {
        self.definition.composition = Some(T::composition);
        self
    }

    /// Called once the instance is built, before dependents get it.
    #[inline]
    pub fn init<F>(self, init: F) -> Self
    where
        F: Fn(&T) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.definition.init = Some(typed_hook(init));
        self
    }

    /// Called on close, before the destroyers of the bean's dependencies.
    #[inline]
    pub fn destroy<F>(self, destroy: F) -> Self
    where
        F: Fn(&T) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.definition.destroy = Some(typed_hook(destroy));
        self
    }
}

fn typed_hook<T, F>(hook: F) -> Hook
where
    T: Send + Sync + 'static,
    F: Fn(&T) -> anyhow::Result<()> + Send + Sync + 'static,
{
    Box::new(move |instance: &RcAny| match instance.downcast_ref::<T>() {
        Some(instance) => hook(instance),
        None => Err(anyhow::anyhow!("instance isn't a {}", type_name::<T>())),
    })
}

/// Picks the only bean providing `T`.
pub(crate) fn select_single<T: ?Sized>(beans: Vec<Arc<BeanDefinition>>) -> Result<Arc<BeanDefinition>, WireErrorKind> {
    let mut beans = beans.into_iter();
    match (beans.next(), beans.next()) {
        (Some(bean), None) => Ok(bean),
        (None, _) => Err(WireErrorKind::NoBean {
            type_name: type_name::<T>().to_owned(),
        }),
        (Some(first), Some(second)) => Err(WireErrorKind::Ambiguous {
            type_name: type_name::<T>().to_owned(),
            candidates: [first, second].iter().chain(beans.as_slice()).map(|bean| bean.to_string()).collect(),
        }),
    }
}

pub(crate) fn cast_instance<T: ?Sized + Send + Sync + 'static>(bean: &BeanDefinition) -> Result<Arc<T>, WireErrorKind> {
    if bean.status() != BeanStatus::Wired {
        return Err(WireErrorKind::NotWired { bean: bean.to_string() });
    }
    bean.instance::<T>().ok_or_else(|| WireErrorKind::IncorrectType {
        bean: bean.to_string(),
        expected: type_name::<T>(),
    })
}
