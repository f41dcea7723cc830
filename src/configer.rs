use std::panic::Location;
use tracing::debug;

use crate::{
    assembly::Assembly,
    cond::Condition,
    dependency_resolver::DependencyResolver,
    errors::{InstantiatorErrorKind, WireErrorKind},
    sort::Sortable,
};

/// Function run once every bean is resolved and before beans are wired.
pub trait Configurer<Deps>: Send + Sync + 'static
where
    Deps: DependencyResolver,
{
    fn configure(&mut self, dependencies: Deps) -> anyhow::Result<()>;
}

macro_rules! impl_configurer {
    (
        [$($ty:ident),*]
    ) => {
        #[allow(non_snake_case)]
        impl<F, $($ty,)*> Configurer<($($ty,)*)> for F
        where
            F: FnMut($($ty,)*) -> anyhow::Result<()> + Send + Sync + 'static,
            $( $ty: DependencyResolver, )*
        {
            fn configure(&mut self, ($($ty,)*): ($($ty,)*)) -> anyhow::Result<()> {
                self($($ty,)*)
            }
        }
    };
}

all_the_tuples!(impl_configurer);

type BoxedConfigurer =
    Box<dyn FnMut(&mut Assembly<'_>) -> Result<(), InstantiatorErrorKind<WireErrorKind, anyhow::Error>> + Send + Sync>;

fn boxed_configurer_factory<C, Deps>(mut configurer: C) -> BoxedConfigurer
where
    C: Configurer<Deps>,
    Deps: DependencyResolver + 'static,
{
    Box::new(move |assembly: &mut Assembly<'_>| {
        let dependencies = Deps::resolve(assembly).map_err(|err| InstantiatorErrorKind::Deps(err.into()))?;
        configurer.configure(dependencies).map_err(InstantiatorErrorKind::Factory)
    })
}

/// Registered configuration function with its ordering constraints.
pub(crate) struct Configer {
    name: String,
    before: Vec<String>,
    after: Vec<String>,
    conditions: Vec<Box<dyn Condition>>,
    run: BoxedConfigurer,
}

impl Configer {
    #[track_caller]
    pub(crate) fn new<C, Deps>(configurer: C) -> Self
    where
        C: Configurer<Deps>,
        Deps: DependencyResolver + 'static,
    {
        Self {
            name: Location::caller().to_string(),
            before: Vec::new(),
            after: Vec::new(),
            conditions: Vec::new(),
            run: boxed_configurer_factory(configurer),
        }
    }

    #[inline]
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub(crate) fn conditions(&self) -> &[Box<dyn Condition>] {
        &self.conditions
    }

    pub(crate) fn run(&mut self, assembly: &mut Assembly<'_>) -> Result<(), InstantiatorErrorKind<WireErrorKind, anyhow::Error>> {
        (self.run)(assembly)?;

        debug!(config = %self.name, "Configuration applied");
        Ok(())
    }
}

impl Sortable for Configer {
    fn key(&self) -> &str {
        &self.name
    }

    fn runs_after(&self, other: &Self) -> bool {
        self.after.contains(&other.name) || other.before.contains(&self.name)
    }
}

/// Chainable handle to a registered configuration function, valid until refresh.
pub struct ConfigMut<'a> {
    configer: &'a mut Configer,
}

impl<'a> ConfigMut<'a> {
    pub(crate) fn new(configer: &'a mut Configer) -> Self {
        Self { configer }
    }

    /// Replaces the default name, the registration call site.
    #[inline]
    pub fn name(self, name: impl Into<String>) -> Self {
        self.configer.name = name.into();
        self
    }

    /// Runs before the configuration named `name`.
    #[inline]
    pub fn before(self, name: impl Into<String>) -> Self {
        self.configer.before.push(name.into());
        self
    }

    /// Runs after the configuration named `name`.
    #[inline]
    pub fn after(self, name: impl Into<String>) -> Self {
        self.configer.after.push(name.into());
        self
    }

    #[inline]
    pub fn on(self, condition: impl Condition) -> Self {
        self.configer.conditions.push(Box::new(condition));
        self
    }
}
