use std::sync::Arc;
use tracing::debug;

use super::{
    any::RcAny,
    assembly::Assembly,
    dependency_resolver::DependencyResolver,
    errors::{InstantiateErrorKind, InstantiatorErrorKind, WireErrorKind},
};

pub trait Instantiator<Deps>: Clone + Send + Sync + 'static
where
    Deps: DependencyResolver,
{
    type Provides: Send + Sync + 'static;

    fn instantiate(&mut self, dependencies: Deps) -> Result<Self::Provides, InstantiateErrorKind>;
}

pub(crate) type BoxedFactory =
    Box<dyn Fn(&mut Assembly<'_>) -> Result<RcAny, InstantiatorErrorKind<WireErrorKind, InstantiateErrorKind>> + Send + Sync>;

#[must_use]
pub(crate) fn boxed_instantiator_factory<Inst, Deps>(instantiator: Inst) -> BoxedFactory
where
    Inst: Instantiator<Deps>,
    Deps: DependencyResolver + 'static,
{
    Box::new(move |assembly: &mut Assembly<'_>| {
        let dependencies = match Deps::resolve(assembly) {
            Ok(dependencies) => dependencies,
            Err(err) => return Err(InstantiatorErrorKind::Deps(err.into())),
        };
        let dependency = match instantiator.clone().instantiate(dependencies) {
            Ok(dependency) => dependency,
            Err(err) => return Err(InstantiatorErrorKind::Factory(err)),
        };

        debug!("Instantiated");

        Ok(Arc::new(dependency) as RcAny)
    })
}

macro_rules! impl_instantiator {
    (
        [$($ty:ident),*]
    ) => {
        #[allow(non_snake_case)]
        impl<F, Response, $($ty,)*> Instantiator<($($ty,)*)> for F
        where
            F: FnMut($($ty,)*) -> Result<Response, InstantiateErrorKind> + Clone + Send + Sync + 'static,
            Response: Send + Sync + 'static,
            $( $ty: DependencyResolver, )*
        {
            type Provides = Response;

            fn instantiate(&mut self, ($($ty,)*): ($($ty,)*)) -> Result<Self::Provides, InstantiateErrorKind> {
                self($($ty,)*)
            }
        }
    };
}

all_the_tuples!(impl_instantiator);

#[cfg(test)]
mod tests {
    use super::{DependencyResolver, InstantiateErrorKind, Instantiator};
    use crate::{inject::Inject, Properties};

    use std::sync::{
        atomic::{AtomicU8, Ordering},
        Arc,
    };

    struct Request;

    #[test]
    #[allow(dead_code)]
    fn test_factory_helper() {
        fn resolver<Deps: DependencyResolver, F: Instantiator<Deps>>(_f: F) {}
        fn resolver_with_dep() {
            resolver(|| Ok::<_, InstantiateErrorKind>(()));
            resolver(|Inject(_request): Inject<Request>, _props: Properties| Ok::<_, InstantiateErrorKind>(1u8));
        }
    }

    #[test]
    fn test_instantiate_call() {
        let call_count = Arc::new(AtomicU8::new(0));
        let mut instantiator = {
            let call_count = call_count.clone();
            move || {
                call_count.fetch_add(1, Ordering::SeqCst);
                Ok::<_, InstantiateErrorKind>(Request)
            }
        };

        let _ = Instantiator::<()>::instantiate(&mut instantiator, ()).unwrap();
        let _ = Instantiator::<()>::instantiate(&mut instantiator, ()).unwrap();

        assert_eq!(call_count.load(Ordering::SeqCst), 2);
    }
}
