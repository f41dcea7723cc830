use crate::{assembly::Assembly, errors::WireErrorKind};

/// Something a constructor or a configuration can ask for.
pub trait DependencyResolver: Sized {
    type Error: Into<WireErrorKind>;

    fn resolve(assembly: &mut Assembly<'_>) -> Result<Self, Self::Error>;
}

macro_rules! impl_dependency_resolver {
    (
        [$($ty:ident),*]
    ) => {
        #[allow(non_snake_case, unused_mut)]
        impl<$($ty,)*> DependencyResolver for ($($ty,)*)
        where
            $( $ty: DependencyResolver, )*
        {
            type Error = WireErrorKind;

            #[inline]
            #[allow(unused_variables)]
            fn resolve(assembly: &mut Assembly<'_>) -> Result<Self, Self::Error> {
                Ok(($($ty::resolve(assembly).map_err(Into::into)?,)*))
            }
        }
    };
}

all_the_tuples!(impl_dependency_resolver);

#[cfg(test)]
mod tests {
    use super::DependencyResolver;
    use crate::{
        inject::{Inject, InjectAll},
        Properties,
    };

    use tokio_util::sync::CancellationToken;

    #[test]
    #[allow(dead_code)]
    fn test_dependency_resolver_impls() {
        fn resolver<T: DependencyResolver>() {}
        fn resolver_with_dep<Dep: Send + Sync + 'static>() {
            resolver::<Inject<Dep>>();
            resolver::<InjectAll<Dep>>();
            resolver::<(Inject<Dep>, InjectAll<Dep>, Properties, CancellationToken)>();
        }
        trait Store: Send + Sync {}
        resolver::<(Inject<dyn Store>, InjectAll<dyn Store>)>();
    }
}
