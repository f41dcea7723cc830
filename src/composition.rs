//! Declared composition trees used for interface auto-export.
//!
//! A bean type that is assembled from other parts describes its fields through [`Composite`].
//! During resolution the tree is walked:
//! - a field marked with [`Field::export`] must be an interface (`dyn Trait`) and becomes an export of the bean,
//!   unless it's also marked with [`Field::inject`], which is an error;
//! - an embedded field ([`Field::embedded`]) is walked recursively, unless it's marked with [`Field::inject`]:
//!   injected parts are opaque dependencies, not sources of exports;
//! - any other field is ignored.
//!
//! A part must not embed itself, directly or through other parts.
//!
//! ```rust
//! use beanery::{Composite, Composition, Field};
//!
//! trait Handler {}
//!
//! struct Base;
//!
//! impl Composite for Base {
//!     fn composition() -> Composition {
//!         Composition::new().field(Field::of::<dyn Handler>("handler").export())
//!     }
//! }
//!
//! struct Service {
//!     base: Base,
//! }
//!
//! impl Composite for Service {
//!     fn composition() -> Composition {
//!         Composition::new().field(Field::embedded::<Base>("base"))
//!     }
//! }
//! ```

use std::collections::BTreeSet;

use crate::{any::TypeInfo, errors::ExportErrorKind};

pub trait Composite {
    fn composition() -> Composition;
}

#[derive(Debug, Clone, Default)]
pub struct Composition {
    fields: Vec<Field>,
}

impl Composition {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    #[inline]
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: &'static str,
    pub type_info: TypeInfo,
    embedded: Option<fn() -> Composition>,
    export: bool,
    inject: bool,
}

impl Field {
    /// Named field of type `T`.
    #[inline]
    #[must_use]
    pub fn of<T: ?Sized + 'static>(name: &'static str) -> Self {
        Self {
            name,
            type_info: TypeInfo::of::<T>(),
            embedded: None,
            export: false,
            inject: false,
        }
    }

    /// Anonymous part whose own composition is walked too.
    #[inline]
    #[must_use]
    pub fn embedded<T: Composite + 'static>(name: &'static str) -> Self {
        Self {
            embedded: Some(T::composition),
            ..Self::of::<T>(name)
        }
    }

    #[inline]
    #[must_use]
    pub fn export(mut self) -> Self {
        self.export = true;
        self
    }

    #[inline]
    #[must_use]
    pub fn inject(mut self) -> Self {
        self.inject = true;
        self
    }

    #[inline]
    #[must_use]
    pub fn is_embedded(&self) -> bool {
        self.embedded.is_some()
    }
}

/// Collects the interfaces exported through `composition` into `exports`.
pub(crate) fn auto_export(composition: &Composition, exports: &mut BTreeSet<TypeInfo>) -> Result<(), ExportErrorKind> {
    walk(composition, exports, &mut Vec::new())
}

/// `embedding` holds the embedded parts from the root down to `composition`.
fn walk(
    composition: &Composition,
    exports: &mut BTreeSet<TypeInfo>,
    embedding: &mut Vec<TypeInfo>,
) -> Result<(), ExportErrorKind> {
    for field in &composition.fields {
        if !field.export {
            if field.inject {
                continue;
            }
            if let Some(nested) = field.embedded {
                if embedding.contains(&field.type_info) {
                    return Err(ExportErrorKind::EmbeddingCycle {
                        field: field.name,
                        type_name: field.type_info.name,
                    });
                }
                embedding.push(field.type_info);
                walk(&nested(), exports, embedding)?;
                embedding.pop();
            }
            continue;
        }

        if !field.type_info.is_interface() {
            return Err(ExportErrorKind::NotInterface {
                field: field.name,
                type_name: field.type_info.name,
            });
        }
        if field.inject {
            return Err(ExportErrorKind::ExportWithInject { field: field.name });
        }

        exports.insert(field.type_info);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{auto_export, Composite, Composition, Field};
    use crate::{any::TypeInfo, errors::ExportErrorKind};

    use std::collections::BTreeSet;

    trait Deep {}
    trait Middle {}
    trait Store {}

    struct C;
    struct B;
    struct A;
    struct InjectedB;
    struct Outer;

    impl Composite for C {
        fn composition() -> Composition {
            Composition::new()
                .field(Field::of::<dyn Deep>("deep").export())
                .field(Field::of::<u32>("counter"))
        }
    }

    impl Composite for B {
        fn composition() -> Composition {
            Composition::new()
                .field(Field::embedded::<C>("c"))
                .field(Field::of::<dyn Middle>("middle").export())
        }
    }

    impl Composite for A {
        fn composition() -> Composition {
            Composition::new().field(Field::embedded::<B>("b"))
        }
    }

    impl Composite for InjectedB {
        fn composition() -> Composition {
            Composition::new().field(Field::embedded::<B>("b").inject())
        }
    }

    impl Composite for Outer {
        fn composition() -> Composition {
            Composition::new()
                .field(Field::embedded::<InjectedB>("inner"))
                .field(Field::of::<dyn Store>("store"))
        }
    }

    fn exports_of<T: Composite>() -> Result<BTreeSet<TypeInfo>, ExportErrorKind> {
        let mut exports = BTreeSet::new();
        auto_export(&T::composition(), &mut exports).map(|()| exports)
    }

    #[test]
    fn test_nested_chain() {
        let exports = exports_of::<A>().unwrap();

        assert_eq!(exports.len(), 2);
        assert!(exports.contains(&TypeInfo::of::<dyn Deep>()));
        assert!(exports.contains(&TypeInfo::of::<dyn Middle>()));
    }

    #[test]
    fn test_injected_part_stops_recursion() {
        let exports = exports_of::<Outer>().unwrap();

        assert!(exports.is_empty());
    }

    #[test]
    fn test_non_embedded_ignored() {
        struct Plain;

        impl Composite for Plain {
            fn composition() -> Composition {
                Composition::new().field(Field::of::<C>("c")).field(Field::of::<dyn Deep>("deep"))
            }
        }

        assert!(exports_of::<Plain>().unwrap().is_empty());
    }

    #[test]
    fn test_export_not_interface() {
        struct Wrong;

        impl Composite for Wrong {
            fn composition() -> Composition {
                Composition::new().field(Field::of::<u8>("byte").export())
            }
        }

        let err = exports_of::<Wrong>().unwrap_err();
        assert!(matches!(err, ExportErrorKind::NotInterface { field: "byte", .. }));
    }

    #[test]
    fn test_export_with_inject() {
        struct Ambiguous;

        impl Composite for Ambiguous {
            fn composition() -> Composition {
                Composition::new().field(Field::of::<dyn Store>("store").export().inject())
            }
        }

        let err = exports_of::<Ambiguous>().unwrap_err();
        assert!(matches!(err, ExportErrorKind::ExportWithInject { field: "store" }));
    }

    #[test]
    fn test_embedding_cycle() {
        struct Node;

        impl Composite for Node {
            fn composition() -> Composition {
                Composition::new()
                    .field(Field::of::<dyn Deep>("deep").export())
                    .field(Field::embedded::<Node>("next"))
            }
        }

        let err = exports_of::<Node>().unwrap_err();
        assert!(matches!(err, ExportErrorKind::EmbeddingCycle { field: "next", .. }));
    }
}
