use std::{
    any::{type_name, Any, TypeId},
    cmp::Ordering,
    fmt::{self, Display, Formatter},
    sync::Arc,
};

pub(crate) type RcAny = Arc<dyn Any + Send + Sync>;
pub(crate) type BoxAny = Box<dyn Any + Send + Sync>;

#[derive(Debug, Clone, Copy)]
pub struct TypeInfo {
    pub name: &'static str,
    pub id: TypeId,
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl PartialOrd for TypeInfo {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeInfo {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl Display for TypeInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl TypeInfo {
    #[inline]
    #[must_use]
    pub fn of<T>() -> Self
    where
        T: ?Sized + 'static,
    {
        Self {
            name: type_name::<T>(),
            id: TypeId::of::<T>(),
        }
    }

    /// Trait object types are the only interfaces a bean can export.
    #[inline]
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.name.starts_with("dyn ")
    }

    /// Last path segment, generics included: `app::repo::PgRepo<u8>` gives `PgRepo<u8>`.
    #[must_use]
    pub fn short_name(&self) -> &'static str {
        let name = self.name.strip_prefix("dyn ").unwrap_or(self.name);
        let name = name.split(" + ").next().unwrap_or(name);
        let head = name.split_once('<').map_or(name, |(head, _)| head);
        match head.rfind("::") {
            Some(pos) => &name[pos + 2..],
            None => name,
        }
    }

    /// Matches either the full path or the short name.
    #[must_use]
    pub(crate) fn matches_name(&self, name: &str) -> bool {
        self.name == name || self.short_name() == name
    }
}

/// Turns the stored instance into a boxed `Arc<I>` for one of the types the bean is indexed under.
pub(crate) type Caster = Box<dyn Fn(RcAny) -> Option<BoxAny> + Send + Sync>;

pub(crate) fn concrete_caster<T: Send + Sync + 'static>() -> Caster {
    Box::new(|instance: RcAny| instance.downcast::<T>().ok().map(|typed| Box::new(typed) as BoxAny))
}

pub(crate) fn interface_caster<T, I>(cast: fn(Arc<T>) -> Arc<I>) -> Caster
where
    T: Send + Sync + 'static,
    I: ?Sized + Send + Sync + 'static,
{
    Box::new(move |instance: RcAny| instance.downcast::<T>().ok().map(|typed| Box::new(cast(typed)) as BoxAny))
}

#[cfg(test)]
mod tests {
    use super::{concrete_caster, interface_caster, TypeInfo};

    use std::{any::Any, sync::Arc};

    trait Greeter: Send + Sync {
        fn greet(&self) -> &'static str;
    }

    struct English;

    impl Greeter for English {
        fn greet(&self) -> &'static str {
            "hello"
        }
    }

    mod nested {
        pub struct Wrapper<T>(pub T);
    }

    #[test]
    fn test_interface_detection() {
        assert!(TypeInfo::of::<dyn Greeter>().is_interface());
        assert!(TypeInfo::of::<dyn Greeter + Send + Sync>().is_interface());
        assert!(!TypeInfo::of::<English>().is_interface());
        assert!(!TypeInfo::of::<Arc<dyn Greeter>>().is_interface());
    }

    #[test]
    fn test_short_name() {
        assert_eq!(TypeInfo::of::<English>().short_name(), "English");
        assert_eq!(TypeInfo::of::<dyn Greeter>().short_name(), "Greeter");
        assert_eq!(TypeInfo::of::<dyn Greeter + Send + Sync>().short_name(), "Greeter");
        assert!(TypeInfo::of::<nested::Wrapper<u8>>().short_name().starts_with("Wrapper<"));
        assert!(TypeInfo::of::<English>().matches_name("English"));
        assert!(TypeInfo::of::<English>().matches_name(TypeInfo::of::<English>().name));
    }

    #[test]
    fn test_casters() {
        let instance: Arc<dyn Any + Send + Sync> = Arc::new(English);

        let concrete = concrete_caster::<English>()(instance.clone()).unwrap();
        assert!(concrete.downcast::<Arc<English>>().is_ok());

        let greeter = interface_caster::<English, dyn Greeter>(|english| english)(instance.clone()).unwrap();
        let greeter = greeter.downcast::<Arc<dyn Greeter>>().unwrap();
        assert_eq!(greeter.greet(), "hello");

        assert!(concrete_caster::<u8>()(instance).is_none());
    }
}
