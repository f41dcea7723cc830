use std::fmt::{self, Display, Formatter};

use crate::{any::TypeInfo, bean::BeanDefinition};

/// Query over registered beans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Beans registered under the name
    Name(String),
    /// Beans whose concrete type or one of the exports is the type
    Type(TypeInfo),
    /// Both of the above
    TypedName(TypeInfo, String),
    /// Parsed `Type:name` form, the type is matched by full or short name
    Parsed { type_name: String, name: Option<String> },
}

impl Selector {
    #[inline]
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::Type(TypeInfo::of::<T>())
    }

    #[inline]
    #[must_use]
    pub fn named<T: ?Sized + 'static>(name: impl Into<String>) -> Self {
        Self::TypedName(TypeInfo::of::<T>(), name.into())
    }

    /// `name`, `Type:name` or `Type:`. Type paths keep their `::` separators.
    #[must_use]
    pub fn parse(selector: &str) -> Self {
        match selector.rsplit_once(':') {
            Some((type_name, name)) if !type_name.is_empty() && !type_name.ends_with(':') => Self::Parsed {
                type_name: type_name.to_owned(),
                name: (!name.is_empty()).then(|| name.to_owned()),
            },
            _ => Self::Name(selector.to_owned()),
        }
    }

    /// Whether `bean` can match once resolved. Used before resolution to pick candidates.
    pub(crate) fn may_match(&self, bean: &BeanDefinition) -> bool {
        match self {
            Self::Name(name) => bean.name() == Some(name.as_str()),
            Self::Type(type_info) => bean.may_provide(type_info),
            Self::TypedName(type_info, name) => bean.name() == Some(name.as_str()) && bean.may_provide(type_info),
            Self::Parsed { name, .. } => name.is_none() || bean.name() == name.as_deref(),
        }
    }

    pub(crate) fn matches(&self, bean: &BeanDefinition) -> bool {
        match self {
            Self::Name(name) => bean.name() == Some(name.as_str()),
            Self::Type(type_info) => bean.provides(type_info),
            Self::TypedName(type_info, name) => bean.name() == Some(name.as_str()) && bean.provides(type_info),
            Self::Parsed { type_name, name } => {
                (name.is_none() || bean.name() == name.as_deref()) && bean.provides_named(type_name)
            }
        }
    }
}

impl Display for Selector {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Type(type_info) => write!(f, "{type_info}"),
            Self::TypedName(type_info, name) => write!(f, "{type_info}:{name}"),
            Self::Parsed { type_name, name } => write!(f, "{type_name}:{}", name.as_deref().unwrap_or_default()),
        }
    }
}

impl From<&str> for Selector {
    fn from(selector: &str) -> Self {
        Self::parse(selector)
    }
}

impl From<String> for Selector {
    fn from(selector: String) -> Self {
        Self::parse(&selector)
    }
}

impl From<TypeInfo> for Selector {
    fn from(type_info: TypeInfo) -> Self {
        Self::Type(type_info)
    }
}

#[cfg(test)]
mod tests {
    use super::Selector;
    use crate::any::TypeInfo;

    struct Repo;

    #[test]
    fn test_parse() {
        assert_eq!(Selector::parse("db"), Selector::Name("db".to_owned()));
        assert_eq!(
            Selector::parse("Repo:db"),
            Selector::Parsed {
                type_name: "Repo".to_owned(),
                name: Some("db".to_owned()),
            }
        );
        assert_eq!(
            Selector::parse("app::Repo:"),
            Selector::Parsed {
                type_name: "app::Repo".to_owned(),
                name: None,
            }
        );
        assert_eq!(Selector::parse("app::Repo"), Selector::Name("app::Repo".to_owned()));
    }

    #[test]
    fn test_typed() {
        assert_eq!(Selector::of::<Repo>(), Selector::Type(TypeInfo::of::<Repo>()));
        assert_eq!(
            Selector::named::<Repo>("db"),
            Selector::TypedName(TypeInfo::of::<Repo>(), "db".to_owned())
        );
        assert!(Selector::named::<Repo>("db").to_string().ends_with("Repo:db"));
    }
}
