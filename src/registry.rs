use std::{
    collections::{btree_map::Entry, BTreeMap, BTreeSet},
    sync::Arc,
};
use tracing::debug;

use crate::{
    any::TypeInfo,
    bean::{BeanDefinition, BeanStatus},
    selector::Selector,
};

/// Registered beans and the indices built over them during refresh.
#[derive(Default)]
pub(crate) struct Registry {
    beans: Vec<Arc<BeanDefinition>>,
    by_id: BTreeMap<String, Arc<BeanDefinition>>,
    by_name: BTreeMap<String, Vec<Arc<BeanDefinition>>>,
    by_type: BTreeMap<TypeInfo, Vec<Arc<BeanDefinition>>>,
}

impl Registry {
    /// Freezes the registered beans and indexes them by identity.
    ///
    /// # Panics
    /// Panics if two beans share an identity.
    pub(crate) fn build_identity_index(&mut self, definitions: Vec<BeanDefinition>) {
        for definition in definitions {
            let bean = Arc::new(definition);
            match self.by_id.entry(bean.id()) {
                Entry::Occupied(entry) => {
                    panic!("found duplicate beans [{}] [{}]", entry.get().description(), bean.description());
                }
                Entry::Vacant(entry) => {
                    entry.insert(bean.clone());
                }
            }
            self.beans.push(bean);
        }
    }

    /// Every registered bean, deleted ones included, in registration order.
    #[inline]
    pub(crate) fn beans(&self) -> &[Arc<BeanDefinition>] {
        &self.beans
    }

    /// Beans still present in the identity index, in registration order.
    pub(crate) fn active(&self) -> impl Iterator<Item = &Arc<BeanDefinition>> {
        self.beans.iter().filter(|bean| bean.status() != BeanStatus::Deleted)
    }

    pub(crate) fn remove(&mut self, bean: &BeanDefinition) {
        self.by_id.remove(&bean.id());
    }

    /// Indexes a resolved bean by its concrete type, its exports and its name.
    pub(crate) fn index(&mut self, bean: &Arc<BeanDefinition>, exports: &BTreeSet<TypeInfo>) {
        for type_info in [bean.type_info()].iter().chain(exports) {
            self.by_type.entry(*type_info).or_default().push(bean.clone());
            debug!(bean = %bean, r#type = %type_info, "Indexed by type");
        }
        if let Some(name) = bean.name() {
            self.by_name.entry(name.to_owned()).or_default().push(bean.clone());
            debug!(bean = %bean, name, "Indexed by name");
        }
    }

    /// Answers a query from the name and type indices.
    pub(crate) fn lookup(&self, selector: &Selector) -> Vec<Arc<BeanDefinition>> {
        let by_name = |name: &str| self.by_name.get(name).map(Vec::as_slice).unwrap_or_default();

        match selector {
            Selector::Name(name) => by_name(name).to_vec(),
            Selector::Type(type_info) => self.by_type.get(type_info).cloned().unwrap_or_default(),
            Selector::TypedName(_, name) | Selector::Parsed { name: Some(name), .. } => {
                by_name(name).iter().filter(|bean| selector.matches(bean)).cloned().collect()
            }
            Selector::Parsed { name: None, .. } => self.active().filter(|bean| selector.matches(bean)).cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Registry;
    use crate::{
        bean::{Bean, BeanDefinition, BeanMut},
        selector::Selector,
    };

    use std::collections::BTreeSet;

    struct Repo;
    struct Cache;

    fn named<T: Send + Sync + 'static>(bean: Bean<T>, name: &str) -> BeanDefinition {
        let mut definition = bean.into_definition();
        let _ = BeanMut::<T>::new(&mut definition).name(name);
        definition
    }

    #[test]
    fn test_lookup_by_name_and_type() {
        let mut registry = Registry::default();
        registry.build_identity_index(vec![named(Bean::object(Repo), "svc"), named(Bean::object(Cache), "svc")]);

        for bean in registry.beans().to_vec() {
            bean.complete_resolving(BTreeSet::new());
            registry.index(&bean, &BTreeSet::new());
        }

        assert_eq!(registry.lookup(&Selector::Name("svc".to_owned())).len(), 2);
        assert_eq!(registry.lookup(&Selector::named::<Repo>("svc")).len(), 1);
        assert_eq!(registry.lookup(&Selector::of::<Cache>()).len(), 1);
        assert_eq!(registry.lookup(&Selector::parse("Cache:svc")).len(), 1);
        assert_eq!(registry.lookup(&Selector::parse("Repo:")).len(), 1);
        assert!(registry.lookup(&Selector::of::<u8>()).is_empty());
    }

    #[test]
    #[should_panic(expected = "found duplicate beans")]
    fn test_duplicate_identity() {
        let mut registry = Registry::default();

        registry.build_identity_index(vec![named(Bean::object(Repo), "repo"), named(Bean::object(Repo), "repo")]);
    }
}
