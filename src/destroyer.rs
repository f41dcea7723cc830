use std::{collections::BTreeSet, sync::Arc};

use crate::{bean::BeanDefinition, sort::Sortable};

/// Teardown of a wired bean.
pub(crate) struct Destroyer {
    id: String,
    bean: Arc<BeanDefinition>,
    /// Beans that must be destroyed before this one
    after: BTreeSet<String>,
}

impl Destroyer {
    pub(crate) fn new(bean: Arc<BeanDefinition>) -> Self {
        Self {
            id: bean.id(),
            bean,
            after: BTreeSet::new(),
        }
    }

    #[inline]
    pub(crate) fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub(crate) fn run_after(&mut self, dependent: String) {
        self.after.insert(dependent);
    }

    #[inline]
    pub(crate) fn run(&self) -> anyhow::Result<()> {
        self.bean.destroy_instance()
    }
}

impl Sortable for Destroyer {
    fn key(&self) -> &str {
        &self.id
    }

    fn runs_after(&self, other: &Self) -> bool {
        self.after.contains(&other.id)
    }
}
