use std::sync::Arc;
use tracing::{debug, debug_span};

use crate::{
    assembly::Assembly,
    bean::{BeanDefinition, BeanStatus},
    errors::WireErrorKind,
};

/// Mechanism that turns a resolved bean into a live instance.
///
/// Implementations must keep the in-progress path of the [`Assembly`] up to date
/// ([`Assembly::enter`]/[`Assembly::leave`]) and record destroyers of the beans they wire.
pub trait Injector: Send + Sync + 'static {
    /// # Errors
    /// Returns [`WireErrorKind`] if the bean or one of its dependencies can't be wired.
    fn wire(&self, bean: &Arc<BeanDefinition>, assembly: &mut Assembly<'_>) -> Result<(), WireErrorKind>;
}

/// Builds every bean once, dependencies first.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultInjector;

impl Injector for DefaultInjector {
    fn wire(&self, bean: &Arc<BeanDefinition>, assembly: &mut Assembly<'_>) -> Result<(), WireErrorKind> {
        match bean.status() {
            BeanStatus::Wired => return Ok(()),
            BeanStatus::Creating => {
                let path = match assembly.path() {
                    path if path.is_empty() => bean.to_string(),
                    path => format!("{path} => {bean}"),
                };
                return Err(WireErrorKind::Cycle { path });
            }
            BeanStatus::Resolved => {}
            BeanStatus::Default | BeanStatus::Resolving | BeanStatus::Deleted => {
                return Err(WireErrorKind::NotResolved { bean: bean.to_string() });
            }
        }

        let span = debug_span!("wire", bean = %bean);
        let _guard = span.enter();

        assembly.enter(bean);
        bean.create(assembly)?;
        assembly.add_destroyer(bean);
        assembly.leave();

        debug!("Wired");
        Ok(())
    }
}
