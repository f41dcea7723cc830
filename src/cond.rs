//! Activation conditions for beans and configuration functions.
//!
//! A condition is evaluated once, during refresh, against a [`Facade`] over the partially
//! resolved container. Looking up beans from a condition resolves them on demand.

use crate::{facade::Facade, selector::Selector};

pub trait Condition: Send + Sync + 'static {
    /// # Errors
    /// Any error aborts the refresh.
    fn matches(&self, facade: &Facade<'_>) -> anyhow::Result<bool>;
}

impl<F> Condition for F
where
    F: Fn(&Facade<'_>) -> anyhow::Result<bool> + Send + Sync + 'static,
{
    #[inline]
    fn matches(&self, facade: &Facade<'_>) -> anyhow::Result<bool> {
        self(facade)
    }
}

/// Pins the closure signature so plain `|facade| ..` closures type-check.
#[inline]
#[must_use]
pub fn func<F>(condition: F) -> F
where
    F: Fn(&Facade<'_>) -> anyhow::Result<bool> + Send + Sync + 'static,
{
    condition
}

pub struct OnProperty {
    key: String,
    value: Option<String>,
    match_if_missing: bool,
}

impl OnProperty {
    /// Matches when the property is missing too.
    #[inline]
    #[must_use]
    pub fn match_if_missing(mut self) -> Self {
        self.match_if_missing = true;
        self
    }
}

impl Condition for OnProperty {
    fn matches(&self, facade: &Facade<'_>) -> anyhow::Result<bool> {
        Ok(match (facade.prop(&self.key), &self.value) {
            (None, _) => self.match_if_missing,
            (Some(_), None) => true,
            (Some(actual), Some(expected)) => actual == expected,
        })
    }
}

/// The property exists.
#[must_use]
pub fn on_property(key: impl Into<String>) -> OnProperty {
    OnProperty {
        key: key.into(),
        value: None,
        match_if_missing: false,
    }
}

/// The property exists and equals `value`.
#[must_use]
pub fn on_property_value(key: impl Into<String>, value: impl Into<String>) -> OnProperty {
    OnProperty {
        key: key.into(),
        value: Some(value.into()),
        match_if_missing: false,
    }
}

pub struct OnMissingProperty {
    key: String,
}

impl Condition for OnMissingProperty {
    fn matches(&self, facade: &Facade<'_>) -> anyhow::Result<bool> {
        Ok(!facade.has_prop(&self.key))
    }
}

#[must_use]
pub fn on_missing_property(key: impl Into<String>) -> OnMissingProperty {
    OnMissingProperty { key: key.into() }
}

#[derive(Clone, Copy)]
enum Expect {
    Some,
    None,
    Single,
}

pub struct OnBean {
    selector: Selector,
    expect: Expect,
}

impl Condition for OnBean {
    fn matches(&self, facade: &Facade<'_>) -> anyhow::Result<bool> {
        let found = facade.find(self.selector.clone())?.len();
        Ok(match self.expect {
            Expect::Some => found > 0,
            Expect::None => found == 0,
            Expect::Single => found == 1,
        })
    }
}

/// At least one active bean matches the selector.
#[must_use]
pub fn on_bean(selector: impl Into<Selector>) -> OnBean {
    OnBean {
        selector: selector.into(),
        expect: Expect::Some,
    }
}

#[must_use]
pub fn on_missing_bean(selector: impl Into<Selector>) -> OnBean {
    OnBean {
        selector: selector.into(),
        expect: Expect::None,
    }
}

#[must_use]
pub fn on_single_bean(selector: impl Into<Selector>) -> OnBean {
    OnBean {
        selector: selector.into(),
        expect: Expect::Single,
    }
}

pub struct Not(Box<dyn Condition>);

impl Condition for Not {
    fn matches(&self, facade: &Facade<'_>) -> anyhow::Result<bool> {
        self.0.matches(facade).map(|matched| !matched)
    }
}

#[must_use]
pub fn not(condition: impl Condition) -> Not {
    Not(Box::new(condition))
}

/// Group of conditions, short-circuits in declaration order.
pub struct Group {
    all: bool,
    conditions: Vec<Box<dyn Condition>>,
}

impl Group {
    #[inline]
    #[must_use]
    pub fn with(mut self, condition: impl Condition) -> Self {
        self.conditions.push(Box::new(condition));
        self
    }
}

impl Condition for Group {
    fn matches(&self, facade: &Facade<'_>) -> anyhow::Result<bool> {
        for condition in &self.conditions {
            if condition.matches(facade)? != self.all {
                return Ok(!self.all);
            }
        }
        Ok(self.all)
    }
}

/// Matches when every condition matches. Empty group matches.
#[must_use]
pub fn all() -> Group {
    Group {
        all: true,
        conditions: Vec::new(),
    }
}

/// Matches when any condition matches. Empty group doesn't match.
#[must_use]
pub fn any() -> Group {
    Group {
        all: false,
        conditions: Vec::new(),
    }
}
