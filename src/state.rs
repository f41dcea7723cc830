use std::fmt::{self, Display, Formatter};

/// Coarse container lifecycle. Only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RefreshState {
    Unrefreshed,
    Refreshing,
    Refreshed,
}

impl Display for RefreshState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unrefreshed => "unrefreshed",
            Self::Refreshing => "refreshing",
            Self::Refreshed => "refreshed",
        })
    }
}

impl RefreshState {
    /// Structural methods (registration, properties) are only valid before refresh.
    ///
    /// # Panics
    /// Panics if refresh has already begun.
    #[track_caller]
    pub(crate) fn expect_unrefreshed(self, operation: &str) {
        assert!(
            self == Self::Unrefreshed,
            "`{operation}` should be called before refreshing, container is {state}",
            state = self
        );
    }

    /// Queries and wiring are only valid once refresh has begun.
    ///
    /// # Panics
    /// Panics if refresh hasn't begun yet.
    #[track_caller]
    pub(crate) fn expect_refreshing(self, operation: &str) {
        assert!(
            self != Self::Unrefreshed,
            "`{operation}` should be called after refreshing began, container is {state}",
            state = self
        );
    }

    /// # Panics
    /// Panics if the container isn't fully refreshed.
    #[track_caller]
    pub(crate) fn expect_refreshed(self, operation: &str) {
        assert!(
            self == Self::Refreshed,
            "`{operation}` should be called after refresh, container is {state}",
            state = self
        );
    }

    /// # Panics
    /// Panics if refresh was already requested.
    #[track_caller]
    pub(crate) fn begin_refresh(&mut self) {
        assert!(*self == Self::Unrefreshed, "container already {state}", state = *self);
        *self = Self::Refreshing;
    }

    pub(crate) fn complete_refresh(&mut self) {
        debug_assert_eq!(*self, Self::Refreshing);
        *self = Self::Refreshed;
    }
}

#[cfg(test)]
mod tests {
    use super::RefreshState;

    #[test]
    fn test_transitions() {
        let mut state = RefreshState::Unrefreshed;
        state.expect_unrefreshed("object");

        state.begin_refresh();
        state.expect_refreshing("find");
        assert_eq!(state, RefreshState::Refreshing);

        state.complete_refresh();
        state.expect_refreshed("close");
        state.expect_refreshing("find");
    }

    #[test]
    #[should_panic(expected = "container already refreshed")]
    fn test_refresh_twice() {
        let mut state = RefreshState::Refreshed;
        state.begin_refresh();
    }

    #[test]
    #[should_panic(expected = "should be called after refreshing began")]
    fn test_query_before_refresh() {
        RefreshState::Unrefreshed.expect_refreshing("find");
    }

    #[test]
    #[should_panic(expected = "should be called before refreshing")]
    fn test_register_after_refresh() {
        RefreshState::Refreshing.expect_unrefreshed("object");
    }
}
