use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use super::Condition;

/// An immutable condition that can be shared across threads and reused.
///
/// Cloning and re-freezing share the same allocation.
#[derive(Debug, Clone)]
pub struct FrozenCondition(Arc<Condition>);

impl FrozenCondition {
    /// Freezing a frozen condition returns the same condition.
    pub fn freeze(&self) -> FrozenCondition {
        self.clone()
    }

    /// Borrow the condition.
    pub fn condition(&self) -> &Condition {
        &self.0
    }

    /// Whether both handles share the same allocation.
    pub fn ptr_eq(&self, other: &FrozenCondition) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for FrozenCondition {
    type Target = Condition;

    fn deref(&self) -> &Condition {
        &self.0
    }
}

impl AsRef<Condition> for FrozenCondition {
    fn as_ref(&self) -> &Condition {
        &self.0
    }
}

impl From<Condition> for FrozenCondition {
    fn from(condition: Condition) -> Self {
        Self(Arc::new(condition))
    }
}

impl PartialEq for FrozenCondition {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *self.0 == *other.0
    }
}

impl PartialEq<Condition> for FrozenCondition {
    fn eq(&self, other: &Condition) -> bool {
        *self.0 == *other
    }
}

impl fmt::Display for FrozenCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
