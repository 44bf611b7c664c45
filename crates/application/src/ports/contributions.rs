//! Contribution source port
//!
//! Supplies contributed variable definitions when a registry initializes.

use varkit_domain::{DynamicContribution, ValueContribution};

/// Source of contributed variable definitions.
///
/// Consulted once per registry initialization. Later entries with the same
/// name override earlier ones.
pub trait ContributionSource: Send + Sync {
    /// Returns the contributed value variables.
    fn value_variables(&self) -> Vec<ValueContribution>;

    /// Returns the contributed dynamic variables.
    fn dynamic_variables(&self) -> Vec<DynamicContribution>;
}

/// A source that contributes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoContributions;

impl ContributionSource for NoContributions {
    fn value_variables(&self) -> Vec<ValueContribution> {
        Vec::new()
    }

    fn dynamic_variables(&self) -> Vec<DynamicContribution> {
        Vec::new()
    }
}

/// A fixed list of contributions.
#[derive(Debug, Clone, Default)]
pub struct StaticContributions {
    values: Vec<ValueContribution>,
    dynamics: Vec<DynamicContribution>,
}

impl StaticContributions {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value variable contribution.
    #[must_use]
    pub fn with_value(mut self, contribution: ValueContribution) -> Self {
        self.values.push(contribution);
        self
    }

    /// Appends a dynamic variable contribution.
    #[must_use]
    pub fn with_dynamic(mut self, contribution: DynamicContribution) -> Self {
        self.dynamics.push(contribution);
        self
    }

    /// Appends several dynamic variable contributions.
    #[must_use]
    pub fn with_dynamics(mut self, contributions: impl IntoIterator<Item = DynamicContribution>) -> Self {
        self.dynamics.extend(contributions);
        self
    }

    /// Appends everything from `other` after the current entries.
    #[must_use]
    pub fn merged(mut self, other: Self) -> Self {
        self.values.extend(other.values);
        self.dynamics.extend(other.dynamics);
        self
    }

    /// Returns the number of contributed variables of both kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len() + self.dynamics.len()
    }

    /// Returns true if nothing is contributed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ContributionSource for StaticContributions {
    fn value_variables(&self) -> Vec<ValueContribution> {
        self.values.clone()
    }

    fn dynamic_variables(&self) -> Vec<DynamicContribution> {
        self.dynamics.clone()
    }
}
