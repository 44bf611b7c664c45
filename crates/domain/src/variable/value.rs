//! Value variable types

use std::fmt;
use std::sync::Arc;

/// Computes the first value of a contributed variable on first read.
///
/// Runs at most once per variable and must not call back into the registry
/// that owns the variable.
pub trait ValueInitializer: Send + Sync {
    /// Returns the initial value for the named variable, or `None` to leave it unset.
    fn initialize(&self, name: &str) -> Option<String>;
}

impl<F> ValueInitializer for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn initialize(&self, name: &str) -> Option<String> {
        self(name)
    }
}

/// What a variable does on its first read.
#[derive(Clone, Default)]
pub enum DeferredValue {
    /// Nothing configured; the variable becomes initialized without a value.
    #[default]
    None,
    /// An explicit initial value.
    Value(String),
    /// A one-shot initializer callback.
    Initializer(Arc<dyn ValueInitializer>),
}

impl DeferredValue {
    /// Wraps a closure or initializer type.
    pub fn initializer(initializer: impl ValueInitializer + 'static) -> Self {
        Self::Initializer(Arc::new(initializer))
    }
}

impl From<Option<String>> for DeferredValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(Self::None, Self::Value)
    }
}

impl fmt::Debug for DeferredValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Initializer(_) => f.write_str("Initializer(..)"),
        }
    }
}

/// Lifecycle of a value variable's content.
#[derive(Debug, Clone)]
pub enum ValueState {
    /// Not read yet; holds what the first read will produce.
    Uninitialized(DeferredValue),
    /// Read or written at least once. `None` means "no value", distinct from `""`.
    Initialized(Option<String>),
}

/// A named, mutable string variable.
#[derive(Debug, Clone)]
pub struct ValueVariable {
    name: String,
    description: Option<String>,
    read_only: bool,
    contributed: bool,
    contributor: Option<String>,
    state: ValueState,
}

impl ValueVariable {
    /// Creates a caller-owned variable. The initial value is applied on first read.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        read_only: bool,
        initial_value: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description,
            read_only,
            contributed: false,
            contributor: None,
            state: ValueState::Uninitialized(initial_value.into()),
        }
    }

    /// Creates a variable registered from an external contribution.
    #[must_use]
    pub fn contributed(
        name: impl Into<String>,
        description: Option<String>,
        read_only: bool,
        deferred: DeferredValue,
        contributor: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description,
            read_only,
            contributed: true,
            contributor: Some(contributor.into()),
            state: ValueState::Uninitialized(deferred),
        }
    }

    /// Returns the variable name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Replaces the description.
    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    /// Returns true if writes after initialization are ignored.
    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Returns true if this variable came from a contribution.
    #[must_use]
    pub const fn is_contributed(&self) -> bool {
        self.contributed
    }

    /// Returns the identifier of the contributor that registered this variable.
    #[must_use]
    pub fn contributor(&self) -> Option<&str> {
        self.contributor.as_deref()
    }

    /// Returns true once the variable has been read or written.
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        matches!(self.state, ValueState::Initialized(_))
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> &ValueState {
        &self.state
    }

    /// Runs the deferred initialization if it has not happened yet.
    ///
    /// Never re-attempts: a variable without an initial value or initializer
    /// ends up initialized with no value.
    pub fn initialize(&mut self) {
        let ValueState::Uninitialized(deferred) = &self.state else {
            return;
        };
        let value = match deferred {
            DeferredValue::None => None,
            DeferredValue::Value(value) => Some(value.clone()),
            DeferredValue::Initializer(initializer) => initializer.initialize(&self.name),
        };
        self.state = ValueState::Initialized(value);
    }

    /// Reads the value, initializing it first if needed.
    pub fn value(&mut self) -> Option<&str> {
        self.initialize();
        match &self.state {
            ValueState::Initialized(value) => value.as_deref(),
            ValueState::Uninitialized(_) => None,
        }
    }

    /// Returns the value without running any initializer.
    ///
    /// An explicit pending initial value is visible; an initializer callback is not.
    #[must_use]
    pub fn peek_value(&self) -> Option<&str> {
        match &self.state {
            ValueState::Initialized(value) => value.as_deref(),
            ValueState::Uninitialized(DeferredValue::Value(value)) => Some(value),
            ValueState::Uninitialized(_) => None,
        }
    }

    /// Writes a new value.
    ///
    /// Returns false without touching anything when the variable is read-only
    /// and already initialized.
    pub fn set_value(&mut self, value: Option<String>) -> bool {
        if self.read_only && self.is_initialized() {
            return false;
        }
        self.state = ValueState::Initialized(value);
        true
    }
}
