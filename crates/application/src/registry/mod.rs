//! Variable registry
//!
//! The registry owns the value and dynamic namespaces and is the entry point
//! for substitution, validation, mutation and change notification.
//!
//! Both namespaces live behind one lock. The lock is never held while a
//! dynamic resolver or a listener runs, so both may call back into the
//! registry. Writes to the preference store are serialized by a second lock
//! held across encoding and `put`, so the store always ends up with the
//! newest snapshot. A store must not call back into the registry.

mod namespace;

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};
use varkit_domain::{
    DynamicVariable, RegistrySettings, ValueVariable, Variable, VariableError, VariableResult,
};

use crate::codec::encode_namespace;
use crate::notifier::{ChangeKind, ChangeNotifier, VariableListener};
use crate::ports::{ContributionSource, InMemoryPreferenceStore, NoContributions, PreferenceStore};
use crate::substitution::{self, Resolved, SubstitutionEngine, VariableLookup};

use namespace::Namespace;

/// Registry of value and dynamic variables.
///
/// Initializes lazily on first access: contributed value variables load first,
/// persisted values overlay them, and dynamic contributions load last.
pub struct Registry {
    state: Mutex<Namespace>,
    persist_lock: Mutex<()>,
    contributions: Arc<dyn ContributionSource>,
    store: Arc<dyn PreferenceStore>,
    settings: RegistrySettings,
    notifier: ChangeNotifier,
}

impl Registry {
    /// Creates a registry over a contribution source and a durable store.
    #[must_use]
    pub fn new(
        contributions: Arc<dyn ContributionSource>,
        store: Arc<dyn PreferenceStore>,
        settings: RegistrySettings,
    ) -> Self {
        Self {
            state: Mutex::new(Namespace::default()),
            persist_lock: Mutex::new(()),
            contributions,
            store,
            settings,
            notifier: ChangeNotifier::new(),
        }
    }

    /// Creates an empty registry persisting to memory only.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(NoContributions),
            Arc::new(InMemoryPreferenceStore::new()),
            RegistrySettings::default(),
        )
    }

    /// Returns the settings this registry was built with.
    #[must_use]
    pub const fn settings(&self) -> &RegistrySettings {
        &self.settings
    }

    /// Discards all in-memory state. The next access loads contributions and
    /// persisted values again. Listeners are kept.
    pub fn reload(&self) {
        *self.state.lock() = Namespace::default();
        debug!("variable registry reset");
    }

    /// Runs `f` on the namespaces under the lock, loading them first if needed.
    fn with_namespace<R>(&self, f: impl FnOnce(&mut Namespace) -> R) -> R {
        let (result, load_error) = {
            let mut state = self.state.lock();
            let load_error = if state.loaded {
                None
            } else {
                state.load(
                    self.contributions.value_variables(),
                    self.contributions.dynamic_variables(),
                    self.store.as_ref(),
                    &self.settings.preference_key,
                )
            };
            (f(&mut state), load_error)
        };
        if let Some(error) = load_error {
            self.notifier.persistence_failed(&error);
        }
        result
    }

    // ---- Construction and lookup ----

    /// Builds an unregistered value variable. Pass it to
    /// [`Registry::add_variables`] to register it.
    #[must_use]
    pub fn new_value_variable(
        name: impl Into<String>,
        description: Option<String>,
        read_only: bool,
        initial_value: Option<String>,
    ) -> ValueVariable {
        ValueVariable::new(name, description, read_only, initial_value)
    }

    /// Returns a snapshot of both namespaces, sorted by name.
    #[must_use]
    pub fn get_variables(&self) -> Vec<Variable> {
        let mut variables: Vec<Variable> = self.with_namespace(|ns| {
            ns.values
                .values()
                .cloned()
                .map(Variable::Value)
                .chain(ns.dynamics.values().cloned().map(Variable::Dynamic))
                .collect()
        });
        variables.sort_by(|a, b| a.name().cmp(b.name()).then(a.kind().cmp(&b.kind())));
        variables
    }

    /// Returns a snapshot of the value variables, sorted by name.
    #[must_use]
    pub fn value_variables(&self) -> Vec<ValueVariable> {
        let mut variables: Vec<ValueVariable> =
            self.with_namespace(|ns| ns.values.values().cloned().collect());
        variables.sort_by(|a, b| a.name().cmp(b.name()));
        variables
    }

    /// Returns the dynamic variables, sorted by name.
    #[must_use]
    pub fn dynamic_variables(&self) -> Vec<Arc<DynamicVariable>> {
        let mut variables: Vec<Arc<DynamicVariable>> =
            self.with_namespace(|ns| ns.dynamics.values().cloned().collect());
        variables.sort_by(|a, b| a.name().cmp(b.name()));
        variables
    }

    /// Returns a snapshot of a value variable. Does not run its initializer.
    #[must_use]
    pub fn get_value_variable(&self, name: &str) -> Option<ValueVariable> {
        self.with_namespace(|ns| ns.values.get(name).cloned())
    }

    /// Returns a dynamic variable.
    #[must_use]
    pub fn get_dynamic_variable(&self, name: &str) -> Option<Arc<DynamicVariable>> {
        self.with_namespace(|ns| ns.dynamics.get(name).cloned())
    }

    /// Reads a value variable, running its deferred initialization once.
    #[must_use]
    pub fn value_of(&self, name: &str) -> Option<String> {
        self.with_namespace(|ns| {
            ns.values
                .get_mut(name)
                .and_then(|variable| variable.value().map(str::to_string))
        })
    }

    // ---- Mutation ----

    /// Registers value variables.
    ///
    /// # Errors
    ///
    /// Fails without registering anything if a name is empty, already
    /// registered, or repeated within `variables`.
    pub fn add_variables(&self, variables: Vec<ValueVariable>) -> VariableResult<()> {
        if variables.is_empty() {
            return Ok(());
        }
        let added = self.with_namespace(|ns| {
            check_new_names(ns, &variables)?;
            for variable in &variables {
                ns.values
                    .insert(variable.name().to_string(), variable.clone());
            }
            Ok::<_, VariableError>(variables)
        })?;

        debug!(count = added.len(), "value variables added");
        self.notifier.notify(ChangeKind::Added, added);
        self.persist();
        Ok(())
    }

    /// Unregisters value variables by name. Unknown names are skipped.
    pub fn remove_variables<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let removed: Vec<ValueVariable> = self.with_namespace(|ns| {
            names
                .into_iter()
                .filter_map(|name| ns.values.remove(name.as_ref()))
                .collect()
        });
        if removed.is_empty() {
            return;
        }

        debug!(count = removed.len(), "value variables removed");
        self.notifier.notify(ChangeKind::Removed, removed);
        self.persist();
    }

    /// Writes a value variable's value.
    ///
    /// Returns false if nothing changed: the name is no longer registered, or
    /// the variable is read-only and already initialized.
    pub fn set_value(&self, name: &str, value: Option<String>) -> bool {
        self.update(name, |variable| {
            let written = variable.set_value(value);
            if !written {
                debug!(name = %variable.name(), "ignored write to read-only variable");
            }
            written
        })
    }

    /// Replaces a value variable's description.
    ///
    /// Returns false if the name is no longer registered.
    pub fn set_description(&self, name: &str, description: Option<String>) -> bool {
        self.update(name, |variable| {
            variable.set_description(description);
            true
        })
    }

    /// Writes a value variable's value and, when `description` is given, its
    /// description, as one change.
    ///
    /// Returns false if nothing changed: the name is no longer registered, or
    /// the value write was ignored and no description was given.
    pub fn set_value_and_description(
        &self,
        name: &str,
        value: Option<String>,
        description: Option<String>,
    ) -> bool {
        self.update(name, |variable| {
            let written = variable.set_value(value);
            let described = description.is_some();
            if described {
                variable.set_description(description);
            }
            written || described
        })
    }

    fn update(&self, name: &str, apply: impl FnOnce(&mut ValueVariable) -> bool) -> bool {
        let changed = self.with_namespace(|ns| {
            let Some(variable) = ns.values.get_mut(name) else {
                warn!(name = %name, "stale write to unregistered variable ignored");
                return None;
            };
            apply(variable).then(|| variable.clone())
        });
        let Some(variable) = changed else {
            return false;
        };

        self.notifier.notify(ChangeKind::Changed, vec![variable]);
        self.persist();
        true
    }

    /// Writes the persistable value variables to the store.
    ///
    /// Failures are logged and reported to listeners; the in-memory state stands.
    fn persist(&self) {
        let _writing = self.persist_lock.lock();
        let encoded = self.with_namespace(|ns| encode_namespace(ns.values.values()));
        let result = encoded
            .map_err(|e| VariableError::PersistenceFailure(e.to_string()))
            .and_then(|blob| {
                self.store
                    .put(&self.settings.preference_key, &blob)
                    .map_err(|e| VariableError::PersistenceFailure(e.to_string()))
            });
        if let Err(error) = result {
            warn!(error = %error, "failed to persist value variables");
            self.notifier.persistence_failed(&error);
        }
    }

    // ---- Substitution ----

    /// Expands every `${name}` and `${name:argument}` reference in `expression`.
    ///
    /// # Errors
    ///
    /// Returns the first error met. With `report_undefined == false` an
    /// undefined name expands to the empty string instead.
    pub fn perform_string_substitution(
        &self,
        expression: &str,
        report_undefined: bool,
    ) -> VariableResult<String> {
        SubstitutionEngine::new(self, self.settings.max_depth)
            .substitute(expression, report_undefined)
    }

    /// Expands `expression`, failing on undefined names.
    ///
    /// # Errors
    ///
    /// See [`Registry::perform_string_substitution`].
    pub fn perform_string_substitution_strict(&self, expression: &str) -> VariableResult<String> {
        self.perform_string_substitution(expression, true)
    }

    /// Checks syntax and that every referenced name is registered.
    ///
    /// Runs no resolver and no deferred initializer.
    ///
    /// # Errors
    ///
    /// Returns `UnterminatedToken` or `UndefinedVariable` for the first problem.
    pub fn validate_string_variables(&self, expression: &str) -> VariableResult<()> {
        SubstitutionEngine::new(self, self.settings.max_depth).validate(expression)
    }

    /// Formats `${name}` or `${name:argument}`.
    #[must_use]
    pub fn generate_variable_expression(name: &str, argument: Option<&str>) -> String {
        substitution::generate_variable_expression(name, argument)
    }

    // ---- Listeners ----

    /// Registers a change listener.
    pub fn add_listener(&self, listener: Arc<dyn VariableListener>) {
        self.notifier.add_listener(listener);
    }

    /// Unregisters a change listener.
    pub fn remove_listener(&self, listener: &Arc<dyn VariableListener>) {
        self.notifier.remove_listener(listener);
    }
}

fn check_new_names(ns: &Namespace, variables: &[ValueVariable]) -> VariableResult<()> {
    let mut seen = HashSet::new();
    for variable in variables {
        let name = variable.name();
        if name.is_empty() {
            return Err(VariableError::InvalidVariableName(name.to_string()));
        }
        if ns.values.contains_key(name) || !seen.insert(name) {
            return Err(VariableError::DuplicateVariable(name.to_string()));
        }
    }
    Ok(())
}

impl VariableLookup for Registry {
    fn lookup(&self, name: &str) -> Resolved {
        self.with_namespace(|ns| {
            if let Some(variable) = ns.values.get_mut(name) {
                return Resolved::Value(variable.value().map(str::to_string));
            }
            ns.dynamics
                .get(name)
                .map_or(Resolved::Undefined, |variable| {
                    Resolved::Dynamic(Arc::clone(variable))
                })
        })
    }

    fn is_defined(&self, name: &str) -> bool {
        self.with_namespace(|ns| ns.contains(name))
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Registry")
            .field("loaded", &state.loaded)
            .field("values", &state.values.len())
            .field("dynamics", &state.dynamics.len())
            .field("settings", &self.settings)
            .field("notifier", &self.notifier)
            .finish_non_exhaustive()
    }
}
