//! Change notification for value variables.

use std::sync::Arc;

use parking_lot::RwLock;
use varkit_domain::{ValueVariable, VariableError};

/// What happened to the variables carried by an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// Variables were registered.
    Added,
    /// Variables were unregistered.
    Removed,
    /// A variable's value or description changed.
    Changed,
}

/// A batch of variables affected by one mutation.
#[derive(Debug, Clone)]
pub struct VariableEvent {
    /// Kind of change.
    pub kind: ChangeKind,
    /// Snapshots of the affected variables, taken right after the mutation.
    pub variables: Vec<ValueVariable>,
}

impl VariableEvent {
    /// Returns the names of the affected variables.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.variables.iter().map(ValueVariable::name).collect()
    }
}

/// Observer of registry changes.
///
/// Called synchronously on the mutating thread, after the registry lock has
/// been released, so a listener may call back into the registry.
pub trait VariableListener: Send + Sync {
    /// Called after variables were added, removed, or changed.
    fn variables_changed(&self, event: &VariableEvent);

    /// Called when a persistence attempt failed. The in-memory change stands.
    fn persistence_failed(&self, _error: &VariableError) {}
}

impl<F> VariableListener for F
where
    F: Fn(&VariableEvent) + Send + Sync,
{
    fn variables_changed(&self, event: &VariableEvent) {
        self(event);
    }
}

/// Dispatches events to listeners in registration order.
#[derive(Default)]
pub struct ChangeNotifier {
    listeners: RwLock<Vec<Arc<dyn VariableListener>>>,
}

fn same_listener(a: &Arc<dyn VariableListener>, b: &Arc<dyn VariableListener>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

impl ChangeNotifier {
    /// Creates a notifier with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener. Registering the same listener twice has no effect.
    pub fn add_listener(&self, listener: Arc<dyn VariableListener>) {
        let mut listeners = self.listeners.write();
        if !listeners.iter().any(|known| same_listener(known, &listener)) {
            listeners.push(listener);
        }
    }

    /// Unregisters a listener, compared by identity.
    pub fn remove_listener(&self, listener: &Arc<dyn VariableListener>) {
        self.listeners
            .write()
            .retain(|known| !same_listener(known, listener));
    }

    /// Returns the number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    // Listeners may add or remove listeners, so dispatch over a copy.
    fn snapshot(&self) -> Vec<Arc<dyn VariableListener>> {
        self.listeners.read().clone()
    }

    /// Sends one event to every listener. Empty batches are dropped.
    pub fn notify(&self, kind: ChangeKind, variables: Vec<ValueVariable>) {
        if variables.is_empty() {
            return;
        }
        let event = VariableEvent { kind, variables };
        for listener in self.snapshot() {
            listener.variables_changed(&event);
        }
    }

    /// Reports a persistence failure to every listener.
    pub fn persistence_failed(&self, error: &VariableError) {
        for listener in self.snapshot() {
            listener.persistence_failed(error);
        }
    }
}

impl std::fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
