//! The two variable namespaces guarded by the registry lock.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use tracing::{debug, warn};
use varkit_domain::{
    DynamicContribution, DynamicVariable, ValueContribution, ValueVariable, VariableError,
    VariableResult,
};

use crate::codec::{decode_namespace, overlay};
use crate::ports::PreferenceStore;

/// Value and dynamic variables, keyed by name.
#[derive(Debug, Default)]
pub(super) struct Namespace {
    pub(super) loaded: bool,
    pub(super) values: HashMap<String, ValueVariable>,
    pub(super) dynamics: HashMap<String, Arc<DynamicVariable>>,
}

impl Namespace {
    /// Fills an empty namespace: value contributions, then the persisted
    /// overlay, then dynamic contributions.
    ///
    /// A persisted blob that cannot be read is returned as an error after the
    /// contributions have been loaded; the namespace is usable either way.
    pub(super) fn load(
        &mut self,
        values: Vec<ValueContribution>,
        dynamics: Vec<DynamicContribution>,
        store: &dyn PreferenceStore,
        key: &str,
    ) -> Option<VariableError> {
        self.loaded = true;

        for contribution in values {
            if contribution.name.is_empty() {
                warn!(contributor = %contribution.contributor, "skipping value variable without a name");
                continue;
            }
            let variable = contribution.into_variable();
            self.insert_value_contribution(variable);
        }

        let load_error = self.overlay_persisted(store, key).err();
        if let Some(error) = &load_error {
            warn!(error = %error, "persisted variables not loaded");
        }

        for contribution in dynamics {
            if contribution.name.is_empty() {
                warn!(contributor = %contribution.contributor, "skipping dynamic variable without a name");
                continue;
            }
            self.insert_dynamic_contribution(contribution.into_variable());
        }

        debug!(
            values = self.values.len(),
            dynamics = self.dynamics.len(),
            "variable registry initialized"
        );
        load_error
    }

    fn insert_value_contribution(&mut self, variable: ValueVariable) {
        match self.values.entry(variable.name().to_string()) {
            Entry::Occupied(mut slot) => {
                warn!(
                    name = %variable.name(),
                    overridden = slot.get().contributor().unwrap_or_default(),
                    contributor = variable.contributor().unwrap_or_default(),
                    "value variable contributed twice, last one wins"
                );
                slot.insert(variable);
            }
            Entry::Vacant(slot) => {
                slot.insert(variable);
            }
        }
    }

    fn insert_dynamic_contribution(&mut self, variable: DynamicVariable) {
        let name = variable.name().to_string();
        let variable = Arc::new(variable);
        if let Some(previous) = self.dynamics.insert(name.clone(), Arc::clone(&variable)) {
            warn!(
                name = %name,
                overridden = previous.contributor().unwrap_or_default(),
                contributor = variable.contributor().unwrap_or_default(),
                "dynamic variable contributed twice, last one wins"
            );
        }
    }

    fn overlay_persisted(&mut self, store: &dyn PreferenceStore, key: &str) -> VariableResult<()> {
        let blob = store
            .get(key)
            .map_err(|e| VariableError::PersistenceFailure(e.to_string()))?;
        let Some(blob) = blob else {
            return Ok(());
        };
        let records =
            decode_namespace(&blob).map_err(|e| VariableError::PersistenceFailure(e.to_string()))?;
        debug!(records = records.len(), "overlaying persisted variables");
        overlay(&mut self.values, records);
        Ok(())
    }

    /// Returns true if `name` is registered in either namespace.
    pub(super) fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name) || self.dynamics.contains_key(name)
    }
}
