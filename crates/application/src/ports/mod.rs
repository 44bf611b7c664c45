//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the registry and its collaborators.
//! Each port is a trait that can be implemented by adapters in the infrastructure layer.

mod contributions;
mod preference_store;

pub use contributions::{ContributionSource, NoContributions, StaticContributions};
pub use preference_store::{InMemoryPreferenceStore, PreferenceStore, StoreError};
