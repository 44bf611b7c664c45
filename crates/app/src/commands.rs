//! Command execution
//!
//! Builds a registry from the command-line paths and runs one command
//! against it. Commands return their output instead of printing it.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use parking_lot::Mutex;
use tracing::debug;
use varkit_application::notifier::{VariableEvent, VariableListener};
use varkit_application::{BuiltinResolvers, Registry, ResolverCatalog, StaticContributions};
use varkit_domain::{Variable, VariableError};
use varkit_infrastructure::{FilePreferenceStore, ManifestContributions, SettingsRepository};

use crate::{Command, SetArgs};

/// File locations given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Paths {
    pub store: Option<PathBuf>,
    pub settings: Option<PathBuf>,
    pub contributions: Option<PathBuf>,
}

/// Collects persistence failures reported while a command runs.
#[derive(Default)]
struct FailureLog {
    failures: Mutex<Vec<VariableError>>,
}

impl FailureLog {
    fn first(&self) -> Option<VariableError> {
        self.failures.lock().first().cloned()
    }
}

impl VariableListener for FailureLog {
    fn variables_changed(&self, event: &VariableEvent) {
        debug!(kind = ?event.kind, names = ?event.names(), "variables changed");
    }

    fn persistence_failed(&self, error: &VariableError) {
        self.failures.lock().push(error.clone());
    }
}

/// Builds the registry: built-in dynamic variables, then the manifest's
/// contributions, over the preference file.
pub fn build_registry(paths: &Paths) -> anyhow::Result<Registry> {
    let settings_repo = paths
        .settings
        .as_ref()
        .map_or_else(SettingsRepository::new, SettingsRepository::at);
    let settings = settings_repo.load().context("failed to load settings")?;

    let store = match &paths.store {
        Some(path) => FilePreferenceStore::new(path),
        None => FilePreferenceStore::at_default_location()?,
    };
    debug!(path = %store.path().display(), "using preference store");

    let mut contributions =
        StaticContributions::new().with_dynamics(ResolverCatalog::builtin_contributions());
    if let Some(path) = &paths.contributions {
        let manifest = ManifestContributions::load(path, &ResolverCatalog::with_builtins())
            .with_context(|| format!("failed to load contributions from {}", path.display()))?;
        contributions = contributions.merged(manifest);
    }

    Ok(Registry::new(Arc::new(contributions), Arc::new(store), settings))
}

/// Runs `command` and returns what it prints.
///
/// A persistence failure fails the command even though the in-memory change
/// was made.
pub fn run(paths: &Paths, command: Command) -> anyhow::Result<String> {
    let registry = build_registry(paths)?;
    let failures = Arc::new(FailureLog::default());
    registry.add_listener(failures.clone());

    let output = execute(&registry, command)?;
    if let Some(error) = failures.first() {
        return Err(error).context("variables could not be saved");
    }
    Ok(output)
}

fn execute(registry: &Registry, command: Command) -> anyhow::Result<String> {
    match command {
        Command::Substitute(args) => {
            Ok(registry.perform_string_substitution(&args.expression, !args.lenient)?)
        }
        Command::Validate { expression } => {
            registry.validate_string_variables(&expression)?;
            Ok("ok".to_string())
        }
        Command::Set(args) => set(registry, args),
        Command::Unset { names } => {
            registry.remove_variables(&names);
            Ok(String::new())
        }
        Command::List => Ok(list(registry)),
        Command::Builtins => Ok(builtins()),
    }
}

fn set(registry: &Registry, args: SetArgs) -> anyhow::Result<String> {
    let SetArgs {
        name,
        value,
        description,
    } = args;

    match registry.get_value_variable(&name) {
        None => {
            registry.add_variables(vec![Registry::new_value_variable(
                name,
                description,
                false,
                Some(value),
            )])?;
        }
        Some(existing) if existing.is_read_only() => bail!("variable {name} is read-only"),
        Some(_) => {
            if !registry.set_value_and_description(&name, Some(value), description) {
                bail!("variable {name} was removed while being updated");
            }
        }
    }
    Ok(String::new())
}

fn list(registry: &Registry) -> String {
    let mut output = String::new();
    for variable in registry.get_variables() {
        let detail = match &variable {
            Variable::Value(value) => {
                let mut detail = value.peek_value().unwrap_or("<unset>").to_string();
                if value.is_read_only() {
                    detail.push_str(" (read-only)");
                }
                detail
            }
            Variable::Dynamic(dynamic) => dynamic.description().unwrap_or_default().to_string(),
        };
        let _ = writeln!(
            output,
            "{}\t{}\t{detail}",
            variable.name(),
            variable.kind().display_name()
        );
    }
    output.trim_end().to_string()
}

fn builtins() -> String {
    BuiltinResolvers::available()
        .iter()
        .map(|info| {
            let expression = Registry::generate_variable_expression(
                info.id,
                info.supports_argument.then_some("ARG"),
            );
            format!("{expression}\t{}\t(e.g. {})", info.description, info.example)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
