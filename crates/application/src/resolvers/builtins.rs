//! Built-in dynamic variables
//!
//! Resolvers that ship with the registry. Each call computes a fresh value.

use chrono::format::{Item, StrftimeItems};
use chrono::{Local, Utc};
use rand::Rng;
use uuid::Uuid;
use varkit_domain::{
    DynamicContribution, DynamicResolver, DynamicVariable, ResolverError, resolver_factory,
};

/// Contributor id used for the built-in variables.
pub const BUILTIN_CONTRIBUTOR: &str = "varkit.builtin";

const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";
const DEFAULT_RANDOM_BOUND: u64 = 1000;

/// Information about a built-in resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltinInfo {
    /// Resolver id, also used as the variable name.
    pub id: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// Example output
    pub example: &'static str,
    /// Whether the resolver takes an argument.
    pub supports_argument: bool,
}

const BUILTINS: &[BuiltinInfo] = &[
    BuiltinInfo {
        id: "env_var",
        description: "Value of the environment variable named by the argument",
        example: "/home/user",
        supports_argument: true,
    },
    BuiltinInfo {
        id: "current_date",
        description: "Current local date, formatted with the strftime argument (default %Y-%m-%d)",
        example: "2024-01-26",
        supports_argument: true,
    },
    BuiltinInfo {
        id: "timestamp",
        description: "Unix timestamp in seconds",
        example: "1706284800",
        supports_argument: false,
    },
    BuiltinInfo {
        id: "uuid",
        description: "Random UUID v4",
        example: "550e8400-e29b-41d4-a716-446655440000",
        supports_argument: false,
    },
    BuiltinInfo {
        id: "random_int",
        description: "Random integer from 0 to the argument (default 1000)",
        example: "427",
        supports_argument: true,
    },
];

/// Resolver for one built-in id.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinResolver {
    id: &'static str,
}

impl DynamicResolver for BuiltinResolver {
    fn resolve(
        &self,
        _variable: &DynamicVariable,
        argument: Option<&str>,
    ) -> Result<String, ResolverError> {
        BuiltinResolvers::resolve(self.id, argument)
            .unwrap_or_else(|| Err(format!("unknown built-in resolver: {}", self.id).into()))
    }
}

/// Generates values for built-in dynamic variables.
pub struct BuiltinResolvers;

impl BuiltinResolvers {
    /// Resolves a built-in id with an optional argument.
    /// Returns None if the id is not a recognized built-in.
    #[must_use]
    pub fn resolve(id: &str, argument: Option<&str>) -> Option<Result<String, ResolverError>> {
        match id {
            "env_var" => Some(Self::env_var(argument)),
            "current_date" => Some(Self::current_date(argument)),
            "timestamp" => Some(Ok(Self::generate_timestamp())),
            "uuid" => Some(Ok(Self::generate_uuid())),
            "random_int" => Some(Self::random_int(argument)),
            _ => None,
        }
    }

    /// Returns whether the id names a built-in resolver.
    #[must_use]
    pub fn is_builtin(id: &str) -> bool {
        BUILTINS.iter().any(|b| b.id == id)
    }

    /// Returns all built-in resolvers with descriptions.
    #[must_use]
    pub fn available() -> &'static [BuiltinInfo] {
        BUILTINS
    }

    /// Returns a resolver for `id`, if it is a built-in.
    #[must_use]
    pub fn resolver(id: &str) -> Option<BuiltinResolver> {
        BUILTINS
            .iter()
            .find(|b| b.id == id)
            .map(|b| BuiltinResolver { id: b.id })
    }

    /// Returns one dynamic variable contribution per built-in, named by its id.
    #[must_use]
    pub fn contributions() -> Vec<DynamicContribution> {
        BUILTINS
            .iter()
            .map(|info| {
                let contribution = DynamicContribution::new(
                    info.id,
                    resolver_factory(BuiltinResolver { id: info.id }),
                    BUILTIN_CONTRIBUTOR,
                )
                .with_description(info.description);
                if info.supports_argument {
                    contribution.with_argument()
                } else {
                    contribution
                }
            })
            .collect()
    }

    /// Reads a process environment variable. Unset variables resolve to "".
    fn env_var(argument: Option<&str>) -> Result<String, ResolverError> {
        let Some(name) = argument else {
            return Err("env_var requires the environment variable name as argument".into());
        };
        match std::env::var(name) {
            Ok(value) => Ok(value),
            Err(std::env::VarError::NotPresent) => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Formats the current local time.
    fn current_date(argument: Option<&str>) -> Result<String, ResolverError> {
        let format = argument.unwrap_or(DEFAULT_DATE_FORMAT);
        if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
            return Err(format!("invalid date format: {format}").into());
        }
        Ok(Local::now().format(format).to_string())
    }

    /// Generates current Unix timestamp in seconds.
    fn generate_timestamp() -> String {
        Utc::now().timestamp().to_string()
    }

    /// Generates a random UUID v4.
    fn generate_uuid() -> String {
        Uuid::new_v4().to_string()
    }

    /// Generates a random integer between 0 and the bound, inclusive.
    fn random_int(argument: Option<&str>) -> Result<String, ResolverError> {
        let bound = match argument {
            Some(raw) => raw.trim().parse::<u64>()?,
            None => DEFAULT_RANDOM_BOUND,
        };
        let mut rng = rand::rng();
        Ok(rng.random_range(0..=bound).to_string())
    }
}
