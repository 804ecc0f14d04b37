//! Factor registry: name-based construction and discovery.
//!
//! A [`FactorRegistry`] maps factor names to constructor functions. It is an
//! ordinary value built once at startup with explicit [`FactorRegistry::register`]
//! calls and read afterwards; nothing is registered implicitly.

use crate::{behavioral::PanicFactor, liquidity::Illiquidity};
use ronda_traits::{Factor, Result, RondaError};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::collections::BTreeMap;
use std::fmt;

/// Factor parameters as a JSON object, e.g. `{"lookback": 10, "do_zscore": true}`.
pub type FactorParams = serde_json::Value;

/// A function building a factor from its parameters.
pub type FactorConstructor = fn(&FactorParams) -> Result<Box<dyn Factor>>;

/// What [`FactorRegistry::register`] does when the name is already taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Fail with [`RondaError::DuplicateName`].
    #[default]
    Reject,
    /// Replace the existing constructor.
    Overwrite,
}

/// Name to constructor mapping for factors.
///
/// # Example
///
/// ```no_run
/// use ronda_factors::registry::FactorRegistry;
/// use serde_json::json;
///
/// let registry = FactorRegistry::with_builtin();
/// let factor = registry.create("panic", &json!({"weight_method": "turnover"})).unwrap();
/// assert_eq!(factor.name(), "panic");
/// ```
#[derive(Clone, Default)]
pub struct FactorRegistry {
    constructors: BTreeMap<String, FactorConstructor>,
    policy: DuplicatePolicy,
}

impl fmt::Debug for FactorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactorRegistry")
            .field("names", &self.names())
            .field("policy", &self.policy)
            .finish()
    }
}

impl FactorRegistry {
    /// An empty registry with the given duplicate policy.
    #[must_use]
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self {
            constructors: BTreeMap::new(),
            policy,
        }
    }

    /// A registry holding every factor shipped with this crate.
    #[must_use]
    pub fn with_builtin() -> Self {
        let mut registry = Self::default();
        registry
            .constructors
            .insert(Illiquidity::NAME.to_string(), build_illiquidity);
        registry
            .constructors
            .insert(PanicFactor::NAME.to_string(), build_panic);
        registry
    }

    /// Add a constructor under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::DuplicateName`] if the name is taken and the policy is
    /// [`DuplicatePolicy::Reject`].
    pub fn register(&mut self, name: impl Into<String>, constructor: FactorConstructor) -> Result<()> {
        let name = name.into();
        if self.constructors.contains_key(&name) {
            match self.policy {
                DuplicatePolicy::Reject => return Err(RondaError::DuplicateName(name)),
                DuplicatePolicy::Overwrite => {
                    log::debug!("overwriting factor constructor '{name}'");
                }
            }
        }
        self.constructors.insert(name, constructor);
        Ok(())
    }

    /// Build the factor registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::UnknownFactor`] for an unregistered name, and whatever
    /// the constructor returns for bad parameters.
    pub fn create(&self, name: &str, params: &FactorParams) -> Result<Box<dyn Factor>> {
        let constructor = self
            .constructors
            .get(name)
            .ok_or_else(|| RondaError::UnknownFactor(name.to_string()))?;
        constructor(params)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.constructors.keys().map(String::as_str).collect()
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Number of registered factors.
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    /// The duplicate policy in force.
    pub const fn policy(&self) -> DuplicatePolicy {
        self.policy
    }
}

fn build_illiquidity(params: &FactorParams) -> Result<Box<dyn Factor>> {
    Ok(Box::new(Illiquidity::from_params(params)?))
}

fn build_panic(params: &FactorParams) -> Result<Box<dyn Factor>> {
    Ok(Box::new(PanicFactor::from_params(params)?))
}

/// Deserialize a factor config from its parameters; `null` means all defaults.
///
/// `fields` lists the parameter names the config accepts.
///
/// # Errors
///
/// Returns [`RondaError::InvalidConfig`] if a parameter name is not in `fields`
/// or the parameters do not fit the config.
pub fn config_from_params<T: DeserializeOwned>(params: &FactorParams, fields: &[&str]) -> Result<T> {
    if let Some(object) = params.as_object() {
        if let Some(key) = object.keys().find(|key| !fields.contains(&key.as_str())) {
            return Err(RondaError::InvalidConfig(format!(
                "unknown parameter '{key}', expected one of: {}",
                fields.join(", ")
            )));
        }
    }
    let params = if params.is_null() {
        FactorParams::Object(serde_json::Map::new())
    } else {
        params.clone()
    };
    serde_json::from_value(params).map_err(|e| RondaError::InvalidConfig(e.to_string()))
}

/// Factor category classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FactorCategory {
    /// Trading-cost and price-impact factors
    Liquidity,
    /// Investor-behavior factors
    Behavioral,
}

impl FactorCategory {
    /// Get a human-readable description of the category.
    #[must_use]
    pub const fn description(&self) -> &str {
        match self {
            Self::Liquidity => "Price impact per unit of trading activity",
            Self::Behavioral => "Investor reaction relative to the market",
        }
    }
}

/// Metadata about a factor.
#[derive(Debug, Clone, Serialize)]
pub struct FactorInfo {
    /// Registry name
    pub name: &'static str,

    /// Category classification
    pub category: FactorCategory,

    /// Human-readable description
    pub description: &'static str,

    /// Default lookback in trading days
    pub default_lookback: usize,

    /// Panel columns the factor reads
    pub required_columns: &'static [&'static str],
}

/// Get information about all built-in factors.
#[must_use]
pub fn available_factors() -> Vec<FactorInfo> {
    vec![
        FactorInfo {
            name: Illiquidity::NAME,
            category: FactorCategory::Liquidity,
            description: "Rolling sum of ln(1 + |return|) over rolling turnover (or volume)",
            default_lookback: Illiquidity::DEFAULT_LOOKBACK,
            required_columns: &["close", "turnover|volume"],
        },
        FactorInfo {
            name: PanicFactor::NAME,
            category: FactorCategory::Behavioral,
            description: "Rolling volatility of panic-weighted returns against the market",
            default_lookback: PanicFactor::DEFAULT_LOOKBACK,
            required_columns: &["close"],
        },
    ]
}

/// Get information about a specific factor by name.
#[must_use]
pub fn get_factor_info(name: &str) -> Option<FactorInfo> {
    available_factors().into_iter().find(|info| info.name == name)
}
