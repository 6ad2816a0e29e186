use hashmesh_types::BackendId;
use serde::{Deserialize, Serialize};

use crate::error::{ResolveError, ResolveResult};

/// Rule for picking the backend that assigns the hash of a new object when
/// the caller gives no hint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetPolicy {
    /// First backend that is not network-addressed, else the first backend.
    #[default]
    PreferLocal,
    /// First configured backend.
    First,
    /// A specific backend.
    Named(BackendId),
}

impl TargetPolicy {
    /// Pick a backend from `ids` (configuration order).
    pub fn select<'a>(&self, ids: &'a [BackendId]) -> Option<&'a BackendId> {
        match self {
            Self::PreferLocal => ids
                .iter()
                .find(|id| !id.is_network_addressed())
                .or_else(|| ids.first()),
            Self::First => ids.first(),
            Self::Named(name) => ids.iter().find(|id| *id == name),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub default_target: TargetPolicy,
    /// Retry with a full broadcast after every known source failed.
    pub fallback_to_broadcast: bool,
    pub replication_channel_capacity: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            default_target: TargetPolicy::PreferLocal,
            fallback_to_broadcast: false,
            replication_channel_capacity: 256,
        }
    }
}

impl ResolverConfig {
    pub fn from_toml_str(s: &str) -> ResolveResult<Self> {
        toml::from_str(s).map_err(|e| ResolveError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<BackendId> {
        names.iter().map(|n| BackendId::new(*n).unwrap()).collect()
    }

    #[test]
    fn default_config() {
        let c = ResolverConfig::default();
        assert_eq!(c.default_target, TargetPolicy::PreferLocal);
        assert!(!c.fallback_to_broadcast);
        assert_eq!(c.replication_channel_capacity, 256);
    }

    #[test]
    fn prefer_local_skips_network_backends() {
        let all = ids(&["https://api.example", "ipfs", "local"]);
        assert_eq!(TargetPolicy::PreferLocal.select(&all).unwrap().as_str(), "ipfs");
    }

    #[test]
    fn prefer_local_falls_back_to_first() {
        let all = ids(&["https://a", "http://b"]);
        assert_eq!(TargetPolicy::PreferLocal.select(&all).unwrap().as_str(), "https://a");
        assert!(TargetPolicy::PreferLocal.select(&[]).is_none());
    }

    #[test]
    fn named_requires_configured_backend() {
        let all = ids(&["a", "b"]);
        let named = TargetPolicy::Named(BackendId::new("b").unwrap());
        assert_eq!(named.select(&all).unwrap().as_str(), "b");
        let missing = TargetPolicy::Named(BackendId::new("z").unwrap());
        assert!(missing.select(&all).is_none());
    }

    #[test]
    fn parse_toml() {
        let c = ResolverConfig::from_toml_str(
            r#"
            default_target = { named = "local" }
            fallback_to_broadcast = true
            "#,
        )
        .unwrap();
        assert_eq!(
            c.default_target,
            TargetPolicy::Named(BackendId::new("local").unwrap())
        );
        assert!(c.fallback_to_broadcast);
        assert_eq!(c.replication_channel_capacity, 256);
    }

    #[test]
    fn parse_unit_policy_and_empty() {
        let c = ResolverConfig::from_toml_str(r#"default_target = "first""#).unwrap();
        assert_eq!(c.default_target, TargetPolicy::First);
        assert_eq!(ResolverConfig::from_toml_str("").unwrap(), ResolverConfig::default());
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let err = ResolverConfig::from_toml_str("default_target = 7").unwrap_err();
        assert!(matches!(err, ResolveError::Config(_)));
    }
}
