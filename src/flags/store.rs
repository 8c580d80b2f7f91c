//! Per-tenant flag storage.
//!
//! [`FlagStore`] owns the tenant → [`FlagSet`] map behind a single `RwLock`.
//! Callers only ever receive copies. Tenants without a record read as
//! all-defaults, and a record is only materialized on the first write.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use super::types::{FlagName, FlagSet};

#[derive(Debug, Default)]
pub struct FlagStore {
    flags: RwLock<HashMap<String, FlagSet>>,
}

impl FlagStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current toggles for `tenant`, or all-defaults if nothing was ever stored.
    pub fn get(&self, tenant: &str) -> FlagSet {
        let flags = self.flags.read().unwrap_or_else(PoisonError::into_inner);
        flags.get(tenant).copied().unwrap_or_default()
    }

    /// Overwrite the tenant's whole record. `None` drops the record so reads
    /// fall back to defaults again.
    pub fn replace(&self, tenant: &str, flags: Option<FlagSet>) {
        let mut map = self.flags.write().unwrap_or_else(PoisonError::into_inner);
        match flags {
            Some(flags) => {
                map.insert(tenant.to_string(), flags);
            }
            None => {
                map.remove(tenant);
            }
        }
    }

    /// Set one toggle by name. Unknown names are ignored so that callers
    /// speaking a newer flag vocabulary don't fail against an older store.
    pub fn update_one(&self, tenant: &str, name: &str, value: bool) {
        match name.parse::<FlagName>() {
            Ok(flag) => self.set(tenant, flag, value),
            Err(_) => tracing::debug!(tenant, flag = name, "ignoring unknown flag"),
        }
    }

    /// Typed form of [`update_one`](Self::update_one).
    pub fn set(&self, tenant: &str, flag: FlagName, value: bool) {
        let mut map = self.flags.write().unwrap_or_else(PoisonError::into_inner);
        map.entry(tenant.to_string()).or_default().set(flag, value);
    }

    /// Whether `tenant` has an explicit record.
    pub fn contains(&self, tenant: &str) -> bool {
        let map = self.flags.read().unwrap_or_else(PoisonError::into_inner);
        map.contains_key(tenant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tenant_reads_defaults() {
        let store = FlagStore::new();
        assert_eq!(store.get("acme"), FlagSet::default());
        assert_eq!(store.get(""), FlagSet::default());
        assert!(!store.contains("acme"));
    }

    #[test]
    fn returned_value_is_a_copy() {
        let store = FlagStore::new();
        let mut flags = store.get("acme");
        flags.propagation_enabled = false;
        assert!(store.get("acme").propagation_enabled);
    }

    #[test]
    fn replace_then_clear_restores_defaults() {
        let store = FlagStore::new();
        let custom = FlagSet {
            propagation_enabled: false,
            slo_guard_enabled: true,
            edge_learning_enabled: false,
        };
        store.replace("acme", Some(custom));
        assert_eq!(store.get("acme"), custom);
        assert_eq!(store.get("other"), FlagSet::default());

        store.replace("acme", None);
        assert!(!store.contains("acme"));
        assert_eq!(store.get("acme"), FlagSet::default());
    }

    #[test]
    fn update_one_materializes_defaults_first() {
        let store = FlagStore::new();
        store.update_one("acme", "slo_guard_enabled", false);

        let flags = store.get("acme");
        assert!(flags.propagation_enabled);
        assert!(!flags.slo_guard_enabled);
        assert!(flags.edge_learning_enabled);
        assert!(store.contains("acme"));
    }

    #[test]
    fn update_one_ignores_unknown_names() {
        let store = FlagStore::new();
        store.update_one("acme", "NON_EXISTENT_FLAG", false);
        store.update_one("acme", "", false);

        assert!(!store.contains("acme"));
        assert_eq!(store.get("acme"), FlagSet::default());
    }
}
