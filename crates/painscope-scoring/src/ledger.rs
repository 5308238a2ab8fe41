use std::collections::BTreeMap;

use painscope_core::PainInstance;

/// In-memory stand-in for instance storage, keyed by
/// `(signal_id, algo_version)`.
///
/// Instances are never overwritten: re-scoring under the same version is a
/// no-op, re-scoring under a new version adds a second instance.
#[derive(Debug, Clone, Default)]
pub struct InstanceLedger {
    instances: BTreeMap<(String, String), PainInstance>,
}

impl InstanceLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `instance` unless its key is already present.
    ///
    /// Returns `true` if the instance was inserted.
    pub fn insert_if_absent(&mut self, instance: PainInstance) -> bool {
        let key = (instance.signal_id.clone(), instance.algo_version.clone());
        if self.instances.contains_key(&key) {
            return false;
        }
        self.instances.insert(key, instance);
        true
    }

    #[must_use]
    pub fn get(&self, signal_id: &str, algo_version: &str) -> Option<&PainInstance> {
        self.instances
            .get(&(signal_id.to_string(), algo_version.to_string()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// All instances in key order.
    pub fn iter(&self) -> impl Iterator<Item = &PainInstance> {
        self.instances.values()
    }

    /// Instances produced by one scorer version, in signal order.
    pub fn for_version<'a>(&'a self, algo_version: &'a str) -> impl Iterator<Item = &'a PainInstance> {
        self.iter().filter(move |i| i.algo_version == algo_version)
    }
}
