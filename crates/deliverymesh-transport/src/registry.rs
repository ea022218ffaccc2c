//! A kind-keyed registry of transport adapters: one of either a pre-built singleton or a
//! factory invoked per `build` call, with conflicting registrations rejected rather than
//! silently overwritten.

use crate::adapter::TransportAdapter;
use deliverymesh_core::MeshError;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Arc;

type Factory = Arc<dyn Fn(&HashMap<String, String>) -> Result<Arc<dyn TransportAdapter>, MeshError> + Send + Sync>;

enum Entry {
    Singleton(Arc<dyn TransportAdapter>),
    Factory(Factory),
}

/// A registry of transport adapters keyed by their `kind()`.
#[derive(Default)]
pub struct AdapterRegistry {
    entries: RwLock<BTreeMap<String, Entry>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a pre-built adapter instance. Errors if `kind` is already registered.
    pub fn register(&self, kind: impl Into<String>, adapter: Arc<dyn TransportAdapter>) -> Result<(), MeshError> {
        let kind = kind.into();
        let mut entries = self.entries.write();
        if entries.contains_key(&kind) {
            return Err(MeshError::conflict(format!(
                "transport adapter kind \"{kind}\" is already registered"
            )));
        }
        entries.insert(kind, Entry::Singleton(adapter));
        Ok(())
    }

    /// Registers a factory invoked on every [`build`](Self::build) call with a defensive clone
    /// of the supplied config map, so callers can vary per-request adapter construction.
    pub fn register_factory(
        &self,
        kind: impl Into<String>,
        factory: impl Fn(&HashMap<String, String>) -> Result<Arc<dyn TransportAdapter>, MeshError>
            + Send
            + Sync
            + 'static,
    ) -> Result<(), MeshError> {
        let kind = kind.into();
        let mut entries = self.entries.write();
        if entries.contains_key(&kind) {
            return Err(MeshError::conflict(format!(
                "transport adapter kind \"{kind}\" is already registered"
            )));
        }
        entries.insert(kind, Entry::Factory(Arc::new(factory)));
        Ok(())
    }

    /// Builds an adapter for `kind`: returns the singleton if one was registered, otherwise
    /// invokes the registered factory with a clone of `config`.
    pub fn build(&self, kind: &str, config: &HashMap<String, String>) -> Result<Arc<dyn TransportAdapter>, MeshError> {
        let entries = self.entries.read();
        match entries.get(kind) {
            Some(Entry::Singleton(adapter)) => Ok(adapter.clone()),
            Some(Entry::Factory(factory)) => factory(&config.clone()),
            None => Err(MeshError::not_found(format!(
                "no transport adapter registered for kind \"{kind}\""
            ))),
        }
    }

    /// Lists registered kinds in deterministic, sorted order.
    pub fn list(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelToken;
    use crate::message::{TransportRequest, TransportResponse};
    use async_trait::async_trait;

    struct Noop;

    #[async_trait]
    impl TransportAdapter for Noop {
        fn kind(&self) -> &str {
            "noop"
        }

        async fn do_request(
            &self,
            _cancel: &CancelToken,
            _req: TransportRequest,
        ) -> Result<TransportResponse, MeshError> {
            unimplemented!()
        }
    }

    #[test]
    fn duplicate_registration_is_a_conflict() {
        let registry = AdapterRegistry::new();
        registry.register("noop", Arc::new(Noop)).unwrap();
        let err = registry.register("noop", Arc::new(Noop)).unwrap_err();
        assert_eq!(err.category(), deliverymesh_core::ErrorCategory::Conflict);
    }

    #[test]
    fn list_is_sorted_by_kind() {
        let registry = AdapterRegistry::new();
        registry.register("zeta", Arc::new(Noop)).unwrap();
        registry.register("alpha", Arc::new(Noop)).unwrap();
        assert_eq!(registry.list(), vec!["alpha".to_string(), "zeta".to_string()]);
    }

    #[test]
    fn build_unknown_kind_is_not_found() {
        let registry = AdapterRegistry::new();
        let err = registry.build("missing", &HashMap::new()).unwrap_err();
        assert_eq!(err.category(), deliverymesh_core::ErrorCategory::NotFound);
    }
}
