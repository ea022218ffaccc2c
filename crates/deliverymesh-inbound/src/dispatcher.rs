//! The generic (non-webhook) inbound dispatcher: verify, dedupe via a claim store, and route
//! to a per-surface handler.

use crate::handler::{Handler, Verifier};
use crate::message::{InboundRequest, InboundResult, SUPPORTED_SURFACES};
use deliverymesh_claimstore::ClaimStore;
use deliverymesh_core::{normalize_provider_id, normalize_surface, Clock, MeshError, SystemClock};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const IDEMPOTENCY_METADATA_KEYS: &[&str] = &["idempotency_key", "delivery_id", "message_id"];
const IDEMPOTENCY_HEADER_KEYS: &[&str] = &["Idempotency-Key", "X-Idempotency-Key", "X-Message-Id"];

/// Verifies + dedupes + routes an [`InboundRequest`] to a registered [`Handler`].
pub struct Dispatcher<C: Clock = SystemClock> {
    handlers: Mutex<HashMap<String, Arc<dyn Handler>>>,
    claim_store: Option<Arc<dyn ClaimStore>>,
    verifier: Option<Arc<dyn Verifier>>,
    key_ttl: Duration,
    clock: Arc<C>,
}

impl Dispatcher<SystemClock> {
    pub fn new(key_ttl: Duration) -> Self {
        Self::with_clock(key_ttl, Arc::new(SystemClock))
    }
}

impl<C: Clock> Dispatcher<C> {
    pub fn with_clock(key_ttl: Duration, clock: Arc<C>) -> Self {
        Self {
            handlers: Mutex::new(HashMap::new()),
            claim_store: None,
            verifier: None,
            key_ttl,
            clock,
        }
    }

    pub fn with_claim_store(mut self, store: Arc<dyn ClaimStore>) -> Self {
        self.claim_store = Some(store);
        self
    }

    pub fn with_verifier(mut self, verifier: Arc<dyn Verifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Idempotently binds `handler` for its surface. Fails with a conflict if the surface is
    /// already bound.
    pub fn register(&self, handler: Arc<dyn Handler>) -> Result<(), MeshError> {
        let surface = normalize_surface(handler.surface());
        let mut guard = self.handlers.lock();
        if guard.contains_key(&surface) {
            return Err(MeshError::conflict(format!(
                "a handler is already registered for surface \"{surface}\""
            )));
        }
        guard.insert(surface, handler);
        Ok(())
    }

    fn handler_for(&self, surface: &str) -> Option<Arc<dyn Handler>> {
        self.handlers.lock().get(surface).cloned()
    }

    pub async fn dispatch(&self, mut req: InboundRequest) -> Result<InboundResult, MeshError> {
        req.provider_id = normalize_provider_id(&req.provider_id);
        req.surface = normalize_surface(&req.surface);
        if req.provider_id.is_empty() {
            return Err(MeshError::bad_input("provider_id is required"));
        }
        if !SUPPORTED_SURFACES.contains(&req.surface.as_str()) {
            return Err(MeshError::bad_input(format!(
                "unsupported surface: {}",
                req.surface
            )));
        }

        if let Some(verifier) = &self.verifier {
            verifier.verify(&req).await.map_err(|err| {
                MeshError::auth(err.message().to_string())
                    .with_metadata("rejected", "true")
                    .with_metadata("status_code", "401")
            })?;
        }

        let mut claim_id: Option<String> = None;
        if let Some(store) = &self.claim_store {
            let idem = req
                .find(IDEMPOTENCY_METADATA_KEYS, IDEMPOTENCY_HEADER_KEYS)
                .ok_or_else(|| MeshError::bad_input("missing idempotency identifier"))?;
            let key = format!("{}:{}:{}", req.provider_id, req.surface, idem);
            let (id, accepted) = store.claim(&key, self.key_ttl)?;
            if !accepted {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    target: "deliverymesh_inbound",
                    key, "{}", deliverymesh_core::events::DISPATCH_DEDUPED
                );
                return Ok(InboundResult::accepted(200).with_metadata("deduped", "true"));
            }
            claim_id = Some(id);
        }

        let Some(handler) = self.handler_for(&req.surface) else {
            return Err(MeshError::not_found(format!(
                "no handler registered for surface: {}",
                req.surface
            )));
        };

        match handler.handle(&req).await {
            Err(err) => {
                if let (Some(store), Some(claim_id)) = (&self.claim_store, &claim_id) {
                    let now = self.clock.now();
                    if let Err(fail_err) = store.fail(claim_id, &err.message().to_string(), now) {
                        return Err(err.with_secondary(fail_err));
                    }
                }
                Err(err)
            }
            Ok(mut result) => {
                let retryable = !result.accepted || result.status_code >= 500;
                if retryable {
                    let retryable_err = MeshError::operation("handler reported a retryable outcome")
                        .with_metadata("status_code", result.status_code.to_string())
                        .with_metadata("accepted", result.accepted.to_string());
                    if let (Some(store), Some(claim_id)) = (&self.claim_store, &claim_id) {
                        let now = self.clock.now();
                        if let Err(fail_err) =
                            store.fail(claim_id, "handler reported a retryable outcome", now)
                        {
                            return Err(retryable_err.with_secondary(fail_err));
                        }
                    }
                    return Err(retryable_err);
                }

                if let (Some(store), Some(claim_id)) = (&self.claim_store, &claim_id) {
                    store
                        .complete(claim_id)
                        .map_err(|err| MeshError::internal("failed to persist claim completion").with_secondary(err))?;
                }

                result.metadata.insert("provider_id".to_string(), req.provider_id.clone());
                result.metadata.insert("surface".to_string(), req.surface.clone());
                Ok(result)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deliverymesh_claimstore::{ClaimStoreConfig, InMemoryClaimStore};
    use deliverymesh_core::FixedClock;

    struct EchoHandler;

    #[async_trait::async_trait]
    impl Handler for EchoHandler {
        fn surface(&self) -> &str {
            "webhook"
        }

        async fn handle(&self, _req: &InboundRequest) -> Result<InboundResult, MeshError> {
            Ok(InboundResult::accepted(200))
        }
    }

    fn dispatcher() -> Dispatcher<FixedClock> {
        let clock = FixedClock::epoch();
        let store = Arc::new(InMemoryClaimStore::with_clock(
            ClaimStoreConfig::builder().build(),
            clock.clone(),
        ));
        Dispatcher::with_clock(Duration::from_secs(300), clock).with_claim_store(store)
    }

    #[tokio::test]
    async fn duplicate_handler_registration_is_a_conflict() {
        let dispatcher = dispatcher();
        dispatcher.register(Arc::new(EchoHandler)).unwrap();
        let err = dispatcher.register(Arc::new(EchoHandler)).unwrap_err();
        assert_eq!(err.category(), deliverymesh_core::ErrorCategory::Conflict);
    }

    #[tokio::test]
    async fn second_dispatch_with_same_idempotency_key_is_deduped() {
        let dispatcher = dispatcher();
        dispatcher.register(Arc::new(EchoHandler)).unwrap();

        let mut metadata = HashMap::new();
        metadata.insert("idempotency_key".to_string(), "abc".to_string());
        let req = InboundRequest::new("github", "webhook").with_metadata(metadata.clone());
        let result = dispatcher.dispatch(req).await.unwrap();
        assert!(result.accepted);
        assert!(result.metadata.get("deduped").is_none());

        let req2 = InboundRequest::new("github", "webhook").with_metadata(metadata);
        let result2 = dispatcher.dispatch(req2).await.unwrap();
        assert_eq!(result2.metadata.get("deduped").map(String::as_str), Some("true"));
    }

    #[tokio::test]
    async fn missing_idempotency_identifier_is_bad_input() {
        let dispatcher = dispatcher();
        dispatcher.register(Arc::new(EchoHandler)).unwrap();
        let req = InboundRequest::new("github", "webhook");
        let err = dispatcher.dispatch(req).await.unwrap_err();
        assert_eq!(err.category(), deliverymesh_core::ErrorCategory::BadInput);
    }

    #[tokio::test]
    async fn unsupported_surface_is_bad_input() {
        let dispatcher = dispatcher();
        let req = InboundRequest::new("github", "not_a_surface");
        let err = dispatcher.dispatch(req).await.unwrap_err();
        assert_eq!(err.category(), deliverymesh_core::ErrorCategory::BadInput);
    }
}
