//! The webhook processor: `dispatcher.rs`'s verify/dedupe/route flow specialized to webhook
//! deliveries, adding burst suppression and an exponential retry policy ahead of dead-lettering.

use crate::handler::{Handler, Verifier};
use crate::message::{InboundRequest, InboundResult};
use deliverymesh_burst::{extract_burst_key, BurstController};
use deliverymesh_core::{normalize_provider_id, normalize_surface, Clock, MeshError, SystemClock};
use deliverymesh_ledger::{DeliveryLedger, DeliveryStatus};
use deliverymesh_retrypolicy::RetryPolicy;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

const DELIVERY_METADATA_KEYS: &[&str] = &["delivery_id", "message_id"];
const DELIVERY_HEADER_KEYS: &[&str] = &["X-Delivery-Id", "X-Github-Delivery", "X-Goog-Message-Number"];

fn ledger_status_label(status: DeliveryStatus) -> &'static str {
    match status {
        DeliveryStatus::Pending => "pending",
        DeliveryStatus::Processing => "processing",
        DeliveryStatus::Processed => "processed",
        DeliveryStatus::RetryReady => "retry_ready",
        DeliveryStatus::Dead => "dead",
    }
}

/// Tunables layered on top of the ledger's own lease/max-attempts defaults.
#[derive(Clone, Copy)]
pub struct WebhookProcessorConfig {
    pub lease: Duration,
    pub max_attempts: u32,
    /// When `true`, a handler reporting `accepted=true` with a 5xx status is treated as
    /// final rather than retried (rare: for providers that report transient degradation with
    /// `accepted=true`).
    pub allow_accepted_server_errors: bool,
}

impl Default for WebhookProcessorConfig {
    fn default() -> Self {
        Self {
            lease: Duration::from_secs(30),
            max_attempts: 8,
            allow_accepted_server_errors: false,
        }
    }
}

pub struct WebhookProcessor<C: Clock = SystemClock> {
    ledger: Arc<dyn DeliveryLedger>,
    burst: Option<Arc<BurstController<C>>>,
    verifier: Option<Arc<dyn Verifier>>,
    handler: Mutex<Option<Arc<dyn Handler>>>,
    retry_policy: RetryPolicy,
    config: WebhookProcessorConfig,
    clock: Arc<C>,
}

impl WebhookProcessor<SystemClock> {
    pub fn new(ledger: Arc<dyn DeliveryLedger>, retry_policy: RetryPolicy, config: WebhookProcessorConfig) -> Self {
        Self::with_clock(ledger, retry_policy, config, Arc::new(SystemClock))
    }
}

impl<C: Clock> WebhookProcessor<C> {
    pub fn with_clock(
        ledger: Arc<dyn DeliveryLedger>,
        retry_policy: RetryPolicy,
        config: WebhookProcessorConfig,
        clock: Arc<C>,
    ) -> Self {
        Self {
            ledger,
            burst: None,
            verifier: None,
            handler: Mutex::new(None),
            retry_policy,
            config,
            clock,
        }
    }

    pub fn with_burst(mut self, burst: Arc<BurstController<C>>) -> Self {
        self.burst = Some(burst);
        self
    }

    pub fn with_verifier(mut self, verifier: Arc<dyn Verifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Binds the single webhook handler. A second call replaces the first; webhook processing
    /// has exactly one handler, unlike the dispatcher's per-surface registry.
    pub fn register(&self, handler: Arc<dyn Handler>) {
        *self.handler.lock() = Some(handler);
    }

    fn fail(&self, claim_id: &str, cause: &str, attempts: u32) -> Result<(), MeshError> {
        let now = self.clock.now();
        let delay = self.retry_policy.next_delay(attempts);
        let next_attempt_at = now + chrono::Duration::from_std(delay).unwrap_or_default();
        self.ledger
            .fail(claim_id, cause, next_attempt_at, self.config.max_attempts)
    }

    pub async fn process(&self, mut req: InboundRequest) -> Result<InboundResult, MeshError> {
        req.provider_id = normalize_provider_id(&req.provider_id);
        req.surface = normalize_surface(&req.surface);
        if req.provider_id.is_empty() {
            return Err(MeshError::bad_input("provider_id is required"));
        }

        if let Some(verifier) = &self.verifier {
            verifier.verify(&req).await.map_err(|err| {
                MeshError::auth(err.message().to_string())
                    .with_metadata("rejected", "true")
                    .with_metadata("status_code", "401")
            })?;
        }

        let delivery_id = req
            .find(DELIVERY_METADATA_KEYS, DELIVERY_HEADER_KEYS)
            .ok_or_else(|| MeshError::bad_input("missing delivery identifier"))?;

        let (record, accepted) = self.ledger.claim(&req.provider_id, &delivery_id, self.config.lease)?;
        if !accepted {
            return Ok(InboundResult::accepted(200)
                .with_metadata("deduped", "true")
                .with_metadata("ledger_status", ledger_status_label(record.status)));
        }

        if let Some(burst) = &self.burst {
            let key = extract_burst_key(&req.provider_id, &req.metadata, &req.headers);
            let decision = burst.allow(key.as_deref());
            if !decision.allowed {
                self.ledger.complete(&record.claim_id)?;
                let mut result = InboundResult::accepted(200);
                result.metadata.extend(decision.metadata);
                return Ok(result);
            }
        }

        let Some(handler) = self.handler.lock().clone() else {
            return Err(MeshError::not_found("no webhook handler registered"));
        };

        match handler.handle(&req).await {
            Err(err) => {
                self.fail(&record.claim_id, &err.message().to_string(), record.attempts)?;
                Err(err)
            }
            Ok(mut result) => {
                let server_error_retry = result.status_code >= 500 && !self.config.allow_accepted_server_errors;
                let retryable = !result.accepted || (result.accepted && server_error_retry);
                if retryable {
                    self.fail(&record.claim_id, "handler reported a retryable outcome", record.attempts)?;
                    return Err(MeshError::operation("handler reported a retryable outcome")
                        .with_metadata("status_code", result.status_code.to_string())
                        .with_metadata("accepted", result.accepted.to_string()));
                }

                self.ledger
                    .complete(&record.claim_id)
                    .map_err(|err| MeshError::internal("failed to persist claim completion").with_secondary(err))?;
                result.metadata.insert("provider_id".to_string(), req.provider_id.clone());
                result.metadata.insert("delivery_id".to_string(), delivery_id);
                Ok(result)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deliverymesh_core::FixedClock;
    use deliverymesh_ledger::{InMemoryDeliveryLedger, LedgerDefaults};
    use deliverymesh_retrypolicy::RetryPolicyConfig;
    use std::collections::HashMap;

    struct FixedOutcomeHandler {
        result: InboundResult,
    }

    #[async_trait::async_trait]
    impl Handler for FixedOutcomeHandler {
        fn surface(&self) -> &str {
            "webhook"
        }

        async fn handle(&self, _req: &InboundRequest) -> Result<InboundResult, MeshError> {
            Ok(self.result.clone())
        }
    }

    fn processor() -> (WebhookProcessor<FixedClock>, Arc<FixedClock>) {
        let clock = FixedClock::epoch();
        let ledger = Arc::new(InMemoryDeliveryLedger::with_clock(LedgerDefaults::default(), clock.clone()));
        let retry_policy = RetryPolicy::new(RetryPolicyConfig::builder().build());
        let processor = WebhookProcessor::with_clock(
            ledger,
            retry_policy,
            WebhookProcessorConfig::default(),
            clock.clone(),
        );
        (processor, clock)
    }

    fn request_with_delivery_id(id: &str) -> InboundRequest {
        let mut metadata = HashMap::new();
        metadata.insert("delivery_id".to_string(), id.to_string());
        InboundRequest::new("github", "webhook").with_metadata(metadata)
    }

    #[tokio::test]
    async fn missing_delivery_id_is_bad_input() {
        let (processor, _clock) = processor();
        processor.register(Arc::new(FixedOutcomeHandler {
            result: InboundResult::accepted(200),
        }));
        let req = InboundRequest::new("github", "webhook");
        let err = processor.process(req).await.unwrap_err();
        assert_eq!(err.category(), deliverymesh_core::ErrorCategory::BadInput);
    }

    #[tokio::test]
    async fn successful_handler_completes_the_ledger_entry() {
        let (processor, _clock) = processor();
        processor.register(Arc::new(FixedOutcomeHandler {
            result: InboundResult::accepted(200),
        }));
        let result = processor.process(request_with_delivery_id("d1")).await.unwrap();
        assert!(result.accepted);
        assert_eq!(result.metadata.get("delivery_id").map(String::as_str), Some("d1"));
    }

    #[tokio::test]
    async fn accepted_5xx_is_retried_by_default() {
        let (processor, _clock) = processor();
        processor.register(Arc::new(FixedOutcomeHandler {
            result: InboundResult {
                accepted: true,
                status_code: 503,
                metadata: HashMap::new(),
            },
        }));
        let err = processor.process(request_with_delivery_id("d1")).await.unwrap_err();
        assert_eq!(err.category(), deliverymesh_core::ErrorCategory::Operation);
    }

    #[tokio::test]
    async fn allow_accepted_server_errors_opts_out_of_5xx_retry() {
        let clock = FixedClock::epoch();
        let ledger = Arc::new(InMemoryDeliveryLedger::with_clock(LedgerDefaults::default(), clock.clone()));
        let retry_policy = RetryPolicy::new(RetryPolicyConfig::builder().build());
        let processor = WebhookProcessor::with_clock(
            ledger,
            retry_policy,
            WebhookProcessorConfig {
                allow_accepted_server_errors: true,
                ..WebhookProcessorConfig::default()
            },
            clock,
        );
        processor.register(Arc::new(FixedOutcomeHandler {
            result: InboundResult {
                accepted: true,
                status_code: 503,
                metadata: HashMap::new(),
            },
        }));
        let result = processor.process(request_with_delivery_id("d1")).await.unwrap();
        assert!(result.accepted);
    }

    #[tokio::test]
    async fn second_delivery_of_same_id_is_deduped() {
        let (processor, _clock) = processor();
        processor.register(Arc::new(FixedOutcomeHandler {
            result: InboundResult::accepted(200),
        }));
        processor.process(request_with_delivery_id("d1")).await.unwrap();
        let result2 = processor.process(request_with_delivery_id("d1")).await.unwrap();
        assert_eq!(result2.metadata.get("deduped").map(String::as_str), Some("true"));
    }
}
