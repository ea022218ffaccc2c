//! Inbound delivery processing: the generic [`Dispatcher`] for non-webhook surfaces and the
//! [`WebhookProcessor`] that layers burst suppression, dead-lettering and retry onto it, plus
//! the provider-specific verifier templates in [`providers`].

pub mod dispatcher;
pub mod handler;
pub mod message;
pub mod processor;
pub mod providers;

pub use dispatcher::Dispatcher;
pub use handler::{Handler, Verifier};
pub use message::{InboundRequest, InboundResult, SUPPORTED_SURFACES};
pub use processor::{WebhookProcessor, WebhookProcessorConfig};
