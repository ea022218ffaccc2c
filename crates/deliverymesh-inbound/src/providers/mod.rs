//! Provider webhook templates: each binds a [`Verifier`](crate::handler::Verifier)
//! implementation to the header/encoding conventions a given provider signs its deliveries
//! with.

pub mod amazon;
pub mod google;
pub mod hmac_verifier;
pub mod meta;
pub mod pinterest;
pub mod shopify;
pub mod tiktok;
pub mod token_verifier;

pub use amazon::amazon_verifier;
pub use google::google_verifier;
pub use meta::meta_verifier;
pub use pinterest::pinterest_verifier;
pub use shopify::shopify_verifier;
pub use tiktok::tiktok_verifier;
