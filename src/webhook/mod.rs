//! Inbound payment-gateway webhooks: signature check, envelope parsing and payload probes.

pub mod envelope;
pub mod extract;
pub mod signature;

pub use envelope::{Envelope, EnvelopeError, GatewayEvent};
pub use signature::{HmacVerifier, SignatureVerifier};
