pub mod errors;
pub mod order;
pub mod plans;
pub mod ports;
pub mod reconcile;
pub mod webhook_event;
