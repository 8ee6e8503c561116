//! UseCase layer: orchestrates the room state machine and event delivery.

pub mod broker;

pub use broker::SessionBroker;
