pub mod agents;
pub mod login;
pub mod metrics;
pub mod modal;
