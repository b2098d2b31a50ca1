pub mod aggregator;
pub mod catalog;
pub mod coordinator;
pub mod debounce;
pub mod readiness;
pub mod registry;
pub mod resolver;
pub mod session;
