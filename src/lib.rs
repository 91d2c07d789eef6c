pub mod access;
pub mod errors;
pub mod events;
pub mod keys;
pub mod models;
pub mod store;

// Re-export commonly used items for consumers and tests
pub use access::{AccessControl, Actor, Operation, OperationTier, Requirement};
pub use errors::{AccessError, AccessResult};
pub use keys::{GlobalPermission, ProjectPermission};
