//! Access control: permission resolution, gates, and the mutation API.
//!
//! Resolution is a pure union over the permission records applying to an
//! actor (direct user grants, group grants, and, for inheriting issues,
//! the parent project's records). System administrators bypass the
//! `AdminOverride`-tier checks listed in [`operation`] but hold no implicit
//! content access; that asymmetry is load-bearing and tested.

pub mod actor;
pub mod inheritance;
pub mod mutation;
pub mod operation;
pub mod requirement;
pub mod resolver;
pub mod service;

pub use actor::Actor;
pub use operation::{Operation, OperationTier};
pub use requirement::Requirement;
pub use resolver::{
    authorize, authorize_global, can_see, filter_visible, record_applies, resolve, resolve_direct,
    resolve_global,
};
pub use service::AccessControl;
