pub mod record;
pub mod resource;
pub mod role;
pub mod user;

pub use record::{Acl, PermissionRecord, RoleSnapshot, TargetKind, TargetSnapshot};
pub use resource::{ResourceKind, SecuredResource};
pub use role::{GlobalRole, ProjectRole};
pub use user::{Group, User};
