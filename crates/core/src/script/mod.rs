//! Script realm tracking.

mod realm;
mod registry;

pub use realm::Realm;
pub use registry::{RealmFilter, RealmRegistry};
