pub mod conflict;
pub mod dispatch;
pub mod invariants;
pub mod lifecycle;
pub mod mutability;
pub mod provisioning;
pub mod references;
pub mod scheduling;
pub mod slug;
