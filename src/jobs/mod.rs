//! Command-triggered maintenance jobs that walk full community
//! memberships: the unverified-member purge and trust-role propagation.

pub mod propagate;
pub mod purge;

pub use propagate::propagate_role;
pub use purge::PurgeJob;
