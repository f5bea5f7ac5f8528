//! Shared security state consulted by the validation pipeline.

mod ban_storage;
mod lockdown;

pub use ban_storage::BanStorage;
pub use lockdown::LockdownController;
