//! Stateful managers for the lobby runtime
//!
//! This module contains manager structs owned by the session logic task.

pub mod friends;
pub mod subscription;

pub use friends::{InviteCoordinator, InviteFilter, InvitePass, MarkerFilter};
pub use subscription::{Subscription, SubscriptionManager, SubscriptionStats};
