//! Lobby Loopback
//!
//! An in-process online service for lobby sessions. A [`LoopbackNetwork`]
//! holds users, friendships, advertised sessions and pending invites; each
//! [`LoopbackBackend`] acts for one user and plugs into a lobby runtime like
//! any other [`lobby_core::OnlineBackend`].
//!
//! ```rust,no_run
//! use lobby_core::UniqueNetId;
//! use lobby_loopback::LoopbackNetwork;
//!
//! let network = LoopbackNetwork::new();
//! let host = UniqueNetId::new("host");
//! network.add_user(host.clone(), "Host");
//! let backend = network.backend_for(&host).expect("registered user");
//! ```

mod backend;
mod network;

pub use backend::LoopbackBackend;
pub use network::{LoopbackNetwork, PendingInvite};
