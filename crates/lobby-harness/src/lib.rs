//! Lobby Harness
//!
//! Testing infrastructure for the lobby crates:
//!
//! - [`MockBackend`]: a scriptable [`lobby_core::OnlineBackend`] with
//!   per-request accept/reject verdicts and optional automatic completions
//! - [`CallJournal`]: a shared record of every backend call, with helpers
//!   for asserting subscription discipline
//! - [`fixtures`]: players, friends and search results
//!
//! ```rust,ignore
//! use lobby_harness::{fixtures, MockBackend, MockBackendConfig};
//! use lobby_runtime::create_test_runtime;
//!
//! #[tokio::test]
//! async fn hosts() {
//!     let backend = MockBackend::new(MockBackendConfig::auto());
//!     let handle = backend.handle();
//!     let runtime = create_test_runtime(fixtures::player("p1"), backend).await.unwrap();
//!     assert!(runtime.host_session("Game", true, true, 4).await.unwrap());
//!     assert_eq!(handle.journal().max_live(lobby_core::SubscriptionKind::CreateSession), 1);
//! }
//! ```

pub mod fixtures;
pub mod journal;
pub mod mock_backend;

pub use journal::{BackendCall, CallJournal};
pub use mock_backend::{MockBackend, MockBackendConfig, MockHandle};
