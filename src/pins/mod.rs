//! Pins Module
//!
//! Per-user pinned repository lists, for profiles that want to feature more
//! repositories than GitHub allows. The list for a username lives in a single
//! key-value record (`pinned:<username>`) holding the ordered JSON array.
//!
//! # Usage
//!
//! ```rust,ignore
//! use profile_pins::kv::MemoryStore;
//! use profile_pins::pins::PinStore;
//!
//! let store = PinStore::new(MemoryStore::new());
//! let pins = store.add("octocat", repo).await?;
//!
//! // or serve it over HTTP
//! let app = profile_pins::handler::router(store, Duration::from_secs(10));
//! ```

mod handler;
mod routes;
mod store;

pub use routes::routes;
pub use store::{DEFAULT_KEY_PREFIX, PinStore};
