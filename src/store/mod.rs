//! Persistence layer: scoped key/value storage for client preferences.

pub mod libsql_backend;
pub mod memory;
pub mod migrations;
pub mod preferences;
pub mod routes;
pub mod traits;

pub use libsql_backend::LibSqlStore;
pub use memory::MemoryStore;
pub use preferences::{AdminSession, Preferences};
pub use routes::{PreferenceRouteState, preference_routes};
pub use traits::KeyValueStore;
