//! Attendance tracking and active-search ("busca ativa") alerts for schools.
//!
//! Attendance is recorded per student as a percentage of lessons attended.
//! When it drops below 80% the recorder adds a system alert to the ledger,
//! where staff also post their own outreach notes.

pub mod alerts;
pub mod attendance;
pub mod config;
pub mod error;
pub mod import;
pub mod models;
pub mod report;
pub mod routes;
pub mod server;
pub mod state;
pub mod store;

pub use config::{Config, SiteDirs};
pub use server::{build_router, serve};
pub use state::AppState;
pub use store::{MemoryStore, PgStore, Store, StoreError};
