//! evepod: declarative REST API for IoT pods, sensors, and time-series
//! readings, backed by a document store.
//!
//! The resource schema registry in [`schema`] is the heart of the crate: a
//! static description of the four collections, their field rules, verb
//! policies, and response shaping. The rest of the crate is a small generic
//! engine that turns those declarations into working endpoints.

pub mod error;
pub mod handlers;
pub mod hooks;
pub mod response;
pub mod routes;
pub mod schema;
pub mod settings;
pub mod state;
pub mod store;
pub mod validate;

pub use error::{AppError, Violation};
pub use hooks::{default_observers, DataInsertLogger, InsertObserver};
pub use routes::app_router;
pub use schema::{domain, Registry, Resource};
pub use settings::{MongoSettings, Settings, SettingsError};
pub use state::AppState;
pub use store::{DocumentStore, MemoryStore, MongoStore, StoreError};
pub use validate::RequestValidator;
