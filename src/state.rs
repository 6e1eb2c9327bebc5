//! Shared application state for all routes.

use std::sync::Arc;

use crate::hooks::InsertObserver;
use crate::schema::Registry;
use crate::store::DocumentStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub registry: Registry,
    pub observers: Arc<Vec<Box<dyn InsertObserver>>>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        registry: Registry,
        observers: Vec<Box<dyn InsertObserver>>,
    ) -> Self {
        AppState { store, registry, observers: Arc::new(observers) }
    }
}
