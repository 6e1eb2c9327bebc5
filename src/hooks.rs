//! Post-insert observers.
//!
//! Replaces the old framework lifecycle callbacks with an explicit,
//! statically-declared list: after a batch is validated and persisted, every
//! observer registered for the resource runs synchronously with the stored
//! documents. Observers are side-effecting only; they cannot veto a write.

use serde_json::Value;

pub trait InsertObserver: Send + Sync {
    /// Resource this observer subscribes to.
    fn resource(&self) -> &'static str;

    fn on_insert(&self, docs: &[Value]);
}

/// Logs every stored data point.
pub struct DataInsertLogger;

impl InsertObserver for DataInsertLogger {
    fn resource(&self) -> &'static str {
        "data"
    }

    fn on_insert(&self, docs: &[Value]) {
        for doc in docs {
            let sensor = doc.get("s").and_then(Value::as_str).unwrap_or("?");
            let pod = doc.get("p").and_then(Value::as_str).unwrap_or("?");
            tracing::info!(sensor, pod, "stored data point");
        }
    }
}

/// The observers this service runs. Pod and gateway deployment hooks are
/// intentionally absent; their semantics were never settled.
pub fn default_observers() -> Vec<Box<dyn InsertObserver>> {
    vec![Box::new(DataInsertLogger)]
}

/// Run every observer registered for `resource`.
pub fn notify(observers: &[Box<dyn InsertObserver>], resource: &str, docs: &[Value]) {
    for observer in observers.iter().filter(|o| o.resource() == resource) {
        observer.on_insert(docs);
    }
}
