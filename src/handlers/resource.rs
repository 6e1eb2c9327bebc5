//! Generic resource handlers: list, create, read, patch, collection delete.
//!
//! Every handler resolves the target resource from the path segment and
//! enforces its declared verb policy before touching the store.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::error::{AppError, Violation};
use crate::hooks;
use crate::response;
use crate::schema::{Method, Resource};
use crate::state::AppState;
use crate::validate::RequestValidator;

fn resolve_resource(state: &AppState, path_segment: &str) -> Result<&'static Resource, AppError> {
    state
        .registry
        .resource(path_segment)
        .ok_or_else(|| AppError::NotFound(path_segment.to_string()))
}

fn body_to_map(value: Value) -> Result<Map<String, Value>, AppError> {
    match value {
        Value::Object(m) => Ok(m),
        _ => Err(AppError::BadRequest("body must be a JSON object".into())),
    }
}

/// Find an item by internal id, falling back to the resource's alternate
/// lookup key. Both paths resolve the same record.
async fn resolve_item(
    state: &AppState,
    resource: &Resource,
    id_segment: &str,
) -> Result<Value, AppError> {
    if let Some(doc) = state.store.find_by_id(resource.name, id_segment).await? {
        return Ok(doc);
    }
    if let Some(lookup) = resource.alternate_lookup {
        let pattern = Regex::new(lookup.pattern)
            .map_err(|_| AppError::BadRequest("invalid lookup pattern".into()))?;
        if pattern.is_match(id_segment) {
            let token = Value::String(id_segment.to_string());
            if let Some(doc) =
                state.store.find_by_field(resource.name, lookup.field, &token).await?
            {
                return Ok(doc);
            }
        }
    }
    Err(AppError::NotFound(id_segment.to_string()))
}

fn item_id(doc: &Value) -> Option<&str> {
    doc.get("_id").and_then(Value::as_str)
}

/// Expand requested embeddable reference fields inline. A dangling or
/// malformed reference is left as the bare id.
async fn embed_references(
    state: &AppState,
    resource: &Resource,
    requested: &[&str],
    docs: &mut [Value],
) -> Result<(), AppError> {
    for (field, related) in resource.embeddable_fields() {
        if !requested.contains(&field) {
            continue;
        }
        let related_resource = state
            .registry
            .resource(related)
            .ok_or_else(|| AppError::NotFound(related.to_string()))?;
        for doc in docs.iter_mut() {
            let Some(id) = doc.get(field).and_then(Value::as_str).map(str::to_string) else {
                continue;
            };
            if let Some(found) = state.store.find_by_id(related, &id).await? {
                doc[field] = response::project(related_resource, found);
            }
        }
    }
    Ok(())
}

fn requested_embeds(params: &HashMap<String, String>) -> Vec<&str> {
    params
        .get("embed")
        .map(|raw| raw.split(',').map(str::trim).filter(|s| !s.is_empty()).collect())
        .unwrap_or_default()
}

pub async fn list(
    State(state): State<AppState>,
    Path(path_segment): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, AppError> {
    let resource = resolve_resource(&state, &path_segment)?;
    if !resource.allows_resource(Method::Get) {
        return Err(AppError::MethodNotAllowed);
    }
    let mut docs = state.store.find_all(resource.name).await?;
    embed_references(&state, resource, &requested_embeds(&params), &mut docs).await?;
    Ok(response::many(resource, StatusCode::OK, docs))
}

pub async fn create(
    State(state): State<AppState>,
    Path(path_segment): Path<String>,
    Json(body): Json<Value>,
) -> Result<Response, AppError> {
    let resource = resolve_resource(&state, &path_segment)?;
    if !resource.allows_resource(Method::Post) {
        return Err(AppError::MethodNotAllowed);
    }
    let (items, batch) = match body {
        Value::Array(arr) => {
            if arr.is_empty() {
                return Err(AppError::BadRequest("batch must not be empty".into()));
            }
            (arr, true)
        }
        other => (vec![other], false),
    };

    let mut docs = Vec::with_capacity(items.len());
    for item in items {
        let map = body_to_map(item)?;
        docs.push(RequestValidator::validate_create(resource, &map)?);
    }
    reject_batch_collisions(resource, &docs)?;
    for doc in &docs {
        RequestValidator::check_unique(state.store.as_ref(), resource, doc, None).await?;
    }

    let stored = state.store.insert_many(resource.name, docs).await?;
    hooks::notify(&state.observers, resource.name, &stored);

    if batch {
        Ok(response::many(resource, StatusCode::CREATED, stored))
    } else {
        let doc = stored.into_iter().next().unwrap_or(Value::Null);
        Ok(response::one(resource, StatusCode::CREATED, doc))
    }
}

/// Two documents in one batch must not claim the same unique value; the store
/// check alone would miss them because neither is persisted yet.
fn reject_batch_collisions(
    resource: &Resource,
    docs: &[Map<String, Value>],
) -> Result<(), AppError> {
    let mut violations = Vec::new();
    for rule in resource.schema.iter().filter(|r| r.unique) {
        let mut seen = Vec::new();
        for doc in docs {
            if let Some(v) = doc.get(rule.name) {
                if seen.contains(&v) {
                    violations.push(Violation::new(
                        rule.name,
                        format!("{} duplicated within batch", rule.name),
                    ));
                } else {
                    seen.push(v);
                }
            }
        }
    }
    if violations.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(violations))
    }
}

pub async fn read(
    State(state): State<AppState>,
    Path((path_segment, id_segment)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, AppError> {
    let resource = resolve_resource(&state, &path_segment)?;
    if !resource.allows_item(Method::Get) {
        return Err(AppError::MethodNotAllowed);
    }
    let doc = resolve_item(&state, resource, &id_segment).await?;
    let mut docs = vec![doc];
    embed_references(&state, resource, &requested_embeds(&params), &mut docs).await?;
    let doc = docs.pop().unwrap_or(Value::Null);
    Ok(response::one(resource, StatusCode::OK, doc))
}

pub async fn patch_item(
    State(state): State<AppState>,
    Path((path_segment, id_segment)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<Response, AppError> {
    let resource = resolve_resource(&state, &path_segment)?;
    if !resource.allows_item(Method::Patch) {
        return Err(AppError::MethodNotAllowed);
    }
    let existing = resolve_item(&state, resource, &id_segment).await?;
    let id = item_id(&existing)
        .ok_or_else(|| AppError::BadRequest("stored document has no id".into()))?
        .to_string();

    let changes = body_to_map(body)?;
    if changes.is_empty() {
        return Ok(response::one(resource, StatusCode::OK, existing));
    }
    RequestValidator::validate_patch(resource, &changes)?;
    RequestValidator::check_unique(state.store.as_ref(), resource, &changes, Some(&id)).await?;

    let updated = state
        .store
        .update_by_id(resource.name, &id, changes)
        .await?
        .ok_or_else(|| AppError::NotFound(id_segment))?;
    Ok(response::one(resource, StatusCode::OK, updated))
}

pub async fn delete_collection(
    State(state): State<AppState>,
    Path(path_segment): Path<String>,
) -> Result<Response, AppError> {
    let resource = resolve_resource(&state, &path_segment)?;
    if !resource.allows_resource(Method::Delete) {
        return Err(AppError::MethodNotAllowed);
    }
    let removed = state.store.delete_all(resource.name).await?;
    tracing::info!(resource = resource.name, removed, "collection cleared");
    Ok(StatusCode::NO_CONTENT.into_response())
}
