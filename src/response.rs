//! Response envelope helpers and read-time field projection.

use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use crate::schema::Resource;

#[derive(Serialize)]
pub struct SuccessOne {
    pub data: Value,
}

#[derive(Serialize)]
pub struct SuccessMany {
    pub data: Vec<Value>,
    pub meta: MetaCount,
}

#[derive(Serialize)]
pub struct MetaCount {
    pub count: u64,
}

/// Strip the resource's projected-out fields from a read representation.
/// Not a security boundary: the fields remain queryable and insertable.
pub fn project(resource: &Resource, mut value: Value) -> Value {
    if let Value::Object(ref mut map) = value {
        for field in resource.projection {
            map.remove(*field);
        }
    }
    value
}

/// Wrap a single document, honoring the resource's cache directive.
pub fn one(resource: &Resource, status: StatusCode, data: Value) -> Response {
    let body = SuccessOne { data: project(resource, data) };
    (status, cache_headers(resource), Json(body)).into_response()
}

/// Wrap a document list, honoring the resource's cache directive.
pub fn many(resource: &Resource, status: StatusCode, data: Vec<Value>) -> Response {
    let count = data.len() as u64;
    let body = SuccessMany {
        data: data.into_iter().map(|d| project(resource, d)).collect(),
        meta: MetaCount { count },
    };
    (status, cache_headers(resource), Json(body)).into_response()
}

fn cache_headers(resource: &Resource) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Some(directive) = resource.cache_control {
        if let Ok(value) = HeaderValue::from_str(directive) {
            headers.insert(header::CACHE_CONTROL, value);
        }
    }
    headers
}
