//! Request validation against a resource's declared field rules.
//!
//! Violations are accumulated so a rejected write enumerates every problem,
//! not just the first.

use chrono::DateTime;
use serde_json::{Map, Value};

use crate::error::{AppError, Violation};
use crate::schema::{FieldRule, FieldType, Resource};
use crate::store::DocumentStore;

pub struct RequestValidator;

impl RequestValidator {
    /// Validate a create body: required fields enforced, defaults applied.
    /// Returns the document to persist.
    pub fn validate_create(
        resource: &Resource,
        body: &Map<String, Value>,
    ) -> Result<Map<String, Value>, AppError> {
        let mut violations = reject_unknown_fields(resource, body);
        let mut doc = Map::new();

        for rule in resource.schema {
            match body.get(rule.name) {
                Some(Value::Null) | None => {
                    if let Some(default) = rule.default {
                        doc.insert(rule.name.to_string(), default.to_json());
                    } else if rule.required {
                        violations
                            .push(Violation::new(rule.name, format!("{} is required", rule.name)));
                    }
                }
                Some(v) => {
                    validate_field(rule, v, &mut violations);
                    doc.insert(rule.name.to_string(), v.clone());
                }
            }
        }

        if violations.is_empty() {
            Ok(doc)
        } else {
            Err(AppError::Validation(violations))
        }
    }

    /// Validate a partial-update body: only provided fields are checked,
    /// required-ness is not enforced for absent fields.
    pub fn validate_patch(
        resource: &Resource,
        body: &Map<String, Value>,
    ) -> Result<(), AppError> {
        let mut violations = reject_unknown_fields(resource, body);
        for (name, v) in body {
            if name == "_id" {
                violations.push(Violation::new("_id", "_id is immutable"));
                continue;
            }
            if let Some(rule) = resource.field(name) {
                if v.is_null() {
                    if rule.required {
                        violations.push(Violation::new(name, format!("{} is required", name)));
                    }
                } else {
                    validate_field(rule, v, &mut violations);
                }
            }
        }
        if violations.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(violations))
        }
    }

    /// Reject the write when a uniqueness-constrained field collides with an
    /// existing record (other than `exclude_id`, for updates).
    pub async fn check_unique(
        store: &dyn DocumentStore,
        resource: &Resource,
        doc: &Map<String, Value>,
        exclude_id: Option<&str>,
    ) -> Result<(), AppError> {
        let mut violations = Vec::new();
        for rule in resource.schema.iter().filter(|r| r.unique) {
            if let Some(v) = doc.get(rule.name) {
                if store.field_exists(resource.name, rule.name, v, exclude_id).await? {
                    violations
                        .push(Violation::new(rule.name, format!("{} is not unique", rule.name)));
                }
            }
        }
        if violations.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(violations))
        }
    }
}

fn reject_unknown_fields(resource: &Resource, body: &Map<String, Value>) -> Vec<Violation> {
    body.keys()
        .filter(|k| *k != "_id" && resource.field(k).is_none())
        .map(|k| Violation::new(k.clone(), format!("unknown field: {}", k)))
        .collect()
}

fn validate_field(rule: &FieldRule, v: &Value, violations: &mut Vec<Violation>) {
    match rule.field_type {
        FieldType::String => {
            let Some(s) = v.as_str() else {
                violations.push(Violation::new(rule.name, format!("{} must be a string", rule.name)));
                return;
            };
            let len = s.chars().count();
            if let Some(min) = rule.min_length {
                if len < min {
                    violations.push(Violation::new(
                        rule.name,
                        format!("{} must be at least {} characters", rule.name, min),
                    ));
                }
            }
            if let Some(max) = rule.max_length {
                if len > max {
                    violations.push(Violation::new(
                        rule.name,
                        format!("{} must be at most {} characters", rule.name, max),
                    ));
                }
            }
            if let Some(allowed) = rule.allowed {
                if !allowed.contains(&s) {
                    violations.push(Violation::new(
                        rule.name,
                        format!("{} must be one of: {}", rule.name, allowed.join(", ")),
                    ));
                }
            }
        }
        FieldType::Integer => {
            let Some(n) = v.as_i64() else {
                violations
                    .push(Violation::new(rule.name, format!("{} must be an integer", rule.name)));
                return;
            };
            if let Some(min) = rule.minimum {
                if n < min {
                    violations.push(Violation::new(
                        rule.name,
                        format!("{} must be at least {}", rule.name, min),
                    ));
                }
            }
            if let Some(max) = rule.maximum {
                if n > max {
                    violations.push(Violation::new(
                        rule.name,
                        format!("{} must be at most {}", rule.name, max),
                    ));
                }
            }
        }
        FieldType::Float => {
            if v.as_f64().is_none() {
                violations
                    .push(Violation::new(rule.name, format!("{} must be a number", rule.name)));
            }
        }
        FieldType::Boolean => {
            if !v.is_boolean() {
                violations
                    .push(Violation::new(rule.name, format!("{} must be a boolean", rule.name)));
            }
        }
        FieldType::DateTime => {
            let ok = v.as_str().is_some_and(|s| DateTime::parse_from_rfc3339(s).is_ok());
            if !ok {
                violations.push(Violation::new(
                    rule.name,
                    format!("{} must be an RFC 3339 timestamp", rule.name),
                ));
            }
        }
        FieldType::StringList => {
            let ok = v
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string));
            if !ok {
                violations.push(Violation::new(
                    rule.name,
                    format!("{} must be a list of strings", rule.name),
                ));
            }
        }
        FieldType::Reference { .. } => {
            if !v.is_string() {
                violations.push(Violation::new(
                    rule.name,
                    format!("{} must be a document id", rule.name),
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::domain;
    use crate::store::{DocumentStore, MemoryStore};
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    fn violation_fields(err: AppError) -> Vec<String> {
        match err {
            AppError::Validation(vs) => vs.into_iter().map(|v| v.field).collect(),
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn pod_create_applies_public_default() {
        let pods = domain().resource("pods").unwrap();
        let body = obj(json!({
            "urlid": "farm1",
            "pid": "5551234567",
            "imei": "123456789012345",
            "status": "active",
        }));
        let doc = RequestValidator::validate_create(pods, &body).unwrap();
        assert_eq!(doc["public"], json!(true));
    }

    #[test]
    fn pod_create_enumerates_all_missing_fields() {
        let pods = domain().resource("pods").unwrap();
        let err = RequestValidator::validate_create(pods, &obj(json!({}))).unwrap_err();
        let mut fields = violation_fields(err);
        fields.sort();
        assert_eq!(fields, vec!["imei", "pid", "status", "urlid"]);
    }

    #[test]
    fn pod_status_outside_allowed_set_rejected() {
        let pods = domain().resource("pods").unwrap();
        let body = obj(json!({
            "urlid": "farm1",
            "pid": "5551234567",
            "imei": "123456789012345",
            "status": "sleeping",
        }));
        let err = RequestValidator::validate_create(pods, &body).unwrap_err();
        assert_eq!(violation_fields(err), vec!["status"]);
    }

    #[test]
    fn pod_imei_length_bounds_enforced() {
        let pods = domain().resource("pods").unwrap();
        let body = obj(json!({
            "urlid": "farm1",
            "pid": "5551234567",
            "imei": "too-short",
            "status": "active",
        }));
        let err = RequestValidator::validate_create(pods, &body).unwrap_err();
        assert_eq!(violation_fields(err), vec!["imei"]);
    }

    #[test]
    fn unknown_field_rejected() {
        let pods = domain().resource("pods").unwrap();
        let body = obj(json!({
            "urlid": "farm1",
            "pid": "5551234567",
            "imei": "123456789012345",
            "status": "active",
            "color": "green",
        }));
        let err = RequestValidator::validate_create(pods, &body).unwrap_err();
        assert_eq!(violation_fields(err), vec!["color"]);
    }

    #[test]
    fn sensor_defaults_applied() {
        let sensors = domain().resource("sensors").unwrap();
        let body = obj(json!({"urlid": "temp1", "sid": 7, "nbytes": 2, "fmt": "h"}));
        let doc = RequestValidator::validate_create(sensors, &body).unwrap();
        assert_eq!(doc["byteorder"], json!("<"));
        assert_eq!(doc["magnitude"], json!(1.0));
        assert_eq!(
            doc["info"],
            json!("no additional information is available for this sensor")
        );
    }

    #[test]
    fn sensor_fmt_outside_alphabet_rejected() {
        let sensors = domain().resource("sensors").unwrap();
        let body = obj(json!({"urlid": "temp1", "sid": 7, "nbytes": 2, "fmt": "z"}));
        let err = RequestValidator::validate_create(sensors, &body).unwrap_err();
        assert_eq!(violation_fields(err), vec!["fmt"]);
    }

    #[test]
    fn sensor_sid_must_fit_three_digits() {
        let sensors = domain().resource("sensors").unwrap();
        let body = obj(json!({"urlid": "temp1", "sid": 1000, "nbytes": 2, "fmt": "h"}));
        let err = RequestValidator::validate_create(sensors, &body).unwrap_err();
        assert_eq!(violation_fields(err), vec!["sid"]);
    }

    #[test]
    fn data_point_requires_all_core_fields() {
        let data = domain().resource("data").unwrap();
        let body = obj(json!({"t": "2026-08-28T12:00:00Z", "v": 12.5}));
        let err = RequestValidator::validate_create(data, &body).unwrap_err();
        let mut fields = violation_fields(err);
        fields.sort();
        assert_eq!(fields, vec!["p", "s"]);
    }

    #[test]
    fn data_point_timestamp_must_parse() {
        let data = domain().resource("data").unwrap();
        let body = obj(json!({"t": "yesterday", "v": 12.5, "p": "farm1", "s": "temp1"}));
        let err = RequestValidator::validate_create(data, &body).unwrap_err();
        assert_eq!(violation_fields(err), vec!["t"]);
    }

    #[test]
    fn user_keys_must_be_string_list() {
        let users = domain().resource("users").unwrap();
        let err =
            RequestValidator::validate_create(users, &obj(json!({"keys": [1, 2]}))).unwrap_err();
        assert_eq!(violation_fields(err), vec!["keys"]);
    }

    #[test]
    fn patch_does_not_enforce_missing_required_fields() {
        let pods = domain().resource("pods").unwrap();
        assert!(RequestValidator::validate_patch(pods, &obj(json!({"status": "dead"}))).is_ok());
    }

    #[test]
    fn patch_rejects_id_mutation() {
        let pods = domain().resource("pods").unwrap();
        let err = RequestValidator::validate_patch(pods, &obj(json!({"_id": "abc"}))).unwrap_err();
        assert_eq!(violation_fields(err), vec!["_id"]);
    }

    #[tokio::test]
    async fn unique_collision_is_a_violation() {
        let store = MemoryStore::new();
        let pods = domain().resource("pods").unwrap();
        store
            .insert_many("pods", vec![obj(json!({"imei": "123456789012345"}))])
            .await
            .unwrap();
        let doc = obj(json!({"imei": "123456789012345"}));
        let err = RequestValidator::check_unique(&store, pods, &doc, None)
            .await
            .unwrap_err();
        assert_eq!(violation_fields(err), vec!["imei"]);
    }
}
