//! The static domain: pods, sensors, data, and users.
//!
//! Field names are deliberately short (`t`, `v`, `p`, `s`) to keep stored
//! documents small.

use crate::schema::types::{
    AlternateLookup, DefaultValue, FieldRule, FieldType, Method, Resource,
};

/// Collection-level default verbs for resources that do not override them.
pub const DEFAULT_RESOURCE_METHODS: &[Method] = &[Method::Get, Method::Post];
/// Item-level default verbs.
pub const DEFAULT_ITEM_METHODS: &[Method] = &[Method::Get, Method::Patch];

/// Pattern a path segment must match to be tried as a `urlid` lookup.
const URLID_PATTERN: &str = r"^[\w]+$";

/// Cache directive for slowly-changing descriptor resources.
const DESCRIPTOR_CACHE: &str = "max-age=10,must-revalidate";

const POD_STATUS: &[&str] = &["dead", "deployed", "provisioned", "active", "unknown"];

/// Value encodings, after the struct-format character codes.
const SENSOR_FORMATS: &[&str] = &[
    "x", "c", "b", "B", "?", "h", "H", "i", "I", "l", "L", "q", "Q", "f", "d", "s", "p", "P",
];
const BYTE_ORDERS: &[&str] = &["@", "=", "<", ">", "!"];

const POD_SCHEMA: &[FieldRule] = &[
    // Text id for use in URLs and in data submissions.
    FieldRule::new("urlid", FieldType::String).required().length(1, 20),
    // Pod id, usually the phone number of the cellular radio.
    FieldRule::new("pid", FieldType::String).required().length(10, 15),
    // IMEI of the cellular radio, acts as serial number.
    FieldRule::new("imei", FieldType::String).required().length(15, 20).unique(),
    FieldRule::new("firmware", FieldType::Integer),
    FieldRule::new("status", FieldType::String).required().allowed(POD_STATUS),
    // Last contact.
    FieldRule::new("last", FieldType::DateTime),
    FieldRule::new("owner", FieldType::String),
    FieldRule::new("public", FieldType::Boolean)
        .required()
        .default_value(DefaultValue::Bool(true)),
];

const SENSOR_SCHEMA: &[FieldRule] = &[
    FieldRule::new("urlid", FieldType::String).required().length(1, 16),
    // Unique sensor id, referenced from pod upload descriptors only.
    FieldRule::new("sid", FieldType::Integer).required().range(0, 999).unique(),
    // Byte width of one encoded reading.
    FieldRule::new("nbytes", FieldType::Integer).required(),
    FieldRule::new("fmt", FieldType::String).required().length(1, 1).allowed(SENSOR_FORMATS),
    FieldRule::new("byteorder", FieldType::String)
        .length(1, 1)
        .allowed(BYTE_ORDERS)
        .default_value(DefaultValue::Str("<")),
    FieldRule::new("info", FieldType::String)
        .length(1, 256)
        .default_value(DefaultValue::Str(
            "no additional information is available for this sensor",
        )),
    // Multiplier applied to raw values.
    FieldRule::new("magnitude", FieldType::Float).default_value(DefaultValue::Float(1.0)),
    FieldRule::new("units", FieldType::String).max_length(100),
];

const DATA_SCHEMA: &[FieldRule] = &[
    FieldRule::new("t", FieldType::DateTime).required(),
    FieldRule::new("v", FieldType::Float).required(),
    FieldRule::new("p", FieldType::String).required(),
    FieldRule::new("s", FieldType::String).required(),
    FieldRule::new("pod", FieldType::Reference { resource: "pods", embeddable: true }),
    FieldRule::new("sensor", FieldType::Reference { resource: "sensors", embeddable: true }),
];

const USER_SCHEMA: &[FieldRule] = &[
    // Only API keys live here; identity and profile data are held by the
    // external identity provider.
    FieldRule::new("keys", FieldType::StringList),
];

const RESOURCES: &[Resource] = &[
    Resource {
        name: "pods",
        schema: POD_SCHEMA,
        resource_methods: DEFAULT_RESOURCE_METHODS,
        item_methods: DEFAULT_ITEM_METHODS,
        alternate_lookup: Some(AlternateLookup { field: "urlid", pattern: URLID_PATTERN }),
        projection: &["owner", "firmware"],
        cache_control: Some(DESCRIPTOR_CACHE),
    },
    Resource {
        name: "sensors",
        schema: SENSOR_SCHEMA,
        resource_methods: DEFAULT_RESOURCE_METHODS,
        item_methods: DEFAULT_ITEM_METHODS,
        alternate_lookup: Some(AlternateLookup { field: "urlid", pattern: URLID_PATTERN }),
        projection: &[],
        cache_control: Some(DESCRIPTOR_CACHE),
    },
    Resource {
        name: "data",
        schema: DATA_SCHEMA,
        resource_methods: DEFAULT_RESOURCE_METHODS,
        // Append-only: no item endpoint at all.
        item_methods: &[],
        alternate_lookup: None,
        projection: &[],
        cache_control: None,
    },
    Resource {
        name: "users",
        schema: USER_SCHEMA,
        resource_methods: &[Method::Get, Method::Post, Method::Delete],
        item_methods: DEFAULT_ITEM_METHODS,
        alternate_lookup: None,
        projection: &[],
        cache_control: None,
    },
];

/// The resolved domain, looked up by path segment at request time.
#[derive(Clone, Copy, Debug)]
pub struct Registry {
    resources: &'static [Resource],
}

impl Registry {
    pub fn resource(&self, path_segment: &str) -> Option<&'static Resource> {
        self.resources.iter().find(|r| r.name == path_segment)
    }

    pub fn resources(&self) -> &'static [Resource] {
        self.resources
    }
}

/// The one registry this service exposes.
pub fn domain() -> Registry {
    Registry { resources: RESOURCES }
}
