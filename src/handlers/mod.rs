//! HTTP handlers for the declared resources.

pub mod resource;

pub use resource::*;
