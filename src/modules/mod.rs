//! Modules layer - Infrastructure components for external integrations
//!
//! Contains clients and adapters for the object store and the vision model.

pub mod storage;
pub mod vision;
