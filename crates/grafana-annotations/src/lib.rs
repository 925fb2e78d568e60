//! Annotation client and data models for the Grafana HTTP API.
//!
//! Provides typed annotation records and an asynchronous client covering the
//! `/api/annotations` endpoints.

#![deny(missing_docs)]

pub mod client;
pub mod models;

pub use client::{AnnotationClient, AnnotationClientBuilder};
pub use models::{Annotation, AnnotationListParams, AnnotationType, GraphiteAnnotation};

/// Convenient result alias that reuses the shared Grafana error type.
pub type Result<T> = grafana_core::Result<T>;
