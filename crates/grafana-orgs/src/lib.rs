//! Organization client and data models for the Grafana HTTP API.
//!
//! Covers `/api/orgs`, organization membership and the org-scoped datasource and
//! dashboard listings. [`Org`] carries convenience accessors that call through an
//! [`OrgClient`].

#![deny(missing_docs)]

pub mod client;
pub mod models;

pub use client::{OrgClient, OrgClientBuilder};
pub use models::{
    AddOrgUserRequest, CreateOrgRequest, CreateOrgResponse, DashboardSearchHit, DataSource, Org,
    OrgUser, OrgUserRole, OrgUsers, User,
};

/// Convenient result alias that reuses the shared Grafana error type.
pub type Result<T> = grafana_core::Result<T>;
