//! Annotation records and list filters.

use chrono::{DateTime, Utc};
use grafana_core::ids::{AlertId, AnnotationId, DashboardId, PanelId, RegionId, UserId};
use grafana_core::query::QueryParams;
use serde::{Deserialize, Serialize};
use std::fmt;

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(value: &bool) -> bool {
    !*value
}

/// An annotation as stored by Grafana.
///
/// `dashboardId`, `panelId`, `time` and `text` are always sent; every other field is
/// omitted from the JSON body when unset. Times are epoch milliseconds.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    /// Annotation id, assigned by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<AnnotationId>,
    /// Alert that produced the annotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_id: Option<AlertId>,
    /// Dashboard the annotation belongs to (0 for organization-wide annotations).
    #[serde(default)]
    pub dashboard_id: DashboardId,
    /// Panel the annotation belongs to.
    #[serde(default)]
    pub panel_id: PanelId,
    /// Author id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    /// Author login.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    /// Alert state after the transition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_state: Option<String>,
    /// Alert state before the transition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_state: Option<String>,
    /// Start time in epoch milliseconds.
    #[serde(default)]
    pub time: i64,
    /// End time in epoch milliseconds, for region annotations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_end: Option<i64>,
    /// Annotation text.
    #[serde(default)]
    pub text: String,
    /// Metric name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
    /// Region id shared by both ends of a region.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_id: Option<RegionId>,
    /// Annotation type as reported by the server.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Whether the annotation spans a time range.
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_region: bool,
}

impl Annotation {
    /// Create an organization-wide annotation at `time`.
    #[must_use]
    pub fn new(text: impl Into<String>, time: DateTime<Utc>) -> Self {
        Self {
            text: text.into(),
            time: time.timestamp_millis(),
            ..Self::default()
        }
    }

    /// Attach the annotation to a dashboard panel.
    #[must_use]
    pub const fn on_panel(mut self, dashboard_id: DashboardId, panel_id: PanelId) -> Self {
        self.dashboard_id = dashboard_id;
        self.panel_id = panel_id;
        self
    }

    /// Turn the annotation into a region ending at `end`.
    #[must_use]
    pub fn ending_at(mut self, end: DateTime<Utc>) -> Self {
        self.time_end = Some(end.timestamp_millis());
        self.is_region = true;
        self
    }

    /// Replace the tags.
    #[must_use]
    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Start time, if representable.
    #[must_use]
    pub fn starts_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.time)
    }

    /// End time of a region annotation.
    #[must_use]
    pub fn ends_at(&self) -> Option<DateTime<Utc>> {
        self.time_end.and_then(DateTime::from_timestamp_millis)
    }
}

/// An annotation in the Graphite event format.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GraphiteAnnotation {
    /// Event title.
    pub what: String,
    /// Event time in epoch seconds.
    pub when: i64,
    /// Event body.
    pub data: String,
    /// Tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Annotation kinds accepted by the `type` filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationType {
    /// Alert state changes only.
    Alert,
    /// User-created annotations only.
    Annotation,
}

impl AnnotationType {
    /// Wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Alert => "alert",
            Self::Annotation => "annotation",
        }
    }
}

impl fmt::Display for AnnotationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Query parameters for listing annotations.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AnnotationListParams {
    /// Only annotations after this instant.
    pub from: Option<DateTime<Utc>>,
    /// Only annotations before this instant.
    pub to: Option<DateTime<Utc>>,
    /// Maximum number of results.
    pub limit: Option<u32>,
    /// Filter by alert.
    pub alert_id: Option<AlertId>,
    /// Filter by dashboard.
    pub dashboard_id: Option<DashboardId>,
    /// Filter by panel.
    pub panel_id: Option<PanelId>,
    /// Filter by author.
    pub user_id: Option<UserId>,
    /// Filter by kind.
    pub kind: Option<AnnotationType>,
    /// Require all of these tags.
    pub tags: Vec<String>,
    /// Further filters sent verbatim, e.g. `matchAny` or `dashboardUID`.
    pub extra: QueryParams,
}

impl AnnotationListParams {
    /// Convert to URL query parameters.
    #[must_use]
    pub fn to_query(&self) -> QueryParams {
        let mut params = QueryParams::new();
        params.push_opt_with("from", self.from, |t| t.timestamp_millis().to_string());
        params.push_opt_with("to", self.to, |t| t.timestamp_millis().to_string());
        params.push_opt("limit", self.limit);
        params.push_opt("alertId", self.alert_id);
        params.push_opt("dashboardId", self.dashboard_id);
        params.push_opt("panelId", self.panel_id);
        params.push_opt("userId", self.user_id);
        params.push_opt("type", self.kind);
        params.push_all("tags", &self.tags);
        params.append(self.extra.clone());
        params
    }
}
