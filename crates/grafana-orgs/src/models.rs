//! Organization, user and datasource records.

use grafana_core::ids::{DashboardId, DataSourceId, FolderId, OrgId, UserId};
use grafana_core::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// A Grafana organization.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Org {
    /// Organization id.
    pub id: OrgId,
    /// Organization name.
    pub name: String,
}

impl fmt::Display for Org {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Body of `POST /api/orgs`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateOrgRequest {
    /// Name of the new organization.
    pub name: String,
}

/// Response of `POST /api/orgs`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrgResponse {
    /// Id of the new organization.
    pub org_id: OrgId,
    /// Server message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A Grafana user.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// User id.
    pub id: UserId,
    /// Email address.
    #[serde(default)]
    pub email: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Login.
    #[serde(default)]
    pub login: String,
    /// Whether the user is a server admin.
    #[serde(default)]
    pub is_admin: bool,
}

/// Role of a user inside an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrgUserRole {
    /// Full control of the organization.
    Admin,
    /// Can edit dashboards.
    Editor,
    /// Read-only access.
    Viewer,
}

impl OrgUserRole {
    /// Wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Editor => "Editor",
            Self::Viewer => "Viewer",
        }
    }
}

impl fmt::Display for OrgUserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrgUserRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Admin" => Ok(Self::Admin),
            "Editor" => Ok(Self::Editor),
            "Viewer" => Ok(Self::Viewer),
            other => Err(Error::ValidationError(format!("invalid role name: {other}"))),
        }
    }
}

/// A user's membership in an organization, as listed by `GET /api/orgs/{id}/users`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrgUser {
    /// Organization id.
    pub org_id: OrgId,
    /// Member's user id.
    pub user_id: UserId,
    /// Email address.
    #[serde(default)]
    pub email: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Login.
    #[serde(default)]
    pub login: String,
    /// Role inside the organization as reported by the server. Besides the
    /// basic roles this may be `None` for members without a basic role.
    pub role: String,
}

impl OrgUser {
    /// The member's basic role, if it has one.
    #[must_use]
    pub fn basic_role(&self) -> Option<OrgUserRole> {
        self.role.parse().ok()
    }

    /// The member as a plain [`User`].
    ///
    /// The listing does not report server admin status, so `is_admin` is
    /// always `false` here and should not be relied on.
    #[must_use]
    pub fn user(&self) -> User {
        User {
            id: self.user_id,
            email: self.email.clone(),
            name: self.name.clone(),
            login: self.login.clone(),
            is_admin: false,
        }
    }
}

/// Members of an organization.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct OrgUsers(pub Vec<OrgUser>);

impl OrgUsers {
    /// The plain users, without their roles.
    #[must_use]
    pub fn users(&self) -> Vec<User> {
        self.0.iter().map(OrgUser::user).collect()
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the organization has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the memberships.
    pub fn iter(&self) -> std::slice::Iter<'_, OrgUser> {
        self.0.iter()
    }
}

impl IntoIterator for OrgUsers {
    type Item = OrgUser;
    type IntoIter = std::vec::IntoIter<OrgUser>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a OrgUsers {
    type Item = &'a OrgUser;
    type IntoIter = std::slice::Iter<'a, OrgUser>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Body of `POST /api/orgs/{id}/users`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddOrgUserRequest {
    /// Role to grant.
    pub role: OrgUserRole,
    /// Login or email of an existing user.
    #[validate(length(min = 1))]
    pub login_or_email: String,
}

/// A datasource configured in an organization.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DataSource {
    /// Datasource id.
    pub id: DataSourceId,
    /// Unique identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    /// Owning organization.
    pub org_id: OrgId,
    /// Name.
    pub name: String,
    /// Plugin type, e.g. `prometheus`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Target URL.
    #[serde(default)]
    pub url: String,
    /// `proxy` or `direct`.
    #[serde(default)]
    pub access: String,
    /// Database name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub database: String,
    /// Login used against the datasource.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user: String,
    /// Whether this is the organization's default datasource.
    #[serde(default)]
    pub is_default: bool,
    /// Plugin specific settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_data: Option<serde_json::Value>,
}

/// One hit of `GET /api/search?type=dash-db`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSearchHit {
    /// Dashboard id.
    pub id: DashboardId,
    /// Dashboard uid.
    pub uid: String,
    /// Title.
    pub title: String,
    /// Legacy `db/<slug>` URI.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uri: String,
    /// Relative URL.
    #[serde(default)]
    pub url: String,
    /// Hit type, `dash-db` for dashboards.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Starred by the requesting user.
    #[serde(default)]
    pub is_starred: bool,
    /// Containing folder id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<FolderId>,
    /// Containing folder uid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_uid: Option<String>,
    /// Containing folder title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_title: Option<String>,
}
