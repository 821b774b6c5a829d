//! Operator context handed to every workflow call.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::api::{ApiClient, ApiError, Endpoint, QueryKey, Transport};
use crate::workflows::domain::{RecordId, Reference};

/// Permission codes granted through an admin's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Permission {
    AcceptStudent,
    AcceptEnrollment,
    ReadStudent,
    CreateStudent,
    UpdateStudent,
    ReadTeacher,
    CreateTeacher,
    UpdateTeacher,
    ReadBranch,
    CreateBranch,
    UpdateBranch,
}

impl Permission {
    pub const fn code(self) -> &'static str {
        match self {
            Permission::AcceptStudent => "ACCEPT_STUDENT",
            Permission::AcceptEnrollment => "ACCEPT_ENROLLMENT",
            Permission::ReadStudent => "READ_STUDENT",
            Permission::CreateStudent => "CREATE_STUDENT",
            Permission::UpdateStudent => "UPDATE_STUDENT",
            Permission::ReadTeacher => "READ_TEACHER",
            Permission::CreateTeacher => "CREATE_TEACHER",
            Permission::UpdateTeacher => "UPDATE_TEACHER",
            Permission::ReadBranch => "READ_BRANCH",
            Permission::CreateBranch => "CREATE_BRANCH",
            Permission::UpdateBranch => "UPDATE_BRANCH",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrant {
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleGrant {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub permissions: Vec<PermissionGrant>,
}

/// The signed-in admin as reported by `/auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminProfile {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<RoleGrant>,
    #[serde(default)]
    pub branch: Option<Reference>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("operator is missing the {permission} permission")]
pub struct PermissionDenied {
    pub permission: Permission,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    admin: AdminProfile,
    permissions: BTreeSet<String>,
}

impl Session {
    pub fn new<I, S>(admin: AdminProfile, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            admin,
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }

    /// Grants exactly the codes attached to the admin's role.
    pub fn from_profile(admin: AdminProfile) -> Self {
        let codes: Vec<String> = admin
            .role
            .as_ref()
            .map(|role| role.permissions.iter().map(|grant| grant.code.clone()).collect())
            .unwrap_or_default();
        Self::new(admin, codes)
    }

    pub fn admin(&self) -> &AdminProfile {
        &self.admin
    }

    pub fn permission_codes(&self) -> impl Iterator<Item = &str> {
        self.permissions.iter().map(String::as_str)
    }

    /// True when any of `allowed` is granted. An operator without codes has
    /// no access at all.
    pub fn has_any(&self, allowed: &[Permission]) -> bool {
        allowed
            .iter()
            .any(|permission| self.permissions.contains(permission.code()))
    }

    pub fn require(&self, permission: Permission) -> Result<(), PermissionDenied> {
        if self.has_any(&[permission]) {
            Ok(())
        } else {
            Err(PermissionDenied { permission })
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CurrentAdminResponse {
    Data { data: AdminProfile },
    User { user: AdminProfile },
    Bare(AdminProfile),
}

/// Resolves the session behind the configured cookie.
pub async fn load_session<T: Transport>(api: &ApiClient<T>) -> Result<Session, ApiError> {
    let key = QueryKey::new(Endpoint::CurrentAdmin.path());
    let response: CurrentAdminResponse = api.query(&key).await?;
    let admin = match response {
        CurrentAdminResponse::Data { data } => data,
        CurrentAdminResponse::User { user } => user,
        CurrentAdminResponse::Bare(admin) => admin,
    };
    Ok(Session::from_profile(admin))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn profile(codes: &[&str]) -> AdminProfile {
        serde_json::from_value(json!({
            "id": "a-1",
            "name": "Case Worker",
            "role": {
                "id": "r-1",
                "name": "Registrar",
                "permissions": codes.iter().map(|code| json!({ "code": code })).collect::<Vec<_>>()
            }
        }))
        .expect("profile decodes")
    }

    #[test]
    fn role_codes_become_permissions() {
        let session = Session::from_profile(profile(&["ACCEPT_STUDENT", "READ_STUDENT"]));
        assert!(session.has_any(&[Permission::AcceptStudent]));
        assert!(session.has_any(&[Permission::AcceptEnrollment, Permission::ReadStudent]));
        assert!(!session.has_any(&[Permission::AcceptEnrollment]));
        assert!(session.require(Permission::ReadStudent).is_ok());
    }

    #[test]
    fn empty_grants_allow_nothing() {
        let session = Session::from_profile(profile(&[]));
        assert!(!session.has_any(&[Permission::AcceptStudent, Permission::ReadBranch]));
        assert_eq!(
            session.require(Permission::AcceptStudent),
            Err(PermissionDenied {
                permission: Permission::AcceptStudent
            })
        );
    }
}
