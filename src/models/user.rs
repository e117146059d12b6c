//! Admin user management request/response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// A user row as returned by the admin API, with role codes resolved.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserView {
    pub id: i64,
    pub username: String,
    pub nickname: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub enabled: bool,
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl UserView {
    /// Highest-ranked role code, used for admin list ordering.
    pub fn highest_role(&self) -> &str {
        if self.roles.iter().any(|r| r == "super_admin") {
            "super_admin"
        } else if self.roles.iter().any(|r| r == "admin") {
            "admin"
        } else {
            "user"
        }
    }
}

/// Filters for the admin user listing.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct UserQueryParams {
    pub username: Option<String>,
    pub nickname: Option<String>,
    pub email: Option<String>,
    pub enabled: Option<bool>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// Admin user creation request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub nickname: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Role code to assign; defaults to `user` when absent
    pub role: Option<String>,
}

/// Role reassignment request (super-admin only).
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRoleRequest {
    /// Target role code: `admin` or `user`
    pub role: String,
}

/// Enable/disable request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub enabled: bool,
}

/// Self-service profile update. Omitted fields stay as they are; a blank
/// phone or avatar URL clears the stored value.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub nickname: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
}

/// Self-service password change.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// Admin password reset for another account.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ResetPasswordRequest {
    pub new_password: String,
}

/// An assignable role, as shown in the admin console's role picker.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoleView {
    pub id: i64,
    pub code: String,
    pub name: String,
}
