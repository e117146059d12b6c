//! Admin user management endpoints.

use actix_web::{HttpResponse, delete, get, post, put, web};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use crate::auth::{AuthUser, ROLE_ADMIN, ROLE_SUPER_ADMIN, ROLE_USER, RoleLookup};
use crate::auth::password::{hash_password, verify_password};
use crate::db;
use crate::db::users::ProfileChanges;
use crate::error::{AppError, AppResult};
use crate::models::{
    ChangePasswordRequest, CreateUserRequest, Pagination, PaginationParams, ResetPasswordRequest,
    RoleView, UpdateProfileRequest, UpdateRoleRequest, UpdateStatusRequest, UserQueryParams,
    UserView,
};

const MIN_PASSWORD_LEN: usize = 6;

/// Configure user routes. Fixed segments go before the `{id}` routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(get_profile)
        .service(update_profile)
        .service(change_password)
        .service(list_roles)
        .service(list_users)
        .service(create_user)
        .service(update_user_role)
        .service(update_user_status)
        .service(reset_password)
        .service(delete_user);
}

/// Paginated user list response.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserListResponse {
    pub users: Vec<UserView>,
    pub pagination: Pagination,
}

fn role_rank(code: &str) -> u8 {
    match code {
        ROLE_SUPER_ADMIN => 0,
        ROLE_ADMIN => 1,
        _ => 2,
    }
}

/// Rank-order the full result set, then cut the requested page.
///
/// The sort must precede the cut so admins surface on the first pages no
/// matter when they were created. The stable sort keeps creation order
/// within each rank.
fn rank_and_paginate(
    mut users: Vec<UserView>,
    params: &PaginationParams,
) -> (Vec<UserView>, u64) {
    users.sort_by_key(|u| role_rank(u.highest_role()));

    let total = users.len() as u64;
    let limit = params.clamped_limit();
    let page = users
        .into_iter()
        .skip(params.offset(limit))
        .take(limit as usize)
        .collect();

    (page, total)
}

async fn to_view(roles: &RoleLookup, user: crate::entity::user::Model) -> AppResult<UserView> {
    let role_codes = roles.roles_of(user.id).await?;
    Ok(UserView {
        id: user.id,
        username: user.username,
        nickname: user.nickname,
        email: user.email,
        phone: user.phone,
        avatar_url: user.avatar_url,
        enabled: user.enabled,
        roles: role_codes,
        created_at: user.created_at,
    })
}

/// Check that the actor may manage the target user.
///
/// Admins manage plain users; super-admins additionally manage admins.
/// Nobody manages a super-admin or themselves through this API.
async fn require_can_manage(
    roles: &RoleLookup,
    actor_id: i64,
    target_id: i64,
) -> AppResult<()> {
    if actor_id == target_id {
        return Err(AppError::PermissionDenied(
            "Cannot manage your own account".to_string(),
        ));
    }

    roles.require_admin(actor_id).await?;

    let target_roles = roles.roles_of(target_id).await?;
    if target_roles.iter().any(|r| r == ROLE_SUPER_ADMIN) {
        return Err(AppError::PermissionDenied(
            "Super admin accounts cannot be managed".to_string(),
        ));
    }
    if target_roles.iter().any(|r| r == ROLE_ADMIN) && !roles.is_super_admin(actor_id).await? {
        return Err(AppError::PermissionDenied(
            "Only a super admin can manage admin accounts".to_string(),
        ));
    }

    Ok(())
}

/// List users for the admin console.
///
/// Super-admin accounts and the caller are always excluded; a plain admin
/// additionally sees no other admins. Rows are ordered by role rank, then
/// creation time.
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "Users",
    params(UserQueryParams),
    responses(
        (status = 200, description = "User page", body = UserListResponse),
        (status = 403, description = "Admin role required", body = crate::error::ErrorResponse),
    ),
    security(("bearer_token" = []))
)]
#[get("/users")]
pub async fn list_users(
    auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    roles: web::Data<RoleLookup>,
    query: web::Query<UserQueryParams>,
) -> AppResult<HttpResponse> {
    roles.require_admin(auth.user_id).await?;

    let mut exclude = db::roles::user_ids_with_code(db.get_ref(), ROLE_SUPER_ADMIN).await?;
    if !roles.is_super_admin(auth.user_id).await? {
        exclude.extend(db::roles::user_ids_with_code(db.get_ref(), ROLE_ADMIN).await?);
    }
    if !exclude.contains(&auth.user_id) {
        exclude.push(auth.user_id);
    }

    let params = PaginationParams {
        page: query.page,
        limit: query.limit,
    };
    let rows = db::users::list_filtered(db.get_ref(), &query, &exclude).await?;

    let mut views = Vec::with_capacity(rows.len());
    for row in rows {
        views.push(to_view(roles.get_ref(), row).await?);
    }
    let (users, total) = rank_and_paginate(views, &params);

    Ok(HttpResponse::Ok().json(UserListResponse {
        users,
        pagination: Pagination::new(&params, total),
    }))
}

/// The caller's own profile.
#[utoipa::path(
    get,
    path = "/api/v1/users/profile",
    tag = "Users",
    responses(
        (status = 200, description = "Current profile", body = UserView),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
    ),
    security(("bearer_token" = []))
)]
#[get("/users/profile")]
pub async fn get_profile(
    auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    roles: web::Data<RoleLookup>,
) -> AppResult<HttpResponse> {
    let user = db::users::find_by_id(db.get_ref(), auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {}", auth.user_id)))?;

    let view = to_view(roles.get_ref(), user).await?;
    Ok(HttpResponse::Ok().json(view))
}

/// Update the caller's own profile.
///
/// Blank nickname and email submissions are ignored; a blank phone or
/// avatar URL clears the field. A changed email must not belong to
/// another account.
#[utoipa::path(
    put,
    path = "/api/v1/users/profile",
    tag = "Users",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserView),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 409, description = "Email already in use", body = crate::error::ErrorResponse),
    ),
    security(("bearer_token" = []))
)]
#[put("/users/profile")]
pub async fn update_profile(
    auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    roles: web::Data<RoleLookup>,
    body: web::Json<UpdateProfileRequest>,
) -> AppResult<HttpResponse> {
    let user = db::users::find_by_id(db.get_ref(), auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {}", auth.user_id)))?;

    let req = body.into_inner();
    let mut changes = ProfileChanges::default();

    if let Some(nickname) = req.nickname.filter(|s| !s.trim().is_empty()) {
        changes.nickname = Some(nickname);
    }
    if let Some(email) = req.email.filter(|s| !s.trim().is_empty()) {
        if let Some(holder) = db::users::find_by_email(db.get_ref(), &email).await? {
            if holder.id != auth.user_id {
                return Err(AppError::Duplicate(format!(
                    "Email '{}' is already in use",
                    email
                )));
            }
        }
        changes.email = Some(email);
    }
    if let Some(phone) = req.phone {
        changes.phone = Some(Some(phone).filter(|s| !s.trim().is_empty()));
    }
    if let Some(avatar_url) = req.avatar_url {
        changes.avatar_url = Some(Some(avatar_url).filter(|s| !s.trim().is_empty()));
    }

    let updated = db::users::update_profile(db.get_ref(), user, changes).await?;
    info!("User {} updated their profile", auth.user_id);

    let view = to_view(roles.get_ref(), updated).await?;
    Ok(HttpResponse::Ok().json(view))
}

/// Change the caller's own password. The old password must verify.
#[utoipa::path(
    put,
    path = "/api/v1/users/change-password",
    tag = "Users",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "Old password incorrect", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
    ),
    security(("bearer_token" = []))
)]
#[put("/users/change-password")]
pub async fn change_password(
    auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    body: web::Json<ChangePasswordRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    if req.new_password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let user = db::users::find_by_id(db.get_ref(), auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {}", auth.user_id)))?;

    if !verify_password(&req.old_password, &user.password_hash)? {
        return Err(AppError::Validation("Old password is incorrect".to_string()));
    }

    let password_hash = hash_password(&req.new_password)?;
    db::users::set_password_hash(db.get_ref(), auth.user_id, &password_hash).await?;

    info!("User {} changed their password", auth.user_id);

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Password changed" })))
}

/// Assignable roles for the admin console's role picker.
#[utoipa::path(
    get,
    path = "/api/v1/roles",
    tag = "Users",
    responses(
        (status = 200, description = "Enabled roles", body = [RoleView]),
        (status = 403, description = "Admin role required", body = crate::error::ErrorResponse),
    ),
    security(("bearer_token" = []))
)]
#[get("/roles")]
pub async fn list_roles(
    auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    roles: web::Data<RoleLookup>,
) -> AppResult<HttpResponse> {
    roles.require_admin(auth.user_id).await?;

    let views: Vec<RoleView> = db::roles::list_enabled(db.get_ref())
        .await?
        .into_iter()
        .map(|r| RoleView {
            id: r.id,
            code: r.code,
            name: r.name,
        })
        .collect();

    Ok(HttpResponse::Ok().json(views))
}

/// Create a user account from the admin console.
///
/// Assigning the `admin` role requires a super-admin caller.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "Users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserView),
        (status = 400, description = "Invalid request", body = crate::error::ErrorResponse),
        (status = 403, description = "Not permitted", body = crate::error::ErrorResponse),
        (status = 409, description = "Username taken", body = crate::error::ErrorResponse),
    ),
    security(("bearer_token" = []))
)]
#[post("/users")]
pub async fn create_user(
    auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    roles: web::Data<RoleLookup>,
    body: web::Json<CreateUserRequest>,
) -> AppResult<HttpResponse> {
    roles.require_admin(auth.user_id).await?;

    let req = body.into_inner();
    let role_code = req.role.as_deref().unwrap_or(ROLE_USER);
    match role_code {
        ROLE_USER => {}
        ROLE_ADMIN => roles.require_super_admin(auth.user_id).await?,
        other => {
            return Err(AppError::Validation(format!(
                "Role '{}' cannot be assigned here",
                other
            )));
        }
    }

    let username = req.username.trim();
    if username.is_empty() {
        return Err(AppError::Validation("Username is required".to_string()));
    }
    if db::users::find_by_username(db.get_ref(), username)
        .await?
        .is_some()
    {
        return Err(AppError::Duplicate(format!(
            "Username '{}' is already taken",
            username
        )));
    }

    let password_hash = hash_password(&req.password)?;
    let user = db::users::insert(
        db.get_ref(),
        username,
        &password_hash,
        req.nickname.as_deref(),
        req.email.as_deref(),
        req.phone.as_deref(),
    )
    .await?;

    let role = db::roles::find_by_code(db.get_ref(), role_code)
        .await?
        .ok_or_else(|| AppError::Database(format!("Role '{}' is missing", role_code)))?;
    db::roles::assign(db.get_ref(), user.id, role.id).await?;

    info!(
        "Admin {} created user: id={}, username={}, role={}",
        auth.user_id, user.id, user.username, role_code
    );

    let view = to_view(roles.get_ref(), user).await?;
    Ok(HttpResponse::Created().json(view))
}

/// Reassign a user's role (super-admin only).
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}/role",
    tag = "Users",
    params(("id" = i64, Path, description = "User ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = UserView),
        (status = 403, description = "Super admin role required", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_token" = []))
)]
#[put("/users/{id}/role")]
pub async fn update_user_role(
    auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    roles: web::Data<RoleLookup>,
    path: web::Path<i64>,
    body: web::Json<UpdateRoleRequest>,
) -> AppResult<HttpResponse> {
    roles.require_super_admin(auth.user_id).await?;

    let target_id = path.into_inner();
    require_can_manage(roles.get_ref(), auth.user_id, target_id).await?;

    let req = body.into_inner();
    if req.role != ROLE_USER && req.role != ROLE_ADMIN {
        return Err(AppError::Validation(format!(
            "Role '{}' cannot be assigned here",
            req.role
        )));
    }

    let user = db::users::find_by_id(db.get_ref(), target_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {}", target_id)))?;

    let role = db::roles::find_by_code(db.get_ref(), &req.role)
        .await?
        .ok_or_else(|| AppError::Database(format!("Role '{}' is missing", req.role)))?;

    db::roles::clear_for_user(db.get_ref(), target_id).await?;
    db::roles::assign(db.get_ref(), target_id, role.id).await?;

    info!(
        "Super admin {} set role of user {} to {}",
        auth.user_id, target_id, req.role
    );

    let view = to_view(roles.get_ref(), user).await?;
    Ok(HttpResponse::Ok().json(view))
}

/// Enable or disable an account.
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}/status",
    tag = "Users",
    params(("id" = i64, Path, description = "User ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated"),
        (status = 403, description = "Not permitted", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_token" = []))
)]
#[put("/users/{id}/status")]
pub async fn update_user_status(
    auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    roles: web::Data<RoleLookup>,
    path: web::Path<i64>,
    body: web::Json<UpdateStatusRequest>,
) -> AppResult<HttpResponse> {
    let target_id = path.into_inner();
    require_can_manage(roles.get_ref(), auth.user_id, target_id).await?;

    db::users::set_enabled(db.get_ref(), target_id, body.enabled).await?;

    info!(
        "Admin {} set enabled={} on user {}",
        auth.user_id, body.enabled, target_id
    );

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Status updated" })))
}

/// Reset another account's password.
///
/// Same management rules as enable/disable: never on yourself (use
/// change-password), and only a super-admin may reset an admin's.
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}/password",
    tag = "Users",
    params(("id" = i64, Path, description = "User ID")),
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset"),
        (status = 403, description = "Not permitted", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_token" = []))
)]
#[put("/users/{id}/password")]
pub async fn reset_password(
    auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    roles: web::Data<RoleLookup>,
    path: web::Path<i64>,
    body: web::Json<ResetPasswordRequest>,
) -> AppResult<HttpResponse> {
    let target_id = path.into_inner();
    require_can_manage(roles.get_ref(), auth.user_id, target_id).await?;

    let req = body.into_inner();
    if req.new_password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let password_hash = hash_password(&req.new_password)?;
    db::users::set_password_hash(db.get_ref(), target_id, &password_hash).await?;

    info!("Admin {} reset the password of user {}", auth.user_id, target_id);

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Password reset" })))
}

/// Soft-delete an account (super-admin only).
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    tag = "Users",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted"),
        (status = 403, description = "Super admin role required", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_token" = []))
)]
#[delete("/users/{id}")]
pub async fn delete_user(
    auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    roles: web::Data<RoleLookup>,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    roles.require_super_admin(auth.user_id).await?;

    let target_id = path.into_inner();
    require_can_manage(roles.get_ref(), auth.user_id, target_id).await?;

    db::users::soft_delete(db.get_ref(), target_id).await?;
    db::roles::clear_for_user(db.get_ref(), target_id).await?;

    info!("Super admin {} deleted user {}", auth.user_id, target_id);

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "User deleted" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn view(id: i64, role: &str, age_days: i64) -> UserView {
        UserView {
            id,
            username: format!("u{}", id),
            nickname: None,
            email: None,
            phone: None,
            avatar_url: None,
            enabled: true,
            roles: vec![role.to_string()],
            created_at: Utc::now() - Duration::days(age_days),
        }
    }

    #[test]
    fn admins_lead_the_first_page_even_when_created_last() {
        // three old plain users, then a freshly created admin
        let views = vec![
            view(1, "user", 30),
            view(2, "user", 20),
            view(3, "user", 10),
            view(4, "admin", 0),
        ];
        let params = PaginationParams {
            page: Some(1),
            limit: Some(2),
        };

        let (page, total) = rank_and_paginate(views, &params);

        assert_eq!(total, 4);
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].id, 4);
        assert_eq!(page[1].id, 1);
    }

    #[test]
    fn creation_order_holds_within_a_rank() {
        let views = vec![view(1, "user", 5), view(2, "user", 3), view(3, "user", 1)];
        let params = PaginationParams {
            page: Some(2),
            limit: Some(2),
        };

        let (page, total) = rank_and_paginate(views, &params);

        assert_eq!(total, 3);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, 3);
    }
}
