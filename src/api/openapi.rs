//! OpenAPI documentation configuration.

use utoipa::OpenApi;

use crate::{api, error, models};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Model Cloud Server",
        version = "0.1.0",
        description = "Model sharing platform: account management, model upload to a Gitea-backed artifact store, moderation, favorites and live visit statistics"
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        // Health endpoints
        api::health::health,
        api::health::ready,
        // Auth endpoints
        api::auth::captcha,
        api::auth::register,
        api::auth::login,
        api::auth::logout,
        api::auth::me,
        // Model endpoints
        api::models::upload_model,
        api::models::list_models,
        api::models::list_my_models,
        api::models::list_pending_models,
        api::models::list_my_activities,
        api::models::model_stats,
        api::models::get_model,
        api::models::get_model_source,
        api::models::update_model_source,
        api::models::update_visibility,
        api::models::update_cover,
        api::models::update_description,
        api::models::audit_model,
        api::models::delete_model,
        // Collect endpoints
        api::collects::collect_model,
        api::collects::uncollect_model,
        api::collects::check_collected,
        api::collects::list_collected,
        // Profile endpoints
        api::users::get_profile,
        api::users::update_profile,
        api::users::change_password,
        // Admin user endpoints
        api::users::list_users,
        api::users::create_user,
        api::users::update_user_role,
        api::users::update_user_status,
        api::users::reset_password,
        api::users::delete_user,
        api::users::list_roles,
        // Events
        api::sse::visit_events,
    ),
    components(
        schemas(
            // Common
            error::ErrorResponse,
            // Health
            api::health::HealthResponse,
            api::health::ReadyResponse,
            // Auth
            models::CaptchaResponse,
            models::RegisterRequest,
            models::LoginRequest,
            models::LoginResponse,
            models::UserInfo,
            // Models
            models::ModelView,
            models::ModelStats,
            models::VisibilityRequest,
            models::AuditRequest,
            models::DescriptionRequest,
            models::SourceFileResponse,
            models::SourceUpdateRequest,
            models::Pagination,
            api::models::ModelListResponse,
            api::models::MutationResponse,
            api::models::DeleteResponse,
            api::collects::CollectListResponse,
            // Users
            models::UserView,
            models::CreateUserRequest,
            models::UpdateRoleRequest,
            models::UpdateStatusRequest,
            models::UpdateProfileRequest,
            models::ChangePasswordRequest,
            models::ResetPasswordRequest,
            models::RoleView,
            api::users::UserListResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Auth", description = "Registration, login and session info"),
        (name = "Models", description = "Model upload, listing, moderation and source management"),
        (name = "Collects", description = "Favorites"),
        (name = "Users", description = "Admin user management"),
        (name = "Events", description = "Server-sent events")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Add the bearer token security scheme.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_token",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
