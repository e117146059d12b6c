//! API data transfer models.

pub mod auth;
pub mod event;
pub mod model;
pub mod pagination;
pub mod user;

pub use auth::{CaptchaResponse, LoginRequest, LoginResponse, RegisterRequest, SessionClaims, UserInfo};
pub use event::VisitCountEvent;
pub use model::{
    AuditRequest, DescriptionRequest, ModelStats, ModelView, SourceFileResponse,
    SourceUpdateRequest, UploadMeta, VisibilityRequest,
};
pub use pagination::{Pagination, PaginationParams};
pub use user::{
    ChangePasswordRequest, CreateUserRequest, ResetPasswordRequest, RoleView, UpdateProfileRequest,
    UpdateRoleRequest, UpdateStatusRequest, UserQueryParams, UserView,
};
