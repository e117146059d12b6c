//! Business logic services.

pub mod captcha;
pub mod event_broadcaster;
pub mod folder;
pub mod gitea;
pub mod model;
pub mod moderation;
pub mod readme;
pub mod stats;

pub use captcha::CaptchaService;
pub use event_broadcaster::EventBroadcaster;
pub use gitea::GiteaClient;
