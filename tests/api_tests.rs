//! HTTP-level tests for the endpoints that run without a database.
//!
//! Full workflow tests (upload, moderation, collects) need PostgreSQL and
//! a Gitea instance; the pieces they compose are covered by unit tests in
//! the library.

use actix_web::{App, web};
use sea_orm::{DatabaseBackend, MockDatabase};
use secrecy::SecretString;

use model_cloud_lib::api;
use model_cloud_lib::auth::issue_session_token;
use model_cloud_lib::config::{Config, Environment, GiteaSettings};
use model_cloud_lib::entity::{collect, model, user};
use model_cloud_lib::services::CaptchaService;

fn test_config() -> Config {
    Config {
        environment: Environment::Development,
        host: "127.0.0.1".to_string(),
        port: 8080,
        database_url: "postgres://test".to_string(),
        jwt_secret: SecretString::from("integration-test-secret"),
        token_ttl_hours: 1,
        captcha_ttl_secs: 300,
        max_upload_size: 1024 * 1024,
        gitea: GiteaSettings {
            base_url: "http://localhost:3000".to_string(),
            account: "modelcloud".to_string(),
            token: SecretString::from("t"),
        },
    }
}

fn test_user() -> user::Model {
    let now = chrono::Utc::now();
    user::Model {
        id: 1,
        username: "alice".to_string(),
        password_hash: "x".to_string(),
        nickname: None,
        email: None,
        phone: None,
        avatar_url: None,
        enabled: true,
        created_at: now,
        updated_at: now,
        deleted_at: None,
    }
}

fn test_model(id: i64) -> model::Model {
    let now = chrono::Utc::now();
    model::Model {
        id,
        name: format!("model-{}", id),
        description: None,
        user_id: 1,
        repo_name: "models-alice".to_string(),
        repo_url: None,
        folder_path: Some(format!("model-model-{}-20260101/", id)),
        cover_image_url: None,
        label_names: None,
        attr_format: None,
        attr_license: None,
        is_public: true,
        status: 20,
        created_at: now,
        updated_at: now,
        deleted_at: None,
    }
}

fn collect_row(id: i64, model_id: i64, deleted: bool) -> collect::Model {
    let now = chrono::Utc::now();
    collect::Model {
        id,
        user_id: 1,
        model_id,
        created_at: now,
        deleted_at: deleted.then_some(now),
    }
}

#[actix_rt::test]
async fn health_returns_healthy() {
    let app = actix_web::test::init_service(
        App::new().service(web::scope("/api/v1").configure(api::configure_health_routes)),
    )
    .await;

    let req = actix_web::test::TestRequest::get()
        .uri("/api/v1/health")
        .to_request();
    let resp = actix_web::test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 200);

    let body: serde_json::Value = actix_web::test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
}

#[actix_rt::test]
async fn captcha_issues_a_key_and_challenge() {
    let app = actix_web::test::init_service(
        App::new()
            .app_data(web::Data::new(CaptchaService::new(300)))
            .service(web::scope("/api/v1").configure(api::configure_auth_routes)),
    )
    .await;

    let req = actix_web::test::TestRequest::get()
        .uri("/api/v1/auth/captcha")
        .to_request();
    let resp = actix_web::test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 200);

    let body: serde_json::Value = actix_web::test::read_body_json(resp).await;
    assert!(!body["key"].as_str().unwrap_or("").is_empty());
    assert!(body["challenge"].as_str().unwrap_or("").contains("= ?"));
}

#[actix_rt::test]
async fn logout_requires_a_session_token() {
    let config = test_config();
    let app = actix_web::test::init_service(
        App::new()
            .app_data(web::Data::new(config))
            .app_data(web::Data::new(CaptchaService::new(300)))
            .service(web::scope("/api/v1").configure(api::configure_auth_routes)),
    )
    .await;

    let req = actix_web::test::TestRequest::post()
        .uri("/api/v1/auth/logout")
        .to_request();
    let resp = actix_web::test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 401);
}

#[actix_rt::test]
async fn logout_accepts_a_valid_token() {
    let config = test_config();
    let token = issue_session_token(&config, &test_user()).unwrap();

    let app = actix_web::test::init_service(
        App::new()
            .app_data(web::Data::new(config))
            .app_data(web::Data::new(CaptchaService::new(300)))
            .service(web::scope("/api/v1").configure(api::configure_auth_routes)),
    )
    .await;

    let req = actix_web::test::TestRequest::post()
        .uri("/api/v1/auth/logout")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let resp = actix_web::test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 200);
}

#[actix_rt::test]
async fn collecting_the_same_model_twice_is_rejected() {
    let config = test_config();
    let token = issue_session_token(&config, &test_user()).unwrap();

    // model lookup succeeds, then an active collect row already exists
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![test_model(7)]])
        .append_query_results([vec![collect_row(1, 7, false)]])
        .into_connection();

    let app = actix_web::test::init_service(
        App::new()
            .app_data(web::Data::new(config))
            .app_data(web::Data::new(db))
            .service(web::scope("/api/v1").configure(api::configure_collect_routes)),
    )
    .await;

    let req = actix_web::test::TestRequest::post()
        .uri("/api/v1/models/7/collect")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let resp = actix_web::test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 409);
}

#[actix_rt::test]
async fn recollecting_after_uncollect_succeeds() {
    let config = test_config();
    let token = issue_session_token(&config, &test_user()).unwrap();

    // collect, uncollect, collect again over one scripted connection
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        // first collect: model found, no active row, insert returns the new row
        .append_query_results([vec![test_model(7)]])
        .append_query_results([Vec::<collect::Model>::new()])
        .append_query_results([vec![collect_row(1, 7, false)]])
        // uncollect: active row found, soft-delete update returns it
        .append_query_results([vec![collect_row(1, 7, false)]])
        .append_query_results([vec![collect_row(1, 7, true)]])
        // second collect: the old row is soft-deleted, so none is active
        .append_query_results([vec![test_model(7)]])
        .append_query_results([Vec::<collect::Model>::new()])
        .append_query_results([vec![collect_row(2, 7, false)]])
        .into_connection();

    let app = actix_web::test::init_service(
        App::new()
            .app_data(web::Data::new(config))
            .app_data(web::Data::new(db))
            .service(web::scope("/api/v1").configure(api::configure_collect_routes)),
    )
    .await;

    let bearer = format!("Bearer {}", token);
    let req = actix_web::test::TestRequest::post()
        .uri("/api/v1/models/7/collect")
        .insert_header(("Authorization", bearer.clone()))
        .to_request();
    let resp = actix_web::test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 200);

    let req = actix_web::test::TestRequest::delete()
        .uri("/api/v1/models/7/collect")
        .insert_header(("Authorization", bearer.clone()))
        .to_request();
    let resp = actix_web::test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 200);

    let req = actix_web::test::TestRequest::post()
        .uri("/api/v1/models/7/collect")
        .insert_header(("Authorization", bearer))
        .to_request();
    let resp = actix_web::test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 200);
}

#[actix_rt::test]
async fn collect_check_reports_an_active_row() {
    let config = test_config();
    let token = issue_session_token(&config, &test_user()).unwrap();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![collect_row(1, 7, false)]])
        .append_query_results([Vec::<collect::Model>::new()])
        .into_connection();

    let app = actix_web::test::init_service(
        App::new()
            .app_data(web::Data::new(config))
            .app_data(web::Data::new(db))
            .service(web::scope("/api/v1").configure(api::configure_collect_routes)),
    )
    .await;

    let bearer = format!("Bearer {}", token);
    let req = actix_web::test::TestRequest::get()
        .uri("/api/v1/models/7/collect")
        .insert_header(("Authorization", bearer.clone()))
        .to_request();
    let resp = actix_web::test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 200);
    let body: serde_json::Value = actix_web::test::read_body_json(resp).await;
    assert_eq!(body["collected"], true);

    let req = actix_web::test::TestRequest::get()
        .uri("/api/v1/models/8/collect")
        .insert_header(("Authorization", bearer))
        .to_request();
    let resp = actix_web::test::call_service(&app, req).await;
    let body: serde_json::Value = actix_web::test::read_body_json(resp).await;
    assert_eq!(body["collected"], false);
}

#[actix_rt::test]
async fn garbage_token_is_rejected() {
    let config = test_config();
    let app = actix_web::test::init_service(
        App::new()
            .app_data(web::Data::new(config))
            .app_data(web::Data::new(CaptchaService::new(300)))
            .service(web::scope("/api/v1").configure(api::configure_auth_routes)),
    )
    .await;

    let req = actix_web::test::TestRequest::post()
        .uri("/api/v1/auth/logout")
        .insert_header(("Authorization", "Bearer not-a-jwt"))
        .to_request();
    let resp = actix_web::test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 401);
}
