//! End-to-end tests over the HTTP surface, backed by in-memory repositories.

use std::sync::Arc;

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::{StatusCode, header};
use actix_web::{App, Error, test, web};

use quill_core::ports::{PasswordService, TokenService};
use quill_infra::{Argon2PasswordService, JwtConfig, JwtTokenService};
use quill_shared::dto::{AuthResponse, MeResponse, PostForm, PostResponse, RegisterRequest};

use crate::handlers;
use crate::state::AppState;

fn test_app() -> App<
    impl ServiceFactory<
        ServiceRequest,
        Response = ServiceResponse<impl MessageBody>,
        Config = (),
        InitError = (),
        Error = Error,
    >,
> {
    let state = AppState::in_memory();
    let token_service: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(JwtConfig {
        secret: "test-secret-key".to_string(),
        expiration_hours: 1,
        issuer: "quill-test".to_string(),
    }));
    let password_service: Arc<dyn PasswordService> = Arc::new(Argon2PasswordService::new());

    App::new()
        .app_data(web::Data::new(state))
        .app_data(web::Data::new(token_service))
        .app_data(web::Data::new(password_service))
        .configure(handlers::configure_routes)
}

fn register_request(username: &str, password: &str) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(RegisterRequest {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password: password.to_string(),
        })
}

fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {token}"))
}

#[actix_web::test]
async fn health_check_reports_ok() {
    let app = test::init_service(test_app()).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/health").to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn post_lifecycle_via_redirects() {
    let app = test::init_service(test_app()).await;

    let resp = test::call_service(&app, register_request("testuser", "12345").to_request()).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let auth: AuthResponse = test::read_body_json(resp).await;
    let token = auth.access_token;

    // Create redirects to the new post's detail view.
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/posts")
            .insert_header(bearer(&token))
            .set_json(PostForm {
                title: "New title".to_string(),
                content: "New Content".to_string(),
            })
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    let detail_url = resp
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();

    // The redirect target resolves back to the created post.
    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri(&detail_url).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let post: PostResponse = test::read_body_json(resp).await;
    assert_eq!(post.title, "New title");
    assert_eq!(post.content, "New Content");
    assert_eq!(post.url, detail_url);

    // Update redirects to detail and the store reflects the change.
    let resp = test::call_service(
        &app,
        test::TestRequest::put()
            .uri(&detail_url)
            .insert_header(bearer(&token))
            .set_json(PostForm {
                title: "New title - updated".to_string(),
                content: "New Content - updated".to_string(),
            })
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri(&detail_url).to_request(),
    )
    .await;
    let post: PostResponse = test::read_body_json(resp).await;
    assert_eq!(post.title, "New title - updated");

    // Delete redirects to the list view and the post is gone.
    let resp = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&detail_url)
            .insert_header(bearer(&token))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        resp.headers().get(header::LOCATION).unwrap(),
        "/api/posts"
    );

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri(&detail_url).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn list_and_detail_are_public() {
    let app = test::init_service(test_app()).await;

    let resp = test::call_service(&app, register_request("testuser", "12345").to_request()).await;
    let auth: AuthResponse = test::read_body_json(resp).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/posts")
            .insert_header(bearer(&auth.access_token))
            .set_json(PostForm {
                title: "Test Post".to_string(),
                content: "This is a test post".to_string(),
            })
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    // No Authorization header on either read.
    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/posts").to_request())
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let posts: Vec<PostResponse> = test::read_body_json(resp).await;
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].content, "This is a test post");

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri(&posts[0].url).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let post: PostResponse = test::read_body_json(resp).await;
    assert_eq!(post.content, "This is a test post");
}

#[actix_web::test]
async fn anonymous_mutation_is_unauthorized() {
    let app = test::init_service(test_app()).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/posts")
            .set_json(PostForm {
                title: "New title".to_string(),
                content: "New Content".to_string(),
            })
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn non_author_mutation_is_forbidden() {
    let app = test::init_service(test_app()).await;

    let resp = test::call_service(&app, register_request("author", "12345").to_request()).await;
    let author: AuthResponse = test::read_body_json(resp).await;
    let resp = test::call_service(&app, register_request("intruder", "12345").to_request()).await;
    let intruder: AuthResponse = test::read_body_json(resp).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/posts")
            .insert_header(bearer(&author.access_token))
            .set_json(PostForm {
                title: "Test Post".to_string(),
                content: "This is a test post".to_string(),
            })
            .to_request(),
    )
    .await;
    let detail_url = resp
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();

    let resp = test::call_service(
        &app,
        test::TestRequest::put()
            .uri(&detail_url)
            .insert_header(bearer(&intruder.access_token))
            .set_json(PostForm {
                title: "hijacked".to_string(),
                content: "hijacked".to_string(),
            })
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&detail_url)
            .insert_header(bearer(&intruder.access_token))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // The post is unchanged.
    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri(&detail_url).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let post: PostResponse = test::read_body_json(resp).await;
    assert_eq!(post.title, "Test Post");
}

#[actix_web::test]
async fn oversized_title_is_a_validation_error() {
    let app = test::init_service(test_app()).await;

    let resp = test::call_service(&app, register_request("testuser", "12345").to_request()).await;
    let auth: AuthResponse = test::read_body_json(resp).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/posts")
            .insert_header(bearer(&auth.access_token))
            .set_json(PostForm {
                title: "x".repeat(101),
                content: "body".to_string(),
            })
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Nothing was stored.
    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/posts").to_request())
        .await;
    let posts: Vec<PostResponse> = test::read_body_json(resp).await;
    assert!(posts.is_empty());
}

#[actix_web::test]
async fn login_returns_token_for_valid_credentials() {
    let app = test::init_service(test_app()).await;

    test::call_service(&app, register_request("testuser", "12345").to_request()).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(serde_json::json!({"username": "testuser", "password": "12345"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let auth: AuthResponse = test::read_body_json(resp).await;
    assert!(!auth.access_token.is_empty());

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(serde_json::json!({"username": "testuser", "password": "wrong"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn registration_provisions_a_profile() {
    let app = test::init_service(test_app()).await;

    let resp = test::call_service(&app, register_request("testuser", "12345").to_request()).await;
    let auth: AuthResponse = test::read_body_json(resp).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/auth/me")
            .insert_header(bearer(&auth.access_token))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let me: MeResponse = test::read_body_json(resp).await;
    assert_eq!(me.profile.user_id, me.user.id);
    assert_eq!(me.user.username, "testuser");
}

#[actix_web::test]
async fn deleting_account_removes_its_posts() {
    let app = test::init_service(test_app()).await;

    let resp = test::call_service(&app, register_request("testuser", "12345").to_request()).await;
    let auth: AuthResponse = test::read_body_json(resp).await;

    for title in ["one", "two"] {
        test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/posts")
                .insert_header(bearer(&auth.access_token))
                .set_json(PostForm {
                    title: title.to_string(),
                    content: "body".to_string(),
                })
                .to_request(),
        )
        .await;
    }

    let resp = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri("/api/auth/me")
            .insert_header(bearer(&auth.access_token))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/posts").to_request())
        .await;
    let posts: Vec<PostResponse> = test::read_body_json(resp).await;
    assert!(posts.is_empty());
}
