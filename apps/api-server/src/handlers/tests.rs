//! Route-level tests against in-memory repositories, a scripted completion
//! client and a temporary upload directory.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use async_trait::async_trait;
use chrono::NaiveDate;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use serde_json::{Value, json};
use tempfile::TempDir;
use uuid::Uuid;

use inkwell_core::domain::{DEFAULT_PROFILE_PICTURE, ImageDescriptor, NewUser, Post, Role, User};
use inkwell_core::ports::{AiError, CompletionClient, CompletionRequest};
use inkwell_core::services::AiAssistant;
use inkwell_infra::{
    Argon2PasswordService, InMemoryPostRepository, InMemoryUserRepository, JwtConfig,
    JwtTokenService, LocalImageStore, MediaConfig,
};

use super::configure_routes;
use crate::middleware::error::{json_error_handler, path_error_handler, query_error_handler};
use crate::state::AppState;

const BOUNDARY: &str = "inkwell-test-boundary";

/// Answers SEO and outline prompts with JSON, everything else with text.
struct CannedClient;

#[async_trait]
impl CompletionClient for CannedClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, AiError> {
        let reply = if request.prompt.contains("SEO metadata") {
            r#"{"seoTitle":"Rust for bloggers","seoDescription":"Why Rust","suggestedTags":["rust"]}"#
        } else if request.prompt.contains("blog outline") {
            r#"{"title":"Outline","sections":[{"heading":"Intro"}]}"#
        } else {
            "A short summary."
        };
        Ok(reply.to_string())
    }
}

struct TestEnv {
    state: AppState,
    root: TempDir,
}

impl TestEnv {
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        let media = MediaConfig {
            upload_dir: root.path().join("uploads"),
            staging_dir: root.path().join("staging"),
            public_base_url: "http://localhost:8080".to_string(),
            ..MediaConfig::default()
        };
        let state = AppState {
            users: Arc::new(InMemoryUserRepository::new()),
            posts: Arc::new(InMemoryPostRepository::new()),
            images: Arc::new(LocalImageStore::new(media.clone())),
            media,
            assistant: AiAssistant::new(Arc::new(CannedClient)),
            tokens: Arc::new(JwtTokenService::new(JwtConfig::default())),
            passwords: Arc::new(Argon2PasswordService::new()),
            expose_reset_tokens: true,
            #[cfg(feature = "postgres")]
            db: None,
        };
        Self { state, root }
    }

    fn upload_dir(&self) -> PathBuf {
        self.root.path().join("uploads")
    }

    fn staging_dir(&self) -> PathBuf {
        self.root.path().join("staging")
    }

    /// Insert a user directly and return it with a valid token. The stored
    /// hash is not a real one, so these users cannot log in.
    async fn seed_user(&self, email: &str, role: Role) -> (User, String) {
        let user = User::new(
            NewUser {
                firstname: "Test".to_string(),
                lastname: "User".to_string(),
                username: email.split('@').next().unwrap_or(email).to_string(),
                email: email.to_string(),
                date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
                role,
            },
            "not-a-hash".to_string(),
        );
        let user = self.state.users.create(user).await.unwrap();
        let token = self
            .state
            .tokens
            .generate_token(user.id, &user.email, user.role)
            .unwrap();
        (user, token)
    }

    async fn seed_post(&self, author: &User, title: &str, tags: &[&str]) -> Post {
        let filename = format!("{}.jpg", Uuid::new_v4());
        let cover = ImageDescriptor {
            url: format!("http://localhost:8080/uploads/post-images/{filename}"),
            path: self
                .upload_dir()
                .join("post-images")
                .join(&filename)
                .to_string_lossy()
                .into_owned(),
            filename,
            original_name: "cover.png".to_string(),
            width: 1200,
            height: 800,
            format: "jpeg".to_string(),
            size: 1024,
            mime_type: "image/jpeg".to_string(),
        };
        let post = Post::new(
            author.id,
            title.to_string(),
            "<p>Body text</p>".to_string(),
            cover,
            tags.iter().map(|t| t.to_string()).collect(),
        );
        self.state.posts.create(post).await.unwrap()
    }
}

macro_rules! app {
    ($env:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($env.state.clone()))
                .app_data(web::JsonConfig::default().error_handler(json_error_handler))
                .app_data(web::PathConfig::default().error_handler(path_error_handler))
                .app_data(web::QueryConfig::default().error_handler(query_error_handler))
                .configure(|cfg| configure_routes(cfg, None)),
        )
        .await
    };
}

enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        field: &'a str,
        filename: &'a str,
        mime: &'a str,
        data: Vec<u8>,
    },
}

fn multipart(parts: Vec<Part<'_>>) -> ((header::HeaderName, String), Vec<u8>) {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                        .as_bytes(),
                );
            }
            Part::File {
                field,
                filename,
                mime,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: {mime}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(&data);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let content_type = (
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={BOUNDARY}"),
    );
    (content_type, body)
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([200, 120, 40]));
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

fn cover(data: Vec<u8>) -> Part<'static> {
    Part::File {
        field: "coverImage",
        filename: "cover.png",
        mime: "image/png",
        data,
    }
}

fn registration<'a>(email: &'a str, password: &'a str) -> Vec<Part<'a>> {
    vec![
        Part::Text("firstname", "Ada"),
        Part::Text("lastname", "Lovelace"),
        Part::Text("username", "ada"),
        Part::Text("email", email),
        Part::Text("password", password),
        Part::Text("dateOfBirth", "1990-12-10"),
    ]
}

/// Count regular files below `dir`; a missing directory counts as empty.
fn files_in(dir: &Path) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    entries
        .flatten()
        .map(|entry| {
            let path = entry.path();
            if path.is_dir() { files_in(&path) } else { 1 }
        })
        .sum()
}

fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {token}"))
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[actix_web::test]
async fn test_register_login_and_me() {
    let env = TestEnv::new();
    let app = app!(env);

    let mut parts = registration("Ada@Example.com", "secret1");
    parts.push(Part::Text("role", "author"));
    let (content_type, body) = multipart(parts);
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .insert_header(content_type)
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "User created successfully");
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert_eq!(body["user"]["role"], "author");
    assert_eq!(body["user"]["profilePicture"], DEFAULT_PROFILE_PICTURE);
    assert!(body["user"].get("passwordHash").is_none());

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "ada@example.com", "password": "secret1" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["tokenType"], "Bearer");
    assert_eq!(body["expiresIn"], 36000);
    let token = body["token"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["username"], "ada");

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "ada@example.com", "password": "wrong-one" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Invalid email or password");
}

#[actix_web::test]
async fn test_duplicate_registration_discards_picture() {
    let env = TestEnv::new();
    let app = app!(env);
    env.seed_user("ada@example.com", Role::Reader).await;

    let mut parts = registration("ada@example.com", "secret1");
    parts.push(Part::File {
        field: "profilePicture",
        filename: "me.png",
        mime: "image/png",
        data: png(64, 64),
    });
    let (content_type, body) = multipart(parts);
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .insert_header(content_type)
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "User already registered");

    assert_eq!(files_in(&env.staging_dir()), 0);
    assert_eq!(files_in(&env.upload_dir()), 0);
}

#[actix_web::test]
async fn test_register_rejects_admin_role_and_short_password() {
    let env = TestEnv::new();
    let app = app!(env);

    let mut parts = registration("root@example.com", "secret1");
    parts.push(Part::Text("role", "admin"));
    let (content_type, body) = multipart(parts);
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .insert_header(content_type)
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let (content_type, body) = multipart(registration("short@example.com", "abc"));
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .insert_header(content_type)
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    assert!(
        env.state
            .users
            .find_by_email("root@example.com")
            .await
            .unwrap()
            .is_none()
    );
}

#[actix_web::test]
async fn test_register_with_profile_picture() {
    let env = TestEnv::new();
    let app = app!(env);

    let mut parts = registration("pic@example.com", "secret1");
    parts.push(Part::File {
        field: "profilePicture",
        filename: "me.png",
        mime: "image/png",
        data: png(300, 300),
    });
    let (content_type, body) = multipart(parts);
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .insert_header(content_type)
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;

    let picture = body["user"]["profilePicture"].as_str().unwrap();
    assert!(picture.starts_with("http://localhost:8080/uploads/profile-pictures/"));
    assert_eq!(body["user"]["profileImage"]["width"], 300);
    assert_eq!(body["user"]["profileImage"]["mimeType"], "image/jpeg");
    assert_eq!(files_in(&env.upload_dir().join("profile-pictures")), 1);
    assert_eq!(files_in(&env.staging_dir()), 0);
}

#[actix_web::test]
async fn test_forgot_and_reset_password() {
    let env = TestEnv::new();
    let app = app!(env);

    let (content_type, body) = multipart(registration("ada@example.com", "secret1"));
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .insert_header(content_type)
        .set_payload(body)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/api/auth/forgot-password")
        .set_json(json!({ "email": "nobody@example.com" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert!(body.get("resetToken").is_none());

    let req = test::TestRequest::post()
        .uri("/api/auth/forgot-password")
        .set_json(json!({ "email": "ada@example.com" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let reset_token = body["resetToken"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri("/api/auth/reset-password")
        .set_json(json!({ "token": reset_token, "newPassword": "brand-new" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    // Tokens are single use.
    let req = test::TestRequest::post()
        .uri("/api/auth/reset-password")
        .set_json(json!({ "token": reset_token, "newPassword": "another-one" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::BAD_REQUEST
    );

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "ada@example.com", "password": "secret1" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::BAD_REQUEST
    );

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "ada@example.com", "password": "brand-new" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_missing_or_invalid_token_is_unauthorized() {
    let env = TestEnv::new();
    let app = app!(env);

    let req = test::TestRequest::get().uri("/api/user/profile").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/user/profile")
        .insert_header(bearer("not.a.token"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].is_string());
}

// ---------------------------------------------------------------------------
// Posts
// ---------------------------------------------------------------------------

#[actix_web::test]
async fn test_create_post_resizes_cover() {
    let env = TestEnv::new();
    let app = app!(env);
    let (author, token) = env.seed_user("author@example.com", Role::Author).await;

    let (content_type, body) = multipart(vec![
        Part::Text("title", "Big picture"),
        Part::Text("content", "<p>Hello</p>"),
        Part::Text("tags", "rust, web, rust"),
        cover(png(2400, 1600)),
    ]);
    let req = test::TestRequest::post()
        .uri("/api/posts/create")
        .insert_header(bearer(&token))
        .insert_header(content_type)
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;

    assert_eq!(body["authorId"], author.id.to_string());
    assert_eq!(body["author"]["username"], "author");
    assert_eq!(body["tags"], json!(["rust", "web"]));
    assert_eq!(body["likeCount"], 0);
    assert_eq!(body["coverImage"]["width"], 1200);
    assert_eq!(body["coverImage"]["height"], 800);
    assert_eq!(body["coverImage"]["mimeType"], "image/jpeg");

    let stored = body["coverImage"]["path"].as_str().unwrap();
    assert_eq!(image::image_dimensions(stored).unwrap(), (1200, 800));
    assert_eq!(files_in(&env.staging_dir()), 0);
}

#[actix_web::test]
async fn test_create_post_rejects_non_image_upload() {
    let env = TestEnv::new();
    let app = app!(env);
    let (_, token) = env.seed_user("author@example.com", Role::Author).await;

    let (content_type, body) = multipart(vec![
        Part::Text("title", "Notes"),
        Part::Text("content", "<p>Hello</p>"),
        Part::File {
            field: "coverImage",
            filename: "notes.txt",
            mime: "text/plain",
            data: b"just text".to_vec(),
        },
    ]);
    let req = test::TestRequest::post()
        .uri("/api/posts/create")
        .insert_header(bearer(&token))
        .insert_header(content_type)
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    assert_eq!(files_in(&env.staging_dir()), 0);
    assert_eq!(files_in(&env.upload_dir()), 0);
    assert!(env.state.posts.list_recent().await.unwrap().is_empty());
}

#[actix_web::test]
async fn test_create_post_rejects_too_many_files() {
    let env = TestEnv::new();
    let app = app!(env);
    let (_, token) = env.seed_user("author@example.com", Role::Author).await;

    let mut parts = vec![
        Part::Text("title", "Gallery"),
        Part::Text("content", "<p>Lots of pictures</p>"),
    ];
    parts.extend((0..11).map(|_| cover(png(8, 8))));
    let (content_type, body) = multipart(parts);
    let req = test::TestRequest::post()
        .uri("/api/posts/create")
        .insert_header(bearer(&token))
        .insert_header(content_type)
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "At most 10 files may be uploaded per request");

    assert_eq!(files_in(&env.staging_dir()), 0);
    assert_eq!(files_in(&env.upload_dir()), 0);
    assert!(env.state.posts.list_recent().await.unwrap().is_empty());
}

#[actix_web::test]
async fn test_create_post_rejects_oversized_cover() {
    let mut env = TestEnv::new();
    env.state.media.max_file_bytes = 16;
    let app = app!(env);
    let (_, token) = env.seed_user("author@example.com", Role::Author).await;

    let (content_type, body) = multipart(vec![
        Part::Text("title", "Huge"),
        Part::Text("content", "<p>Big picture</p>"),
        cover(png(40, 40)),
    ]);
    let req = test::TestRequest::post()
        .uri("/api/posts/create")
        .insert_header(bearer(&token))
        .insert_header(content_type)
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    assert_eq!(files_in(&env.staging_dir()), 0);
    assert_eq!(files_in(&env.upload_dir()), 0);
    assert!(env.state.posts.list_recent().await.unwrap().is_empty());
}

#[actix_web::test]
async fn test_create_post_collects_repeated_tag_fields() {
    let env = TestEnv::new();
    let app = app!(env);
    let (_, token) = env.seed_user("author@example.com", Role::Author).await;

    let (content_type, body) = multipart(vec![
        Part::Text("title", "Tagged"),
        Part::Text("content", "<p>Tags as parts</p>"),
        Part::Text("tags", "rust"),
        Part::Text("tags", "web, actix"),
        Part::Text("tags", "rust"),
        cover(png(40, 40)),
    ]);
    let req = test::TestRequest::post()
        .uri("/api/posts/create")
        .insert_header(bearer(&token))
        .insert_header(content_type)
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["tags"], json!(["rust", "web", "actix"]));
}

#[actix_web::test]
async fn test_form_field_count_is_capped() {
    let env = TestEnv::new();
    let app = app!(env);
    let (_, token) = env.seed_user("author@example.com", Role::Author).await;

    let (content_type, body) = multipart((0..101).map(|_| Part::Text("filler", "x")).collect());
    let req = test::TestRequest::post()
        .uri("/api/posts/create")
        .insert_header(bearer(&token))
        .insert_header(content_type)
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Too many form fields");
}

#[actix_web::test]
async fn test_create_post_requires_cover_and_fields() {
    let env = TestEnv::new();
    let app = app!(env);
    let (_, token) = env.seed_user("author@example.com", Role::Author).await;

    let (content_type, body) = multipart(vec![
        Part::Text("title", "No cover"),
        Part::Text("content", "<p>Hello</p>"),
    ]);
    let req = test::TestRequest::post()
        .uri("/api/posts/create")
        .insert_header(bearer(&token))
        .insert_header(content_type)
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Cover image is required");

    let (content_type, body) = multipart(vec![
        Part::Text("title", "No content"),
        cover(png(10, 10)),
    ]);
    let req = test::TestRequest::post()
        .uri("/api/posts/create")
        .insert_header(bearer(&token))
        .insert_header(content_type)
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Title and content are required");
    assert_eq!(files_in(&env.staging_dir()), 0);
    assert_eq!(files_in(&env.upload_dir()), 0);
}

#[actix_web::test]
async fn test_reader_cannot_create_post() {
    let env = TestEnv::new();
    let app = app!(env);
    let (_, token) = env.seed_user("reader@example.com", Role::Reader).await;

    let (content_type, body) = multipart(vec![
        Part::Text("title", "Mine"),
        Part::Text("content", "<p>Hello</p>"),
        cover(png(10, 10)),
    ]);
    let req = test::TestRequest::post()
        .uri("/api/posts/create")
        .insert_header(bearer(&token))
        .insert_header(content_type)
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Only authors or admins can create posts");
}

#[actix_web::test]
async fn test_only_owner_or_admin_can_update() {
    let env = TestEnv::new();
    let app = app!(env);
    let (owner, _) = env.seed_user("owner@example.com", Role::Author).await;
    let (_, other_token) = env.seed_user("other@example.com", Role::Author).await;
    let (_, admin_token) = env.seed_user("admin@example.com", Role::Admin).await;
    let post = env.seed_post(&owner, "Seeded", &["rust"]).await;

    let (content_type, body) = multipart(vec![Part::Text("title", "Hijacked")]);
    let req = test::TestRequest::put()
        .uri(&format!("/api/posts/{}", post.id))
        .insert_header(bearer(&other_token))
        .insert_header(content_type)
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let stored = env.state.posts.find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(stored.title, "Seeded");

    let (content_type, body) = multipart(vec![Part::Text("title", "Edited by admin")]);
    let req = test::TestRequest::put()
        .uri(&format!("/api/posts/{}", post.id))
        .insert_header(bearer(&admin_token))
        .insert_header(content_type)
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["title"], "Edited by admin");
    assert_eq!(body["content"], "<p>Body text</p>");
    assert_eq!(body["tags"], json!(["rust"]));
}

#[actix_web::test]
async fn test_update_ignores_empty_cover_input() {
    let env = TestEnv::new();
    let app = app!(env);
    let (owner, token) = env.seed_user("owner@example.com", Role::Author).await;
    let post = env.seed_post(&owner, "Seeded", &["rust"]).await;

    let (content_type, body) = multipart(vec![
        Part::Text("title", "Retitled"),
        Part::File {
            field: "coverImage",
            filename: "",
            mime: "application/octet-stream",
            data: Vec::new(),
        },
    ]);
    let req = test::TestRequest::put()
        .uri(&format!("/api/posts/{}", post.id))
        .insert_header(bearer(&token))
        .insert_header(content_type)
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["title"], "Retitled");
    assert_eq!(body["coverImage"]["filename"], post.cover_image.filename.as_str());
    assert_eq!(files_in(&env.staging_dir()), 0);
}

#[actix_web::test]
async fn test_like_toggle_round_trip() {
    let env = TestEnv::new();
    let app = app!(env);
    let (author, _) = env.seed_user("author@example.com", Role::Author).await;
    let (_, token) = env.seed_user("reader@example.com", Role::Reader).await;
    let post = env.seed_post(&author, "Likeable", &[]).await;

    let uri = format!("/api/posts/{}/like", post.id);
    let req = test::TestRequest::post()
        .uri(&uri)
        .insert_header(bearer(&token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["liked"], true);
    assert_eq!(body["likeCount"], 1);
    assert_eq!(body["message"], "Post liked successfully");

    let req = test::TestRequest::post()
        .uri(&uri)
        .insert_header(bearer(&token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["liked"], false);
    assert_eq!(body["likeCount"], 0);
    assert_eq!(body["message"], "Post unliked successfully");

    let req = test::TestRequest::post()
        .uri(&format!("/api/posts/{}/like", Uuid::new_v4()))
        .insert_header(bearer(&token))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_web::test]
async fn test_get_post_counts_views_and_lists_likers() {
    let env = TestEnv::new();
    let app = app!(env);
    let (author, _) = env.seed_user("author@example.com", Role::Author).await;
    let (reader, _) = env.seed_user("reader@example.com", Role::Reader).await;
    let post = env.seed_post(&author, "Popular", &[]).await;
    env.state.posts.toggle_like(post.id, reader.id).await.unwrap();

    let uri = format!("/api/posts/{}", post.id);
    let req = test::TestRequest::get().uri(&uri).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["viewCount"], 1);

    let req = test::TestRequest::get().uri(&uri).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["viewCount"], 2);
    assert_eq!(body["likedBy"][0]["username"], "reader");
    assert_eq!(body["author"]["username"], "author");
}

#[actix_web::test]
async fn test_invalid_post_id_is_not_found() {
    let env = TestEnv::new();
    let app = app!(env);

    let req = test::TestRequest::get()
        .uri("/api/posts/not-a-uuid")
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_web::test]
async fn test_delete_post_removes_cover_file() {
    let env = TestEnv::new();
    let app = app!(env);
    let (_, token) = env.seed_user("author@example.com", Role::Author).await;

    let (content_type, body) = multipart(vec![
        Part::Text("title", "Short lived"),
        Part::Text("content", "<p>Bye</p>"),
        cover(png(40, 40)),
    ]);
    let req = test::TestRequest::post()
        .uri("/api/posts/create")
        .insert_header(bearer(&token))
        .insert_header(content_type)
        .set_payload(body)
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let id = body["id"].as_str().unwrap().to_string();
    let stored = PathBuf::from(body["coverImage"]["path"].as_str().unwrap());
    assert!(stored.exists());

    let uri = format!("/api/posts/{id}");
    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Post deleted successfully");
    assert!(!stored.exists());

    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header(bearer(&token))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );

    let req = test::TestRequest::get().uri(&uri).to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_web::test]
async fn test_non_owner_cannot_delete_post() {
    let env = TestEnv::new();
    let app = app!(env);
    let (_, owner_token) = env.seed_user("owner@example.com", Role::Author).await;
    let (_, other_token) = env.seed_user("other@example.com", Role::Author).await;

    let (content_type, body) = multipart(vec![
        Part::Text("title", "Keep me"),
        Part::Text("content", "<p>Mine</p>"),
        cover(png(40, 40)),
    ]);
    let req = test::TestRequest::post()
        .uri("/api/posts/create")
        .insert_header(bearer(&owner_token))
        .insert_header(content_type)
        .set_payload(body)
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let id: Uuid = body["id"].as_str().unwrap().parse().unwrap();
    let stored = PathBuf::from(body["coverImage"]["path"].as_str().unwrap());

    let req = test::TestRequest::delete()
        .uri(&format!("/api/posts/{id}"))
        .insert_header(bearer(&other_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    assert!(env.state.posts.find_by_id(id).await.unwrap().is_some());
    assert!(stored.exists());
}

#[actix_web::test]
async fn test_search_and_list() {
    let env = TestEnv::new();
    let app = app!(env);
    let (author, token) = env.seed_user("author@example.com", Role::Author).await;
    env.seed_post(&author, "Learning Rust", &["rust"]).await;
    env.seed_post(&author, "Baking bread", &["food", "weekend"]).await;

    let req = test::TestRequest::get()
        .uri("/api/posts/search?q=RUST")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["posts"].as_array().unwrap().len(), 1);
    assert_eq!(body["posts"][0]["title"], "Learning Rust");

    let req = test::TestRequest::get()
        .uri("/api/posts/search?tags=weekend,travel")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["posts"].as_array().unwrap().len(), 1);
    assert_eq!(body["posts"][0]["title"], "Baking bread");

    let req = test::TestRequest::get().uri("/api/posts/all").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["posts"].as_array().unwrap().len(), 2);

    let req = test::TestRequest::get()
        .uri("/api/user/posts")
        .insert_header(bearer(&token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["posts"].as_array().unwrap().len(), 2);
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

#[actix_web::test]
async fn test_update_profile_fields() {
    let env = TestEnv::new();
    let app = app!(env);
    let (_, token) = env.seed_user("grace@example.com", Role::Reader).await;

    let (content_type, body) = multipart(vec![
        Part::Text("firstname", "Grace"),
        Part::Text("dateOfBirth", "1906-12-09"),
    ]);
    let req = test::TestRequest::put()
        .uri("/api/user/profile")
        .insert_header(bearer(&token))
        .insert_header(content_type)
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["firstname"], "Grace");
    assert_eq!(body["lastname"], "User");
    assert_eq!(body["dateOfBirth"], "1906-12-09");
}

// ---------------------------------------------------------------------------
// AI assistant
// ---------------------------------------------------------------------------

#[actix_web::test]
async fn test_ai_settings_gate_assistant_routes() {
    let env = TestEnv::new();
    let app = app!(env);
    let (_, token) = env.seed_user("writer@example.com", Role::Author).await;

    let req = test::TestRequest::put()
        .uri("/api/ai/settings")
        .insert_header(bearer(&token))
        .set_json(json!({ "aiAssistantEnabled": false, "preferredTone": "loud" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["aiSettings"]["aiAssistantEnabled"], false);
    assert_eq!(body["data"]["aiSettings"]["preferredTone"], "neutral");

    let req = test::TestRequest::post()
        .uri("/api/ai/generate-outline")
        .insert_header(bearer(&token))
        .set_json(json!({ "topic": "Rust" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );

    // Summaries are not gated.
    let req = test::TestRequest::post()
        .uri("/api/ai/generate-summary")
        .insert_header(bearer(&token))
        .set_json(json!({ "content": "Long text" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["summary"], "A short summary.");

    let req = test::TestRequest::put()
        .uri("/api/ai/settings")
        .insert_header(bearer(&token))
        .set_json(json!({ "aiAssistantEnabled": true, "preferredTone": "formal" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/api/ai/generate-outline")
        .insert_header(bearer(&token))
        .set_json(json!({ "topic": "Rust" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["title"], "Outline");

    let req = test::TestRequest::get()
        .uri("/api/ai/settings")
        .insert_header(bearer(&token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["preferredTone"], "formal");
    assert_eq!(body["data"]["contentSuggestions"], true);
}

#[actix_web::test]
async fn test_ai_input_validation() {
    let env = TestEnv::new();
    let app = app!(env);
    let (_, token) = env.seed_user("writer@example.com", Role::Author).await;

    let req = test::TestRequest::post()
        .uri("/api/ai/generate-outline")
        .insert_header(bearer(&token))
        .set_json(json!({ "topic": "  " }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Topic is required");

    let req = test::TestRequest::post()
        .uri("/api/ai/generate-seo")
        .insert_header(bearer(&token))
        .set_json(json!({ "title": "Only a title" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Title and content are required");

    let req = test::TestRequest::post()
        .uri("/api/ai/generate-outline")
        .set_json(json!({ "topic": "Rust" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[actix_web::test]
async fn test_generate_metadata_is_saved_for_owner() {
    let env = TestEnv::new();
    let app = app!(env);
    let (owner, owner_token) = env.seed_user("owner@example.com", Role::Author).await;
    let (_, other_token) = env.seed_user("other@example.com", Role::Author).await;
    let post = env.seed_post(&owner, "Rust tips", &["rust"]).await;

    let uri = format!("/api/ai/posts/{}/generate-metadata", post.id);
    let req = test::TestRequest::post()
        .uri(&uri)
        .insert_header(bearer(&other_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Not authorized");

    let req = test::TestRequest::post()
        .uri(&uri)
        .insert_header(bearer(&owner_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["aiMeta"]["seoTitle"], "Rust for bloggers");
    assert_eq!(body["data"]["aiMeta"]["summary"], "A short summary.");
    assert_eq!(body["data"]["author"]["username"], "owner");

    let stored = env.state.posts.find_by_id(post.id).await.unwrap().unwrap();
    let meta = stored.ai_meta.unwrap();
    assert_eq!(meta.suggested_tags, vec!["rust"]);
    assert!(meta.generated_at.is_some());
}

#[actix_web::test]
async fn test_summarize_post_uses_stored_content() {
    let env = TestEnv::new();
    let app = app!(env);
    let (author, _) = env.seed_user("author@example.com", Role::Author).await;
    let (_, reader_token) = env.seed_user("reader@example.com", Role::Reader).await;
    let post = env.seed_post(&author, "Summarize me", &[]).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/ai/posts/{}/summary", post.id))
        .insert_header(bearer(&reader_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["summary"], "A short summary.");

    let stored = env.state.posts.find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(
        stored.ai_meta.unwrap().summary.as_deref(),
        Some("A short summary.")
    );

    let req = test::TestRequest::post()
        .uri(&format!("/api/ai/posts/{}/summary", Uuid::new_v4()))
        .insert_header(bearer(&reader_token))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_web::test]
async fn test_suggest_content_respects_setting() {
    let env = TestEnv::new();
    let app = app!(env);
    let (mut user, token) = env.seed_user("writer@example.com", Role::Author).await;

    user.ai_settings.content_suggestions = false;
    env.state.users.update(user).await.unwrap();

    let req = test::TestRequest::get()
        .uri("/api/ai/suggest-content")
        .insert_header(bearer(&token))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );
}

#[actix_web::test]
async fn test_health_reports_in_memory_store() {
    let env = TestEnv::new();
    let app = app!(env);

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "in-memory");
}
