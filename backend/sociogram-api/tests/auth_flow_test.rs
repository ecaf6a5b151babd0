//! Account flows: signup, login, sessions, profile and search.

mod common;

use actix_web::http::{header, StatusCode};
use actix_web::test::{self, TestRequest};
use chrono::{Duration, Utc};
use common::{send, signup, TestContext, PASSWORD};
use serde_json::json;
use uuid::Uuid;

#[actix_web::test]
async fn test_signup_returns_account_and_token() {
    let ctx = TestContext::new();
    let app = test::init_service(sociogram_api::app(ctx.state.clone(), ctx.jwt.clone())).await;

    let (status, body) = send(
        &app,
        TestRequest::post().uri("/api/auth/signup").set_json(json!({
            "username": "Jane_Dev",
            "email": "Jane@Example.com",
            "password": PASSWORD,
            "fullName": "Jane Doe",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "User created successfully");
    assert!(body["timestamp"].is_string());

    let user = &body["data"]["user"];
    assert_eq!(user["username"], "jane_dev");
    assert_eq!(user["email"], "jane@example.com");
    assert_eq!(user["fullName"], "Jane Doe");

    let raw = body.to_string();
    assert!(!raw.contains(PASSWORD));
    assert!(!raw.contains("argon2"));
    assert!(!raw.to_lowercase().contains("password"));

    let token = body["data"]["token"].as_str().unwrap();
    let user_id = ctx.jwt.user_id(token).unwrap();
    assert_eq!(user["_id"], user_id.to_string());
}

#[actix_web::test]
async fn test_duplicate_signup_conflicts_and_keeps_original() {
    let ctx = TestContext::new();
    let app = test::init_service(sociogram_api::app(ctx.state.clone(), ctx.jwt.clone())).await;
    let original = signup(&app, "alice").await;

    for (username, email) in [("alice2", "alice@example.com"), ("ALICE", "other@example.com")] {
        let (status, body) = send(
            &app,
            TestRequest::post().uri("/api/auth/signup").set_json(json!({
                "username": username,
                "email": email,
                "password": "DifferentPass456",
                "fullName": "Impostor",
            })),
        )
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "User with this email or username already exists");
    }

    // Original credentials still work and no second account exists.
    let (status, body) = send(
        &app,
        TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": original.email, "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["fullName"], "alice Tester");

    let (status, body) = send(&app, TestRequest::get().uri("/api/auth/search?query=alice")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 1);
}

#[actix_web::test]
async fn test_login_failures_are_indistinguishable() {
    let ctx = TestContext::new();
    let app = test::init_service(sociogram_api::app(ctx.state.clone(), ctx.jwt.clone())).await;
    let user = signup(&app, "bob").await;

    let (wrong_status, wrong_body) = send(
        &app,
        TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": user.email, "password": "WrongPass123" })),
    )
    .await;
    let (unknown_status, unknown_body) = send(
        &app,
        TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": "nobody@example.com", "password": PASSWORD })),
    )
    .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body["message"], "Invalid email or password");
    assert_eq!(wrong_body["message"], unknown_body["message"]);
    assert_eq!(wrong_body["error"], unknown_body["error"]);
}

#[actix_web::test]
async fn test_login_is_case_insensitive_on_email() {
    let ctx = TestContext::new();
    let app = test::init_service(sociogram_api::app(ctx.state.clone(), ctx.jwt.clone())).await;
    signup(&app, "carol").await;

    let (status, body) = send(
        &app,
        TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": "CAROL@example.com", "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Login successful");
    assert!(body["data"]["token"].is_string());
}

#[actix_web::test]
async fn test_signup_validation_errors() {
    let ctx = TestContext::new();
    let app = test::init_service(sociogram_api::app(ctx.state.clone(), ctx.jwt.clone())).await;

    let cases = [
        json!({ "username": "ab", "email": "ab@example.com", "password": PASSWORD, "fullName": "A B" }),
        json!({ "username": "has space", "email": "s@example.com", "password": PASSWORD, "fullName": "S" }),
        json!({ "username": "weak", "email": "weak@example.com", "password": "alllowercase1", "fullName": "W" }),
        json!({ "username": "nomail", "email": "not-an-email", "password": PASSWORD, "fullName": "N" }),
        json!({ "username": "noname", "email": "n@example.com", "password": PASSWORD, "fullName": "" }),
    ];

    for case in cases {
        let (status, body) = send(
            &app,
            TestRequest::post().uri("/api/auth/signup").set_json(&case),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "accepted {}", case);
        assert_eq!(body["success"], false);
    }
}

#[actix_web::test]
async fn test_malformed_json_is_bad_request() {
    let ctx = TestContext::new();
    let app = test::init_service(sociogram_api::app(ctx.state.clone(), ctx.jwt.clone())).await;

    let (status, body) = send(
        &app,
        TestRequest::post()
            .uri("/api/auth/login")
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload("{not json"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[actix_web::test]
async fn test_profile_requires_valid_session() {
    let ctx = TestContext::new();
    let app = test::init_service(sociogram_api::app(ctx.state.clone(), ctx.jwt.clone())).await;
    let user = signup(&app, "dave").await;

    let (status, _) = send(&app, TestRequest::get().uri("/api/auth/profile")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        TestRequest::get()
            .uri("/api/auth/profile")
            .insert_header((header::AUTHORIZATION, format!("Token {}", user.token))),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        TestRequest::get()
            .uri("/api/auth/profile")
            .insert_header((header::AUTHORIZATION, "Bearer not.a.jwt")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let user_id: Uuid = user.id.parse().unwrap();
    let expired = ctx
        .jwt
        .issue_at(user_id, &user.email, Utc::now() - Duration::hours(3))
        .unwrap();
    let (status, body) = send(
        &app,
        TestRequest::get()
            .uri("/api/auth/profile")
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", expired))),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, body) = send(
        &app,
        TestRequest::get().uri("/api/auth/profile").insert_header(user.bearer()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Profile retrieved successfully");
    assert_eq!(body["data"]["email"], "dave@example.com");
}

#[actix_web::test]
async fn test_update_profile_and_device_token() {
    let ctx = TestContext::new();
    let app = test::init_service(sociogram_api::app(ctx.state.clone(), ctx.jwt.clone())).await;
    let user = signup(&app, "erin").await;

    let (status, body) = send(
        &app,
        TestRequest::put()
            .uri("/api/auth/profile")
            .insert_header(user.bearer())
            .set_json(json!({
                "fullName": "Erin Example",
                "bio": "Rustacean",
                "profileImage": "https://cdn.example.com/erin.png",
            })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Profile updated successfully");
    assert_eq!(body["data"]["fullName"], "Erin Example");
    assert_eq!(body["data"]["bio"], "Rustacean");

    let (status, _) = send(
        &app,
        TestRequest::put()
            .uri("/api/auth/profile")
            .insert_header(user.bearer())
            .set_json(json!({ "profileImage": "not a url" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        TestRequest::put()
            .uri("/api/auth/device-token")
            .insert_header(user.bearer())
            .set_json(json!({ "deviceToken": "fcm-device-token-123456" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Device token updated successfully");
    assert_eq!(body["data"]["deviceToken"], "fcm-device-token-123456");

    let (status, _) = send(
        &app,
        TestRequest::put()
            .uri("/api/auth/device-token")
            .insert_header(user.bearer())
            .set_json(json!({ "deviceToken": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_blank_full_name_is_rejected() {
    let ctx = TestContext::new();
    let app = test::init_service(sociogram_api::app(ctx.state.clone(), ctx.jwt.clone())).await;

    let (status, body) = send(
        &app,
        TestRequest::post().uri("/api/auth/signup").set_json(json!({
            "username": "blanky",
            "email": "blanky@example.com",
            "password": PASSWORD,
            "fullName": "   ",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let user = signup(&app, "frank").await;
    let (status, _) = send(
        &app,
        TestRequest::put()
            .uri("/api/auth/profile")
            .insert_header(user.bearer())
            .set_json(json!({ "fullName": "    " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        TestRequest::get().uri("/api/auth/profile").insert_header(user.bearer()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["fullName"], "frank Tester");
}

#[actix_web::test]
async fn test_empty_profile_update_is_rejected() {
    let ctx = TestContext::new();
    let app = test::init_service(sociogram_api::app(ctx.state.clone(), ctx.jwt.clone())).await;
    let user = signup(&app, "gina").await;

    let (status, body) = send(
        &app,
        TestRequest::put()
            .uri("/api/auth/profile")
            .insert_header(user.bearer())
            .set_json(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No profile fields to update");
}

#[actix_web::test]
async fn test_public_profile_hides_private_fields() {
    let ctx = TestContext::new();
    let app = test::init_service(sociogram_api::app(ctx.state.clone(), ctx.jwt.clone())).await;
    let user = signup(&app, "frank").await;
    common::register_device(&app, &user, "fcm-device-token-frank").await;

    let (status, body) = send(&app, TestRequest::get().uri("/api/auth/users/Frank")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User profile retrieved successfully");
    assert_eq!(body["data"]["username"], "frank");
    assert!(body["data"].get("email").is_none());
    assert!(body["data"].get("deviceToken").is_none());

    let (status, body) = send(&app, TestRequest::get().uri("/api/auth/users/ghost")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");
}

#[actix_web::test]
async fn test_search_is_paginated() {
    let ctx = TestContext::new();
    let app = test::init_service(sociogram_api::app(ctx.state.clone(), ctx.jwt.clone())).await;
    for name in ["rust_a", "rust_b", "rust_c", "gopher"] {
        signup(&app, name).await;
    }

    let (status, body) = send(
        &app,
        TestRequest::get().uri("/api/auth/search?query=RUST&page=2&limit=2"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Users found");
    assert_eq!(body["pagination"]["total"], 3);
    assert_eq!(body["pagination"]["totalPages"], 2);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["username"], "rust_c");

    let (status, _) = send(&app, TestRequest::get().uri("/api/auth/search?query=%20")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_unknown_route_uses_envelope() {
    let ctx = TestContext::new();
    let app = test::init_service(sociogram_api::app(ctx.state.clone(), ctx.jwt.clone())).await;

    let (status, body) = send(&app, TestRequest::get().uri("/api/nothing-here")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Route not found");
}

#[actix_web::test]
async fn test_health() {
    let ctx = TestContext::new();
    let app = test::init_service(sociogram_api::app(ctx.state.clone(), ctx.jwt.clone())).await;

    let (status, body) = send(&app, TestRequest::get().uri("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "OK");
}
