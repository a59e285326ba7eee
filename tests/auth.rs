mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{error, event_body, TestApp};

#[tokio::test]
async fn registration_sends_a_verification_link() {
    let app = TestApp::new();

    let (status, body) = app.register("Alice@GaTech.edu", "Alice").await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["email"], "alice@gatech.edu");
    assert_eq!(body["user"]["emailVerified"], false);
    assert!(body["user"].get("passwordHash").is_none());
    assert!(body["token"].is_string());

    let id = body["user"]["id"].as_str().unwrap();
    let emails = app.mailer.sent_to("alice@gatech.edu");
    assert_eq!(emails.len(), 1);
    assert_eq!(
        emails[0].subject,
        "Welcome to Campus Pickup at Georgia Institute of Technology!"
    );
    assert!(emails[0]
        .html
        .contains(&format!("http://localhost:3000/verifyEmail/user/{}?token=", id)));
    assert!(body["user"].get("verificationToken").is_none());

    let (_, schools) = app.get("/schools").await;
    let gatech = schools
        .as_array()
        .unwrap()
        .iter()
        .find(|school| school["emailDomain"] == "gatech.edu")
        .unwrap();
    assert_eq!(gatech["numUsers"], 1);
}

#[tokio::test]
async fn registration_is_validated() {
    let app = TestApp::new();
    app.register("alice@gatech.edu", "Alice").await;

    let cases = vec![
        (json!({ "email": "bob@gatech.edu" }), "Email and password are required."),
        (
            json!({ "email": "bob@gatech.edu", "password": "short", "firstName": "Bob", "lastName": "B" }),
            "Password must be at least 8 characters long.",
        ),
        (
            json!({ "email": "bob@gatech.edu", "password": "password123" }),
            "First name and last name are required.",
        ),
        (
            json!({ "email": "bob", "password": "password123", "firstName": "Bob", "lastName": "B" }),
            "Invalid email address.",
        ),
        (
            json!({ "email": "ALICE@gatech.edu", "password": "password123", "firstName": "A", "lastName": "B" }),
            "Account with email address already exists.",
        ),
        (
            json!({ "email": "bob@gmail.com", "password": "password123", "firstName": "Bob", "lastName": "B" }),
            "Invalid university email.",
        ),
    ];

    for (form, message) in cases {
        let (status, body) = app
            .request(Method::POST, "/register", None, Some(form))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", message);
        assert_eq!(error(&body), message);
    }
}

#[tokio::test]
async fn login_checks_the_password() {
    let app = TestApp::new();
    app.register("alice@gatech.edu", "Alice").await;

    let (status, body) = app
        .request(
            Method::POST,
            "/login",
            None,
            Some(json!({ "email": "alice@gatech.edu", "password": "password123" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].is_string());
    assert_eq!(body["user"]["firstName"], "Alice");

    for form in [
        json!({ "email": "alice@gatech.edu", "password": "wrong password" }),
        json!({ "email": "nobody@gatech.edu", "password": "password123" }),
        json!({ "email": "alice@gatech.edu" }),
    ] {
        let (status, body) = app.request(Method::POST, "/login", None, Some(form)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(error(&body), "Invalid email or password.");
    }
}

#[tokio::test]
async fn protected_routes_need_a_verified_user() {
    let app = TestApp::new();
    let (_, body) = app.register("alice@gatech.edu", "Alice").await;
    let token = body["token"].as_str().unwrap().to_owned();
    let id = body["user"]["id"].as_str().unwrap().to_owned();

    let (status, body) = app
        .request(Method::POST, "/event", None, Some(event_body(10)))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error(&body), "Unauthorized Access");

    let (status, body) = app
        .request(Method::POST, "/event", Some(&token), Some(event_body(10)))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error(&body), "Must validate student email.");

    let (status, body) = app.get(&app.verify_path("alice@gatech.edu")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id);
    assert_eq!(body["emailVerified"], true);

    let (status, _) = app
        .request(Method::POST, "/event", Some(&token), Some(event_body(10)))
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn logging_out_revokes_the_token() {
    let app = TestApp::new();
    let alice = app.user("alice@gatech.edu", "Alice").await;

    let (status, _) = app
        .request(Method::POST, "/logout", Some(&alice.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .request(Method::POST, "/event", Some(&alice.token), Some(event_body(10)))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error(&body), "Unauthorized Access");
}

#[tokio::test]
async fn verification_links_need_the_emailed_token() {
    let app = TestApp::new();
    let (_, body) = app.register("mallory@gatech.edu", "Mallory").await;
    let token = body["token"].as_str().unwrap().to_owned();
    let id = body["user"]["id"].as_str().unwrap().to_owned();

    for uri in [
        format!("/verifyEmail/user/{}", id),
        format!("/verifyEmail/user/{}?token=guessed", id),
    ] {
        let (status, body) = app.request(Method::POST, &uri, None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error(&body), "Invalid verification link.");
    }

    let (status, body) = app
        .request(Method::POST, "/event", Some(&token), Some(event_body(10)))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error(&body), "Must validate student email.");
}

#[tokio::test]
async fn verifying_an_unknown_user_is_not_found() {
    let app = TestApp::new();

    let (status, body) = app
        .request(
            Method::POST,
            "/verifyEmail/user/00000000-0000-0000-0000-000000000000",
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error(&body), "User not found");

    let (status, _) = app
        .request(Method::POST, "/verifyEmail/user/not-an-id", None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
