use std::sync::Arc;

use api_lib::{
    adapters::MemoryAdapter,
    config::{Config, MEMORY_DATABASE_URL},
    web::{self, state::AppState},
};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use social_core::domain::{
    NewReaction, NewThought, NewUser, Thought, ThoughtChanges, User, UserChanges, UserProfile,
};
use social_core::ports::{DatabaseService, PortError, PortResult};
use tower::ServiceExt;
use uuid::Uuid;

fn test_config() -> Arc<Config> {
    let config = Config::from_lookup(|key| match key {
        "DATABASE_URL" => Some(MEMORY_DATABASE_URL.to_string()),
        _ => None,
    })
    .expect("memory config is valid");
    Arc::new(config)
}

fn app_with(db: Arc<dyn DatabaseService>) -> Router {
    let state = Arc::new(AppState::new(db, test_config()));
    web::router(state).expect("router builds")
}

fn app() -> Router {
    app_with(Arc::new(MemoryAdapter::new()))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn create_user(app: &Router, name: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/users",
        Some(json!({ "username": name, "email": format!("{}@x.com", name) })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["_id"].as_str().unwrap().to_string()
}

async fn create_thought(app: &Router, text: &str, username: &str, user_id: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/thoughts",
        Some(json!({ "thoughtText": text, "username": username, "userId": user_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["_id"].as_str().unwrap().to_string()
}

//=========================================================================================
// Users
//=========================================================================================

#[tokio::test]
async fn user_and_thought_end_to_end() {
    let app = app();

    let (status, user) = send(
        &app,
        Method::POST,
        "/users",
        Some(json!({ "username": "a", "email": "a@x.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let user_id = user["_id"].as_str().unwrap().to_string();
    assert!(Uuid::parse_str(&user_id).is_ok());

    let (status, thought) = send(
        &app,
        Method::POST,
        "/thoughts",
        Some(json!({ "thoughtText": "hi", "username": "a", "userId": user_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(thought["thoughtText"], "hi");
    assert_eq!(thought["username"], "a");

    let (status, fetched) = send(&app, Method::GET, &format!("/users/{user_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let thoughts = fetched["thoughts"].as_array().unwrap();
    assert_eq!(thoughts.len(), 1);
    assert_eq!(thoughts[0]["_id"], thought["_id"]);
    assert_eq!(thoughts[0]["thoughtText"], "hi");
}

#[tokio::test]
async fn created_user_echoes_input_with_generated_id() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/users",
        Some(json!({ "username": "ada", "email": "ada@example.com" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "ada");
    assert_eq!(body["email"], "ada@example.com");
    assert_eq!(body["thoughts"], json!([]));
    assert_eq!(body["friends"], json!([]));
    assert_eq!(body["friendCount"], 0);
    assert!(Uuid::parse_str(body["_id"].as_str().unwrap()).is_ok());
}

#[tokio::test]
async fn missing_user_is_not_found() {
    let app = app();
    let missing = Uuid::new_v4();

    for method in [Method::GET, Method::DELETE] {
        let (status, body) = send(&app, method, &format!("/users/{missing}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "No user found with that ID");
    }

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/users/{missing}"),
        Some(json!({ "username": "ghost" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_a_missing_user_mutates_nothing() {
    let app = app();
    create_user(&app, "ada").await;

    let (status, _) = send(&app, Method::DELETE, &format!("/users/{}", Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, users) = send(&app, Method::GET, "/users", None).await;
    assert_eq!(users.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn delete_user_returns_the_removed_document() {
    let app = app();
    let ada = create_user(&app, "ada").await;

    let (status, body) = send(&app, Method::DELETE, &format!("/users/{ada}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User deleted successfully");
    assert_eq!(body["user"]["_id"], ada.as_str());

    let (status, _) = send(&app, Method::GET, &format!("/users/{ada}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_user_merges_supplied_fields() {
    let app = app();
    let ada = create_user(&app, "ada").await;

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/users/{ada}"),
        Some(json!({ "email": "lovelace@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "ada");
    assert_eq!(body["email"], "lovelace@example.com");
}

#[tokio::test]
async fn user_schema_checks_reject_bad_writes() {
    let app = app();
    let ada = create_user(&app, "ada").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/users",
        Some(json!({ "username": "grace", "email": "not-an-email" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("email"));

    let (status, body) = send(
        &app,
        Method::POST,
        "/users",
        Some(json!({ "username": "ada", "email": "other@x.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("username"));

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/users/{ada}"),
        Some(json!({ "email": "still not an email" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, unchanged) = send(&app, Method::GET, &format!("/users/{ada}"), None).await;
    assert_eq!(unchanged["email"], "ada@x.com");
}

#[tokio::test]
async fn friend_add_and_remove_are_idempotent() {
    let app = app();
    let ada = create_user(&app, "ada").await;
    let grace = create_user(&app, "grace").await;
    let uri = format!("/users/{ada}/friends/{grace}");

    send(&app, Method::POST, &uri, None).await;
    let (status, body) = send(&app, Method::POST, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["friends"], json!([grace]));
    assert_eq!(body["friendCount"], 1);

    send(&app, Method::DELETE, &uri, None).await;
    let (status, body) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["friends"], json!([]));
}

#[tokio::test]
async fn friend_mutation_on_missing_user_is_not_found() {
    let app = app();
    let grace = create_user(&app, "grace").await;
    let uri = format!("/users/{}/friends/{grace}", Uuid::new_v4());

    let (status, body) = send(&app, Method::POST, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No user found with that ID");
}

#[tokio::test]
async fn user_list_populates_friends_and_thoughts() {
    let app = app();
    let ada = create_user(&app, "ada").await;
    let grace = create_user(&app, "grace").await;
    send(&app, Method::POST, &format!("/users/{ada}/friends/{grace}"), None).await;
    create_thought(&app, "first", "ada", &ada).await;

    let (status, users) = send(&app, Method::GET, "/users", None).await;
    assert_eq!(status, StatusCode::OK);
    let ada_doc = users
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["_id"] == ada.as_str())
        .unwrap();
    assert_eq!(ada_doc["friends"][0]["username"], "grace");
    assert_eq!(ada_doc["thoughts"][0]["thoughtText"], "first");
    assert_eq!(ada_doc["friendCount"], 1);
}

//=========================================================================================
// Thoughts
//=========================================================================================

#[tokio::test]
async fn thought_for_unknown_user_is_still_created() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/thoughts",
        Some(json!({ "thoughtText": "orphan", "username": "nobody", "userId": Uuid::new_v4() })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["message"],
        "No user found with that ID, but the thought was created"
    );
    let thought_id = body["thought"]["_id"].as_str().unwrap();

    let (status, stored) = send(&app, Method::GET, &format!("/thoughts/{thought_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stored["thoughtText"], "orphan");
}

#[tokio::test]
async fn missing_thought_is_not_found() {
    let app = app();
    let missing = Uuid::new_v4();

    let (status, body) = send(&app, Method::GET, &format!("/thoughts/{missing}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No thought found with that ID");

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/thoughts/{missing}/reactions"),
        Some(json!({ "reactionBody": "nice", "username": "ada" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/thoughts/{missing}"),
        Some(json!({ "thoughtText": "edited" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No thought found with that ID");

    let uri = format!("/thoughts/{missing}/reactions/{}", Uuid::new_v4());
    let (status, body) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No thought found with that ID");
}

#[tokio::test]
async fn malformed_requests_are_rejected_as_json() {
    let app = app();
    let ada = create_user(&app, "ada").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/thoughts",
        Some(json!({ "username": "ada", "userId": ada })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("thoughtText"), "{body}");

    let (status, body) =
        send(&app, Method::POST, "/users", Some(json!({ "username": "grace" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("email"), "{body}");

    let (status, body) = send(&app, Method::GET, "/users/not-an-id", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string(), "{body}");

    let uri = format!("/thoughts/{ada}/reactions/not-an-id");
    let (status, body) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string(), "{body}");
}

#[tokio::test]
async fn delete_thought_pulls_it_from_the_user() {
    let app = app();
    let ada = create_user(&app, "ada").await;
    let thought = create_thought(&app, "bye", "ada", &ada).await;

    let uri = format!("/thoughts/{ada}/{thought}");
    let (status, body) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Thought deleted successfully");
    assert_eq!(body["userData"]["thoughts"], json!([]));

    let (status, _) = send(&app, Method::GET, &format!("/thoughts/{thought}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_a_missing_thought_never_touches_the_user() {
    let app = app();
    let ada = create_user(&app, "ada").await;
    let kept = create_thought(&app, "kept", "ada", &ada).await;

    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("/thoughts/{ada}/{}", Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No thought found with that ID");

    let (_, user) = send(&app, Method::GET, &format!("/users/{ada}"), None).await;
    assert_eq!(user["thoughts"][0]["_id"], kept.as_str());
}

#[tokio::test]
async fn delete_thought_reports_a_missing_user() {
    let app = app();
    let ada = create_user(&app, "ada").await;
    let thought = create_thought(&app, "bye", "ada", &ada).await;

    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("/thoughts/{}/{thought}", Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["message"],
        "No user found with that ID, but the thought was deleted"
    );

    let (status, _) = send(&app, Method::GET, &format!("/thoughts/{thought}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_thought_merges_and_validates() {
    let app = app();
    let ada = create_user(&app, "ada").await;
    let thought = create_thought(&app, "draft", "ada", &ada).await;
    let uri = format!("/thoughts/{thought}");

    let (status, body) =
        send(&app, Method::PUT, &uri, Some(json!({ "thoughtText": "final" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["thoughtText"], "final");
    assert_eq!(body["username"], "ada");

    let (status, body) = send(
        &app,
        Method::PUT,
        &uri,
        Some(json!({ "thoughtText": "x".repeat(281) })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("thoughtText"));
}

#[tokio::test]
async fn reactions_are_added_once_and_removed_by_id() {
    let app = app();
    let ada = create_user(&app, "ada").await;
    let thought = create_thought(&app, "hello", "ada", &ada).await;
    let reactions_uri = format!("/thoughts/{thought}/reactions");
    let reaction = json!({ "reactionBody": "nice", "username": "grace" });

    send(&app, Method::POST, &reactions_uri, Some(reaction.clone())).await;
    let (status, body) = send(&app, Method::POST, &reactions_uri, Some(reaction)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reactionCount"], 1);
    let reaction_id = body["reactions"][0]["reactionId"].as_str().unwrap().to_string();
    assert_eq!(body["reactions"][0]["reactionBody"], "nice");

    let (status, unchanged) = send(
        &app,
        Method::DELETE,
        &format!("{reactions_uri}/{}", Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unchanged["reactions"], body["reactions"]);

    let uri = format!("{reactions_uri}/{reaction_id}");
    let (status, body) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reactions"], json!([]));
    assert_eq!(body["reactionCount"], 0);
}

#[tokio::test]
async fn thought_list_includes_reactions() {
    let app = app();
    let ada = create_user(&app, "ada").await;
    let thought = create_thought(&app, "hello", "ada", &ada).await;
    send(
        &app,
        Method::POST,
        &format!("/thoughts/{thought}/reactions"),
        Some(json!({ "reactionBody": "wow", "username": "grace" })),
    )
    .await;

    let (status, thoughts) = send(&app, Method::GET, "/thoughts", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(thoughts[0]["reactions"][0]["reactionBody"], "wow");
}

//=========================================================================================
// Datastore faults and documentation
//=========================================================================================

/// A datastore whose every operation fails as if the connection were gone.
struct UnreachableStore;

fn fault<T>() -> PortResult<T> {
    Err(PortError::Unexpected("connection refused".to_string()))
}

#[async_trait]
impl DatabaseService for UnreachableStore {
    async fn list_users(&self) -> PortResult<Vec<UserProfile>> {
        fault()
    }
    async fn get_user(&self, _: Uuid) -> PortResult<UserProfile> {
        fault()
    }
    async fn create_user(&self, _: NewUser) -> PortResult<User> {
        fault()
    }
    async fn update_user(&self, _: Uuid, _: UserChanges) -> PortResult<User> {
        fault()
    }
    async fn delete_user(&self, _: Uuid) -> PortResult<User> {
        fault()
    }
    async fn add_friend(&self, _: Uuid, _: Uuid) -> PortResult<User> {
        fault()
    }
    async fn remove_friend(&self, _: Uuid, _: Uuid) -> PortResult<User> {
        fault()
    }
    async fn attach_thought(&self, _: Uuid, _: Uuid) -> PortResult<User> {
        fault()
    }
    async fn detach_thought(&self, _: Uuid, _: Uuid) -> PortResult<User> {
        fault()
    }
    async fn list_thoughts(&self) -> PortResult<Vec<Thought>> {
        fault()
    }
    async fn get_thought(&self, _: Uuid) -> PortResult<Thought> {
        fault()
    }
    async fn create_thought(&self, _: NewThought) -> PortResult<Thought> {
        fault()
    }
    async fn update_thought(&self, _: Uuid, _: ThoughtChanges) -> PortResult<Thought> {
        fault()
    }
    async fn delete_thought(&self, _: Uuid) -> PortResult<Thought> {
        fault()
    }
    async fn add_reaction(&self, _: Uuid, _: NewReaction) -> PortResult<Thought> {
        fault()
    }
    async fn remove_reaction(&self, _: Uuid, _: Uuid) -> PortResult<Thought> {
        fault()
    }
}

#[tokio::test]
async fn datastore_faults_surface_the_raw_message() {
    let app = app_with(Arc::new(UnreachableStore));

    let (status, body) = send(&app, Method::GET, "/users", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "connection refused");

    let uri = format!("/thoughts/{}", Uuid::new_v4());
    let (status, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "connection refused");
}

#[tokio::test]
async fn openapi_document_lists_the_routes() {
    let app = app();
    let (status, doc) = send(&app, Method::GET, "/api-docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/users"].is_object());
    assert!(doc["paths"]["/thoughts/{id}/reactions"].is_object());
}
