use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use http_body_util::BodyExt;
use migration::MigratorTrait;
use sea_orm::{ConnectionTrait, Database, Statement};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use engine::{Engine, IngredientRecord};
use server::ServerState;

const PNG: &str = "data:image/png;base64,iVBORw0KGgo=";

struct Setup {
    app: Router,
    flour: i64,
    sugar: i64,
    egg: i64,
    tag: i64,
}

async fn setup() -> Setup {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    for username in ["alice", "bob"] {
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (username, password) VALUES (?, ?)",
            vec![username.into(), "password".into()],
        ))
        .await
        .unwrap();
    }

    let media = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../target/test_media")
        .join(Uuid::new_v4().to_string());
    let engine = Engine::builder()
        .database(db.clone())
        .media_root(media)
        .build()
        .await
        .unwrap();

    let records: Vec<IngredientRecord> = [("Flour", "g"), ("Sugar", "g"), ("Egg", "pcs")]
        .into_iter()
        .map(|(name, unit)| IngredientRecord {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
        })
        .collect();
    engine.import_ingredients(&records).await.unwrap();
    let tag = engine
        .create_tag("Breakfast", "#E26C2D", "breakfast")
        .await
        .unwrap();

    let app = server::router(ServerState {
        engine: Arc::new(engine),
        db,
    });

    let (_, ingredients) = send(&app, Method::GET, "/ingredients/", None, None).await;
    let id_of = |name: &str| {
        ingredients
            .as_array()
            .unwrap()
            .iter()
            .find(|i| i["name"] == name)
            .and_then(|i| i["id"].as_i64())
            .unwrap()
    };

    Setup {
        flour: id_of("Flour"),
        sugar: id_of("Sugar"),
        egg: id_of("Egg"),
        tag: i64::from(tag.id),
        app,
    }
}

fn basic(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}

async fn send_raw(
    app: &Router,
    method: Method,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(header::AUTHORIZATION, basic(user, "password"));
    }
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    app.clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap()
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let response = send_raw(app, method, uri, user, body).await;
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn recipe_body(name: &str, ingredients: &[(i64, i64)], tags: &[i64]) -> Value {
    json!({
        "name": name,
        "text": "Mix and bake.",
        "image": PNG,
        "cooking_time": 20,
        "tags": tags,
        "ingredients": ingredients
            .iter()
            .map(|(id, amount)| json!({"id": id, "amount": amount}))
            .collect::<Vec<_>>(),
    })
}

#[tokio::test]
async fn tags_and_ingredients_are_public() {
    let s = setup().await;

    let (status, tags) = send(&s.app, Method::GET, "/tags/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tags[0]["slug"], "breakfast");

    let uri = format!("/tags/{}/", s.tag);
    let (status, tag) = send(&s.app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tag["color"], "#E26C2D");

    let (status, _) = send(&s.app, Method::GET, "/tags/999/", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, found) = send(&s.app, Method::GET, "/ingredients/?search=su", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found.as_array().map(Vec::len), Some(1));
    assert_eq!(found[0]["name"], "Sugar");

    let uri = format!("/ingredients/{}/", s.egg);
    let (status, egg) = send(&s.app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(egg["measurement_unit"], "pcs");
}

#[tokio::test]
async fn anonymous_create_is_forbidden_and_bad_credentials_unauthorized() {
    let s = setup().await;
    let body = recipe_body("Pancakes", &[(s.flour, 200)], &[]);

    let (status, _) = send(&s.app, Method::POST, "/recipes/", None, Some(body.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let response = s
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/recipes/")
                .header(header::AUTHORIZATION, basic("alice", "wrong"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn recipe_lifecycle() {
    let s = setup().await;

    let body = recipe_body("Pancakes", &[(s.flour, 200), (s.egg, 2)], &[s.tag]);
    let (status, created) = send(&s.app, Method::POST, "/recipes/", Some("alice"), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["author"]["username"], "alice");
    assert_eq!(created["tags"][0]["slug"], "breakfast");
    assert_eq!(created["ingredients"][1]["amount"], 2);
    let id = created["id"].as_i64().unwrap();
    let uri = format!("/recipes/{id}/");

    let (status, fetched) = send(&s.app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["is_favorited"], false);

    let patch = json!({"name": "Crepes"});
    let (status, _) = send(&s.app, Method::PATCH, &uri, Some("bob"), Some(patch.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, updated) = send(&s.app, Method::PATCH, &uri, Some("alice"), Some(patch)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Crepes");
    assert_eq!(updated["ingredients"].as_array().map(Vec::len), Some(2));

    let (status, _) = send(&s.app, Method::DELETE, &uri, Some("bob"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&s.app, Method::DELETE, &uri, Some("alice"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&s.app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn validation_errors_name_the_field() {
    let s = setup().await;

    let mut body = recipe_body("Toast", &[(s.flour, 1)], &[]);
    body["cooking_time"] = json!(0);
    let (status, error) = send(&s.app, Method::POST, "/recipes/", Some("alice"), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["field"], "cooking_time");

    let body = recipe_body("Toast", &[(s.flour, 1), (s.flour, 2)], &[]);
    let (status, error) = send(&s.app, Method::POST, "/recipes/", Some("alice"), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["field"], "ingredients");

    let (status, error) = send(&s.app, Method::GET, "/recipes/?ordering=name", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["field"], "ordering");
}

#[tokio::test]
async fn malformed_bodies_get_structured_errors() {
    let s = setup().await;

    let mut body = recipe_body("Toast", &[(s.flour, 1)], &[]);
    body["cooking_time"] = json!("abc");
    let (status, error) = send(&s.app, Method::POST, "/recipes/", Some("alice"), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["field"], "cooking_time");
    assert!(
        error["error"]
            .as_str()
            .unwrap()
            .starts_with("invalid type: string")
    );

    let body = json!({ "ingredients": [{ "id": s.flour, "amount": "lots" }] });
    let (_, created) = send(
        &s.app,
        Method::POST,
        "/recipes/",
        Some("alice"),
        Some(recipe_body("Toast", &[(s.flour, 1)], &[])),
    )
    .await;
    let uri = format!("/recipes/{}/", created["id"]);
    let (status, error) = send(&s.app, Method::PATCH, &uri, Some("alice"), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["field"], "ingredients[0].amount");

    let (status, error) = send(&s.app, Method::GET, "/recipes/?page=first", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["field"], "page");
}

#[tokio::test]
async fn favorites_and_list_filters() {
    let s = setup().await;
    let mut ids = Vec::new();
    for (name, tags) in [("Porridge", vec![s.tag]), ("Stew", vec![])] {
        let body = recipe_body(name, &[(s.flour, 10)], &tags);
        let (_, created) = send(&s.app, Method::POST, "/recipes/", Some("alice"), Some(body)).await;
        ids.push(created["id"].as_i64().unwrap());
    }

    let uri = format!("/recipes/{}/favorite/", ids[1]);
    let (status, short) = send(&s.app, Method::POST, &uri, Some("bob"), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(short["name"], "Stew");
    let (status, _) = send(&s.app, Method::POST, &uri, Some("bob"), None).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, page) = send(
        &s.app,
        Method::GET,
        "/recipes/?is_favorited=1",
        Some("bob"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["count"], 1);
    assert_eq!(page["results"][0]["is_favorited"], true);

    let (_, page) = send(&s.app, Method::GET, "/recipes/?tags=breakfast", None, None).await;
    assert_eq!(page["count"], 1);
    assert_eq!(page["results"][0]["name"], "Porridge");

    let (_, page) = send(
        &s.app,
        Method::GET,
        "/recipes/?limit=1&ordering=id",
        None,
        None,
    )
    .await;
    assert_eq!(page["count"], 2);
    assert_eq!(page["next"], 2);
    assert_eq!(page["previous"], Value::Null);
    assert_eq!(page["results"][0]["id"], ids[0]);

    let (status, _) = send(&s.app, Method::GET, "/recipes/?page=9", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&s.app, Method::DELETE, &uri, Some("bob"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&s.app, Method::DELETE, &uri, Some("bob"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&s.app, Method::POST, &uri, None, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn shopping_cart_download_is_a_pdf_attachment() {
    let s = setup().await;
    for ingredients in [
        vec![(s.flour, 200), (s.sugar, 50)],
        vec![(s.flour, 300), (s.egg, 2)],
    ] {
        let body = recipe_body("Bake", &ingredients, &[]);
        let (_, created) = send(&s.app, Method::POST, "/recipes/", Some("alice"), Some(body)).await;
        let uri = format!("/recipes/{}/shopping_cart/", created["id"]);
        let (status, _) = send(&s.app, Method::POST, &uri, Some("bob"), None).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let response = send_raw(
        &s.app,
        Method::GET,
        "/recipes/download_shopping_cart/",
        Some("bob"),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/pdf"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"shopping_list.pdf\""
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(bytes.starts_with(b"%PDF-"));

    let (status, _) = send(
        &s.app,
        Method::GET,
        "/recipes/download_shopping_cart/",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
