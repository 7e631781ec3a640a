mod handlers;

use std::any::Any;
use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::Extension,
    response::{IntoResponse, Response},
    routing::{get, get_service},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::api::API;
use crate::config::Config;
use crate::error::{unexpected_error, Error};
use crate::server::handlers::{assets, places};

pub use crate::api::DynAPI;

/// Builds the application router. The fixed `/api/places/random*` paths are
/// matched ahead of `/api/places/:id`; anything outside the API falls through
/// to the static directory.
pub fn router(api: DynAPI, static_dir: &Path) -> Router {
    Router::new()
        .route("/api/places", get(places::list).post(places::create))
        .route("/api/places/random", get(places::random))
        .route("/api/places/random-match", get(places::random_match))
        .route(
            "/api/places/:id",
            get(places::find).put(places::update).delete(places::delete),
        )
        .route(
            "/",
            get_service(ServeFile::new(static_dir.join(assets::MAIN_PAGE)))
                .handle_error(assets::io_error),
        )
        .route(
            "/admin",
            get_service(ServeFile::new(static_dir.join(assets::ADMIN_PAGE)))
                .handle_error(assets::io_error),
        )
        .fallback(get_service(ServeDir::new(static_dir)).handle_error(assets::io_error))
        .layer(Extension(api))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(panic_response))
}

fn panic_response(_: Box<dyn Any + Send + 'static>) -> Response {
    tracing::error!("request handler panicked");

    unexpected_error().into_response()
}

pub async fn serve<T: API + Sync + Send + 'static>(api: T, config: &Config) -> Result<(), Error> {
    let api = Arc::new(api) as DynAPI;

    let app = router(api, &config.static_dir);

    tracing::info!(
        static_dir = %config.static_dir.display(),
        "listening on {}",
        config.addr
    );

    axum::Server::bind(&config.addr)
        .serve(app.into_make_service())
        .await
        .map_err(|err| {
            tracing::error!(error = %err, "server failed");
            unexpected_error()
        })
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tokio_test::block_on;
    use tower::ServiceExt;

    use super::router;
    use crate::db::{temp_store, PlaceStore};
    use crate::engine::Engine;
    use crate::entities::{NewPlace, Place};
    use crate::error::{database_error, Error};

    async fn app(dir: &TempDir) -> Router {
        let static_dir = dir.path().join("static");
        fs::create_dir_all(static_dir.join("assets")).unwrap();
        fs::write(static_dir.join("main_page.html"), "<h1>main</h1>").unwrap();
        fs::write(static_dir.join("admin.html"), "<h1>admin</h1>").unwrap();
        fs::write(static_dir.join("assets/app.css"), "body {}").unwrap();

        let engine = Engine::new(temp_store(dir).await).await.unwrap();
        router(Arc::new(engine), &static_dir)
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Vec<u8>) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();

        (status, bytes.to_vec())
    }

    async fn send_json(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let (status, bytes) = send(app, method, uri, body).await;

        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn cafe_a() -> Value {
        json!({
            "name": "Cafe A",
            "district": "Center",
            "category": "coffee",
            "breakfast_time": "morning",
            "lat": 1.0,
            "lng": 2.0,
            "address": "X St",
            "price": "400 ₽",
            "rating": 4.5
        })
    }

    #[test]
    fn created_place_is_listed_with_id_and_empty_photos() {
        block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let app = app(&dir).await;

            let (status, body) = send_json(&app, "POST", "/api/places", Some(cafe_a())).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["status"], "ok");
            let id = body["id"].as_i64().unwrap();

            let (status, body) = send_json(&app, "GET", "/api/places", None).await;
            assert_eq!(status, StatusCode::OK);
            let places: Vec<Place> = serde_json::from_value(body).unwrap();
            assert_eq!(places.len(), 1);
            assert_eq!(places[0].id, id);
            assert_eq!(places[0].name, "Cafe A");
            assert!(places[0].photos.is_empty());
            assert_eq!(places[0].description, "");
            assert_eq!(places[0].website, None);
        });
    }

    #[test]
    fn missing_required_field_is_a_client_error() {
        block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let app = app(&dir).await;

            let mut body = cafe_a();
            body.as_object_mut().unwrap().remove("rating");

            let (status, response) =
                send_json(&app, "POST", "/api/places", Some(body.clone())).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(response["error"], "missing required field: rating");

            let (status, _) = send_json(&app, "PUT", "/api/places/1", Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);

            let (_, places) = send_json(&app, "GET", "/api/places", None).await;
            assert_eq!(places, json!([]));
        });
    }

    #[test]
    fn update_find_and_delete() {
        block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let app = app(&dir).await;

            let (_, body) = send_json(&app, "POST", "/api/places", Some(cafe_a())).await;
            let id = body["id"].as_i64().unwrap();
            let uri = format!("/api/places/{id}");

            let mut changed = cafe_a();
            changed["name"] = json!("Cafe B");
            changed["photos"] = json!(["a.jpg", "b.jpg"]);
            let (status, body) = send_json(&app, "PUT", &uri, Some(changed)).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, json!({"status": "ok"}));

            let (status, body) = send_json(&app, "GET", &uri, None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["name"], "Cafe B");
            assert_eq!(body["photos"], json!(["a.jpg", "b.jpg"]));

            let (status, _) = send_json(&app, "DELETE", &uri, None).await;
            assert_eq!(status, StatusCode::OK);

            let (status, body) = send_json(&app, "GET", &uri, None).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(body["error"], "place not found");
        });
    }

    #[test]
    fn non_numeric_ids_are_not_found() {
        block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let app = app(&dir).await;

            let (status, body) = send_json(&app, "GET", "/api/places/abc", None).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(body, json!({"code": 104, "error": "place not found"}));

            let (status, body) = send_json(&app, "PUT", "/api/places/abc", Some(cafe_a())).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(body["code"], 104);

            let (status, body) = send_json(&app, "DELETE", "/api/places/1.5", None).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(body["code"], 104);
        });
    }

    #[test]
    fn unknown_ids_are_accepted_silently() {
        block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let app = app(&dir).await;

            let (status, body) = send_json(&app, "PUT", "/api/places/42", Some(cafe_a())).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, json!({"status": "ok"}));

            let (status, body) = send_json(&app, "DELETE", "/api/places/42", None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, json!({"status": "ok"}));
        });
    }

    #[test]
    fn random_returns_public_projection() {
        block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let app = app(&dir).await;

            for name in ["A", "B", "C", "D"] {
                let mut place = cafe_a();
                place["name"] = json!(name);
                send_json(&app, "POST", "/api/places", Some(place)).await;
            }

            let (status, body) = send_json(&app, "GET", "/api/places/random", None).await;
            assert_eq!(status, StatusCode::OK);
            let sample = body.as_array().unwrap();
            assert_eq!(sample.len(), 3);
            for place in sample {
                let place = place.as_object().unwrap();
                for field in ["lat", "lng", "address", "website", "description"] {
                    assert!(!place.contains_key(field));
                }
                assert!(place.contains_key("photos"));
            }

            let (_, body) = send_json(&app, "GET", "/api/places/random?count=10", None).await;
            assert_eq!(body.as_array().unwrap().len(), 4);

            let (_, body) = send_json(&app, "GET", "/api/places/random?count=1", None).await;
            assert_eq!(body.as_array().unwrap().len(), 1);
        });
    }

    #[test]
    fn random_match_applies_filters() {
        block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let app = app(&dir).await;

            let mut cheap = cafe_a();
            cheap["name"] = json!("Cheap");
            cheap["price"] = json!("300 ₽");
            send_json(&app, "POST", "/api/places", Some(cheap)).await;

            let mut vague = cafe_a();
            vague["name"] = json!("Vague");
            vague["price"] = json!("not a number");
            send_json(&app, "POST", "/api/places", Some(vague)).await;

            for _ in 0..10 {
                let (status, body) =
                    send_json(&app, "GET", "/api/places/random-match?max_price=500", None).await;
                assert_eq!(status, StatusCode::OK);
                assert_eq!(body["name"], "Cheap");
                assert_eq!(body["address"], "X St");
            }

            let (status, body) = send_json(
                &app,
                "GET",
                "/api/places/random-match?district=Center&category=coffee&breakfast_time=morning&min_rating=4.5",
                None,
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["district"], "Center");

            let (status, body) =
                send_json(&app, "GET", "/api/places/random-match?district=Nowhere", None).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(body["error"], "no matching place found");
        });
    }

    #[test]
    fn static_pages_and_assets() {
        block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let app = app(&dir).await;

            let (status, body) = send(&app, "GET", "/", None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, b"<h1>main</h1>");

            let (status, body) = send(&app, "GET", "/admin", None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, b"<h1>admin</h1>");

            let (status, body) = send(&app, "GET", "/assets/app.css", None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, b"body {}");

            let (status, _) = send(&app, "GET", "/assets/missing.js", None).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
        });
    }

    struct BrokenStore {
        panic: bool,
    }

    #[async_trait]
    impl PlaceStore for BrokenStore {
        async fn initialize(&self) -> Result<(), Error> {
            Ok(())
        }

        async fn load_all(&self) -> Result<Vec<Place>, Error> {
            if self.panic {
                panic!("store exploded");
            }
            Err(database_error("database is locked"))
        }

        async fn find_by_id(&self, _: i64) -> Result<Option<Place>, Error> {
            Err(database_error("database is locked"))
        }

        async fn insert(&self, _: &NewPlace) -> Result<i64, Error> {
            Err(database_error("database is locked"))
        }

        async fn update_by_id(&self, _: i64, _: &NewPlace) -> Result<u64, Error> {
            Err(database_error("database is locked"))
        }

        async fn delete_by_id(&self, _: i64) -> Result<u64, Error> {
            Err(database_error("database is locked"))
        }
    }

    async fn broken_app(dir: &TempDir, panic: bool) -> Router {
        let engine = Engine::new(BrokenStore { panic }).await.unwrap();
        router(Arc::new(engine), dir.path())
    }

    #[test]
    fn store_failures_become_generic_server_errors() {
        block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let app = broken_app(&dir, false).await;

            let (status, body) = send_json(&app, "GET", "/api/places/random-match", None).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body, json!({"code": 2, "error": "Internal Server Error"}));

            let (status, _) = send_json(&app, "POST", "/api/places", Some(cafe_a())).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        });
    }

    #[test]
    fn handler_panics_do_not_escape() {
        block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let app = broken_app(&dir, true).await;

            let (status, body) = send_json(&app, "GET", "/api/places", None).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body["error"], "Internal Server Error");
        });
    }
}
