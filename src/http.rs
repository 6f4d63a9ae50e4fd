//! HTTP transport - maps the REST surface onto the CRUD service.
//!
//! Requires the `http` feature. Uses axum for routing.
//!
//! ## Routes
//!
//! - `GET /{collection}` / `POST /{collection}` - list / create
//! - `GET|PUT|PATCH|DELETE /{collection}/{id}` - get / update / delete
//! - `GET /parent-navs`, `/parent-navs/all-with-child`,
//!   `/parent-navs/{id}`, `/parent-navs/slug/{slug}` - navigation parents
//! - `GET /child-navs`, `/child-navs/{id}` - flattened navigation children
//! - `GET /navigation-links` - raw navigation array (legacy, no envelope)
//! - `GET /` - API info, `GET /health` - health check
//!
//! Every response is JSON. Success and error bodies alike carry the
//! `{statusCode, message, ...}` envelope the site's frontend expects,
//! with `data` on success.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Map, Value};
use tower_http::cors::{Any, CorsLayer};

use crate::crud::CollectionCrudService;
use crate::document::KNOWN_COLLECTIONS;
use crate::error::{singular, CrudError};
use crate::navigation::NavigationView;
use crate::record::RecordId;
use crate::store::DocumentStore;

type Service<S> = Arc<CollectionCrudService<S>>;

/// Build the axum `Router` for the API.
pub fn router<S: DocumentStore + 'static>(service: Service<S>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    Router::new()
        .route("/", get(api_info))
        .route("/health", get(health))
        .route("/parent-navs/all-with-child", get(parent_navs_with_children))
        .route("/parent-navs/slug/:slug", get(parent_nav_by_slug))
        .route("/parent-navs/:id", get(parent_nav_by_id))
        .route("/parent-navs", get(parent_navs))
        .route("/child-navs/:id", get(child_nav_by_id))
        .route("/child-navs", get(child_navs))
        .route("/navigation-links", get(navigation_links))
        .route("/:collection", get(list_records).post(create_record))
        .route(
            "/:collection/:id",
            get(get_record)
                .put(update_record)
                .patch(update_record)
                .delete(delete_record),
        )
        .layer(cors)
        .with_state(service)
}

/// Serve the API at the given address (e.g. `"0.0.0.0:3001"`).
pub async fn serve<S: DocumentStore + 'static>(
    service: Service<S>,
    addr: &str,
) -> Result<(), std::io::Error> {
    let app = router(service);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

/// `GET /` - API info plus the database's last sync time.
async fn api_info<S: DocumentStore + 'static>(State(service): State<Service<S>>) -> Response {
    let last_updated = service
        .store()
        .load()
        .ok()
        .and_then(|doc| doc.last_sync())
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_default();

    json_response(
        StatusCode::OK,
        json!({
            "name": "Thôn Trang Liên Nhật API",
            "version": env!("CARGO_PKG_VERSION"),
            "status": "active",
            "lastUpdated": last_updated,
            "endpoints": {
                "products": "/products",
                "services": "/services",
                "experiences": "/experiences",
                "news": "/news",
                "navigation": "/parent-navs/all-with-child",
                "team": "/team"
            }
        }),
    )
}

/// `GET /health`
async fn health() -> Response {
    json_response(StatusCode::OK, json!({ "ok": true }))
}

async fn list_records<S: DocumentStore + 'static>(
    State(service): State<Service<S>>,
    Path(collection): Path<String>,
) -> Response {
    let Some(collection) = known(&collection) else {
        return unknown_collection(&collection);
    };
    match service.list(collection) {
        Ok(records) => success(StatusCode::OK, "Success", Value::Array(records)),
        Err(e) => failure(&e),
    }
}

async fn get_record<S: DocumentStore + 'static>(
    State(service): State<Service<S>>,
    Path((collection, id)): Path<(String, String)>,
) -> Response {
    let Some(collection) = known(&collection) else {
        return unknown_collection(&collection);
    };
    match service.get(collection, &RecordId::parse(&id)) {
        Ok(record) => success(StatusCode::OK, "Success", record),
        Err(e) => failure(&e),
    }
}

async fn create_record<S: DocumentStore + 'static>(
    State(service): State<Service<S>>,
    Path(collection): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let Some(collection) = known(&collection) else {
        return unknown_collection(&collection);
    };
    let partial = match request_object(payload) {
        Ok(partial) => partial,
        Err(response) => return response,
    };
    match service.create(collection, partial) {
        Ok(record) => success(
            StatusCode::CREATED,
            &format!("{} created successfully", singular(collection)),
            record,
        ),
        Err(e) => failure(&e),
    }
}

async fn update_record<S: DocumentStore + 'static>(
    State(service): State<Service<S>>,
    Path((collection, id)): Path<(String, String)>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let Some(collection) = known(&collection) else {
        return unknown_collection(&collection);
    };
    let partial = match request_object(payload) {
        Ok(partial) => partial,
        Err(response) => return response,
    };
    match service.update(collection, &RecordId::parse(&id), partial) {
        Ok(record) => success(
            StatusCode::OK,
            &format!("{} updated successfully", singular(collection)),
            record,
        ),
        Err(e) => failure(&e),
    }
}

async fn delete_record<S: DocumentStore + 'static>(
    State(service): State<Service<S>>,
    Path((collection, id)): Path<(String, String)>,
) -> Response {
    let Some(collection) = known(&collection) else {
        return unknown_collection(&collection);
    };
    match service.delete(collection, &RecordId::parse(&id)) {
        Ok(record) => success(
            StatusCode::OK,
            &format!("{} deleted successfully", singular(collection)),
            record,
        ),
        Err(e) => failure(&e),
    }
}

async fn parent_navs_with_children<S: DocumentStore + 'static>(
    State(service): State<Service<S>>,
) -> Response {
    match NavigationView::new(&service).all_with_children() {
        Ok(navs) => success(StatusCode::OK, "Success", Value::Array(navs)),
        Err(e) => failure(&e),
    }
}

async fn parent_navs<S: DocumentStore + 'static>(State(service): State<Service<S>>) -> Response {
    match NavigationView::new(&service).parents() {
        Ok(navs) => success(StatusCode::OK, "Success", Value::Array(navs)),
        Err(e) => failure(&e),
    }
}

async fn parent_nav_by_id<S: DocumentStore + 'static>(
    State(service): State<Service<S>>,
    Path(id): Path<String>,
) -> Response {
    match NavigationView::new(&service).parent_by_id(&RecordId::parse(&id)) {
        Ok(nav) => success(StatusCode::OK, "Parent navigation fetched successfully", nav),
        Err(e) => failure(&e),
    }
}

async fn parent_nav_by_slug<S: DocumentStore + 'static>(
    State(service): State<Service<S>>,
    Path(slug): Path<String>,
) -> Response {
    match NavigationView::new(&service).parent_by_slug(&slug) {
        Ok(nav) => success(StatusCode::OK, "Parent navigation fetched successfully", nav),
        Err(e) => failure(&e),
    }
}

async fn child_navs<S: DocumentStore + 'static>(State(service): State<Service<S>>) -> Response {
    match NavigationView::new(&service).children() {
        Ok(navs) => success(StatusCode::OK, "Success", Value::Array(navs)),
        Err(e) => failure(&e),
    }
}

async fn child_nav_by_id<S: DocumentStore + 'static>(
    State(service): State<Service<S>>,
    Path(id): Path<String>,
) -> Response {
    match NavigationView::new(&service).child_by_id(&RecordId::parse(&id)) {
        Ok(nav) => success(StatusCode::OK, "Child navigation fetched successfully", nav),
        Err(e) => failure(&e),
    }
}

/// `GET /navigation-links` - legacy route returning the bare array.
async fn navigation_links<S: DocumentStore + 'static>(State(service): State<Service<S>>) -> Response {
    match NavigationView::new(&service).all_with_children() {
        Ok(navs) => json_response(StatusCode::OK, Value::Array(navs)),
        Err(e) => failure(&e),
    }
}

/// Validate a path segment against the served collection names.
fn known(collection: &str) -> Option<&'static str> {
    KNOWN_COLLECTIONS
        .iter()
        .copied()
        .find(|name| *name == collection)
}

fn unknown_collection(collection: &str) -> Response {
    envelope(
        StatusCode::NOT_FOUND,
        &format!("Collection {} not found", collection),
        None,
    )
}

/// Pull the JSON object out of a request body, or produce the 400 envelope.
fn request_object(
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Map<String, Value>, Response> {
    let parsed = match payload {
        Ok(Json(value)) => value,
        Err(rejection) => {
            let err = CrudError::MalformedInput(rejection.body_text());
            return Err(failure(&err));
        }
    };
    match parsed {
        Value::Object(map) => Ok(map),
        other => {
            let err = CrudError::MalformedInput(format!(
                "expected a JSON object, got {}",
                value_kind(&other)
            ));
            Err(failure(&err))
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn success(status: StatusCode, message: &str, data: Value) -> Response {
    envelope(status, message, Some(data))
}

fn failure(err: &CrudError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    envelope(status, &err.to_string(), None)
}

/// The `{statusCode, message, data?}` response body.
fn envelope(status: StatusCode, message: &str, data: Option<Value>) -> Response {
    let mut body = json!({
        "statusCode": status.as_u16(),
        "message": message,
    });
    if let Some(data) = data {
        body["data"] = data;
    }
    json_response(status, body)
}

/// JSON response with the cache-busting headers the CDN setup requires.
fn json_response(status: StatusCode, body: Value) -> Response {
    let mut response = (status, Json(body)).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store, no-cache, must-revalidate, proxy-revalidate"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
    response
}

