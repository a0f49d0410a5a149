//! Common test infrastructure
//!
//! Builds the full router against an in-memory SQLite store and drives it
//! with `tower::ServiceExt::oneshot`, no sockets involved.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use musicspace_server::playlist_store::SqlitePlaylistStore;
use musicspace_server::scoring::ProfileCache;
use musicspace_server::server::{make_app, ServerConfig};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

pub struct TestApp {
    app: Router,
}

impl TestApp {
    pub fn spawn() -> Self {
        let store = Arc::new(SqlitePlaylistStore::in_memory().unwrap());
        let app = make_app(
            ServerConfig::default(),
            store,
            Arc::new(ProfileCache::new()),
        )
        .unwrap();
        Self { app }
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(value) => {
                builder = builder.header("content-type", "application/json");
                builder.body(Body::from(value.to_string())).unwrap()
            }
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request("GET", uri, None).await
    }

    /// Imports a playlist and returns its id. Tracks are (title, artist, genre).
    pub async fn import_playlist(
        &self,
        owner_id: i64,
        name: &str,
        source: &str,
        tracks: &[(&str, &str, Option<&str>)],
    ) -> i64 {
        let tracks: Vec<Value> = tracks
            .iter()
            .map(|(title, artist, genre)| {
                json!({ "title": title, "artist": artist, "genre": genre })
            })
            .collect();
        let body = json!({
            "owner_id": owner_id,
            "name": name,
            "source": source,
            "tracks": tracks,
        });
        let (status, value) = self.request("POST", "/v1/playlists", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "import failed: {}", value);
        value["id"].as_i64().unwrap()
    }

    pub async fn train(&self, user_id: i64) -> (StatusCode, Value) {
        self.request(
            "POST",
            "/v1/analysis/train",
            Some(json!({ "user_id": user_id })),
        )
        .await
    }

    pub async fn evaluate(&self, playlist_id: i64, user_id: i64) -> (StatusCode, Value) {
        self.request(
            "POST",
            &format!("/v1/analysis/evaluate/{}", playlist_id),
            Some(json!({ "user_id": user_id })),
        )
        .await
    }

    pub async fn promote(&self, user_id: i64, threshold: Option<f64>) -> (StatusCode, Value) {
        let mut body = json!({ "user_id": user_id });
        if let Some(threshold) = threshold {
            body["threshold"] = json!(threshold);
        }
        self.request("POST", "/v1/analysis/promote", Some(body)).await
    }

    pub async fn approve(&self, playlist_id: i64) -> (StatusCode, Value) {
        self.request("POST", &format!("/v1/playlists/{}/approve", playlist_id), None)
            .await
    }

    pub async fn reject(&self, playlist_id: i64) -> (StatusCode, Value) {
        self.request("POST", &format!("/v1/playlists/{}/reject", playlist_id), None)
            .await
    }

    pub async fn set_status(&self, playlist_id: i64, status: &str) -> (StatusCode, Value) {
        self.request(
            "PATCH",
            &format!("/v1/playlists/{}/status", playlist_id),
            Some(json!({ "status": status })),
        )
        .await
    }

    pub async fn move_playlist(&self, playlist_id: i64, space: &str) -> (StatusCode, Value) {
        self.request(
            "PATCH",
            &format!("/v1/playlists/{}/move", playlist_id),
            Some(json!({ "space_type": space })),
        )
        .await
    }

    pub async fn get_playlist(&self, playlist_id: i64) -> (StatusCode, Value) {
        self.get(&format!("/v1/playlists/{}", playlist_id)).await
    }
}
