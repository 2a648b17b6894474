//! HTTP tile server on top of a [`TileClient`].
//!
//! Routes:
//! - `GET /tiles/{provider}/{zoom}/{x}/{y}` returns the tile bytes; `y` may
//!   carry a file extension (`/tiles/openstreetmap/3/4/2.png`)
//! - `GET /providers` lists registered providers as JSON

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::client::TileClient;
use crate::provider::ProviderDescriptor;
use crate::tile::TileError;

/// Builds the router. Exposed separately from [`serve`] for embedding.
pub fn router(client: Arc<TileClient>) -> Router {
    Router::new()
        .route("/tiles/:provider/:zoom/:x/:y", get(tile_handler))
        .route("/providers", get(providers_handler))
        .with_state(client)
}

/// Serves tiles on `bind` until `shutdown` resolves.
pub async fn serve<F>(
    bind: SocketAddr,
    client: Arc<TileClient>,
    shutdown: F,
) -> Result<(), std::io::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(addr = %listener.local_addr()?, providers = client.len(), "Tile server listening");

    axum::serve(listener, router(Arc::clone(&client)))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Tile server stopped");
    client.log_stats();
    Ok(())
}

#[derive(Debug, Serialize)]
struct ProviderList {
    current: Option<String>,
    providers: Vec<ProviderDescriptor>,
}

async fn providers_handler(State(client): State<Arc<TileClient>>) -> Json<ProviderList> {
    Json(ProviderList {
        current: client.current_provider_id(),
        providers: client.providers(),
    })
}

#[instrument(skip(client))]
async fn tile_handler(
    State(client): State<Arc<TileClient>>,
    Path((provider, zoom, x, y)): Path<(String, u32, u32, String)>,
) -> Response {
    let Some(y) = parse_row(&y) else {
        return (StatusCode::BAD_REQUEST, format!("invalid tile row '{}'", y)).into_response();
    };

    match client.get_tile(&provider, zoom, x, y).await {
        Ok(data) => {
            debug!(bytes = data.len(), "Serving tile");
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, content_type_for(&data)),
                    (header::CACHE_CONTROL, "max-age=3600"),
                    (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
                ],
                data,
            )
                .into_response()
        }
        Err(e) => {
            let status = status_for(&e);
            if status.is_server_error() {
                warn!(error = %e, "Tile request failed");
            }
            (status, e.to_string()).into_response()
        }
    }
}

/// Accepts `7` or `7.png`.
fn parse_row(segment: &str) -> Option<u32> {
    let stem = segment.split_once('.').map_or(segment, |(stem, _)| stem);
    stem.parse().ok()
}

fn status_for(error: &TileError) -> StatusCode {
    match error {
        TileError::UnknownProvider(_) => StatusCode::NOT_FOUND,
        TileError::ZoomOutOfRange(_)
        | TileError::ZoomNotSupported { .. }
        | TileError::TileIndexOutOfRange { .. } => StatusCode::BAD_REQUEST,
        TileError::TileFetchFailed { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Sniffs the image format from magic bytes.
fn content_type_for(data: &[u8]) -> &'static str {
    if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        "image/png"
    } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        "image/webp"
    } else {
        "application/octet-stream"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{MockHttpClient, TileProvider, UriTemplate};
    use bytes::Bytes;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\nrest";

    fn client() -> (Arc<TileClient>, Arc<MockHttpClient>) {
        let http = Arc::new(MockHttpClient::new().respond("http://t.test/2/1/3", Ok(PNG.into())));
        let descriptor = ProviderDescriptor::new(
            "test",
            vec![UriTemplate::parse("http://t.test/{zoom}/{x}/{y}").unwrap()],
        )
        .with_zoom_range(0, 10);
        let client = TileClient::new();
        client
            .register_provider(TileProvider::new(descriptor, Arc::clone(&http)).unwrap(), true)
            .unwrap();
        (Arc::new(client), http)
    }

    async fn get_tile(client: &Arc<TileClient>, p: &str, z: u32, x: u32, y: &str) -> Response {
        tile_handler(
            State(Arc::clone(client)),
            Path((p.to_string(), z, x, y.to_string())),
        )
        .await
    }

    async fn body(response: Response) -> Bytes {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_serves_tile_with_sniffed_type() {
        let (client, _) = client();
        let response = get_tile(&client, "test", 2, 1, "3.png").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        assert_eq!(body(response).await, Bytes::from_static(PNG));
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let (client, _) = client();

        let response = get_tile(&client, "nope", 2, 1, "3").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = get_tile(&client, "test", 11, 0, "0").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = get_tile(&client, "test", 2, 4, "0").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = get_tile(&client, "test", 2, 1, "abc").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // No scripted response for this tile
        let response = get_tile(&client, "test", 2, 0, "0").await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_providers_listing() {
        let (client, _) = client();
        let Json(list) = providers_handler(State(client)).await;

        assert_eq!(list.current.as_deref(), Some("test"));
        assert_eq!(list.providers.len(), 1);
        let json = serde_json::to_value(&list).unwrap();
        assert_eq!(json["providers"][0]["id"], "test");
    }

    #[test]
    fn test_parse_row() {
        assert_eq!(parse_row("7"), Some(7));
        assert_eq!(parse_row("7.jpg"), Some(7));
        assert_eq!(parse_row(".png"), None);
        assert_eq!(parse_row("-1"), None);
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for(PNG), "image/png");
        assert_eq!(content_type_for(&[0xFF, 0xD8, 0xFF, 0xE0]), "image/jpeg");
        assert_eq!(content_type_for(b"RIFF\0\0\0\0WEBPVP8 "), "image/webp");
        assert_eq!(content_type_for(b"text"), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_serve_shuts_down() {
        let (client, _) = client();
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        serve(addr, client, async {}).await.unwrap();
    }
}
