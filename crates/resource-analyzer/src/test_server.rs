//! In-process HTTP server serving test fixtures

use axum::body::Body;
use axum::extract::{Path, Query, Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Hits = Arc<Mutex<HashMap<String, usize>>>;

pub(crate) const SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"><rect width="10" height="10"/></svg>"#;

const WEBPAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>Cats</title>
  <meta property="og:title" content="Cat Page">
  <meta property="og:image" content="image.png">
</head>
<body><p>Meow!</p></body>
</html>"#;

const PLAIN_PAGE: &str = r#"<html><head>
  <title>Plain Page</title>
  <meta name="description" content="Nothing to see">
</head><body></body></html>"#;

const SUMMARY_PAGE: &str = r#"<html><head>
  <meta name="description" content="Only a summary">
</head><body></body></html>"#;

const BROKEN_IMAGE_PAGE: &str = r#"<html><head>
  <meta property="og:image" content="/static/broken.png">
</head></html>"#;

const QUERY_IMAGE_PAGE: &str = r#"<html><head>
  <meta property="og:title" content="Sized &amp; Cropped">
  <meta property="og:image" content="/static/sized.png?w=120&amp;h=90">
</head></html>"#;

const MISSING_IMAGE_PAGE: &str = r#"<html><head>
  <meta property="og:image" content="/echo/404">
</head></html>"#;

/// Encode a generated image of the given size
pub(crate) fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let image = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        })),
        _ => DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
        })),
    };
    let mut output = Cursor::new(Vec::new());
    image.write_to(&mut output, format).unwrap();
    output.into_inner()
}

/// JPEG carrying an EXIF orientation tag
pub(crate) fn jpeg_with_orientation(width: u32, height: u32, orientation: u16) -> Vec<u8> {
    let jpeg = encode(width, height, ImageFormat::Jpeg);
    // Big-endian TIFF header, one IFD entry: Orientation (0x0112), SHORT, count 1
    let mut tiff = vec![b'M', b'M', 0x00, 0x2A, 0x00, 0x00, 0x00, 0x08, 0x00, 0x01];
    tiff.extend_from_slice(&[0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01]);
    tiff.extend_from_slice(&orientation.to_be_bytes());
    tiff.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);

    let mut app1 = b"Exif\0\0".to_vec();
    app1.extend_from_slice(&tiff);
    let length = (app1.len() + 2) as u16;

    // APP1 goes right after SOI
    let mut data = jpeg[..2].to_vec();
    data.extend_from_slice(&[0xFF, 0xE1]);
    data.extend_from_slice(&length.to_be_bytes());
    data.extend_from_slice(&app1);
    data.extend_from_slice(&jpeg[2..]);
    data
}

/// A tiny GIF claiming to be 65535x65535 pixels
pub(crate) fn gif_bomb() -> Vec<u8> {
    let mut data = b"GIF89a".to_vec();
    // Logical screen: size, no color table
    data.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x00]);
    // Image descriptor
    data.extend_from_slice(&[0x2C, 0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0x00]);
    // LZW minimum code size, empty data, trailer
    data.extend_from_slice(&[0x02, 0x00, 0x3B]);
    data
}

pub(crate) struct TestServer {
    base: String,
    hits: Hits,
}

impl TestServer {
    pub(crate) async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let hits: Hits = Arc::default();

        let api_base = base.clone();
        let app = Router::new()
            .route(
                "/static/blob",
                get(|| async { b"\x00\x01\x02\x03".to_vec() }),
            )
            .route(
                "/static/doc.pdf",
                get(|| async { fixture("application/pdf", b"%PDF-1.4".to_vec()) }),
            )
            .route(
                "/static/image.png",
                get(|| async { fixture("image/png", encode(1600, 900, ImageFormat::Png)) }),
            )
            .route(
                "/static/small.png",
                get(|| async { fixture("image/png", encode(120, 90, ImageFormat::Png)) }),
            )
            .route(
                "/static/photo.jpg",
                get(|| async { fixture("image/jpeg", encode(400, 1440, ImageFormat::Jpeg)) }),
            )
            .route("/static/sized.png", get(sized_image))
            .route(
                "/static/broken.png",
                get(|| async { fixture("image/png", b"not a png".to_vec()) }),
            )
            .route(
                "/static/bomb.gif",
                get(|| async { fixture("image/gif", gif_bomb()) }),
            )
            .route(
                "/static/image.svg",
                get(|| async { fixture("image/svg+xml", SVG.as_bytes().to_vec()) }),
            )
            .route("/static/webpage.html", get(|| async { page(WEBPAGE) }))
            .route("/static/plain.html", get(|| async { page(PLAIN_PAGE) }))
            .route("/static/summary.html", get(|| async { page(SUMMARY_PAGE) }))
            .route(
                "/static/broken-image.html",
                get(|| async { page(BROKEN_IMAGE_PAGE) }),
            )
            .route(
                "/static/query-image.html",
                get(|| async { page(QUERY_IMAGE_PAGE) }),
            )
            .route(
                "/static/missing-image.html",
                get(|| async { page(MISSING_IMAGE_PAGE) }),
            )
            .route(
                "/static/latin1.html",
                get(|| async {
                    fixture(
                        "text/html; charset=iso-8859-1",
                        b"<title>Caf\xe9</title>".to_vec(),
                    )
                }),
            )
            .route(
                "/redirect",
                get(|| async { Redirect::temporary("/static/image.png") }),
            )
            .route("/echo/{code}", get(echo))
            .route(
                "/stream",
                get(|| async {
                    let chunks = (0..4).map(|_| Ok::<_, std::io::Error>(vec![0u8; 4096]));
                    Body::from_stream(futures::stream::iter(chunks))
                }),
            )
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(2)).await;
                    "late"
                }),
            )
            .route(
                "/youtube/videos",
                get(move |query: Query<HashMap<String, String>>| {
                    youtube_videos(api_base.clone(), query)
                }),
            )
            .route(
                "/youtube-bad/videos",
                get(|| async { fixture("application/json", b"<html>".to_vec()) }),
            )
            .route(
                "/youtube-empty/videos",
                get(|| async { fixture("application/json", br#"{"items": []}"#.to_vec()) }),
            )
            .layer(middleware::from_fn_with_state(hits.clone(), count_hits));

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base, hits }
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Number of requests served for `path`
    pub(crate) fn hits(&self, path: &str) -> usize {
        self.hits.lock().unwrap().get(path).copied().unwrap_or(0)
    }
}

fn fixture(content_type: &'static str, body: Vec<u8>) -> Response {
    ([(header::CONTENT_TYPE, content_type)], body).into_response()
}

fn page(html: &'static str) -> Response {
    fixture("text/html; charset=utf-8", html.as_bytes().to_vec())
}

/// PNG of the size given by the `w` and `h` query parameters
async fn sized_image(Query(params): Query<HashMap<String, u32>>) -> Response {
    match (params.get("w"), params.get("h")) {
        (Some(&width), Some(&height)) if width <= 2048 && height <= 2048 => {
            fixture("image/png", encode(width, height, ImageFormat::Png))
        }
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn echo(Path(code): Path<u16>) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST)
}

async fn youtube_videos(
    base: String,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if params.get("key").map(String::as_str) != Some("secret") {
        return StatusCode::FORBIDDEN.into_response();
    }
    if params.get("part").map(String::as_str) != Some("snippet") {
        return StatusCode::BAD_REQUEST.into_response();
    }
    let body = serde_json::json!({
        "items": [{
            "id": params.get("id"),
            "snippet": {
                "title": "Cat Video",
                "thumbnails": {
                    "default": { "url": format!("{}/static/small.png", base) },
                    "high": { "url": format!("{}/static/image.png", base) }
                }
            }
        }]
    });
    fixture("application/json", body.to_string().into_bytes())
}

async fn count_hits(State(hits): State<Hits>, request: Request, next: Next) -> Response {
    *hits
        .lock()
        .unwrap()
        .entry(request.uri().path().to_string())
        .or_default() += 1;
    next.run(request).await
}
