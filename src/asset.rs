//! # Background Asset Fetching
//!
//! The only asynchronous step in a generation run. The background image is
//! resolved before layout starts: http(s) URLs go through `reqwest`, anything
//! else through the local source reader. The whole fetch runs under
//! `tokio::time::timeout`, and every failure degrades to a solid fill so a
//! slow or broken asset host never blocks or fails a document.

use std::time::Duration;

use thiserror::Error;

use crate::image_loader::{self, ImageError, LoadedImage};
use crate::style::Color;

/// A resolved page background.
#[derive(Debug, Clone)]
pub enum BackgroundAsset {
    Image { key: String, image: LoadedImage },
    Solid(Color),
}

#[derive(Debug, Error)]
enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("decode task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Fetch and decode the background image.
///
/// Never fails: no source gives `fallback` silently, and a fetch error,
/// unsupported format, or timeout gives `fallback` with a warning.
pub async fn fetch_background(src: Option<&str>, timeout: Duration, fallback: Color) -> BackgroundAsset {
    let Some(src) = src.map(str::trim).filter(|s| !s.is_empty()) else {
        return BackgroundAsset::Solid(fallback);
    };

    let fetched = match tokio::time::timeout(timeout, fetch_image(src, timeout)).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout(timeout)),
    };

    match fetched {
        Ok(image) => {
            log::debug!(
                "background loaded ({}x{} px)",
                image.width_px,
                image.height_px
            );
            BackgroundAsset::Image {
                key: src.to_string(),
                image,
            }
        }
        Err(e) => {
            log::warn!(
                "background '{}' unavailable, using solid fill: {}",
                abbreviate(src),
                e
            );
            BackgroundAsset::Solid(fallback)
        }
    }
}

async fn fetch_image(src: &str, timeout: Duration) -> Result<LoadedImage, FetchError> {
    if is_remote(src) {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let response = client.get(src).send().await?.error_for_status()?;
        let bytes = response.bytes().await?.to_vec();
        return off_runtime(move || image_loader::decode_image(bytes)).await;
    }
    let src = src.to_string();
    off_runtime(move || image_loader::decode_image(image_loader::read_source_bytes(&src)?)).await
}

/// Run file reads and decoding on the blocking pool so they never stall the
/// runtime, and so the timeout can fire while they are still running.
async fn off_runtime<F>(work: F) -> Result<LoadedImage, FetchError>
where
    F: FnOnce() -> Result<LoadedImage, ImageError> + Send + 'static,
{
    Ok(tokio::task::spawn_blocking(work).await??)
}

fn is_remote(src: &str) -> bool {
    src.starts_with("http://") || src.starts_with("https://")
}

/// Data URIs can be megabytes long; keep log lines readable.
fn abbreviate(src: &str) -> String {
    const MAX: usize = 64;
    if src.chars().count() <= MAX {
        src.to_string()
    } else {
        let head: String = src.chars().take(MAX).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn png_data_uri() -> String {
        use base64::Engine;
        let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([0, 0, 255, 255]));
        let mut buf = Vec::new();
        image::ImageEncoder::write_image(
            image::codecs::png::PngEncoder::new(&mut buf),
            img.as_raw(),
            2,
            2,
            image::ColorType::Rgba8,
        )
        .unwrap();
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(buf)
        )
    }

    #[tokio::test]
    async fn missing_source_is_solid_fallback() {
        let bg = fetch_background(None, Duration::from_millis(100), Color::WHITE).await;
        assert!(matches!(bg, BackgroundAsset::Solid(c) if c == Color::WHITE));
        let bg = fetch_background(Some("  "), Duration::from_millis(100), Color::BLACK).await;
        assert!(matches!(bg, BackgroundAsset::Solid(c) if c == Color::BLACK));
    }

    #[tokio::test]
    async fn data_uri_loads_without_network() {
        let uri = png_data_uri();
        let bg = fetch_background(Some(&uri), Duration::from_secs(5), Color::WHITE).await;
        match bg {
            BackgroundAsset::Image { image, .. } => assert_eq!(image.width_px, 2),
            other => panic!("expected image, got {:?}", other),
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn file_source_decodes_on_blocking_pool() {
        use base64::Engine;
        let uri = png_data_uri();
        let payload = uri.trim_start_matches("data:image/png;base64,");
        let bytes = base64::engine::general_purpose::STANDARD.decode(payload).unwrap();
        let path = std::env::temp_dir().join(format!("folio-bg-{}.png", std::process::id()));
        std::fs::write(&path, bytes).unwrap();

        let src = path.to_string_lossy().to_string();
        let bg = fetch_background(Some(&src), Duration::from_secs(5), Color::WHITE).await;
        let _ = std::fs::remove_file(&path);
        match bg {
            BackgroundAsset::Image { image, key } => {
                assert_eq!(image.height_px, 2);
                assert_eq!(key, src);
            }
            other => panic!("expected image, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn silent_server_times_out_to_fallback() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let url = format!("http://{}/background.png", addr);
        let started = std::time::Instant::now();
        let bg = fetch_background(Some(&url), Duration::from_millis(200), Color::WHITE).await;
        assert!(matches!(bg, BackgroundAsset::Solid(c) if c == Color::WHITE));
        assert!(started.elapsed() < Duration::from_secs(5));
        server.abort();
    }

    #[tokio::test]
    async fn non_image_response_falls_back() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let body = "<html>oops</html>";
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
            }
        });

        let url = format!("http://{}/bg.png", addr);
        let bg = fetch_background(Some(&url), Duration::from_secs(5), Color::WHITE).await;
        assert!(matches!(bg, BackgroundAsset::Solid(_)));
        server.abort();
    }

    #[test]
    fn long_sources_are_abbreviated() {
        let long = "a".repeat(500);
        assert_eq!(abbreviate(&long).len(), 67);
        assert_eq!(abbreviate("bg.png"), "bg.png");
    }
}
