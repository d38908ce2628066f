//! Page download and text extraction.

use promptline_core::provider::{FetchProvider, FetchService, FetchedPage};
use promptline_core::{Error, Result};
use futures::TryStreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use url::Url;

use super::html::extract_text;
use super::http::HttpConfig;
use crate::TRACING_TARGET_WEB;

/// Default cap on downloaded page size: 1 MiB.
pub const DEFAULT_MAX_BYTES: usize = 1024 * 1024;

const CAPABILITY: &str = "fetch";

/// Downloads pages over HTTP(S) and extracts their readable text.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    http: Client,
    max_bytes: usize,
}

impl PageFetcher {
    /// Creates a fetcher from `config`.
    pub fn new(config: &HttpConfig) -> Result<Self> {
        Ok(Self {
            http: config.build_client()?,
            max_bytes: DEFAULT_MAX_BYTES,
        })
    }

    /// Sets the largest body accepted, in bytes.
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Wraps this fetcher into a [`FetchService`].
    pub fn into_service(self) -> FetchService {
        FetchService::new(self)
    }
}

/// Parses `url`, accepting only `http` and `https`.
fn parse_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url.trim())
        .map_err(|e| Error::capability(CAPABILITY, format!("invalid URL '{url}': {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(Error::capability(
            CAPABILITY,
            format!("unsupported URL scheme '{scheme}'"),
        )),
    }
}

fn is_html(content_type: Option<&str>) -> bool {
    content_type.is_none_or(|ct| ct.contains("html") || ct.contains("xml"))
}

/// Reads the response body, failing as soon as it grows past `max_bytes`.
async fn read_limited(response: Response, max_bytes: usize) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    let mut chunks = response.bytes_stream();
    while let Some(chunk) = chunks
        .try_next()
        .await
        .map_err(|e| Error::capability(CAPABILITY, e))?
    {
        if body.len() + chunk.len() > max_bytes {
            return Err(Error::capability(
                CAPABILITY,
                format!("page exceeds {max_bytes} bytes"),
            ));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

#[async_trait::async_trait]
impl FetchProvider for PageFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let target = parse_url(url)?;
        tracing::debug!(target: TRACING_TARGET_WEB, url = %target, "Fetching page");

        let response = self
            .http
            .get(target.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::capability(CAPABILITY, e))?;

        if let Some(length) = response.content_length()
            && length > self.max_bytes as u64
        {
            return Err(Error::capability(
                CAPABILITY,
                format!("page is {length} bytes (max {})", self.max_bytes),
            ));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_ascii_lowercase);

        let body = read_limited(response, self.max_bytes).await?;
        let body = String::from_utf8_lossy(&body).into_owned();

        let (title, text) = if is_html(content_type.as_deref()) {
            let extracted = extract_text(&body);
            (extracted.title, extracted.text)
        } else {
            (None, body)
        };

        Ok(FetchedPage {
            url: target.to_string(),
            title,
            text,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use super::*;

    const CHUNK: usize = 64 * 1024;

    /// Serves one chunked `text/plain` response of `total` bytes and
    /// returns how many body bytes were written before the client left.
    async fn serve_chunked(total: usize) -> (String, JoinHandle<usize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 2048];
            let _ = socket.read(&mut request).await;

            let head = "HTTP/1.1 200 OK\r\ncontent-type: text/plain\r\ntransfer-encoding: chunked\r\n\r\n";
            if socket.write_all(head.as_bytes()).await.is_err() {
                return 0;
            }

            let chunk = vec![b'a'; CHUNK];
            let mut sent = 0;
            while sent < total {
                let size = format!("{CHUNK:x}\r\n");
                if socket.write_all(size.as_bytes()).await.is_err()
                    || socket.write_all(&chunk).await.is_err()
                    || socket.write_all(b"\r\n").await.is_err()
                {
                    return sent;
                }
                sent += CHUNK;
            }
            let _ = socket.write_all(b"0\r\n\r\n").await;
            sent
        });

        (format!("http://{addr}/page"), server)
    }

    #[test]
    fn accepts_only_http_urls() {
        assert!(parse_url("https://example.com/a?b=c").is_ok());
        assert!(parse_url(" http://example.com ").is_ok());
        assert!(parse_url("ftp://example.com").unwrap_err().is_capability());
        assert!(parse_url("not a url").unwrap_err().is_capability());
    }

    #[test]
    fn detects_markup_content() {
        assert!(is_html(None));
        assert!(is_html(Some("text/html; charset=utf-8")));
        assert!(is_html(Some("application/xhtml+xml")));
        assert!(!is_html(Some("text/plain")));
        assert!(!is_html(Some("application/json")));
    }

    #[tokio::test]
    async fn invalid_url_fails_before_request() {
        let fetcher = PageFetcher::new(&HttpConfig::default()).unwrap();
        let err = fetcher.fetch("file:///etc/passwd").await.unwrap_err();
        assert!(err.is_capability());
    }

    #[tokio::test]
    async fn reads_chunked_body_within_limit() {
        let (url, server) = serve_chunked(2 * CHUNK).await;
        let fetcher = PageFetcher::new(&HttpConfig::default()).unwrap();

        let page = fetcher.fetch(&url).await.unwrap();
        assert_eq!(page.text.len(), 2 * CHUNK);
        assert_eq!(page.title, None);
        assert_eq!(server.await.unwrap(), 2 * CHUNK);
    }

    #[tokio::test]
    async fn oversized_chunked_body_is_cut_off() {
        let total = 32 * 1024 * 1024;
        let (url, server) = serve_chunked(total).await;
        let fetcher = PageFetcher::new(&HttpConfig::default())
            .unwrap()
            .with_max_bytes(1024 * 1024);

        let err = fetcher.fetch(&url).await.unwrap_err();
        assert!(err.is_capability());
        assert!(err.to_string().contains("exceeds 1048576 bytes"));

        let sent = tokio::time::timeout(Duration::from_secs(10), server)
            .await
            .unwrap()
            .unwrap();
        assert!(sent < total);
    }
}
