//! Web search and page fetch over HTTP.

mod fetch;
mod html;
mod http;
mod search;

pub use fetch::{DEFAULT_MAX_BYTES, PageFetcher};
pub use html::{HtmlText, extract_text};
pub use http::{DEFAULT_TIMEOUT, HttpConfig};
pub use search::{SERPAPI_ENDPOINT, SerpApiSearch};
