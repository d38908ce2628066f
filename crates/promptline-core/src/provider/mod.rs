//! External capability abstractions.
//!
//! Each capability is a provider trait plus a cheaply cloneable service
//! wrapper that the pipeline holds:
//!
//! - [`GenerationProvider`] / [`GenerationService`]: prompt to a lazy stream
//!   of text fragments
//! - [`SearchProvider`] / [`SearchService`]: query to structured results
//! - [`FetchProvider`] / [`FetchService`]: URL to page text

mod fetch;
mod generation;
mod search;

pub use fetch::{FetchProvider, FetchService, FetchedPage};
pub use generation::{FragmentStream, GenerationProvider, GenerationService};
pub use search::{SearchHit, SearchProvider, SearchResults, SearchService};
