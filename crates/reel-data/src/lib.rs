//! HTTP transport for `reel-query` against a TMDB-style movie API.
//!
//! This crate provides:
//! - `TmdbFetcher` - A `PageFetcher` over page-number-paginated REST
//!   endpoints, mapping the shared response envelope onto `Page`
//! - `FetchPolicy` / `EndpointClass` - Timeout and retry defaults per
//!   endpoint class
//! - `Movie` / `Person` - Item models for the list endpoints
//!
//! # Example
//!
//! ```ignore
//! use reel_data::{Movie, TmdbFetcher};
//! use reel_query::{QueryClient, QueryKey};
//!
//! let fetcher = TmdbFetcher::new("https://api.themoviedb.org/3")
//!     .with_api_key(api_key);
//! let client: QueryClient<Movie> = QueryClient::new(fetcher);
//!
//! let key = QueryKey::new("/search/movie").with_param("query", "dune")?;
//! client.ensure_first_page(&key).await;
//! ```

mod policy;
mod tmdb;
mod types;

pub use policy::*;
pub use tmdb::*;
pub use types::*;
