//! A Rust library for generating offline map tile sets.
//!
//! An area (predefined region, geocoded place or places, or explicit bounds)
//! is resolved to a bounding box, planned into Web Mercator `{z}/{x}/{y}`
//! tiles over a zoom range, fetched concurrently from a tile provider into a
//! directory tree, and described by a `metadata.json` descriptor. Re-running
//! a generation only fetches tiles that are not yet on disk.

pub mod config;
pub mod confirm;
pub mod error;
pub mod generator;
pub mod http;
pub mod provider;
pub mod resolver;

pub use config::*;
pub use error::*;
pub use generator::*;
pub use http::{HttpClient, HttpConfig, HttpError, HttpResponse};
pub use provider::*;
pub use resolver::*;
