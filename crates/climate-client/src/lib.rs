//! Client side of the climate data API.
//!
//! - [`ApiClient`]: timeouts, typed errors, `/data`, `/metadata`, `/health`, `/chat`
//! - [`HttpBorderSource`]: base-map overlay files
//! - [`Debouncer`] and [`RequestGeneration`]: keep slider drags and
//!   overlapping loads from flooding or racing the API

pub mod borders;
pub mod client;
pub mod debounce;
pub mod error;
pub mod generation;

pub use borders::HttpBorderSource;
pub use client::{ApiClient, ClientConfig, ClimateApi};
pub use debounce::{Debouncer, DEFAULT_DEBOUNCE};
pub use error::{ClientError, ClientResult};
pub use generation::RequestGeneration;
