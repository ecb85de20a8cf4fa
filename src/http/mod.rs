//! HTTP layer — `HttpTransport` for the `/info` and `/exchange` endpoints.

pub mod client;

pub use client::HttpTransport;
