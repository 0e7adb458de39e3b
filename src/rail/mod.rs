//! Payment rail adapters: a deterministic simulation for development and
//! tests, and an HTTP client for a real debit-execution endpoint.

pub mod http;
pub mod simulated;

pub use http::HttpRail;
pub use simulated::SimulatedRail;
