//! Persistence seams for the three managed services the API writes to.
//!
//! Each service sits behind an `async_trait` so `AppState` can carry
//! `Arc<dyn ...>` handles built once at startup.

pub mod cache;
pub mod files;
pub mod users;
