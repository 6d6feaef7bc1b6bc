//! Data source abstraction layer.
//!
//! This module defines the [`ApodSource`] trait and the [`RemoteItem`] type.
//! The real endpoint lives in [`apod`]; tests substitute scripted sources.
//!
//! ## For contributors — adding a new source
//!
//! 1. Create a new file in this directory (e.g. `mirror.rs`).
//! 2. Define a struct and implement [`ApodSource`] for it.
//! 3. Add `mod mirror;` below and re-export the struct.
//! 4. Construct it in `main.rs` instead of [`NasaApod`].
//!
//! The fetcher, state machine and UI are all source-agnostic.

mod apod;
mod remote_item;

pub use apod::NasaApod;
pub use remote_item::{ApodResponse, RemoteItem, PLACEHOLDER_IMAGE_URL, SUMMARY_CHARS};

#[cfg(test)]
pub(crate) use remote_item::MediaKind;
#[cfg(test)]
pub(crate) use remote_item::tests::make_item;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::SourceError;

/// Trait that every APOD source must implement.
///
/// The fetcher calls [`fetch()`](ApodSource::fetch) from a tokio task, so
/// implementations must be [`Send`] + [`Sync`].
#[async_trait]
pub trait ApodSource: Send + Sync {
    /// Human-readable label used in logs and the status bar.
    fn name(&self) -> &str;

    /// Perform one request.  `None` asks for the current entry.
    ///
    /// Implementations must not retry; the fetcher owns retry policy.
    async fn fetch(&self, date: Option<NaiveDate>) -> Result<RemoteItem, SourceError>;
}
