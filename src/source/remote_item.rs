//! The item type produced by every APOD source.
//!
//! `RemoteItem` is one fetched Astronomy Picture of the Day entry.  Sources
//! deserialize the endpoint's JSON into [`ApodResponse`] and convert it with
//! [`RemoteItem::from`], so the fetcher, state machine and UI never see the
//! wire format.
//!
//! A `RemoteItem` is immutable once built: the fetcher hands it to the state
//! machine by value and nothing mutates it afterwards.

use chrono::NaiveDate;
use serde::Deserialize;

/// Image shown when an item has no usable URL (videos without a thumbnail,
/// missing fields).
pub const PLACEHOLDER_IMAGE_URL: &str =
    "https://images.unsplash.com/photo-1446776653964-20c1d3a81b06?w=1920&q=80";

/// How many characters of the explanation compact views show.
pub const SUMMARY_CHARS: usize = 250;

/// Media classification reported by the endpoint's `media_type` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    /// Anything else the endpoint reports, kept verbatim.
    Other(String),
}

impl MediaKind {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "image" => Self::Image,
            "video" => Self::Video,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Other(raw) => raw,
        }
    }
}

/// Raw JSON body of a successful APOD response.
///
/// Only `date` is mandatory; the endpoint omits `hdurl` for videos and
/// `copyright` for public-domain images.
#[derive(Debug, Clone, Deserialize)]
pub struct ApodResponse {
    pub date: NaiveDate,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub hdurl: Option<String>,
    #[serde(default = "default_media_type")]
    pub media_type: String,
    #[serde(default)]
    pub copyright: Option<String>,
}

fn default_media_type() -> String {
    "image".to_string()
}

/// A single APOD entry, normalised from the endpoint's response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteItem {
    /// Calendar date of the entry; the correlation key for history.
    pub date: NaiveDate,

    /// Decides which of the two URLs is authoritative.
    pub kind: MediaKind,

    /// Preferred source location (the endpoint's `url`).
    pub display_url: Option<String>,

    /// Used when `display_url` is missing (the endpoint's `hdurl`).
    pub fallback_url: Option<String>,

    pub title: String,

    /// Full explanation text.  Never truncated here; see [`RemoteItem::summary`].
    pub description: String,

    pub copyright: Option<String>,
}

impl From<ApodResponse> for RemoteItem {
    fn from(raw: ApodResponse) -> Self {
        Self {
            date: raw.date,
            kind: MediaKind::parse(&raw.media_type),
            display_url: raw.url.filter(|u| !u.is_empty()),
            fallback_url: raw.hdurl.filter(|u| !u.is_empty()),
            title: raw.title,
            description: raw.explanation,
            copyright: raw.copyright.map(|c| c.trim().to_string()),
        }
    }
}

impl RemoteItem {
    /// The URL a renderer should try first.
    ///
    /// Images fall back to the HD url when `url` is absent.  For other media
    /// the HD url is never an image, so only `url` counts.  `None` means the
    /// caller should show [`PLACEHOLDER_IMAGE_URL`].
    pub fn resolved_url(&self) -> Option<&str> {
        match self.kind {
            MediaKind::Image => self
                .display_url
                .as_deref()
                .or(self.fallback_url.as_deref()),
            _ => self.display_url.as_deref(),
        }
    }

    /// The description cut to `max_chars` characters, with `...` appended
    /// when anything was dropped.
    pub fn summary(&self, max_chars: usize) -> String {
        let mut chars = self.description.char_indices();
        match chars.nth(max_chars) {
            Some((cut, _)) => format!("{}...", &self.description[..cut]),
            None => self.description.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
