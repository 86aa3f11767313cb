//! Google Calendar provider implementation.
//!
//! [`GoogleProvider`] answers free/busy queries through the `freeBusy`
//! endpoint and creates confirmed meetings through `events.insert`, with a
//! Google Meet conference attached on request.
//!
//! Authentication is a bearer access token supplied by configuration.
//!
//! # Example
//!
//! ```ignore
//! use mailslot_providers::google::{GoogleConfig, GoogleProvider};
//!
//! let provider = GoogleProvider::new(GoogleConfig::new(token).with_calendar_id("primary"))?;
//! let busy = provider.query_free_busy(FreeBusyQuery::new(from, to)).await?;
//! ```

mod client;
mod config;
mod provider;

pub use client::GoogleCalendarClient;
pub use config::{CALENDAR_API_BASE, GoogleConfig, SendUpdates};
pub use provider::GoogleProvider;
