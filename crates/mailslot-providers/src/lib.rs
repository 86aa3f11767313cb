//! Collaborators of the scheduler: calendar free/busy, event creation and
//! meeting intent extraction.
//!
//! - [`FreeBusyProvider`], [`EventWriter`], [`IntentExtractor`] - the traits
//!   the server depends on
//! - [`google::GoogleProvider`] - Google Calendar (free/busy and events)
//! - [`openai::OpenAiExtractor`] - intent extraction via a chat model
//! - [`ProviderError`] - the single error type, with retryability
//!
//! ```text
//!  ┌──────────────┐   ┌──────────────┐
//!  │ Calendar API │   │  Chat model  │
//!  └──────┬───────┘   └──────┬───────┘
//!         ▼                  ▼
//!  ┌──────────────┐   ┌──────────────┐
//!  │GoogleProvider│   │OpenAiExtract.│
//!  └──┬────────┬──┘   └──────┬───────┘
//!     │        │             │
//!  FreeBusy  EventWriter  IntentExtractor
//!     └────────┴─────┬───────┘
//!                    ▼
//!            mailslot-server
//! ```

pub mod error;
#[cfg(feature = "google")]
pub mod google;
#[cfg(any(feature = "google", feature = "openai"))]
mod http;
#[cfg(feature = "openai")]
pub mod openai;
pub mod provider;

pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use provider::{
    BoxFuture, ErrorProvider, EventWriter, FreeBusyProvider, FreeBusyQuery, IntentExtractor,
    StaticFreeBusy, with_timeout,
};
