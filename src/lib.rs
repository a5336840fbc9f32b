//! Voice Relay - session relay for a browser voice assistant
//!
//! The browser transcribes speech and posts the text here; the relay
//! forwards it to a generative-language provider and returns the reply
//! for the browser to speak.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │            Browser (STT / TTS)               │
//! └────────────────────┬─────────────────────────┘
//!                      │ POST /api/voice/{query,interrupt}
//! ┌────────────────────▼─────────────────────────┐
//! │   API  │  VoiceRelay  │  SessionStore        │
//! └────────────────────┬─────────────────────────┘
//!                      │ generate(text)
//! ┌────────────────────▼─────────────────────────┐
//! │   ProviderAdapter  (retry, mock fallback)    │
//! └────────────────────┬─────────────────────────┘
//!                      │ generateContent
//!              Generative Language API
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod persona;
pub mod provider;
pub mod relay;
pub mod session;

pub use api::{ApiServer, ApiServerBuilder, ApiState};
pub use config::Config;
pub use error::{Error, Result};
pub use persona::Persona;
pub use provider::{ProviderAdapter, ProviderFailure, ReplyGenerator, RetryPolicy};
pub use relay::{QueryReply, RelayError, VoiceRelay};
pub use session::{Session, SessionStore};
