//! # autoline Core
//!
//! Domain types, traits, and error definitions for the autoline
//! shell-completion assistant. This crate has **no I/O**; it defines the
//! domain model that the history, provider, engine and CLI crates implement
//! against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (history database, completion service,
//! desktop notifications, terminal capture) is a trait here. Implementations
//! live in their respective crates, so the engine can be tested end-to-end
//! with in-memory stand-ins.

pub mod capture;
pub mod error;
pub mod history;
pub mod message;
pub mod notify;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use capture::TerminalCapture;
pub use error::{Error, Result};
pub use history::{HistoryEntry, HistoryFilter, HistoryQuery, HistorySource};
pub use message::{Message, Role};
pub use notify::{NoopNotifier, Notice, NotificationSink};
pub use provider::{Provider, ProviderRequest, StreamChunk};
