//! # insight_chat - Document upload and chat workflow for InsightAI
//!
//! This crate provides the client side of the InsightAI document assistant:
//! - Upload gating against the supported document types
//! - A typed HTTP client for the document backend (`/upload`, `/ask`)
//! - The chat session state machine and its transcript
//! - The workflow controller sequencing upload, processing and chat
//!
//! All state lives in owned values with explicit transitions, so the whole
//! workflow can be driven and tested without any rendering surface.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌────────────────────┐     ┌─────────────────┐
//! │   UploadGate    │────▶│ WorkflowController │────▶│ DocumentClient  │
//! └─────────────────┘     └─────────┬──────────┘     └────────▲────────┘
//!                                   │                         │
//!                                   ▼                         │
//!                         ┌───────────────────┐               │
//!                         │    ChatSession    │───── ask ─────┘
//!                         └───────────────────┘
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod gate;
pub mod notify;
pub mod session;
pub mod types;
pub mod workflow;

pub use client::*;
pub use config::*;
pub use error::*;
pub use gate::*;
pub use notify::*;
pub use session::*;
pub use types::*;
pub use workflow::*;
