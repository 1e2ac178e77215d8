//! # Clipnote
//!
//! Annotate a moment in a video and share it as a signed Nostr note.
//!
//! ## Overview
//!
//! A share takes a [`ClipMoment`] (video, selected time, comment) through
//! these steps:
//!
//! 1. Save the draft to history
//! 2. Confirm a signer is present and learn the author's public key
//! 3. Build the note and have the signer sign it
//! 4. Verify the signed note against the draft, field by field
//! 5. Publish to the author's writable relays, or the defaults
//! 6. Save again with the published event id
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use clipnote::{ClipMoment, ClipnoteConfig, ShareOrchestrator, ShareSession};
//! use clipnote::bridge::{BridgeChannel, BridgeClient, BridgeSession, InProcessLauncher, Signer};
//! use clipnote::relay::{Publisher, WsConnector};
//! use clipnote::store::SqliteHistory;
//!
//! async fn example(signer: Arc<dyn Signer>) {
//!     let config = ClipnoteConfig::default();
//!
//!     // The signer runs behind a bridge session
//!     let launcher = Arc::new(InProcessLauncher::new(signer));
//!     let session = BridgeSession::new(BridgeChannel::default(), launcher, config.bridge.clone());
//!     let client = Arc::new(BridgeClient::new(Arc::new(session)));
//!
//!     let publisher = Publisher::new(Arc::new(WsConnector), config.publish.clone());
//!     let history = Arc::new(SqliteHistory::open("history.db", config.history.clone()).unwrap());
//!     let orchestrator = ShareOrchestrator::new(client, publisher, history);
//!
//!     let moment = ClipMoment::new("dQw4w9WgXcQ", "Never Gonna Give You Up")
//!         .at(42)
//!         .comment("Great moment");
//!     let mut share = ShareSession::new(moment);
//!
//!     match orchestrator.share(&mut share).await {
//!         Ok(report) => println!("{}", report.status()),
//!         Err(e) => println!("{}", e.status()),
//!     }
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `clipnote::core` - Events, canonical form, integrity checks
//! - `clipnote::bridge` - Signer bridge
//! - `clipnote::relay` - Relay publishing
//! - `clipnote::store` - History storage

pub mod config;
pub mod error;
pub mod moment;
pub mod player;
pub mod share;

// Re-export component crates
pub use clipnote_bridge as bridge;
pub use clipnote_core as core;
pub use clipnote_relay as relay;
pub use clipnote_store as store;

// Re-export main types for convenience
pub use config::ClipnoteConfig;
pub use error::{Result, ShareError};
pub use moment::{default_preview, format_timestamp, timestamp_url, ClipMoment};
pub use player::{capture_time, seek_clamped, VideoPlayer};
pub use share::{HistoryApply, ShareOrchestrator, ShareReport, ShareSession, SignerStatus};

// Re-export commonly used core types
pub use clipnote_core::{EventId, IntegrityError, SignedEvent, Tag, UnsignedEvent};
