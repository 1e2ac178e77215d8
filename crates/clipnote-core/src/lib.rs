//! # Clipnote Core
//!
//! Pure primitives for Clipnote: events, canonical serialization, content
//! hashing and integrity verification.
//!
//! This crate contains no I/O, no storage, no networking. It is pure computation
//! over the event data structures that travel between the signer and relays.
//!
//! ## Key Types
//!
//! - [`UnsignedEvent`] - A draft note, built locally, not yet signed
//! - [`SignedEvent`] - A note carrying its content hash (`id`) and signature
//! - [`EventId`] - Content-addressed identifier (SHA-256 of the canonical form)
//! - [`Tag`] - An ordered, labeled tag
//!
//! ## Canonicalization
//!
//! Event ids are computed over the compact JSON array
//! `[0, pubkey, created_at, kind, tags, content]`. See [`canonical`] module.
//!
//! ## Integrity
//!
//! The signer is an untrusted party. [`verify_integrity`] checks every field it
//! could have altered against the original draft before an event is allowed
//! onto the network.

pub mod canonical;
pub mod crypto;
pub mod error;
pub mod event;
pub mod types;
pub mod validation;

pub use canonical::canonical_bytes;
pub use crypto::{compute_event_id, is_hex, Sha256Hash};
pub use error::{CoreError, IntegrityError};
pub use event::{EventBuilder, Kind, SignedEvent, Tag, UnsignedEvent};
pub use types::{EventId, PUBKEY_HEX_LEN, EVENT_ID_HEX_LEN, SIGNATURE_HEX_LEN};
pub use validation::{verify_integrity, verify_signed_event};
