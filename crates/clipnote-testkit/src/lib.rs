//! # Clipnote Testkit
//!
//! Testing utilities for Clipnote.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known events with expected ids for cross-platform verification
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: A scriptable signer and helpers that wire it to a bridge or relays
//!
//! ## Golden Vectors
//!
//! ```rust
//! use clipnote_testkit::vectors::{all_vectors, event_from_vector};
//!
//! for vector in all_vectors() {
//!     let event = event_from_vector(&vector);
//!     println!("{}: {}", vector.name, event.compute_id().to_hex());
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use clipnote_testkit::fixtures::{TamperMode, TestSigner};
//!
//! let honest = TestSigner::new();
//! let forger = TestSigner::new().with_tamper(TamperMode::ChangeContent);
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{
    bridged_client, history_record, publisher, signed_note, TamperMode, TestSigner, TEST_PUBKEY,
    TEST_SIGNATURE,
};
pub use generators::{event_from_params, EventParams};
pub use vectors::{all_vectors, event_from_vector, verify_all_vectors, GoldenVector};
