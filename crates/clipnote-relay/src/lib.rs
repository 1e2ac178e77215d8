//! # Clipnote Relay
//!
//! Broadcasts a signed event to several independent relays concurrently and
//! aggregates their verdicts.
//!
//! ## Protocol
//!
//! Per relay: validate the endpoint (`wss://` only), connect, send
//! `["EVENT", event]`, wait for `["OK", id, accepted, reason]` naming the
//! event. A transport failure is `"socket error"`, running out of time is
//! `"timeout"`, and a clean close with no verdict counts as sent.
//!
//! Across relays: at most six endpoints, all attempted at once, and the
//! [`PublishReport`] is built only after every attempt has settled.

pub mod endpoint;
pub mod error;
pub mod messages;
pub mod publish;
pub mod transport;

pub use endpoint::{normalize_relays, RelayUrl};
pub use error::{RelayError, Result};
pub use messages::{ClientMessage, RelayMessage};
pub use publish::{
    PublishConfig, PublishDetail, PublishOutcome, PublishReport, Publisher, DEFAULT_RELAYS,
};
pub use transport::{RelayConnection, RelayConnector, WsConnector};
