//! # Clipnote Bridge
//!
//! Request/response RPC that lets untrusted code borrow a signing capability
//! living in a separate, isolated context.
//!
//! ## Model
//!
//! Both sides share one broadcast [`BridgeChannel`]. Every message carries a
//! `source`, a `type` and the session's [`BridgeToken`]; both sides drop
//! anything that does not match what they expect.
//!
//! - [`BridgeSession`] - the caller side: readiness handshake, correlation
//!   ids, per-call timeouts
//! - [`CapabilityProvider`] - the signer side: token check, allow-list,
//!   dispatch to a [`Signer`]
//! - [`ContextLauncher`] - establishes the isolated context
//!
//! ## Typed access
//!
//! [`SignerCapability`] exposes the five allow-listed operations. Use
//! [`BridgeClient`] across an isolation boundary and [`DirectSigner`] when
//! there is none.

pub mod channel;
pub mod client;
pub mod error;
pub mod messages;
pub mod preferences;
pub mod provider;
pub mod session;
pub mod signer;

pub use channel::BridgeChannel;
pub use client::{BridgeClient, DirectSigner, SignerCapability};
pub use error::{BridgeError, Result};
pub use messages::{BridgeMessage, BridgeMethod, BridgeToken};
pub use preferences::{RelayPolicy, RelayPreferences};
pub use provider::{CapabilityProvider, ContextLauncher, InProcessLauncher, LaunchError};
pub use session::{BridgeConfig, BridgeSession, SessionState};
pub use signer::{Signer, SignerError, SignerInfo, DEFAULT_SIGNER_NAME};
