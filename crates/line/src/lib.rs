//! LINE Messaging API adapter for LedgerLens.
//!
//! Everything that talks to the LINE platform lives here behind narrow traits,
//! so the webhook consumer can be exercised without the network:
//!
//! - [`TokenProvider`]: short-lived channel access tokens, cached and refreshed
//!   single-flight by [`CredentialCache`].
//! - [`WebhookVerifier`]: signature check plus event decoding.
//! - [`MessagingApi`]: content download and reply delivery.
//! - [`IdTokenVerifier`]: LINE Login ID-token verification for account linking.

pub mod client;
pub mod error;
pub mod events;
pub mod login;
pub mod signature;
pub mod token;

pub use client::{build_http_client, LineClient, MessagingApi};
pub use error::{LineError, LineResult};
pub use events::*;
pub use login::{IdTokenVerifier, LineLogin, LineProfile};
pub use signature::{ChannelSecretVerifier, WebhookVerifier, SIGNATURE_HEADER};
pub use token::{
    Credential, CredentialCache, HttpTokenExchange, IssuedToken, TokenExchange, TokenProvider,
};
