//! # zero-auth-openid
//!
//! OpenID 2.0 relying party for zero-auth.
//!
//! This crate provides:
//! - Endpoint discovery from an XRDS document, resolved once and cached
//! - Authentication request URLs with an attribute-exchange email request
//! - Callback verification by direct verification with the provider
//! - Replay protection with a bounded response-nonce cache
//!
//! # Security Note
//! Assertions are never verified locally. Every callback is re-submitted to
//! the provider with `openid.mode=check_authentication`, and a response nonce
//! is recorded only after the provider confirmed it.

#![warn(clippy::all)]

pub mod callback;
pub mod client;
pub mod compose;
pub mod config;
pub mod constants;
pub mod discovery;
pub mod errors;
pub mod nonce;
pub mod request;
pub mod verify;

pub use callback::CallbackRequest;
pub use client::OpenIdClient;
pub use compose::compose;
pub use config::OpenIdConfig;
pub use discovery::EndpointResolver;
pub use errors::{OpenIdError, Result};
pub use nonce::{NonceCache, NonceRecord};
pub use request::AuthRequestBuilder;
pub use verify::{CallbackVerifier, Verification, VerificationResponse};
