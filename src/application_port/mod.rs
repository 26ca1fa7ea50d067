mod access_verifier;
mod authorization_service;
mod client_service;
mod consent_service;
mod error;
mod refresh_coordinator;
mod revocation_service;
mod token_codec;

pub use access_verifier::*;
pub use authorization_service::*;
pub use client_service::*;
pub use consent_service::*;
pub use error::*;
pub use refresh_coordinator::*;
pub use revocation_service::*;
pub use token_codec::*;
