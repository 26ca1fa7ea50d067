mod access_verifier_impl;
mod authorization_service_impl;
mod client_service_impl;
mod consent_service_impl;
mod grant_locks;
mod jwt_codec;
mod refresh_coordinator_impl;
mod revocation_service_impl;
mod token_issuer;

pub use access_verifier_impl::*;
pub use authorization_service_impl::*;
pub use client_service_impl::*;
pub use consent_service_impl::*;
pub use grant_locks::*;
pub use jwt_codec::*;
pub use refresh_coordinator_impl::*;
pub use revocation_service_impl::*;
pub use token_issuer::*;
