// clock

mod clock;

pub use clock::*;

// store

mod offline_session_store;

pub use offline_session_store::*;

// repo

mod client_repo;
mod consent_repo;

pub use client_repo::*;
pub use consent_repo::*;

// events

mod event_sink;

pub use event_sink::*;
