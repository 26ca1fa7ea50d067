mod client_repo_memory;
mod clock;
mod consent_repo_memory;
mod event_sink_memory;
mod offline_session_store_memory;

pub use client_repo_memory::*;
pub use clock::*;
pub use consent_repo_memory::*;
pub use event_sink_memory::*;
pub use offline_session_store_memory::*;
