mod client;
mod event;
mod grant;
mod offline_session;
mod scope;
mod token;
mod user;

pub use client::*;
pub use event::*;
pub use grant::*;
pub use offline_session::*;
pub use scope::*;
pub use token::*;
pub use user::*;
