mod server;
mod flow_sweeper;
mod event_publisher_impl;

pub use server::*;
pub use flow_sweeper::*;
pub use event_publisher_impl::*;
