mod offline_session_store_redis;

pub use offline_session_store_redis::*;
