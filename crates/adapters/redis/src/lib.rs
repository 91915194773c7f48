//! portal-adapter-redis - Redis 适配器

mod code_store;
mod connection;

pub use code_store::*;
pub use connection::*;
