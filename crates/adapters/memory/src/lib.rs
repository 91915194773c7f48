//! portal-adapter-memory - 进程内适配器

mod code_store;

pub use code_store::*;
