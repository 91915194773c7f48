//! ports - 抽象 trait 层
//!
//! 网关只依赖这里的接口，具体实现位于 `crates/adapters/*`

mod code_store;
mod identity;
mod script;
mod sms;

pub use code_store::*;
pub use identity::*;
pub use script::*;
pub use sms::*;
