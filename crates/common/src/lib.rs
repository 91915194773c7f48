//! common - 通用类型和工具库

pub mod clock;
pub mod fields;
pub mod phone;

pub use clock::*;
pub use fields::*;
pub use phone::*;
