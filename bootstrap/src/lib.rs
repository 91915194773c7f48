//! portal-bootstrap - 服务启动骨架
//!
//! 日志与指标初始化、关闭信号、外部依赖的装配

mod infrastructure;
mod metrics;
mod retry;
mod runtime;

pub use infrastructure::*;
pub use metrics::*;
pub use retry::*;
pub use runtime::*;
