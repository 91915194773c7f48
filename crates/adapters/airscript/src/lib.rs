//! portal-adapter-airscript - WPS AirScript 适配器
//!
//! 所有业务数据都存放在 WPS 多维表格中，通过 AirScript 脚本读写。
//! 这里负责请求封装、响应信封解析、字段别名映射。

mod client;
pub mod envelope;
mod identity;
mod menu;
mod personal;
mod scheduler;
mod sheets;

#[cfg(test)]
mod testing;

pub use client::*;
pub use identity::*;
pub use menu::*;
pub use scheduler::*;
pub use sheets::*;

use std::sync::Arc;

use portal_config::ScriptUrls;
use portal_ports::ScriptRunner;

/// 业务脚本集合
#[derive(Clone)]
pub struct BusinessScripts {
    runner: Arc<dyn ScriptRunner>,
    urls: ScriptUrls,
}

impl BusinessScripts {
    pub fn new(runner: Arc<dyn ScriptRunner>, urls: ScriptUrls) -> Self {
        Self { runner, urls }
    }
}
