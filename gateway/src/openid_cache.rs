//! openid → 手机号 短期缓存
//!
//! 命中只是提示，调用方必须再确认手机号仍在名单中。
//! 过期条目与超出容量的条目由 Moka 淘汰。

use std::time::Duration;

use moka::sync::Cache;

pub struct OpenIdCache {
    entries: Cache<String, String>,
}

impl OpenIdCache {
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        let entries = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();
        Self { entries }
    }

    pub fn get(&self, openid: &str) -> Option<String> {
        self.entries.get(openid)
    }

    pub fn insert(&self, openid: &str, phone: &str) {
        self.entries.insert(openid.to_string(), phone.to_string());
    }

    pub fn remove(&self, openid: &str) {
        self.entries.invalidate(openid);
    }

    /// 当前条目数（执行待处理的淘汰后统计）
    pub fn len(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }
}
