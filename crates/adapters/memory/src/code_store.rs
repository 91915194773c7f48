//! 进程内验证码存储

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::Duration;
use parking_lot::Mutex;
use portal_auth_core::{CODE_TTL_SECS, OneTimeCode};
use portal_common::{SharedClock, SystemClock, normalize_phone};
use portal_errors::AppResult;
use portal_ports::CodeStore;
use tokio::task::JoinHandle;
use tracing::debug;

/// 内存验证码存储
///
/// 每次 issue / verify 都在同一把锁内完成，同一手机号的操作天然线性化。
pub struct MemoryCodeStore {
    entries: Mutex<HashMap<String, OneTimeCode>>,
    clock: SharedClock,
    ttl: Duration,
}

impl Default for MemoryCodeStore {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl MemoryCodeStore {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
            ttl: Duration::seconds(CODE_TTL_SECS),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// 保存指定验证码（覆盖已有条目）
    pub fn insert(&self, entry: OneTimeCode) {
        let phone = normalize_phone(&entry.phone);
        self.entries.lock().insert(phone, entry);
    }

    /// 当前条目数
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// 清除所有已过期条目，返回清除数量
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    /// 启动后台清理任务
    pub fn spawn_sweeper(self: &Arc<Self>, every: StdDuration) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.tick().await;
            loop {
                interval.tick().await;
                let removed = store.sweep_expired();
                if removed > 0 {
                    debug!(removed, "Swept expired verification codes");
                }
            }
        })
    }
}

#[async_trait]
impl CodeStore for MemoryCodeStore {
    async fn issue(&self, phone: &str) -> AppResult<String> {
        let phone = normalize_phone(phone);
        let entry = OneTimeCode::issue(phone.clone(), self.clock.now(), self.ttl);
        let code = entry.code.clone();
        self.entries.lock().insert(phone, entry);
        Ok(code)
    }

    async fn verify(&self, phone: &str, code: &str) -> AppResult<bool> {
        let phone = normalize_phone(phone);
        let now = self.clock.now();
        let mut entries = self.entries.lock();

        let Some(entry) = entries.get(&phone) else {
            return Ok(false);
        };

        let outcome = entry.check(code, now);
        if outcome.removes_entry() {
            entries.remove(&phone);
        }
        Ok(outcome.is_match())
    }

    async fn delete(&self, phone: &str, code: &str) -> AppResult<bool> {
        let phone = normalize_phone(phone);
        let mut entries = self.entries.lock();
        match entries.get(&phone) {
            Some(entry) if entry.code == code => {
                entries.remove(&phone);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
