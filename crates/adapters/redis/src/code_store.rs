//! Redis 验证码存储
//!
//! 每个手机号一个 hash：`portal:sms:<phone>` → `{code, expires_at}`，
//! 键 TTL 比验证码有效期多 1 秒，过期判断仍以 `expires_at` 为准。

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use portal_auth_core::{CODE_TTL_SECS, OneTimeCode};
use portal_common::{SharedClock, SystemClock, normalize_phone};
use portal_errors::{AppError, AppResult};
use portal_ports::CodeStore;
use redis::aio::ConnectionManager;
use redis::Script;
use tracing::debug;

const KEY_PREFIX: &str = "portal:sms:";

/// 校验脚本
///
/// 返回 0 = 不存在，1 = 匹配（已删除），2 = 不匹配（保留），3 = 已过期（已删除）
const VERIFY_SCRIPT: &str = r"
local entry = redis.call('HMGET', KEYS[1], 'code', 'expires_at')
if not entry[1] then
    return 0
end
if tonumber(ARGV[2]) > tonumber(entry[2]) then
    redis.call('DEL', KEYS[1])
    return 3
end
if entry[1] == ARGV[1] then
    redis.call('DEL', KEYS[1])
    return 1
end
return 2
";

/// 撤回脚本：仅当保存的仍是该验证码时删除，返回删除的键数
const DELETE_SCRIPT: &str = r"
if redis.call('HGET', KEYS[1], 'code') == ARGV[1] then
    return redis.call('DEL', KEYS[1])
end
return 0
";

fn code_key(phone: &str) -> String {
    format!("{}{}", KEY_PREFIX, phone)
}

/// Redis 验证码存储
pub struct RedisCodeStore {
    conn: ConnectionManager,
    clock: SharedClock,
    ttl: Duration,
    verify_script: Script,
    delete_script: Script,
}

impl RedisCodeStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self::with_clock(conn, Arc::new(SystemClock))
    }

    pub fn with_clock(conn: ConnectionManager, clock: SharedClock) -> Self {
        Self {
            conn,
            clock,
            ttl: Duration::seconds(CODE_TTL_SECS),
            verify_script: Script::new(VERIFY_SCRIPT),
            delete_script: Script::new(DELETE_SCRIPT),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

#[async_trait]
impl CodeStore for RedisCodeStore {
    async fn issue(&self, phone: &str) -> AppResult<String> {
        let phone = normalize_phone(phone);
        let entry = OneTimeCode::issue(phone.clone(), self.clock.now(), self.ttl);
        let key = code_key(&phone);
        let mut conn = self.conn.clone();

        redis::pipe()
            .atomic()
            .del(&key)
            .ignore()
            .hset_multiple(
                &key,
                &[
                    ("code", entry.code.clone()),
                    ("expires_at", entry.expires_at.timestamp().to_string()),
                ],
            )
            .ignore()
            .expire(&key, self.ttl.num_seconds() + 1)
            .ignore()
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| AppError::external_unavailable(format!("Redis issue code failed: {}", e)))?;

        Ok(entry.code)
    }

    async fn verify(&self, phone: &str, code: &str) -> AppResult<bool> {
        let phone = normalize_phone(phone);
        let mut conn = self.conn.clone();

        let outcome: i64 = self
            .verify_script
            .key(code_key(&phone))
            .arg(code.trim())
            .arg(self.clock.unix_seconds())
            .invoke_async(&mut conn)
            .await
            .map_err(|e| {
                AppError::external_unavailable(format!("Redis verify code failed: {}", e))
            })?;

        if outcome == 3 {
            debug!(phone = %phone, "Verification code expired");
        }
        Ok(outcome == 1)
    }

    async fn delete(&self, phone: &str, code: &str) -> AppResult<bool> {
        let mut conn = self.conn.clone();
        let removed: i64 = self
            .delete_script
            .key(code_key(&normalize_phone(phone)))
            .arg(code)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| {
                AppError::external_unavailable(format!("Redis delete code failed: {}", e))
            })?;
        Ok(removed > 0)
    }
}
