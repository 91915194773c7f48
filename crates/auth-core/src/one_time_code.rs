//! 短信验证码
//!
//! 6 位数字，有效期 300 秒，验证成功或过期后即失效。

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

/// 验证码有效期（秒）
pub const CODE_TTL_SECS: i64 = 300;

const CODE_MIN: u32 = 100_000;
const CODE_MAX: u32 = 999_999;

/// 生成 6 位验证码
pub fn generate_code() -> String {
    rand::thread_rng().gen_range(CODE_MIN..=CODE_MAX).to_string()
}

/// 校验结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeCheck {
    Matched,
    Mismatch,
    Expired,
}

impl CodeCheck {
    /// 是否需要删除该条目
    pub fn removes_entry(self) -> bool {
        matches!(self, CodeCheck::Matched | CodeCheck::Expired)
    }

    pub fn is_match(self) -> bool {
        self == CodeCheck::Matched
    }
}

/// 待验证的验证码
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneTimeCode {
    pub phone: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

impl OneTimeCode {
    /// 为手机号生成新验证码
    pub fn issue(phone: impl Into<String>, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self::with_code(phone, generate_code(), now + ttl)
    }

    pub fn with_code(
        phone: impl Into<String>,
        code: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            phone: phone.into(),
            code: code.into(),
            expires_at,
        }
    }

    /// 恰好在 `expires_at` 时仍然有效
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// 比对提交的验证码，过期优先于比对
    pub fn check(&self, submitted: &str, now: DateTime<Utc>) -> CodeCheck {
        if self.is_expired(now) {
            CodeCheck::Expired
        } else if self.code == submitted.trim() {
            CodeCheck::Matched
        } else {
            CodeCheck::Mismatch
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_generated_codes_are_six_digits() {
        for _ in 0..1000 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            let n: u32 = code.parse().unwrap();
            assert!((CODE_MIN..=CODE_MAX).contains(&n));
        }
    }

    #[test]
    fn test_issue_sets_expiry() {
        let code = OneTimeCode::issue("13800000000", t0(), Duration::seconds(CODE_TTL_SECS));
        assert_eq!(code.phone, "13800000000");
        assert_eq!(code.expires_at, t0() + Duration::seconds(300));
    }

    #[test]
    fn test_check_outcomes() {
        let code = OneTimeCode::with_code("13800000000", "123456", t0() + Duration::seconds(300));

        assert_eq!(code.check("123456", t0()), CodeCheck::Matched);
        assert_eq!(code.check(" 123456 ", t0()), CodeCheck::Matched);
        assert_eq!(code.check("654321", t0()), CodeCheck::Mismatch);
        assert_eq!(
            code.check("123456", t0() + Duration::seconds(300)),
            CodeCheck::Matched
        );
        assert_eq!(
            code.check("123456", t0() + Duration::seconds(301)),
            CodeCheck::Expired
        );
        assert_eq!(
            code.check("654321", t0() + Duration::seconds(301)),
            CodeCheck::Expired
        );
    }

    #[test]
    fn test_entry_removal_policy() {
        assert!(CodeCheck::Matched.removes_entry());
        assert!(CodeCheck::Expired.removes_entry());
        assert!(!CodeCheck::Mismatch.removes_entry());
        assert!(CodeCheck::Matched.is_match());
        assert!(!CodeCheck::Expired.is_match());
    }
}
