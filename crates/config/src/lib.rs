//! config - 配置加载库
//!
//! 加载顺序（后者覆盖前者）：
//! 1. `{config_dir}/default.toml`
//! 2. `{config_dir}/{APP_ENV}.toml`
//! 3. `PORTAL_` 前缀环境变量，`__` 表示嵌套（如 `PORTAL_JWT__SECRET`）
//! 4. 旧部署使用的环境变量名（`JWT_SECRET`、`USER_AIR_URL` 等）

use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use secrecy::Secret;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] figment::Error),
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// 令牌配置
///
/// 有效期固定为 7 天，不可配置。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JwtConfig {
    /// 签名密钥；缺失时登录与鉴权返回配置错误
    #[serde(default)]
    pub secret: Option<Secret<String>>,
}

/// 会话 Cookie 配置
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// 是否只在 HTTPS 下发送
    #[serde(default)]
    pub secure: bool,
}

fn default_cookie_name() -> String {
    "auth_token".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            secure: false,
        }
    }
}

/// 验证码存储后端
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeStoreBackend {
    #[default]
    Memory,
    Redis,
}

/// 验证码存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct CodeStoreConfig {
    #[serde(default)]
    pub backend: CodeStoreBackend,
    #[serde(default)]
    pub redis_url: Option<Secret<String>>,
    #[serde(default = "default_code_ttl_secs")]
    pub ttl_secs: i64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_code_ttl_secs() -> i64 {
    300
}

fn default_sweep_interval_secs() -> u64 {
    60
}

impl Default for CodeStoreConfig {
    fn default() -> Self {
        Self {
            backend: CodeStoreBackend::default(),
            redis_url: None,
            ttl_secs: default_code_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

/// 短信网关配置
#[derive(Debug, Clone, Deserialize)]
pub struct SmsConfig {
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub template_code: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    8
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            template_code: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// 各 AirScript 脚本地址
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScriptUrls {
    /// 人员名单
    pub users: Option<String>,
    /// 应用菜单
    pub menu: Option<String>,
    /// 排班
    pub scheduler: Option<String>,
    /// 美容师手工数据
    pub manual_data: Option<String>,
    /// 绩效
    pub performance: Option<String>,
    /// 文档列表
    pub articles: Option<String>,
    /// 培训记录
    pub training: Option<String>,
    /// 病例
    pub clinic: Option<String>,
    /// 病例按姓名搜索
    pub clinic_search: Option<String>,
    /// 历史记录
    pub history: Option<String>,
    /// 工资
    pub wages: Option<String>,
}

/// AirScript 配置
#[derive(Debug, Clone, Deserialize)]
pub struct AirScriptConfig {
    #[serde(default)]
    pub token: Option<Secret<String>>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub scripts: ScriptUrls,
}

impl Default for AirScriptConfig {
    fn default() -> Self {
        Self {
            token: None,
            timeout_secs: default_timeout_secs(),
            scripts: ScriptUrls::default(),
        }
    }
}

/// 微信公众号配置
#[derive(Debug, Clone, Deserialize)]
pub struct WechatConfig {
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(default)]
    pub app_secret: Option<Secret<String>>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_openid_cache_ttl_secs")]
    pub openid_cache_ttl_secs: u64,
    #[serde(default = "default_openid_cache_capacity")]
    pub openid_cache_capacity: u64,
}

fn default_openid_cache_ttl_secs() -> u64 {
    600
}

fn default_openid_cache_capacity() -> u64 {
    10_000
}

impl Default for WechatConfig {
    fn default() -> Self {
        Self {
            app_id: None,
            app_secret: None,
            timeout_secs: default_timeout_secs(),
            openid_cache_ttl_secs: default_openid_cache_ttl_secs(),
            openid_cache_capacity: default_openid_cache_capacity(),
        }
    }
}

/// 遥测配置
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// 输出 JSON 日志
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json: false,
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default = "default_app_env")]
    pub app_env: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub jwt: JwtConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub code_store: CodeStoreConfig,
    #[serde(default)]
    pub sms: SmsConfig,
    #[serde(default)]
    pub airscript: AirScriptConfig,
    #[serde(default)]
    pub wechat: WechatConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    /// 前端静态文件目录
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            app_env: default_app_env(),
            server: ServerConfig::default(),
            jwt: JwtConfig::default(),
            session: SessionConfig::default(),
            code_store: CodeStoreConfig::default(),
            sms: SmsConfig::default(),
            airscript: AirScriptConfig::default(),
            wechat: WechatConfig::default(),
            telemetry: TelemetryConfig::default(),
            static_dir: default_static_dir(),
        }
    }
}

fn default_app_name() -> String {
    "staff-portal".to_string()
}

fn default_app_env() -> String {
    "development".to_string()
}

fn default_static_dir() -> String {
    "dist".to_string()
}

/// 旧环境变量名到配置路径的映射
const LEGACY_ENV: &[(&str, &str)] = &[
    ("JWT_SECRET", "jwt.secret"),
    ("SMS_API_URL", "sms.api_url"),
    ("SMS_TEMPLATE_CODE", "sms.template_code"),
    ("AIRSCRIPT_TOKEN", "airscript.token"),
    ("USER_AIR_URL", "airscript.scripts.users"),
    ("APP_AIR_URL", "airscript.scripts.menu"),
    ("SCHEDULER_AIR_URL", "airscript.scripts.scheduler"),
    ("SERVER_MANUAL_URL", "airscript.scripts.manual_data"),
    ("MANUAL_AIR_URL", "airscript.scripts.performance"),
    ("ARTICLE_AIR_URL", "airscript.scripts.articles"),
    ("TRAINING_AIR_URL", "airscript.scripts.training"),
    ("CLINIC_AIR_URL", "airscript.scripts.clinic"),
    ("SERCH_AIR_URL", "airscript.scripts.clinic_search"),
    ("HISTORY_AIR_URL", "airscript.scripts.history"),
    ("WAGES_AIR_URL", "airscript.scripts.wages"),
    ("WECHAT_APPID", "wechat.app_id"),
    ("WECHAT_SECRET", "wechat.app_secret"),
    ("REDIS_URL", "code_store.redis_url"),
    ("PORT", "server.port"),
    ("APP_ENV", "app_env"),
];

fn legacy_key(env_key: &str) -> Option<&'static str> {
    LEGACY_ENV
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(env_key))
        .map(|(_, path)| *path)
}

impl AppConfig {
    /// 构建配置源
    pub fn figment(config_dir: &str) -> Figment {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        Figment::new()
            .merge(Toml::file(format!("{}/default.toml", config_dir)))
            .merge(Toml::file(format!("{}/{}.toml", config_dir, env)))
            .merge(Env::prefixed("PORTAL_").split("__"))
            .merge(Env::raw().filter_map(|key| legacy_key(key.as_str()).map(Into::into)))
    }

    /// 从配置文件和环境变量加载配置
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        // .env 不存在时忽略
        let _ = dotenvy::dotenv();

        Self::from_figment(Self::figment(config_dir))
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        Ok(figment.extract()?)
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }

    /// 是否为开发环境
    pub fn is_development(&self) -> bool {
        self.app_env == "development"
    }
}
