use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use validator::Validate;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_DATABASE_URL: &str = "sqlite://daigou.db?mode=rwc";
const DEFAULT_EXPORT_LOCALE: &str = "ko-KR";
const DEFAULT_TEMPLATE_DIR: &str = "config/channel_formats";
const DEFAULT_EXPORT_DIR: &str = "./exports";

/// Process-wide pricing defaults. Every value can be overridden per product
/// or per export call; these are the last layer of the resolution chain.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct PricingConfig {
    /// CNY -> KRW exchange rate applied when neither the call nor the
    /// product carries one.
    #[serde(default = "default_exchange_rate")]
    pub exchange_rate: f64,

    /// Margin as a percentage of the landed cost (15 means +15%).
    #[serde(default = "default_margin_rate")]
    pub margin_rate: f64,

    /// VAT as a percentage (10 means +10%).
    #[serde(default = "default_vat_rate")]
    pub vat_rate: f64,

    /// Flat KRW delivery fee added to the landed cost.
    #[serde(default = "default_delivery_fee")]
    pub delivery_fee: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            exchange_rate: default_exchange_rate(),
            margin_rate: default_margin_rate(),
            vat_rate: default_vat_rate(),
            delivery_fee: default_delivery_fee(),
        }
    }
}

/// Catalog export configuration.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct ExportConfig {
    /// Locale used when neither the request nor the template names one.
    #[serde(default = "default_export_locale")]
    pub default_locale: String,

    /// Directory holding `{channel}_{type}.{yaml|yml|json}` template files.
    #[serde(default = "default_template_dir")]
    pub template_dir: String,

    /// Directory where generated catalog files are archived.
    #[serde(default = "default_export_dir")]
    pub export_dir: String,

    /// Return-policy image appended to every exported description when set.
    #[serde(default)]
    pub return_policy_image_url: Option<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            default_locale: default_export_locale(),
            template_dir: default_template_dir(),
            export_dir: default_export_dir(),
            return_policy_image_url: None,
        }
    }
}

/// Application configuration, layered from `config/default.toml` (optional)
/// under `APP__`-prefixed environment variables.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct AppConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub pricing: PricingConfig,

    #[serde(default)]
    pub export: ExportConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            pricing: PricingConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from the optional `config/default` file and the
    /// environment (e.g. `APP__DATABASE_URL`, `APP__PRICING__MARGIN_RATE`).
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;
        settings.try_deserialize()
    }
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_database_url() -> String {
    DEFAULT_DATABASE_URL.to_string()
}

fn default_exchange_rate() -> f64 {
    185.2
}

fn default_margin_rate() -> f64 {
    15.0
}

fn default_vat_rate() -> f64 {
    10.0
}

fn default_delivery_fee() -> f64 {
    3500.0
}

fn default_export_locale() -> String {
    DEFAULT_EXPORT_LOCALE.to_string()
}

fn default_template_dir() -> String {
    DEFAULT_TEMPLATE_DIR.to_string()
}

fn default_export_dir() -> String {
    DEFAULT_EXPORT_DIR.to_string()
}
