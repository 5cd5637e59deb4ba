//! Server configuration.
//!
//! Everything is read from `CHK_*` environment variables (a `.env` file is loaded first, if present). Missing or
//! invalid values are logged and replaced with defaults, so a misconfigured server still starts and says what is wrong.
//! Run `checkout_server --help` for the full list.
use std::{env, net::IpAddr};

use checkout_clients::{LmsConfig, SdnConfig};
use checkout_common::{helpers::parse_boolean_flag, Secret};
use checkout_engine::{db::db_url, helpers::SiteConfig, processors::CybersourceConfig};
use log::*;

use crate::errors::ServerError;

const DEFAULT_CHK_HOST: &str = "127.0.0.1";
const DEFAULT_CHK_PORT: u16 = 8370;
const DEFAULT_SITE: &str = "edx";
const DEFAULT_PARTNER_SHORT_CODE: &str = "EDX";
const DEFAULT_ECOMMERCE_URL_ROOT: &str = "http://localhost:8002";
const DEFAULT_LANGUAGE_CODE: &str = "en";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_forwarded: bool,
    pub site: SiteSettings,
    pub cybersource: CybersourceConfig,
    /// If supplied, payment notifications are only accepted from these addresses.
    pub cybersource_whitelist: Option<Vec<IpAddr>>,
    pub sdn: SdnConfig,
    pub lms: LmsConfig,
    /// Used for calls to the LMS credit API
    pub lms_access_token: Secret<String>,
}

/// The raw site settings. Call [`SiteSettings::site_config`] to validate the URLs.
#[derive(Clone, Debug, Default)]
pub struct SiteSettings {
    pub site: String,
    pub partner_short_code: String,
    pub ecommerce_url_root: String,
    pub enable_otto_receipt_page: bool,
    pub enable_sdn_check: bool,
    pub payment_support_email: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_CHK_HOST.to_string(),
            port: DEFAULT_CHK_PORT,
            database_url: String::default(),
            auth: AuthConfig::default(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            site: SiteSettings::default(),
            cybersource: CybersourceConfig::default(),
            cybersource_whitelist: None,
            sdn: SdnConfig::default(),
            lms: LmsConfig::default(),
            lms_access_token: Secret::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("CHK_HOST").ok().unwrap_or_else(|| DEFAULT_CHK_HOST.into());
        let port = env::var("CHK_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for CHK_PORT. {e} Using the default, {DEFAULT_CHK_PORT}, instead."
                    );
                    DEFAULT_CHK_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_CHK_PORT);
        let database_url = db_url();
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!("🪛️ {e}. Every authenticated request will be refused.");
            AuthConfig::default()
        });
        let use_x_forwarded_for = parse_boolean_flag(env::var("CHK_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("CHK_USE_FORWARDED").ok(), false);
        let site = SiteSettings::from_env_or_default();
        let cybersource = cybersource_config_from_env();
        let cybersource_whitelist = env::var("CHK_CYBERSOURCE_IP_WHITELIST").ok().and_then(|s| parse_ip_whitelist(&s));
        log_whitelist(&cybersource_whitelist);
        let sdn = SdnConfig::new_from_env_or_default();
        let lms = LmsConfig::new_from_env_or_default();
        let lms_access_token = Secret::new(env::var("CHK_LMS_ACCESS_TOKEN").unwrap_or_else(|_| {
            warn!("🪛️ CHK_LMS_ACCESS_TOKEN is not set. Credit provider details will not be available on receipts.");
            String::default()
        }));
        Self {
            host,
            port,
            database_url,
            auth,
            use_x_forwarded_for,
            use_forwarded,
            site,
            cybersource,
            cybersource_whitelist,
            sdn,
            lms,
            lms_access_token,
        }
    }

    pub fn site_config(&self) -> Result<SiteConfig, ServerError> {
        self.site.site_config(&self.lms.lms_url_root)
    }
}

impl SiteSettings {
    pub fn from_env_or_default() -> Self {
        let site = env::var("CHK_SITE").unwrap_or_else(|_| {
            info!("🪛️ CHK_SITE is not set. Using {DEFAULT_SITE}.");
            DEFAULT_SITE.to_string()
        });
        let partner_short_code = env::var("CHK_PARTNER_SHORT_CODE").unwrap_or_else(|_| {
            info!("🪛️ CHK_PARTNER_SHORT_CODE is not set. Using {DEFAULT_PARTNER_SHORT_CODE}.");
            DEFAULT_PARTNER_SHORT_CODE.to_string()
        });
        let ecommerce_url_root = env::var("CHK_ECOMMERCE_URL_ROOT").unwrap_or_else(|_| {
            warn!("🪛️ CHK_ECOMMERCE_URL_ROOT is not set. Using {DEFAULT_ECOMMERCE_URL_ROOT}.");
            DEFAULT_ECOMMERCE_URL_ROOT.to_string()
        });
        let enable_otto_receipt_page = parse_boolean_flag(env::var("CHK_ENABLE_OTTO_RECEIPT_PAGE").ok(), false);
        let enable_sdn_check = parse_boolean_flag(env::var("CHK_ENABLE_SDN_CHECK").ok(), false);
        if !enable_sdn_check {
            info!("🪛️ SDN screening is disabled. Set CHK_ENABLE_SDN_CHECK=1 to enable it.");
        }
        let payment_support_email = env::var("CHK_PAYMENT_SUPPORT_EMAIL").unwrap_or_else(|_| {
            warn!("🪛️ CHK_PAYMENT_SUPPORT_EMAIL is not set. Customers will not be shown a support address.");
            String::default()
        });
        Self {
            site,
            partner_short_code,
            ecommerce_url_root,
            enable_otto_receipt_page,
            enable_sdn_check,
            payment_support_email,
        }
    }

    pub fn site_config(&self, lms_url_root: &str) -> Result<SiteConfig, ServerError> {
        let mut config = SiteConfig::new(&self.site, &self.partner_short_code, lms_url_root, &self.ecommerce_url_root)
            .map_err(|e| ServerError::ConfigurationError(format!("Invalid site URL. {e}")))?;
        config.enable_otto_receipt_page = self.enable_otto_receipt_page;
        config.enable_sdn_check = self.enable_sdn_check;
        config.payment_support_email = self.payment_support_email.clone();
        Ok(config)
    }
}

fn cybersource_config_from_env() -> CybersourceConfig {
    let required = |name: &str| {
        env::var(name).unwrap_or_else(|_| {
            error!("🪛️ {name} is not set. Payments cannot be taken until it is.");
            String::default()
        })
    };
    let profile_id = required("CHK_CYBERSOURCE_PROFILE_ID");
    let access_key = required("CHK_CYBERSOURCE_ACCESS_KEY");
    let secret_key = Secret::new(required("CHK_CYBERSOURCE_SECRET_KEY"));
    let payment_page_url = required("CHK_CYBERSOURCE_PAYMENT_PAGE_URL");
    let sop_payment_page_url = required("CHK_CYBERSOURCE_SOP_PAYMENT_PAGE_URL");
    let language_code = env::var("CHK_CYBERSOURCE_LANGUAGE_CODE").unwrap_or_else(|_| DEFAULT_LANGUAGE_CODE.into());
    CybersourceConfig { profile_id, access_key, secret_key, payment_page_url, sop_payment_page_url, language_code }
}

/// Parses a comma-separated list of IP addresses. "none", "false" and "0" explicitly disable the whitelist. Invalid
/// entries are skipped.
pub fn parse_ip_whitelist(s: &str) -> Option<Vec<IpAddr>> {
    if ["none", "false", "0"].contains(&s.trim().to_lowercase().as_str()) {
        info!(
            "🪛️ CyberSource IP whitelist is disabled. If this is not what you want, set CHK_CYBERSOURCE_IP_WHITELIST \
             to a comma-separated list of IP addresses to enable it."
        );
        return None;
    }
    let ip_addrs = s
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| {
            s.parse::<IpAddr>()
                .map_err(|e| warn!("🪛️ Ignoring invalid IP address ({s}) in CHK_CYBERSOURCE_IP_WHITELIST: {e}"))
                .ok()
        })
        .collect::<Vec<IpAddr>>();
    Some(ip_addrs)
}

fn log_whitelist(whitelist: &Option<Vec<IpAddr>>) {
    match whitelist {
        Some(whitelist) if whitelist.is_empty() => {
            warn!(
                "🚨️ The CyberSource IP whitelist was configured, but is empty. The server will run, but won't accept \
                 any payment notifications."
            );
        },
        None => {
            info!("🪛️ No CyberSource IP whitelist is set. Only signature validation will be used.");
        },
        Some(v) => {
            let addrs = v.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ");
            info!("🪛️ CyberSource IP whitelist: {addrs}");
        },
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug, Default)]
pub struct AuthConfig {
    /// The HS256 secret shared with the LMS, used to verify access tokens.
    pub jwt_secret: Secret<String>,
}

impl AuthConfig {
    pub fn new<S: Into<String>>(jwt_secret: S) -> Self {
        Self { jwt_secret: Secret::new(jwt_secret.into()) }
    }

    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret =
            env::var("CHK_JWT_SECRET").map_err(|e| ServerError::ConfigurationError(format!("{e} [CHK_JWT_SECRET]")))?;
        if secret.len() < 32 {
            warn!("🪛️ CHK_JWT_SECRET is shorter than 32 bytes. Use a longer secret in production.");
        }
        Ok(Self::new(secret))
    }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that is used to configure the server's behaviour. Generally we try to keep this
/// as small as possible, and exclude secrets to avoid passing sensitive information around the system.
#[derive(Clone, Debug, Default)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
    /// If supplied, payment notifications are only accepted from these addresses.
    pub cybersource_whitelist: Option<Vec<IpAddr>>,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            use_x_forwarded_for: config.use_x_forwarded_for,
            use_forwarded: config.use_forwarded,
            cybersource_whitelist: config.cybersource_whitelist.clone(),
        }
    }
}
