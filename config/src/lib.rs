//! Configuration for Beacon.
//!
//! `~/.beacon/config.toml` is parsed into [`RawConfig`] and then resolved into
//! [`BeaconConfig`]: URLs are parsed, durations checked, passwords hashed and
//! `${VAR}` references expanded. Nothing downstream sees an unvalidated value.

mod raw;

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use beacon_engine::{
    AggregatorSettings, ProbeCheck, ProbeTarget, SmtpSettings, WatcherSettings, default_targets,
};
use beacon_types::{PasswordHash, Principal, Role};
use beacon_upstream::{HttpSettings, hash_password};
use thiserror::Error;
use url::Url;

pub use raw::{
    RawCheck, RawConfig, RawEndpoint, RawHttp, RawPlatform, RawPrincipal, RawProbe, RawServer,
    RawSmtp, RawWatcher,
};

const DEFAULT_PORT: u16 = 8081;
const DEFAULT_TITLE: &str = "Opensolar status dashboard";
const DEFAULT_TEMPLATE: &str = "index";
const DEFAULT_PLATFORM_URL: &str = "https://api2.openx.solar";
const DEFAULT_LEDGER_URL: &str = "https://horizon-testnet.stellar.org";
const DEFAULT_TICKER_URL: &str = "https://api.binance.com/api/v3/ticker/price?symbol=XLMUSDT";
const DEFAULT_EXPLORER_URL: &str = "https://testnet.steexp.com/account/";
const DEFAULT_STABLE_ASSET: &str = "STABLEUSD";
const DEFAULT_PROJECT_INDEX: i64 = 1;
const DEFAULT_RECIPIENT: &str = "aibonitoGsIoJ";
const DEFAULT_ADMIN: &str = "admin";
const DEFAULT_PASSWORD: &str = "password";
const DEFAULT_PROBE_STATUS: i64 = 200;
const DEFAULT_WATCH_INTERVAL_SECS: u64 = 2 * 24 * 60 * 60;
const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
const DEFAULT_SMTP_PORT: u16 = 587;
const PARTICLE_DEVICES_URL: &str = "https://api.particle.io/v1/devices";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigError {
    fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub port: u16,
    /// Serve plain HTTP instead of TLS.
    pub insecure: bool,
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
    pub static_dir: PathBuf,
    pub template_dir: PathBuf,
    pub template: String,
}

/// Fully resolved configuration. Read-only after start-up.
#[derive(Debug, Clone)]
pub struct BeaconConfig {
    pub server: ServerSettings,
    pub http: HttpSettings,
    pub aggregator: AggregatorSettings,
    /// Present only when a `[watcher]` section exists.
    pub watcher: Option<WatcherSettings>,
    pub smtp: Option<SmtpSettings>,
}

impl BeaconConfig {
    /// Load from `path`, or from [`config_path`] when `None`.
    ///
    /// A missing file yields the built-in defaults; an unreadable or invalid one
    /// is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(Path::to_path_buf).or_else(config_path);
        let raw = match path {
            Some(path) => RawConfig::load_from(&path)?.unwrap_or_default(),
            None => RawConfig::default(),
        };
        Self::resolve(raw)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let raw = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        Self::resolve(raw)
    }

    pub fn resolve(raw: RawConfig) -> Result<Self, ConfigError> {
        let (server, title) = resolve_server(raw.server.unwrap_or_default());
        let http = resolve_http(raw.http.unwrap_or_default())?;

        let platform = raw.platform.unwrap_or_default();
        let platform_url = parse_url(
            "platform.url",
            platform.url.as_deref().unwrap_or(DEFAULT_PLATFORM_URL),
        )?;
        let ledger_url = parse_url(
            "ledger.url",
            raw.ledger
                .and_then(|l| l.url)
                .as_deref()
                .unwrap_or(DEFAULT_LEDGER_URL),
        )?;
        let ticker_url = parse_url(
            "ticker.url",
            raw.ticker
                .and_then(|t| t.url)
                .as_deref()
                .unwrap_or(DEFAULT_TICKER_URL),
        )?;
        let explorer_url = parse_url(
            "platform.explorer_url",
            platform
                .explorer_url
                .as_deref()
                .unwrap_or(DEFAULT_EXPLORER_URL),
        )?;

        let recipient = resolve_principal(
            "platform.recipient",
            platform.recipient.unwrap_or_default(),
            DEFAULT_RECIPIENT,
            Role::User,
        )?;
        let admin = resolve_principal(
            "platform.admin",
            platform.admin.unwrap_or_default(),
            DEFAULT_ADMIN,
            Role::Admin,
        )?;

        let probes = if raw.probes.is_empty() {
            default_targets(&platform_url)
        } else {
            raw.probes
                .into_iter()
                .map(resolve_probe)
                .collect::<Result<Vec<_>, _>>()?
        };

        let aggregator = AggregatorSettings {
            title,
            platform_url,
            ledger_url,
            ticker_url,
            explorer_url,
            recipient,
            admin,
            project_index: platform.project_index.unwrap_or(DEFAULT_PROJECT_INDEX),
            stable_asset: platform
                .stable_asset
                .unwrap_or_else(|| DEFAULT_STABLE_ASSET.to_string()),
            probes,
        };

        Ok(Self {
            server,
            http,
            aggregator,
            watcher: raw.watcher.map(resolve_watcher).transpose()?,
            smtp: raw.smtp.map(resolve_smtp),
        })
    }
}

impl RawConfig {
    /// `Ok(None)` when `path` does not exist.
    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(None);
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(Some(config)),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }
}

fn resolve_server(raw: RawServer) -> (ServerSettings, String) {
    let server = ServerSettings {
        port: raw.port.unwrap_or(DEFAULT_PORT),
        insecure: raw.insecure,
        cert_path: raw.cert.unwrap_or_else(|| PathBuf::from("certs/server.crt")),
        key_path: raw.key.unwrap_or_else(|| PathBuf::from("certs/server.key")),
        static_dir: raw.static_dir.unwrap_or_else(|| PathBuf::from("static")),
        template_dir: raw.template_dir.unwrap_or_else(|| PathBuf::from("templates")),
        template: raw.template.unwrap_or_else(|| DEFAULT_TEMPLATE.to_string()),
    };
    (server, raw.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()))
}

fn resolve_http(raw: RawHttp) -> Result<HttpSettings, ConfigError> {
    let defaults = HttpSettings::default();
    Ok(HttpSettings {
        connect_timeout: positive_secs("http.connect_timeout_secs", raw.connect_timeout_secs)?
            .unwrap_or(defaults.connect_timeout),
        request_timeout: positive_secs("http.request_timeout_secs", raw.request_timeout_secs)?
            .unwrap_or(defaults.request_timeout),
        user_agent: raw.user_agent.unwrap_or(defaults.user_agent),
    })
}

fn resolve_principal(
    field: &str,
    raw: RawPrincipal,
    default_username: &str,
    role: Role,
) -> Result<Principal, ConfigError> {
    let username = raw
        .username
        .unwrap_or_else(|| default_username.to_string());
    if username.trim().is_empty() {
        return Err(ConfigError::invalid(
            format!("{field}.username"),
            "must not be empty",
        ));
    }

    let hash = match (raw.password_hash, raw.password) {
        (Some(hash), _) => PasswordHash::from_hex(expand_env_vars(&hash))
            .map_err(|e| ConfigError::invalid(format!("{field}.password_hash"), e.to_string()))?,
        (None, Some(password)) => hash_password(&expand_env_vars(&password)),
        (None, None) => hash_password(DEFAULT_PASSWORD),
    };
    Ok(Principal::new(username, hash, role))
}

fn resolve_probe(raw: RawProbe) -> Result<ProbeTarget, ConfigError> {
    let field = format!("probes.{}", raw.name);
    let url = parse_url(&format!("{field}.url"), &raw.url)?;
    let check = match raw.check {
        RawCheck::Status => ProbeCheck::Status {
            expected: raw.expected.unwrap_or(DEFAULT_PROBE_STATUS),
        },
        RawCheck::Body => match raw.marker {
            Some(marker) if !marker.is_empty() => ProbeCheck::BodyContains { marker },
            _ => {
                return Err(ConfigError::invalid(
                    format!("{field}.marker"),
                    "body checks need a non-empty marker",
                ));
            }
        },
    };

    let label = raw.label.unwrap_or_else(|| raw.name.clone());
    let mut target = ProbeTarget::new(raw.name, label, url, check);
    if let Some(display) = raw.display {
        target.display = display;
    }
    Ok(target)
}

fn resolve_watcher(raw: RawWatcher) -> Result<WatcherSettings, ConfigError> {
    let ping_url = match (raw.ping_url, raw.device_id) {
        (Some(url), _) => parse_url("watcher.ping_url", &url)?,
        (None, Some(device)) => parse_url(
            "watcher.device_id",
            &format!("{PARTICLE_DEVICES_URL}/{device}/ping"),
        )?,
        (None, None) => {
            return Err(ConfigError::invalid(
                "watcher.ping_url",
                "set either ping_url or device_id",
            ));
        }
    };
    let interval = positive_secs("watcher.interval_secs", raw.interval_secs)?
        .unwrap_or(Duration::from_secs(DEFAULT_WATCH_INTERVAL_SECS));

    Ok(WatcherSettings {
        ping_url,
        access_token: raw
            .access_token
            .map(|t| expand_env_vars(&t))
            .unwrap_or_default(),
        location: raw.location.unwrap_or_default(),
        interval,
        recipients: raw.recipients,
    })
}

fn resolve_smtp(raw: RawSmtp) -> SmtpSettings {
    let username = raw
        .username
        .map(|u| expand_env_vars(&u))
        .unwrap_or_default();
    SmtpSettings {
        host: raw.host.unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
        port: raw.port.unwrap_or(DEFAULT_SMTP_PORT),
        password: raw
            .password
            .map(|p| expand_env_vars(&p))
            .unwrap_or_default(),
        from: raw
            .from
            .map(|f| expand_env_vars(&f))
            .unwrap_or_else(|| username.clone()),
        username,
    }
}

fn parse_url(field: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::invalid(field, e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::invalid(
            field,
            format!("unsupported scheme {:?}", url.scheme()),
        ));
    }
    Ok(url)
}

fn positive_secs(field: &str, secs: Option<u64>) -> Result<Option<Duration>, ConfigError> {
    match secs {
        Some(0) => Err(ConfigError::invalid(field, "must be greater than zero")),
        Some(secs) => Ok(Some(Duration::from_secs(secs))),
        None => Ok(None),
    }
}

/// Replace `${VAR}` with the value of `VAR`; unset variables become empty.
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let var = &after[..end];
        if !var.is_empty() {
            out.push_str(&env::var(var).unwrap_or_default());
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".beacon").join("config.toml"))
}
