//! Transport configuration for Prism Central clients.
//!
//! A [`TransportConfig`] is resolved from module parameters with environment
//! fallbacks: explicit parameter first, then environment variable, then the
//! built-in default.

use percent_encoding::percent_decode_str;
use secrecy::SecretString;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::hash::BuildHasher;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;
use validator::Validate;

use crate::error::{Error, Result};
use crate::types::DEFAULT_PORT;

/// Default proxy port when the proxy URL carries none
pub const DEFAULT_PROXY_PORT: u16 = 443;

const fn default_request_timeout_secs() -> u64 {
    30
}

/// Source of environment variables.
///
/// [`ProcessEnv`] reads the process environment; a `HashMap` can stand in
/// for it in tests.
pub trait EnvSource {
    /// Returns the value of `key`, or `None` when unset or empty.
    fn var(&self, key: &str) -> Option<String>;
}

/// Reads variables from the current process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.is_empty())
    }
}

impl<S: BuildHasher> EnvSource for HashMap<String, String, S> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).filter(|v| !v.is_empty()).cloned()
    }
}

impl<S: BuildHasher> EnvSource for HashMap<&str, &str, S> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key)
            .filter(|v| !v.is_empty())
            .map(|v| (*v).to_string())
    }
}

/// Authentication material for Prism Central.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// HTTP Basic authentication
    Basic {
        /// Login name
        username: String,
        /// Password
        password: SecretString,
    },
    /// API key sent as `X-ntnx-api-key`
    ApiKey(SecretString),
}

impl Credentials {
    /// Creates Basic credentials.
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    /// Creates API key credentials.
    pub fn api_key(key: impl Into<String>) -> Self {
        Self::ApiKey(SecretString::from(key.into()))
    }
}

/// Forward proxy settings.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// `http` or `https`
    pub scheme: String,
    /// Proxy host (IPv6 literals keep their brackets)
    pub host: String,
    /// Proxy port
    pub port: u16,
    /// Optional proxy user
    pub username: Option<String>,
    /// Optional proxy password
    pub password: Option<SecretString>,
}

impl ProxyConfig {
    /// Parses a proxy URL such as `user:pass@proxy.corp:3128`.
    ///
    /// The scheme defaults to `http` and the port to [`DEFAULT_PROXY_PORT`].
    /// Embedded credentials are percent-decoded once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the URL cannot be parsed, has no
    /// host or uses a scheme other than `http`/`https`.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let with_scheme = if raw.contains("://") {
            raw.to_string()
        } else {
            format!("http://{raw}")
        };

        let url = Url::parse(&with_scheme)
            .map_err(|e| Error::InvalidConfig(format!("Invalid proxy URL `{raw}`: {e}")))?;

        let scheme = url.scheme().to_string();
        if scheme != "http" && scheme != "https" {
            return Err(Error::InvalidConfig(format!(
                "Unsupported proxy scheme `{scheme}`"
            )));
        }

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| Error::InvalidConfig(format!("Proxy URL `{raw}` has no host")))?
            .to_string();

        let port = if authority_has_port(&with_scheme) {
            url.port_or_known_default().unwrap_or(DEFAULT_PROXY_PORT)
        } else {
            DEFAULT_PROXY_PORT
        };

        let username = Some(decode_once(url.username())?).filter(|u| !u.is_empty());
        let password = url
            .password()
            .map(decode_once)
            .transpose()?
            .map(SecretString::from);

        Ok(Self {
            scheme,
            host,
            port,
            username,
            password,
        })
    }

    /// Overrides the proxy username.
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Overrides the proxy password.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(SecretString::from(password.into()));
        self
    }

    /// Proxy URL without credentials.
    #[must_use]
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }
}

fn decode_once(value: &str) -> Result<String> {
    percent_decode_str(value)
        .decode_utf8()
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| Error::InvalidConfig(format!("Invalid proxy credentials encoding: {e}")))
}

fn authority_has_port(raw: &str) -> bool {
    let rest = raw.split_once("://").map_or(raw, |(_, r)| r);
    let authority = rest.split(['/', '?', '#']).next().unwrap_or(rest);
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
    match host_port.rfind(']') {
        Some(end) => host_port[end + 1..].starts_with(':'),
        None => host_port.contains(':'),
    }
}

/// Returns true if `host` matches an entry of the no-proxy list.
///
/// Entries match as case-insensitive suffixes of the host, ports are ignored
/// on both sides and `*` matches everything.
#[must_use]
pub fn no_proxy_matches(no_proxy: &[String], host: &str) -> bool {
    let host = strip_port(host).to_lowercase();
    no_proxy.iter().any(|entry| {
        let entry = entry.trim();
        if entry == "*" {
            return true;
        }
        let entry = strip_port(entry).trim_start_matches('.').to_lowercase();
        !entry.is_empty() && host.ends_with(&entry)
    })
}

fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        return host.find(']').map_or(host, |end| &host[..=end]);
    }
    match host.rsplit_once(':') {
        Some((name, port)) if !name.contains(':') && port.chars().all(|c| c.is_ascii_digit()) => {
            name
        }
        _ => host,
    }
}

/// Normalized connection settings for one Prism Central endpoint.
#[derive(Debug, Clone, Validate)]
pub struct TransportConfig {
    /// Prism Central host name or address
    #[validate(length(min = 1))]
    pub host: String,

    /// HTTPS port
    #[validate(range(min = 1))]
    pub port: u16,

    /// URL scheme used to reach the endpoint
    pub scheme: String,

    /// Authentication material
    pub credentials: Credentials,

    /// Whether to verify TLS certificates
    pub validate_certs: bool,

    /// Optional forward proxy
    pub proxy: Option<ProxyConfig>,

    /// Host suffixes that bypass the proxy
    pub no_proxy: Vec<String>,

    /// Enables the request/response interceptor
    pub debug: bool,

    /// Optional append-only log file for the interceptor
    pub log_file: Option<PathBuf>,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 600))]
    pub request_timeout_secs: u64,
}

impl TransportConfig {
    /// Create a configuration with default port, TLS verification on and no proxy.
    pub fn new(host: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            scheme: "https".to_string(),
            credentials,
            validate_certs: true,
            proxy: None,
            no_proxy: Vec::new(),
            debug: false,
            log_file: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }

    /// Set the port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the URL scheme (`https` unless talking to a plain-HTTP endpoint).
    #[must_use]
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    /// Set whether to verify TLS certificates.
    #[must_use]
    pub const fn with_validate_certs(mut self, validate: bool) -> Self {
        self.validate_certs = validate;
        self
    }

    /// Set the forward proxy.
    #[must_use]
    pub fn with_proxy(mut self, proxy: ProxyConfig) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Set the no-proxy suffix list.
    #[must_use]
    pub fn with_no_proxy(mut self, no_proxy: Vec<String>) -> Self {
        self.no_proxy = no_proxy;
        self
    }

    /// Enable or disable request logging.
    #[must_use]
    pub const fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Set the interceptor log file.
    #[must_use]
    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    /// Set request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Returns true if requests to the configured host skip the proxy.
    #[must_use]
    pub fn bypasses_proxy(&self) -> bool {
        no_proxy_matches(&self.no_proxy, &self.host)
    }

    /// Base URL of a service: `{scheme}://{host}:{port}/api/{namespace}/{version}/`.
    ///
    /// # Errors
    ///
    /// Returns an error if the host does not form a valid URL.
    pub fn service_url(&self, namespace: &str, version: &str) -> Result<Url> {
        let url = Url::parse(&format!(
            "{}://{}:{}/api/{namespace}/{version}/",
            self.scheme, self.host, self.port
        ))?;
        Ok(url)
    }

    /// Resolves a configuration from module parameters and the environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] when the host is missing, no credential
    /// form resolves, a username comes without a password, both credential
    /// forms are supplied at the same precedence tier, the proxy URL is
    /// malformed or a numeric setting is not numeric.
    pub fn resolve<E: EnvSource + ?Sized>(params: &Map<String, Value>, env: &E) -> Result<Self> {
        let host = param_str(params, "nutanix_host")?
            .or_else(|| env.var("NUTANIX_HOST"))
            .or_else(|| env.var("NUTANIX_HOSTNAME"))
            .ok_or_else(|| Error::InvalidConfig("nutanix_host is required".to_string()))?;

        let port = match param_str(params, "nutanix_port")?.or_else(|| env.var("NUTANIX_PORT")) {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| {
                Error::InvalidConfig(format!("nutanix_port `{raw}` is not a valid port"))
            })?,
            None => DEFAULT_PORT,
        };

        let credentials = resolve_credentials(params, env)?;

        let validate_certs = match param_bool(params, "validate_certs")? {
            Some(v) => v,
            None => env
                .var("VALIDATE_CERTS")
                .map(|v| parse_bool("VALIDATE_CERTS", &v))
                .transpose()?
                .unwrap_or(true),
        };

        let debug = match param_bool(params, "nutanix_debug")? {
            Some(v) => v,
            None => env
                .var("NUTANIX_DEBUG")
                .map(|v| parse_bool("NUTANIX_DEBUG", &v))
                .transpose()?
                .unwrap_or(false),
        };

        let log_file = param_str(params, "nutanix_log_file")?
            .or_else(|| env.var("NUTANIX_LOG_FILE"))
            .map(PathBuf::from);

        let proxy_url = param_str(params, "proxy_url")?.or_else(|| {
            [
                "HTTPS_PROXY",
                "https_proxy",
                "HTTP_PROXY",
                "http_proxy",
                "ALL_PROXY",
                "all_proxy",
            ]
            .iter()
            .find_map(|key| env.var(key))
        });

        let proxy = match proxy_url {
            Some(raw) => {
                let mut proxy = ProxyConfig::parse(&raw)?;
                if let Some(user) =
                    param_str(params, "proxy_username")?.or_else(|| env.var("PROXY_USERNAME"))
                {
                    proxy = proxy.with_username(user);
                }
                if let Some(pass) =
                    param_str(params, "proxy_password")?.or_else(|| env.var("PROXY_PASSWORD"))
                {
                    proxy = proxy.with_password(pass);
                }
                Some(proxy)
            }
            None => None,
        };

        let no_proxy = match params.get("no_proxy") {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str().map(str::to_string).ok_or_else(|| {
                        Error::InvalidConfig("no_proxy entries must be strings".to_string())
                    })
                })
                .collect::<Result<Vec<_>>>()?,
            Some(Value::String(raw)) => split_list(raw),
            Some(Value::Null) | None => env
                .var("NO_PROXY")
                .or_else(|| env.var("no_proxy"))
                .map(|raw| split_list(&raw))
                .unwrap_or_default(),
            Some(other) => {
                return Err(Error::InvalidConfig(format!(
                    "no_proxy must be a string or list, got {other}"
                )))
            }
        };

        let request_timeout_secs = match param_str(params, "request_timeout")? {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                Error::InvalidConfig(format!("request_timeout `{raw}` is not a number"))
            })?,
            None => default_request_timeout_secs(),
        };

        let config = Self {
            host,
            port,
            scheme: "https".to_string(),
            credentials,
            validate_certs,
            proxy,
            no_proxy,
            debug,
            log_file,
            request_timeout_secs,
        };

        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Tier {
    Environment,
    Parameter,
}

fn tiered<E: EnvSource + ?Sized>(
    params: &Map<String, Value>,
    env: &E,
    param: &str,
    var: &str,
) -> Result<Option<(String, Tier)>> {
    if let Some(value) = param_str(params, param)? {
        return Ok(Some((value, Tier::Parameter)));
    }
    Ok(env.var(var).map(|value| (value, Tier::Environment)))
}

fn resolve_credentials<E: EnvSource + ?Sized>(
    params: &Map<String, Value>,
    env: &E,
) -> Result<Credentials> {
    let username = tiered(params, env, "nutanix_username", "NUTANIX_USERNAME")?;
    let password = tiered(params, env, "nutanix_password", "NUTANIX_PASSWORD")?;
    let api_key = tiered(params, env, "nutanix_api_key", "NUTANIX_API_KEY")?;

    let basic_tier = match (&username, &password) {
        (None, None) => None,
        (u, p) => u.iter().chain(p.iter()).map(|(_, t)| *t).max(),
    };

    if let (Some((key, key_tier)), Some(basic_tier)) = (&api_key, basic_tier) {
        return match key_tier.cmp(&basic_tier) {
            std::cmp::Ordering::Equal => Err(Error::InvalidConfig(
                "both username/password and api key were supplied; use exactly one".to_string(),
            )),
            std::cmp::Ordering::Greater => Ok(Credentials::api_key(key.clone())),
            std::cmp::Ordering::Less => basic_from(username, password),
        };
    }

    if let Some((key, _)) = api_key {
        return Ok(Credentials::api_key(key));
    }
    if basic_tier.is_some() {
        return basic_from(username, password);
    }

    Err(Error::InvalidConfig(
        "no credentials: provide nutanix_username and nutanix_password, or nutanix_api_key"
            .to_string(),
    ))
}

fn basic_from(
    username: Option<(String, Tier)>,
    password: Option<(String, Tier)>,
) -> Result<Credentials> {
    match (username, password) {
        (Some((user, _)), Some((pass, _))) => Ok(Credentials::basic(user, pass)),
        (Some(_), None) => Err(Error::InvalidConfig(
            "nutanix_username was supplied without nutanix_password".to_string(),
        )),
        (None, _) => Err(Error::InvalidConfig(
            "nutanix_password was supplied without nutanix_username".to_string(),
        )),
    }
}

fn param_str(params: &Map<String, Value>, key: &str) -> Result<Option<String>> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(Error::InvalidConfig(format!(
            "{key} must be a scalar, got {other}"
        ))),
    }
}

fn param_bool(params: &Map<String, Value>, key: &str) -> Result<Option<bool>> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(Value::String(s)) => parse_bool(key, s).map(Some),
        Some(other) => Err(Error::InvalidConfig(format!(
            "{key} must be a boolean, got {other}"
        ))),
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::InvalidConfig(format!(
            "{key} `{raw}` is not a boolean"
        ))),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
