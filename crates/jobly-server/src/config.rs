//! `jobly.toml` loading and environment overrides.

use anyhow::Context;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;

/// Config file read when `--config` is not given. Its absence is not an error.
pub const DEFAULT_CONFIG_PATH: &str = "jobly.toml";

/// Placeholder secret shipped in development setups.
pub const DEV_SECRET_KEY: &str = "secret-dev";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3001".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_pool_size: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_pool_size: jobly::pool::DEFAULT_POOL_SIZE,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    pub secret_key: Option<String>,
    /// Accept [`DEV_SECRET_KEY`] as the signing secret.
    pub allow_dev_secret: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub max_sql_length: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            max_sql_length: jobly::trace::DEFAULT_MAX_SQL_LENGTH,
        }
    }
}

/// Fully resolved runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind: SocketAddr,
    pub database_url: String,
    pub max_pool_size: usize,
    pub secret_key: String,
    pub max_sql_length: usize,
}

impl ConfigFile {
    /// Read the config file.
    ///
    /// An explicit path must exist; the default path is optional.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let (path, required) = match path {
            Some(p) => (p, true),
            None => (Path::new(DEFAULT_CONFIG_PATH), false),
        };

        if !required && !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Expand `${VAR}` references, apply environment overrides and check
    /// that everything required is present.
    pub fn resolve(self, env: impl Fn(&str) -> Option<String>) -> anyhow::Result<Settings> {
        let expand = |s: &str| expand_env_vars(s, &env);

        let bind = match env("JOBLY_BIND") {
            Some(v) => v,
            None => expand(&self.server.bind)?,
        };
        let bind: SocketAddr = bind
            .parse()
            .with_context(|| format!("invalid bind address: {bind}"))?;

        let database_url = match env("DATABASE_URL") {
            Some(v) => v,
            None => match &self.database.url {
                Some(url) => expand(url)?,
                None => anyhow::bail!("database url is not configured (set DATABASE_URL)"),
            },
        };
        if database_url.trim().is_empty() {
            anyhow::bail!("database url must not be empty");
        }
        if self.database.max_pool_size == 0 {
            anyhow::bail!("database.max_pool_size must be at least 1");
        }

        let secret_key = match env("SECRET_KEY") {
            Some(v) => v,
            None => match &self.auth.secret_key {
                Some(key) => expand(key)?,
                None => anyhow::bail!("secret key is not configured (set SECRET_KEY)"),
            },
        };
        if secret_key.is_empty() {
            anyhow::bail!("secret key must not be empty");
        }
        if secret_key == DEV_SECRET_KEY && !self.auth.allow_dev_secret {
            anyhow::bail!(
                "refusing the development secret key; set auth.allow_dev_secret = true to use it"
            );
        }

        Ok(Settings {
            bind,
            database_url,
            max_pool_size: self.database.max_pool_size,
            secret_key,
            max_sql_length: self.logging.max_sql_length,
        })
    }
}

fn expand_env_vars(input: &str, env: &impl Fn(&str) -> Option<String>) -> anyhow::Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next();

            let mut key = String::new();
            let mut closed = false;
            for ch in chars.by_ref() {
                if ch == '}' {
                    closed = true;
                    break;
                }
                key.push(ch);
            }

            if !closed {
                anyhow::bail!("unterminated env var reference: ${{{key}}}");
            }
            if key.is_empty() {
                anyhow::bail!("invalid env var reference: ${{}}");
            }

            let v = env(&key)
                .ok_or_else(|| anyhow::anyhow!("missing env var for config expansion: {key}"))?;
            out.push_str(&v);
            continue;
        }

        out.push(c);
    }

    Ok(out)
}
