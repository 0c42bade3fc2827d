use std::collections::HashMap;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result};
use log::*;
use r2d2::Pool;
use serde::Deserialize;

use infra::persistence::DocumentConnectionManager;

use crate::restaurants::CustomerMatch;
use crate::users::Auth;

/// Everything the server needs at startup. Read from the environment
/// (`DATABASE_URL`, `TOKEN_SECRET`, ...) or from the same keys in a TOML file.
#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub token_secret: String,
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
    #[serde(default)]
    pub customer_match: CustomerMatch,
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

#[derive(Deserialize, Debug)]
pub struct Settings {
    #[serde(flatten)]
    pub rustaurant: Config,
    #[serde(default)]
    pub env_logger: Option<EnvLogger>,
}

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(rename_all = "lowercase")]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Deserialize, Debug, Default)]
pub struct EnvLogger {
    level: Option<LogLevel>,
    #[serde(default)]
    modules: HashMap<String, LogLevel>,
    #[serde(default)]
    timestamp_nanos: bool,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}

fn default_bcrypt_cost() -> u32 {
    10
}

fn default_pool_size() -> u32 {
    10
}

impl Config {
    pub fn from_env() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => debug!("Loaded {:?}", path),
            Err(e) => debug!("No .env loaded: {}", e),
        }
        let config = envy::from_env::<Config>().context("read config from environment")?;
        Ok(config)
    }

    pub fn build(&self) -> Result<Pool<DocumentConnectionManager>> {
        debug!("Build pool of {}", self.pool_size);
        let manager = DocumentConnectionManager::new(&self.database_url)?;
        let pool = r2d2::Pool::builder()
            .max_size(self.pool_size)
            .build(manager)
            .context("build pool")?;
        Ok(pool)
    }

    pub fn auth(&self) -> Auth {
        Auth::new(&self.token_secret, self.bcrypt_cost)
    }
}

impl Settings {
    /// Reads `path` as TOML when given, otherwise the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let buf = fs::read_to_string(path)
                    .with_context(|| format!("read config {:?}", path))?;
                let settings = toml::from_str(&buf).context("parse config")?;
                Ok(settings)
            }
            None => Ok(Settings {
                rustaurant: Config::from_env()?,
                env_logger: None,
            }),
        }
    }

    pub fn init_logging(&self) {
        let res = match self.env_logger.as_ref() {
            Some(logger) => logger.builder().try_init(),
            None => env_logger::try_init(),
        };
        if let Err(e) = res {
            eprintln!("Logger already initialised: {}", e);
        }
    }
}

impl LogLevel {
    fn to_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

impl EnvLogger {
    pub fn builder(&self) -> env_logger::Builder {
        let mut b = env_logger::Builder::from_default_env();
        if let Some(level) = self.level {
            b.filter_level(level.to_filter());
        }

        for (module, level) in self.modules.iter() {
            b.filter_module(module, level.to_filter());
        }

        if self.timestamp_nanos {
            b.format_timestamp_nanos();
        }

        b
    }
}
