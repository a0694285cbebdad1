use std::sync::Arc;

use anyhow::{Context, Result};
use config::{Config, ConfigError, Environment, File};
use k256::ecdsa::SigningKey;
use serde::{Deserialize, Serialize};

use crate::{message_builder::DEFAULT_VERSION, receipt::signing_key_from_hex};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Full,
    Json,
}

pub type SharedConf = Arc<Conf>;

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Conf {
    /// Protocol version written in message headers.
    pub version: u16,
    pub log_format: LogFormat,
    /// Hex secp256k1 secret used to sign receipts, usually from `STATEHUB_SIGNING_KEY`.
    signing_key: Option<String>,
}

impl Conf {
    pub fn new(config_file: Option<String>, json_logs: Option<bool>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("version", DEFAULT_VERSION as i64)?
            .set_default("log_format", "full")?;
        if let Some(config_file) = config_file {
            builder = builder.add_source(File::with_name(config_file.as_str()).required(false));
        }
        let s = builder
            // Priority order: config file, then environment variables, then CLI
            .add_source(Environment::with_prefix("statehub"))
            .set_override_option("log_format", json_logs.filter(|j| *j).map(|_| "json"))?
            .build()?;

        s.try_deserialize()
    }

    pub fn new_shared(
        config_file: Option<String>,
        json_logs: Option<bool>,
    ) -> Result<SharedConf, ConfigError> {
        Self::new(config_file, json_logs).map(Arc::new)
    }

    pub fn signing_key(&self) -> Result<SigningKey> {
        let secret = self
            .signing_key
            .as_deref()
            .context("no signing key configured, set STATEHUB_SIGNING_KEY")?;
        signing_key_from_hex(secret)
    }
}
