//! The key sync run: backup, obtain a key, validate, write.

use crate::backup::create_backup;
use crate::browser;
use crate::config::SyncConfig;
use crate::display::{mask_key, print_info, print_success};
use crate::envfile::{UpdateOutcome, update_env_file};
use crate::error::SupakeyError;
use crate::input::Prompter;
use crate::manual::manual_extraction;
use crate::validation::validate_api_key;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Where the key that got written came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeySource {
    Direct,
    Browser,
    Manual,
}

impl fmt::Display for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            KeySource::Direct => write!(f, "provided on the command line"),
            KeySource::Browser => write!(f, "automated browser extraction"),
            KeySource::Manual => write!(f, "manual entry"),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SyncReport {
    pub env_file: PathBuf,
    pub backup: PathBuf,
    pub variable: String,
    pub source: KeySource,
    pub outcome: UpdateOutcome,
    /// Masked; the full key is never reported.
    pub preview: String,
}

pub struct KeySync {
    config: SyncConfig,
}

impl KeySync {
    pub fn new(config: SyncConfig) -> Result<Self, SupakeyError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn run(&self, prompter: &mut dyn Prompter) -> Result<SyncReport, SupakeyError> {
        let config = &self.config;

        print_info("🚀 Supabase API Key Retrieval");
        print_info(&format!("📍 Project Reference: {}", config.project_ref));
        print_info(&format!("🌐 Dashboard URL: {}", config.dashboard_url));

        let backup = create_backup(&config.env_file)?;

        let (key, source) = self.obtain_key(prompter)?;

        validate_api_key(&key)?;
        let preview = mask_key(&key);
        print_success("API key validation passed");
        print_info(&format!("🔑 Key preview: {}", preview));

        let outcome = update_env_file(&config.env_file, &config.variable, &key)?;

        Ok(SyncReport {
            env_file: config.env_file.clone(),
            backup,
            variable: config.variable.clone(),
            source,
            outcome,
            preview,
        })
    }

    /// Direct key if given; otherwise automated extraction, falling back to
    /// the interactive path when it yields nothing.
    fn obtain_key(&self, prompter: &mut dyn Prompter) -> Result<(String, KeySource), SupakeyError> {
        let config = &self.config;

        if let Some(key) = &config.direct_key {
            return Ok((key.trim().to_string(), KeySource::Direct));
        }

        let automated = match &config.browser {
            Some(browser_config) => {
                browser::try_extract(browser_config, &config.dashboard_url, prompter)?
            }
            None => {
                print_info("Skipping automated extraction (--no-browser)");
                None
            }
        };

        match automated {
            Some(key) => Ok((key, KeySource::Browser)),
            None => {
                print_info("🔄 Falling back to manual extraction...");
                let key = manual_extraction(&config.dashboard_url, prompter)?;
                Ok((key, KeySource::Manual))
            }
        }
    }
}
