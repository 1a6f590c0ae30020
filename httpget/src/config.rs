use anyhow::{bail, Context, Result};
use plaintext_check::{FetchOptions, MIN_SECURE_MAX_AGE};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG: &str = "httpget.yaml";

#[derive(Debug, Default, Deserialize, Clone)]
pub struct AuditConfig {
    pub output_dir: Option<PathBuf>,
    pub timeout_ms: Option<u64>,
    pub max_redirects: Option<usize>,
    pub min_hsts_max_age: Option<u64>,
    pub concurrency: Option<usize>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct Config {
    pub audit: Option<AuditConfig>,
}

/// Load `path`, or `./httpget.yaml` when no path is given and that file
/// exists. An explicitly named file that cannot be read is an error.
pub fn load_config(path: Option<&Path>) -> Result<Option<Config>> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let p = Path::new(DEFAULT_CONFIG);
            if p.exists() { p.to_path_buf() } else { return Ok(None); }
        }
    };
    let s = fs::read_to_string(&path).with_context(|| format!("cannot read config {}", path.display()))?;
    let cfg = serde_yaml::from_str(&s).with_context(|| format!("invalid config {}", path.display()))?;
    Ok(Some(cfg))
}

/// Values given on the command line; these win over the config file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub output_dir: Option<PathBuf>,
    pub timeout_ms: Option<u64>,
    pub concurrency: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub output_dir: PathBuf,
    pub fetch: FetchOptions,
    pub min_hsts_max_age: u64,
    pub concurrency: usize,
}

impl Settings {
    pub fn resolve(cli: Overrides, cfg: Option<&Config>) -> Result<Self> {
        let file = cfg.and_then(|c| c.audit.clone()).unwrap_or_default();
        let mut fetch = FetchOptions::default();
        if let Some(t) = cli.timeout_ms.or(file.timeout_ms) { fetch.timeout_ms = t; }
        if let Some(r) = file.max_redirects { fetch.max_redirects = r; }
        if let Some(ua) = file.user_agent { fetch.user_agent = ua; }
        let concurrency = cli.concurrency.or(file.concurrency).unwrap_or(1);

        if fetch.timeout_ms == 0 {
            bail!("timeout must be greater than zero");
        }
        if concurrency == 0 {
            bail!("concurrency must be greater than zero");
        }

        Ok(Settings {
            output_dir: cli.output_dir.or(file.output_dir).unwrap_or_else(|| PathBuf::from(".")),
            fetch,
            min_hsts_max_age: file.min_hsts_max_age.unwrap_or(MIN_SECURE_MAX_AGE),
            concurrency,
        })
    }
}
