use std::path::{Path, PathBuf};

use super::types::AppConfig;

/// Get the default taskforge data directory: ~/.taskforge
pub fn get_data_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(PathBuf::from(home).join(".taskforge"))
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    // Priority 1: ~/.taskforge/config.toml (highest)
    let data_dir = get_data_dir()?;
    let user_config = data_dir.join("config.toml");

    // Priority 2: ./config.toml (current directory)
    let local_config = Path::new("config.toml");

    let cfg = if user_config.exists() {
        load_from(&user_config)?
    } else if local_config.exists() {
        load_from(local_config)?
    } else {
        AppConfig::default()
    };

    finalize(cfg, &data_dir)
}

pub fn load_from(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let cfg = toml::from_str::<AppConfig>(&s)
        .map_err(|e| anyhow::anyhow!("invalid config {}: {e}", path.display()))?;
    Ok(cfg)
}

/// Fills in data-dir defaults and applies environment overrides.
pub fn finalize(mut cfg: AppConfig, data_dir: &Path) -> anyhow::Result<AppConfig> {
    if cfg.storage.directory.trim().is_empty() {
        cfg.storage.directory = data_dir.join("data").to_string_lossy().to_string();
    } else {
        cfg.storage.directory = expand(&cfg.storage.directory)?;
    }

    // Logging directory defaults to the data directory if not set
    let logs_dir = match cfg.logging.directory.as_deref().map(str::trim) {
        Some(dir) if !dir.is_empty() => expand(dir)?,
        _ => data_dir.join("logs").to_string_lossy().to_string(),
    };
    cfg.logging.directory = Some(logs_dir);

    apply_env_overrides(&mut cfg, |key| std::env::var(key).ok());
    Ok(cfg)
}

/// Environment variable overrides (Priority 0: highest)
pub(crate) fn apply_env_overrides<F>(cfg: &mut AppConfig, get: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| get(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = non_empty("TASKFORGE_AI_URL") {
        cfg.aiservice.base_url = v;
    }
    if let Some(v) = non_empty("TASKFORGE_AI_API_KEY") {
        cfg.aiservice.api_key = v;
    }
    if let Some(v) = non_empty("TASKFORGE_MODEL") {
        cfg.aiservice.model = v;
    }
    if let Some(v) = non_empty("TASKFORGE_PACING_MS") {
        match v.trim().parse::<u64>() {
            Ok(ms) => cfg.scheduler.pacing_ms = ms,
            Err(_) => tracing::warn!(value = %v, "ignoring invalid TASKFORGE_PACING_MS"),
        }
    }
}

fn expand(path: &str) -> anyhow::Result<String> {
    shellexpand::full(path)
        .map(|p| p.into_owned())
        .map_err(|e| anyhow::anyhow!("failed to expand path '{path}': {e}"))
}
