use std::path::PathBuf;

use url::Url;

use crate::app_config::{AppConfig, Viewport};
use crate::ConfigError;

const DEFAULT_SITE_ORIGIN: &str = "https://www.idus.com";
const DEFAULT_IMAGE_CDN_BASE: &str = "https://image.idus.com/image/files";
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can feed a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        let raw = or_default(var, default);
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: format!("expected a boolean, got \"{other}\""),
            }),
        }
    };

    let log_level = or_default("CRAFTLENS_LOG_LEVEL", "info");
    let site_origin = parse_origin(&or_default("CRAFTLENS_SITE_ORIGIN", DEFAULT_SITE_ORIGIN))?;
    let image_cdn_base = or_default("CRAFTLENS_IMAGE_CDN_BASE", DEFAULT_IMAGE_CDN_BASE)
        .trim_end_matches('/')
        .to_string();

    let api_timeout_secs = parse_u64("CRAFTLENS_API_TIMEOUT_SECS", "10")?;
    let navigation_timeout_secs = parse_u64("CRAFTLENS_NAVIGATION_TIMEOUT_SECS", "30")?;
    let script_timeout_secs = parse_u64("CRAFTLENS_SCRIPT_TIMEOUT_SECS", "10")?;
    let settle_delay_ms = parse_u64("CRAFTLENS_SETTLE_DELAY_MS", "3000")?;

    let user_agent = or_default("CRAFTLENS_USER_AGENT", DEFAULT_USER_AGENT);
    let locale = or_default("CRAFTLENS_LOCALE", "ko-KR");
    let timezone = or_default("CRAFTLENS_TIMEZONE", "Asia/Seoul");
    let viewport = parse_viewport(&or_default("CRAFTLENS_VIEWPORT", "1920x1080"))?;
    let stealth = parse_bool("CRAFTLENS_STEALTH", "true")?;
    let chromium_path = lookup("CRAFTLENS_CHROMIUM_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);

    Ok(AppConfig {
        log_level,
        site_origin,
        image_cdn_base,
        api_timeout_secs,
        navigation_timeout_secs,
        script_timeout_secs,
        settle_delay_ms,
        user_agent,
        locale,
        timezone,
        viewport,
        stealth,
        chromium_path,
    })
}

/// Accepts `http(s)://host[:port]` with an optional trailing slash and no
/// path, query or fragment. Returns the serialized origin.
fn parse_origin(raw: &str) -> Result<String, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar {
        var: "CRAFTLENS_SITE_ORIGIN".to_string(),
        reason,
    };

    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!(
            "origin must use http or https, got \"{}\"",
            url.scheme()
        )));
    }
    if url.host_str().is_none() {
        return Err(invalid("origin must have a host".to_string()));
    }
    if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("origin must be scheme and host only".to_string()));
    }
    Ok(url.origin().ascii_serialization())
}

/// Parses `"<width>x<height>"`, e.g. `"1920x1080"`.
fn parse_viewport(raw: &str) -> Result<Viewport, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar {
        var: "CRAFTLENS_VIEWPORT".to_string(),
        reason,
    };

    let (w, h) = raw
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| invalid(format!("expected WIDTHxHEIGHT, got \"{raw}\"")))?;
    let width = w.trim().parse::<u32>().map_err(|e| invalid(e.to_string()))?;
    let height = h.trim().parse::<u32>().map_err(|e| invalid(e.to_string()))?;
    if width == 0 || height == 0 {
        return Err(invalid("viewport dimensions must be non-zero".to_string()));
    }
    Ok(Viewport { width, height })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
