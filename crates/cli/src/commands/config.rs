use secrecy::ExposeSecret;
use serde_json::json;

use coursey_core::config::{AppConfig, LoadOptions, LogFormat};

/// Effective configuration with secrets redacted.
pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return json!({
                "command": "config",
                "status": "error",
                "message": format!("configuration issue: {error}"),
            })
            .to_string();
        }
    };

    let api_key = config.llm.api_key.as_ref().map(|key| redact(key.expose_secret()));
    let format = match config.logging.format {
        LogFormat::Compact => "compact",
        LogFormat::Pretty => "pretty",
        LogFormat::Json => "json",
    };

    let payload = json!({
        "command": "config",
        "status": "ok",
        "database": {
            "url": config.database.url,
            "max_connections": config.database.max_connections,
            "timeout_secs": config.database.timeout_secs,
        },
        "llm": {
            "enabled": config.llm.enabled,
            "available": config.llm.is_available(),
            "api_key": api_key,
            "base_url": config.llm.base_url,
            "model": config.llm.model,
            "timeout_secs": config.llm.timeout_secs,
        },
        "server": {
            "bind_address": config.server.bind_address,
            "port": config.server.port,
            "graceful_shutdown_secs": config.server.graceful_shutdown_secs,
        },
        "catalog": {
            "cache_ttl_secs": config.catalog.cache_ttl_secs,
        },
        "logging": {
            "level": config.logging.level,
            "format": format,
        },
    });

    serde_json::to_string_pretty(&payload).unwrap_or_else(|_| payload.to_string())
}

fn redact(secret: &str) -> String {
    if secret.len() <= 4 {
        "****".to_string()
    } else {
        format!("{}****", &secret[..4])
    }
}

#[cfg(test)]
mod tests {
    use super::redact;

    #[test]
    fn redaction_keeps_only_a_short_prefix() {
        assert_eq!(redact("sk-abcdef123456"), "sk-a****");
        assert_eq!(redact("key"), "****");
    }
}
