use std::time::Duration;

use crate::query::FallbackPolicy;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub backend: Backend,
    pub data_dir: String,
    pub duckdb_memory_limit: String,
    pub metrics_fallback: FallbackPolicy,
    pub gateway_timeout_ms: u64,
    pub cors_origins: Vec<String>,
}

/// Which persistence gateway the server talks to.
#[derive(Debug, Clone, PartialEq)]
pub enum Backend {
    /// Embedded DuckDB file under `data_dir`.
    DuckDb,
    /// Managed Supabase project reached over its PostgREST API.
    Supabase { url: String, key: String },
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            port: std::env::var("CAMPAIGN_PORT")
                .or_else(|_| std::env::var("PORT"))
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|e| format!("invalid port: {e}"))?,
            backend: {
                let raw = std::env::var("CAMPAIGN_BACKEND").unwrap_or_else(|_| "duckdb".to_string());
                match raw.as_str() {
                    "supabase" => {
                        let url = std::env::var("SUPABASE_URL").map_err(|_| {
                            "SUPABASE_URL required when CAMPAIGN_BACKEND=supabase".to_string()
                        })?;
                        let key = std::env::var("SUPABASE_KEY").map_err(|_| {
                            "SUPABASE_KEY required when CAMPAIGN_BACKEND=supabase".to_string()
                        })?;
                        Backend::Supabase { url, key }
                    }
                    "duckdb" => Backend::DuckDb,
                    other => return Err(format!("unknown CAMPAIGN_BACKEND: {other}")),
                }
            },
            data_dir: std::env::var("CAMPAIGN_DATA_DIR").unwrap_or_else(|_| "./data".to_string()),
            duckdb_memory_limit: std::env::var("CAMPAIGN_DUCKDB_MEMORY")
                .unwrap_or_else(|_| "1GB".to_string()),
            metrics_fallback: FallbackPolicy::parse(
                std::env::var("CAMPAIGN_METRICS_FALLBACK").ok().as_deref(),
            )
            .map_err(|e| e.to_string())?,
            gateway_timeout_ms: match std::env::var("CAMPAIGN_GATEWAY_TIMEOUT_MS") {
                Err(_) => 10_000,
                Ok(raw) => match raw.trim().parse::<u64>() {
                    Ok(ms) if ms > 0 => ms,
                    _ => {
                        return Err(format!(
                            "CAMPAIGN_GATEWAY_TIMEOUT_MS must be a positive number of milliseconds (got {raw})"
                        ))
                    }
                },
            },
            cors_origins: std::env::var("CAMPAIGN_CORS_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        })
    }

    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_millis(self.gateway_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Serializes tests that mutate process-global env vars.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "CAMPAIGN_PORT",
        "PORT",
        "CAMPAIGN_BACKEND",
        "SUPABASE_URL",
        "SUPABASE_KEY",
        "CAMPAIGN_METRICS_FALLBACK",
        "CAMPAIGN_GATEWAY_TIMEOUT_MS",
        "CAMPAIGN_CORS_ORIGINS",
    ];

    fn clear_env() {
        for var in VARS {
            unsafe { std::env::remove_var(var) };
        }
    }

    #[test]
    fn defaults() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|p| p.into_inner());
        clear_env();
        let cfg = Config::from_env().expect("config");
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.backend, Backend::DuckDb);
        assert_eq!(cfg.metrics_fallback, FallbackPolicy::OnEmptyOrError);
        assert_eq!(cfg.gateway_timeout(), Duration::from_secs(10));
        assert!(cfg.cors_origins.is_empty());
    }

    #[test]
    fn supabase_requires_credentials() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|p| p.into_inner());
        clear_env();
        unsafe { std::env::set_var("CAMPAIGN_BACKEND", "supabase") };
        let err = Config::from_env().err();
        assert_eq!(
            err.as_deref(),
            Some("SUPABASE_URL required when CAMPAIGN_BACKEND=supabase")
        );

        unsafe {
            std::env::set_var("SUPABASE_URL", "https://abc.supabase.co");
            std::env::set_var("SUPABASE_KEY", "anon-key");
        }
        let cfg = Config::from_env().expect("config");
        assert_eq!(
            cfg.backend,
            Backend::Supabase {
                url: "https://abc.supabase.co".to_string(),
                key: "anon-key".to_string()
            }
        );
        clear_env();
    }

    #[test]
    fn invalid_fallback_policy_is_rejected() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|p| p.into_inner());
        clear_env();
        unsafe { std::env::set_var("CAMPAIGN_METRICS_FALLBACK", "sometimes") };
        assert!(Config::from_env().is_err());

        unsafe { std::env::set_var("CAMPAIGN_METRICS_FALLBACK", "none") };
        let cfg = Config::from_env().expect("config");
        assert_eq!(cfg.metrics_fallback, FallbackPolicy::Never);
        clear_env();
    }

    #[test]
    fn gateway_timeout_must_be_positive() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|p| p.into_inner());
        clear_env();
        for bad in ["0", "soon", "-5"] {
            unsafe { std::env::set_var("CAMPAIGN_GATEWAY_TIMEOUT_MS", bad) };
            assert!(Config::from_env().is_err(), "accepted {bad}");
        }

        unsafe { std::env::set_var("CAMPAIGN_GATEWAY_TIMEOUT_MS", "250") };
        let cfg = Config::from_env().expect("config");
        assert_eq!(cfg.gateway_timeout(), Duration::from_millis(250));
        clear_env();
    }

    #[test]
    fn port_falls_back_to_plain_port_var() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|p| p.into_inner());
        clear_env();
        unsafe { std::env::set_var("PORT", "8080") };
        assert_eq!(Config::from_env().map(|c| c.port), Ok(8080));

        unsafe { std::env::set_var("CAMPAIGN_PORT", "9090") };
        assert_eq!(Config::from_env().map(|c| c.port), Ok(9090));
        clear_env();
    }
}
