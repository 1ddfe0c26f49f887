/// Configuration management for Product Service
///
/// Configuration is read from environment variables (optionally seeded from a
/// `.env` file by the binaries).
///
/// **Environment Variables**:
/// - `APP_ENV`: deployment environment (default: development)
/// - `PRODUCT_SERVICE_HOST`: bind host (default: 0.0.0.0)
/// - `PRODUCT_HTTP_PORT`: HTTP port (default: 8080)
/// - `PRODUCT_GRPC_PORT`: gRPC port (default: 9080)
/// - `PRODUCT_GRPC_UPSTREAM`: product gRPC endpoint used by the gateway
/// - `HTTP_AUTH_MODE`: `jwt` or `trust` for inbound HTTP (default: jwt)
/// - `GRPC_AUTH_MODE`: `jwt` or `trust` for inbound gRPC (default: trust)
/// - `GRPC_CLIENT_AUTH_MODE`: `jwt` or `trust` for outbound gRPC (default: trust)
/// - `LOG_FORMAT`: `json` for JSON log lines, anything else for plain text
///
/// Key settings (`JWT_SECRET`, `JWT_PUBLIC_KEY_PEM`, `KEY_SERVICE_URL`,
/// `JWT_ALG`, `KEY_FETCH_TIMEOUT_MS`) are read by [`AuthConfig`].
use auth_core::{AuthConfig, AuthMode, AuthService};
use std::str::FromStr;
use std::sync::Arc;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Token verification settings
    pub auth: AuthConfig,
    /// Auth variant per transport
    pub auth_modes: AuthModes,
    /// Product gRPC endpoint the gateway forwards to
    pub grpc_upstream: String,
}

/// Application settings
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Application environment (dev, staging, prod)
    pub env: String,
    pub host: String,
    pub http_port: u16,
    pub grpc_port: u16,
    /// Emit JSON log lines
    pub json_logs: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthModes {
    pub http: AuthMode,
    pub grpc: AuthMode,
    pub grpc_client: AuthMode,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let auth = AuthConfig::from_lookup(&lookup).map_err(|e| e.to_string())?;

        let app = AppConfig {
            env: auth.app_env.clone(),
            host: var("PRODUCT_SERVICE_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            http_port: parse_or("PRODUCT_HTTP_PORT", var("PRODUCT_HTTP_PORT"), 8080)?,
            grpc_port: parse_or("PRODUCT_GRPC_PORT", var("PRODUCT_GRPC_PORT"), 9080)?,
            json_logs: var("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json")),
        };

        let auth_modes = AuthModes {
            http: parse_or("HTTP_AUTH_MODE", var("HTTP_AUTH_MODE"), AuthMode::Jwt)?,
            grpc: parse_or("GRPC_AUTH_MODE", var("GRPC_AUTH_MODE"), AuthMode::Trust)?,
            grpc_client: parse_or(
                "GRPC_CLIENT_AUTH_MODE",
                var("GRPC_CLIENT_AUTH_MODE"),
                AuthMode::Trust,
            )?,
        };

        let grpc_upstream = var("PRODUCT_GRPC_UPSTREAM")
            .unwrap_or_else(|| format!("http://127.0.0.1:{}", app.grpc_port));

        Ok(Config {
            app,
            auth,
            auth_modes,
            grpc_upstream,
        })
    }

    pub fn http_bind_address(&self) -> String {
        format!("{}:{}", self.app.host, self.app.http_port)
    }

    pub fn grpc_bind_address(&self) -> String {
        format!("{}:{}", self.app.host, self.app.grpc_port)
    }

    /// Auth service for a transport mode
    pub fn auth_service(&self, mode: AuthMode) -> Result<Arc<dyn AuthService>, String> {
        self.auth
            .build_service(mode)
            .map_err(|e| format!("{mode} auth: {e}"))
    }
}

fn parse_or<T>(name: &str, raw: Option<String>, default: T) -> Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| format!("{name} is invalid ({raw}): {e}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();

        assert_eq!(config.http_bind_address(), "0.0.0.0:8080");
        assert_eq!(config.grpc_bind_address(), "0.0.0.0:9080");
        assert_eq!(config.grpc_upstream, "http://127.0.0.1:9080");
        assert_eq!(
            config.auth_modes,
            AuthModes {
                http: AuthMode::Jwt,
                grpc: AuthMode::Trust,
                grpc_client: AuthMode::Trust,
            }
        );
        assert!(!config.app.json_logs);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("PRODUCT_HTTP_PORT", "18080"),
            ("PRODUCT_GRPC_PORT", "19080"),
            ("HTTP_AUTH_MODE", "trust"),
            ("GRPC_AUTH_MODE", "JWT"),
            ("LOG_FORMAT", "json"),
        ])
        .unwrap();

        assert_eq!(config.app.http_port, 18080);
        assert_eq!(config.grpc_upstream, "http://127.0.0.1:19080");
        assert_eq!(config.auth_modes.http, AuthMode::Trust);
        assert_eq!(config.auth_modes.grpc, AuthMode::Jwt);
        assert!(config.app.json_logs);
    }

    #[test]
    fn test_invalid_values_are_reported() {
        let err = load(&[("PRODUCT_HTTP_PORT", "eighty")]).unwrap_err();
        assert!(err.contains("PRODUCT_HTTP_PORT"));

        let err = load(&[("GRPC_AUTH_MODE", "oauth")]).unwrap_err();
        assert!(err.contains("GRPC_AUTH_MODE"));
    }

    #[test]
    fn test_jwt_without_key_cannot_build() {
        let config = load(&[]).unwrap();
        assert!(config.auth_service(AuthMode::Jwt).is_err());
        assert!(config.auth_service(AuthMode::Trust).is_ok());

        let config = load(&[("JWT_SECRET", "secret")]).unwrap();
        assert_eq!(
            config.auth_service(AuthMode::Jwt).map(|auth| auth.kind()),
            Ok("jwt")
        );
    }

    #[test]
    #[serial]
    fn test_from_env_reads_process_environment() {
        std::env::set_var("PRODUCT_SERVICE_HOST", "127.0.0.1");
        let config = Config::from_env();
        std::env::remove_var("PRODUCT_SERVICE_HOST");

        assert_eq!(config.unwrap().app.host, "127.0.0.1");
    }
}
