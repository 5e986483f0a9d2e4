use crate::error_handler::AppError;

pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Listener address from `API_HOST` / `API_PORT`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(&|k| std::env::var(k).ok())
    }

    pub fn from_lookup(env: &dyn Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let get = |k: &str| env(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let raw_port = get("API_PORT").ok_or(AppError::MissingEnv("API_PORT"))?;
        let port = raw_port.parse::<u16>().map_err(|_| AppError::InvalidEnv {
            key: "API_PORT",
            value: raw_port.clone(),
        })?;
        let host = get("API_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());

        Ok(Self { host, port })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_is_required() {
        assert!(matches!(
            ServerConfig::from_lookup(&|_| None),
            Err(AppError::MissingEnv("API_PORT"))
        ));
    }

    #[test]
    fn host_defaults_to_all_interfaces() {
        let cfg = ServerConfig::from_lookup(&|k| (k == "API_PORT").then(|| "3000".to_string())).unwrap();
        assert_eq!(cfg.addr(), "0.0.0.0:3000");
    }

    #[test]
    fn non_numeric_port_is_rejected() {
        let env = |k: &str| match k {
            "API_PORT" => Some("http".to_string()),
            "API_HOST" => Some("127.0.0.1".to_string()),
            _ => None,
        };
        assert!(matches!(
            ServerConfig::from_lookup(&env),
            Err(AppError::InvalidEnv { key: "API_PORT", .. })
        ));
    }
}
