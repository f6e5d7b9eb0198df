use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

pub const DEFAULT_SERVICE_DESK_URL: &str = "https://sampleapi.squaredup.com/integrations/v1/service-desk";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} has an invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub service_desk_url: String,
    pub bind_address: SocketAddr,
    pub dashboard_datapoints: u32,
    pub issue_type_datapoints: u32,
    pub static_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_desk_url: DEFAULT_SERVICE_DESK_URL.to_string(),
            bind_address: SocketAddr::from(([0, 0, 0, 0], 8080)),
            dashboard_datapoints: 100,
            issue_type_datapoints: 500,
            static_dir: PathBuf::from("static"),
        }
    }
}

impl Config {
    /// Reads settings from the environment; call `dotenv` first to pick up a
    /// local `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Config::default();
        Ok(Self {
            service_desk_url: lookup("SERVICE_DESK_URL").unwrap_or(defaults.service_desk_url),
            bind_address: parsed(&lookup, "BIND_ADDRESS")?.unwrap_or(defaults.bind_address),
            dashboard_datapoints: parsed(&lookup, "DASHBOARD_DATAPOINTS")?
                .unwrap_or(defaults.dashboard_datapoints),
            issue_type_datapoints: parsed(&lookup, "ISSUE_TYPE_DATAPOINTS")?
                .unwrap_or(defaults.issue_type_datapoints),
            static_dir: lookup("STATIC_DIR").map(PathBuf::from).unwrap_or(defaults.static_dir),
        })
    }
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(name)
        .map(|value| {
            value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                name,
                reason: e.to_string(),
                value,
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.service_desk_url, DEFAULT_SERVICE_DESK_URL);
        assert_eq!(config.bind_address.to_string(), "0.0.0.0:8080");
        assert_eq!(config.dashboard_datapoints, 100);
        assert_eq!(config.issue_type_datapoints, 500);
        assert_eq!(config.static_dir, PathBuf::from("static"));
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = Config::from_lookup(lookup(&[
            ("SERVICE_DESK_URL", "http://localhost:9000/desk"),
            ("BIND_ADDRESS", "127.0.0.1:3000"),
            ("DASHBOARD_DATAPOINTS", " 25 "),
        ]))
        .unwrap();
        assert_eq!(config.service_desk_url, "http://localhost:9000/desk");
        assert_eq!(config.bind_address.port(), 3000);
        assert_eq!(config.dashboard_datapoints, 25);
        assert_eq!(config.issue_type_datapoints, 500);
    }

    #[test]
    fn malformed_values_name_the_variable() {
        let err = Config::from_lookup(lookup(&[("ISSUE_TYPE_DATAPOINTS", "lots")])).unwrap_err();
        assert!(err.to_string().starts_with("ISSUE_TYPE_DATAPOINTS has an invalid value \"lots\""));

        assert!(Config::from_lookup(lookup(&[("BIND_ADDRESS", "localhost")])).is_err());
    }
}
