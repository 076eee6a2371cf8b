use std::env;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use crate::planner::PlannerConfig;

/// Complete application configuration, loaded from environment variables or
/// default values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub planner: PlannerConfig,
}

impl AppConfig {
    /// Creates a configuration from the currently available environment
    /// variables.
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig::from_env(),
            planner: planner_config_from_env(),
        }
    }
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    bind_ip: IpAddr,
    display_host: String,
    port: u16,
}

impl ApiConfig {
    const DEFAULT_HOST: &'static str = "0.0.0.0";
    const DEFAULT_PORT: u16 = 8080;

    fn from_env() -> Self {
        let host_value =
            env_string("LOADMASTER_API_HOST").unwrap_or_else(|| Self::DEFAULT_HOST.to_string());
        let (bind_ip, effective_host) = match host_value.parse::<IpAddr>() {
            Ok(ip) => (ip, host_value),
            Err(err) => {
                eprintln!(
                    "⚠️ Could not parse LOADMASTER_API_HOST ('{}'): {}. Using {}.",
                    host_value,
                    err,
                    Self::DEFAULT_HOST
                );
                (
                    Self::DEFAULT_HOST
                        .parse::<IpAddr>()
                        .expect("Default host must be valid"),
                    Self::DEFAULT_HOST.to_string(),
                )
            }
        };

        let port = match env_string("LOADMASTER_API_PORT") {
            Some(raw) => match raw.parse::<u16>() {
                Ok(value) if value != 0 => value,
                Ok(_) => {
                    eprintln!(
                        "⚠️ LOADMASTER_API_PORT must not be 0. Using {}.",
                        Self::DEFAULT_PORT
                    );
                    Self::DEFAULT_PORT
                }
                Err(err) => {
                    eprintln!(
                        "⚠️ Could not parse LOADMASTER_API_PORT ('{}'): {}. Using {}.",
                        raw,
                        err,
                        Self::DEFAULT_PORT
                    );
                    Self::DEFAULT_PORT
                }
            },
            None => Self::DEFAULT_PORT,
        };

        Self {
            bind_ip,
            display_host: effective_host,
            port,
        }
    }

    /// Socket address to bind the server to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    /// Visible hostname for logging and hints.
    pub fn display_host(&self) -> &str {
        &self.display_host
    }

    /// Configured port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Indicates whether binding to all interfaces.
    pub fn binds_to_all_interfaces(&self) -> bool {
        match self.bind_ip {
            IpAddr::V4(addr) => addr == Ipv4Addr::UNSPECIFIED,
            IpAddr::V6(addr) => addr == Ipv6Addr::UNSPECIFIED,
        }
    }
}

const CLOSURE_THRESHOLD_VAR: &str = "LOADMASTER_CLOSURE_THRESHOLD";
const PACKING_LOSS_VAR: &str = "LOADMASTER_PACKING_LOSS_FACTOR";
const REFERENCE_ARM_VAR: &str = "LOADMASTER_SHORING_REFERENCE_ARM";

fn planner_config_from_env() -> PlannerConfig {
    let closure_threshold = load_f64_with_warning(
        CLOSURE_THRESHOLD_VAR,
        PlannerConfig::DEFAULT_CLOSURE_THRESHOLD,
        |value| (0.0..=1.0).contains(&value),
        "must be between 0 and 1",
        "Warning: Adjusted closure threshold changes when ULDs stop accepting cargo",
    );

    let packing_loss_factor = load_f64_with_warning(
        PACKING_LOSS_VAR,
        PlannerConfig::DEFAULT_PACKING_LOSS_FACTOR,
        |value| value > 0.0 && value <= 1.0,
        "must be between 0 and 1",
        "Warning: Adjusted packing loss factor changes every volume capacity",
    );

    let reference_arm_in = load_f64_with_warning(
        REFERENCE_ARM_VAR,
        PlannerConfig::DEFAULT_REFERENCE_ARM_IN,
        |value| value >= 0.0,
        "must not be negative",
        "Warning: Adjusted reference arm changes pre-allocation shoring estimates",
    );

    PlannerConfig::builder()
        .closure_threshold(closure_threshold)
        .packing_loss_factor(packing_loss_factor)
        .reference_arm_in(reference_arm_in)
        .build()
}

fn env_string(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            eprintln!(
                "⚠️ Access to {} failed: {}. Using default value.",
                name, err
            );
            None
        }
    }
}

fn load_f64_with_warning(
    var_name: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
    warning: &str,
) -> f64 {
    match env_string(var_name) {
        Some(raw) => match raw.parse::<f64>() {
            Ok(value) => {
                if !validator(value) {
                    eprintln!(
                        "⚠️ {} contains invalid value '{}': {}. Using {}.",
                        var_name, raw, invalid_hint, default
                    );
                    default
                } else {
                    let tolerance = (default.abs().max(1.0)) * 1e-9;
                    if (value - default).abs() > tolerance {
                        println!("⚠️ {} ({} = {}).", warning, var_name, value);
                    }
                    value
                }
            }
            Err(err) => {
                eprintln!(
                    "⚠️ Could not parse {} ('{}') as number: {}. Using {}.",
                    var_name, raw, err, default
                );
                default
            }
        },
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_planner_constants() {
        let config = planner_config_from_env();
        assert_eq!(config.closure_threshold, PlannerConfig::DEFAULT_CLOSURE_THRESHOLD);
        assert_eq!(config.packing_loss_factor, PlannerConfig::DEFAULT_PACKING_LOSS_FACTOR);
        assert_eq!(config.reference_arm_in, PlannerConfig::DEFAULT_REFERENCE_ARM_IN);
    }

    #[test]
    fn load_f64_keeps_default_on_invalid_values() {
        // unset variable falls straight through to the default
        let value = load_f64_with_warning(
            "LOADMASTER_TEST_UNSET_VAR",
            0.95,
            |v| (0.0..=1.0).contains(&v),
            "must be between 0 and 1",
            "warning",
        );
        assert_eq!(value, 0.95);
    }
}
