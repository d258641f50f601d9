//! Command-line arguments and their merge with the TOML file

use crate::session::SessionOptions;
use clap::Parser;
use mxs_common::config::TomlConfig;
use mxs_common::JobLimits;
use std::path::PathBuf;

/// Command-line arguments for mxs-server
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "mxs-server")]
#[command(about = "Matrix multiplication benchmark server")]
#[command(version)]
pub struct Args {
    /// Interface to bind (overrides the config file)
    #[arg(long, env = "MXS_HOST")]
    pub host: Option<String>,

    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "MXS_PORT")]
    pub port: Option<u16>,

    /// Path to the TOML config file
    #[arg(long, env = "MXS_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Effective server settings after merging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub max_request_bytes: usize,
    pub limits: JobLimits,
    pub log_level: String,
}

impl Settings {
    /// Arguments (and their env fallbacks) win over the file
    pub fn merge(args: &Args, file: &TomlConfig) -> Self {
        Self {
            host: args.host.clone().unwrap_or_else(|| file.host.clone()),
            port: args.port.unwrap_or(file.port),
            max_request_bytes: file.max_request_bytes,
            limits: file.job_limits(),
            log_level: file.logging.level.clone(),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            max_request_bytes: self.max_request_bytes,
            limits: self.limits,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        std::env::remove_var("MXS_HOST");
        std::env::remove_var("MXS_PORT");
        std::env::remove_var("MXS_CONFIG");
    }

    #[test]
    #[serial]
    fn test_no_args_uses_file_values() {
        clear_env();
        let args = Args::try_parse_from(["mxs-server"]).unwrap();
        let file = TomlConfig::from_toml_str(
            "port = 9000\nmax_request_bytes = 128\nmax_matrix_size = 512\nmax_workers = 4\n",
        )
        .unwrap();

        let settings = Settings::merge(&args, &file);
        assert_eq!(settings.bind_addr(), "0.0.0.0:9000");
        let options = settings.session_options();
        assert_eq!(options.max_request_bytes, 128);
        assert_eq!(options.limits.max_matrix_size, 512);
        assert_eq!(options.limits.max_workers, 4);
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        clear_env();
        std::env::set_var("MXS_PORT", "7100");
        let args = Args::try_parse_from(["mxs-server"]).unwrap();
        clear_env();

        let settings = Settings::merge(&args, &TomlConfig::default());
        assert_eq!(settings.port, 7100);
    }

    #[test]
    #[serial]
    fn test_cli_overrides_env() {
        clear_env();
        std::env::set_var("MXS_PORT", "7100");
        let args =
            Args::try_parse_from(["mxs-server", "--port", "7200", "--host", "127.0.0.1"]).unwrap();
        clear_env();

        let settings = Settings::merge(&args, &TomlConfig::default());
        assert_eq!(settings.bind_addr(), "127.0.0.1:7200");
    }

    #[test]
    #[serial]
    fn test_config_path_from_env() {
        clear_env();
        std::env::set_var("MXS_CONFIG", "/etc/mxs/custom.toml");
        let args = Args::try_parse_from(["mxs-server"]).unwrap();
        clear_env();

        assert_eq!(args.config, Some(PathBuf::from("/etc/mxs/custom.toml")));
    }

    #[test]
    #[serial]
    fn test_invalid_port_rejected() {
        clear_env();
        assert!(Args::try_parse_from(["mxs-server", "--port", "not-a-port"]).is_err());
    }
}
