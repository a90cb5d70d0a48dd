use crate::input::{parse_target, target_from_params};
use crate::model::{Config, OutputConfig, OutputFormat, ProbeConfig};
use clap::{ArgAction, Parser};
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(author, version, about = "Checks whether an endpoint relays TLS to a reference service", long_about = None)]
pub struct Cli {
    /// Candidate address as ADDRESS:PORT (alternative to --ip/--port)
    #[arg(value_name = "ADDRESS:PORT", conflicts_with_all = ["ip", "port"])]
    pub target: Option<String>,

    /// Candidate IP or hostname
    #[arg(long = "ip", value_name = "IP")]
    pub ip: Option<String>,

    /// Candidate port
    #[arg(short = 'p', long = "port", value_name = "PORT")]
    pub port: Option<String>,

    /// Connect timeout in milliseconds
    #[arg(long = "connect-timeout", default_value_t = 5000)]
    pub connect_timeout_ms: u64,

    /// Overall timeout for the whole probe in milliseconds
    #[arg(long = "timeout", default_value_t = 15000)]
    pub timeout_ms: u64,

    /// Max bytes accepted from the candidate
    #[arg(long = "max-bytes", default_value_t = 64 * 1024)]
    pub max_bytes: usize,

    /// Output format
    #[arg(long = "output", default_value_t = OutputFormat::Json)]
    pub output: OutputFormat,

    /// Print a short human-readable summary instead of JSON
    #[arg(long = "pretty", action = ArgAction::SetTrue)]
    pub pretty: bool,
}

impl Cli {
    pub fn into_config(self) -> anyhow::Result<Config> {
        if self.connect_timeout_ms == 0 || self.timeout_ms == 0 {
            anyhow::bail!("timeouts must be greater than zero");
        }

        let target = match self.target.as_deref() {
            Some(line) => parse_target(line)?,
            None => target_from_params(self.ip.as_deref(), self.port.as_deref())?,
        };

        Ok(Config {
            target,
            probe: ProbeConfig {
                connect_timeout: Duration::from_millis(self.connect_timeout_ms),
                overall_timeout: Duration::from_millis(self.timeout_ms),
                max_bytes: self.max_bytes.max(1),
                ..ProbeConfig::default()
            },
            output: OutputConfig {
                format: if self.pretty {
                    OutputFormat::Pretty
                } else {
                    self.output
                },
            },
        })
    }
}
