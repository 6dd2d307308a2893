use anyhow::{anyhow, Result};
use clap::ArgMatches;
use lazy_static::lazy_static;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub static SERVICE_NAME: &str = "deployment-admission-controller";

lazy_static! {
    pub(crate) static ref HOSTNAME: String =
        std::env::var("HOSTNAME").unwrap_or_else(|_| String::from("unknown"));
}

pub struct Config {
    pub addr: SocketAddr,
    pub tls_config: Option<TlsConfig>,
    pub liveness_interval: Duration,
    pub ignore_kubernetes_connection_failure: bool,
    pub log_level: String,
    pub log_fmt: String,
    pub log_no_color: bool,
}

#[derive(Clone, Debug)]
pub struct TlsConfig {
    pub cert_file: PathBuf,
    pub key_file: PathBuf,
}

impl Config {
    pub fn from_args(matches: &ArgMatches) -> Result<Self> {
        let addr = api_bind_address(matches)?;

        let (cert_file, key_file) = tls_files(matches)?;
        let tls_config = if cert_file.is_empty() {
            None
        } else {
            Some(TlsConfig {
                cert_file: PathBuf::from(cert_file),
                key_file: PathBuf::from(key_file),
            })
        };

        let liveness_interval = liveness_interval(matches)?;
        let ignore_kubernetes_connection_failure = matches
            .get_one::<bool>("ignore-kubernetes-connection-failure")
            .expect("clap should have set a default value")
            .to_owned();

        let log_level = matches
            .get_one::<String>("log-level")
            .expect("This should not happen, there's a default value for log-level")
            .to_owned();
        let log_fmt = matches
            .get_one::<String>("log-fmt")
            .expect("This should not happen, there's a default value for log-fmt")
            .to_owned();
        let log_no_color = matches
            .get_one::<bool>("log-no-color")
            .expect("clap should have assigned a default value")
            .to_owned();

        Ok(Self {
            addr,
            tls_config,
            liveness_interval,
            ignore_kubernetes_connection_failure,
            log_level,
            log_fmt,
            log_no_color,
        })
    }
}

fn api_bind_address(matches: &clap::ArgMatches) -> Result<SocketAddr> {
    format!(
        "{}:{}",
        matches
            .get_one::<String>("address")
            .expect("clap should have set a default value"),
        matches
            .get_one::<String>("port")
            .expect("clap should have set a default value")
    )
    .parse()
    .map_err(|e| anyhow!("error parsing arguments: {}", e))
}

fn tls_files(matches: &clap::ArgMatches) -> Result<(String, String)> {
    let cert_file = matches
        .get_one::<String>("cert-file")
        .expect("clap should have set a default value")
        .to_owned();
    let key_file = matches
        .get_one::<String>("key-file")
        .expect("clap should have set a default value")
        .to_owned();
    if cert_file.is_empty() != key_file.is_empty() {
        Err(anyhow!("error parsing arguments: either both --cert-file and --key-file must be provided, or neither"))
    } else {
        Ok((cert_file, key_file))
    }
}

fn liveness_interval(matches: &clap::ArgMatches) -> Result<Duration> {
    let seconds = matches
        .get_one::<String>("liveness-interval")
        .expect("clap should have set a default value")
        .parse::<u64>()
        .map_err(|e| anyhow!("error parsing --liveness-interval: {}", e))?;
    if seconds == 0 {
        return Err(anyhow!("--liveness-interval must be greater than zero"));
    }

    Ok(Duration::from_secs(seconds))
}
