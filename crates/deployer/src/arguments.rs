use {
    crate::http_client,
    std::{
        fmt::{self, Display, Formatter},
        path::PathBuf,
    },
    tracing::level_filters::LevelFilter,
};

#[derive(clap::Parser)]
pub struct LoggingArguments {
    #[clap(long, env, default_value = "warn,deployer=debug,explorer=debug,ethrpc=info")]
    pub log_filter: String,

    #[clap(long, env, default_value = "error")]
    pub log_stderr_threshold: LevelFilter,

    /// Emit log events as JSON objects, one per line.
    #[clap(long, env)]
    pub use_json_logs: bool,
}

impl LoggingArguments {
    pub fn observe_config(&self) -> observe::Config {
        observe::Config::new(
            &self.log_filter,
            self.log_stderr_threshold.into_level(),
            self.use_json_logs,
        )
    }
}

impl Display for LoggingArguments {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Self {
            log_filter,
            log_stderr_threshold,
            use_json_logs,
        } = self;

        writeln!(f, "log_filter: {log_filter}")?;
        writeln!(f, "log_stderr_threshold: {log_stderr_threshold}")?;
        writeln!(f, "use_json_logs: {use_json_logs}")
    }
}

/// Deploys the Hands contract suite and writes the deployment manifest.
#[derive(clap::Parser)]
#[command(version)]
pub struct Arguments {
    #[clap(flatten)]
    pub http_client: http_client::Arguments,

    #[clap(flatten)]
    pub logging: LoggingArguments,

    /// Path to the deployment configuration file. This file should be in
    /// TOML format.
    #[clap(long, env, default_value = "deploy.toml")]
    pub config: PathBuf,

    /// Network to deploy to. Defaults to the `default-network` of the
    /// configuration file.
    #[clap(long, env)]
    pub network: Option<String>,

    /// Path to the JSON file holding private keys and explorer API keys.
    #[clap(long, env, default_value = "secrets.json")]
    pub secrets: PathBuf,

    /// Block explorer API key. Takes precedence over the secrets file.
    #[clap(long, env)]
    pub explorer_api_key: Option<String>,

    /// Deploy without publishing sources on the block explorer.
    #[clap(long, env)]
    pub skip_verification: bool,
}

impl Display for Arguments {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Self {
            http_client,
            logging,
            config,
            network,
            secrets,
            explorer_api_key,
            skip_verification,
        } = self;

        write!(f, "{http_client}")?;
        write!(f, "{logging}")?;
        writeln!(f, "config: {}", config.display())?;
        writeln!(f, "network: {network:?}")?;
        writeln!(f, "secrets: {}", secrets.display())?;
        writeln!(
            f,
            "explorer_api_key: {}",
            explorer_api_key.as_ref().map(|_| "SECRET").unwrap_or("None")
        )?;
        writeln!(f, "skip_verification: {skip_verification}")
    }
}
