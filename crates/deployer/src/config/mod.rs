use {
    alloy::primitives::{
        Address,
        U256,
        utils::{ParseUnits, parse_units},
    },
    anyhow::{Context, Result, anyhow, bail},
    serde::Deserialize,
    std::{
        collections::HashMap,
        path::{Path, PathBuf},
        time::Duration,
    },
    url::Url,
};

pub mod secrets;

/// Deployment configuration, loaded from a TOML file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Configuration {
    /// Network used when none is passed on the command line.
    pub default_network: Option<String>,

    /// Directory containing the compiled contract artifacts.
    #[serde(default = "default_artifacts")]
    pub artifacts: PathBuf,

    /// Where the deployment manifest is written to.
    #[serde(default = "default_manifest")]
    pub manifest: PathBuf,

    /// How long to wait after a deployment was mined before submitting its
    /// sources, giving the explorer time to index the new contract.
    #[serde(with = "humantime_serde", default = "default_verification_delay")]
    pub verification_delay: Duration,

    #[serde(default)]
    pub dependencies: Dependencies,

    #[serde(default)]
    pub hands_token: HandsToken,

    pub networks: HashMap<String, Network>,
}

/// Location of the contracts the deployed suite builds on.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Dependencies {
    /// JSON file with the addresses of the dependency contracts.
    #[serde(default = "default_dependency_manifest")]
    pub manifest: PathBuf,

    /// Artifact directory of the dependency contracts.
    #[serde(default = "default_dependency_artifacts")]
    pub artifacts: PathBuf,
}

impl Default for Dependencies {
    fn default() -> Self {
        Self {
            manifest: default_dependency_manifest(),
            artifacts: default_dependency_artifacts(),
        }
    }
}

/// Constructor parameters of the `HandsToken` contract. Missing fields take
/// their value from [`HandsToken::default`].
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct HandsToken {
    /// Receiver of the premint. Defaults to the deployer account.
    pub premint_receiver: Option<Address>,

    /// Premint amount in whole tokens, e.g. `"1000000"` or `"0.5"`.
    pub premint_amount: String,

    /// Supply cap in whole tokens.
    pub supply_cap: String,

    pub decimals: u8,
}

impl HandsToken {
    pub fn premint_amount(&self) -> Result<U256> {
        to_base_units(&self.premint_amount, self.decimals).context("invalid premint-amount")
    }

    pub fn supply_cap(&self) -> Result<U256> {
        to_base_units(&self.supply_cap, self.decimals).context("invalid supply-cap")
    }
}

impl Default for HandsToken {
    fn default() -> Self {
        Self {
            premint_receiver: None,
            premint_amount: "1000000".to_string(),
            supply_cap: "1000000".to_string(),
            decimals: 18,
        }
    }
}

fn to_base_units(amount: &str, decimals: u8) -> Result<U256> {
    match parse_units(amount, decimals)? {
        ParseUnits::U256(amount) => Ok(amount),
        ParseUnits::I256(_) => bail!("amount {amount:?} is negative"),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Network {
    /// JSON-RPC endpoint of the network.
    pub url: Url,

    /// Chain id the node is expected to report.
    pub chain_id: u64,

    /// Number of confirmations to wait for after a deployment was mined.
    #[serde(default = "default_confirmations")]
    pub confirmations: u64,

    /// Maximum time to wait for a deployment transaction to be confirmed.
    #[serde(with = "humantime_serde", default = "default_transaction_timeout")]
    pub transaction_timeout: Duration,

    /// Block explorer to verify deployed contracts on. Verification is
    /// skipped when missing.
    pub explorer: Option<Explorer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Explorer {
    /// Etherscan-compatible API endpoint.
    pub api_url: Url,

    /// Explorer frontend, used to log links to the deployed contracts.
    pub browser_url: Option<Url>,

    #[serde(with = "humantime_serde", default = "default_poll_interval")]
    pub poll_interval: Duration,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
}

impl Explorer {
    /// Link to the explorer page of `address`, if a browser URL is set.
    pub fn address_url(&self, address: Address) -> Option<Url> {
        self.browser_url
            .as_ref()
            .and_then(|url| url.join(&format!("address/{address}")).ok())
    }
}

impl Configuration {
    pub async fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml(&data, path)
    }

    fn from_toml(data: &str, path: &Path) -> Result<Self> {
        match toml::from_str(data) {
            Ok(self_) => Ok(self_),
            Err(err) if std::env::var("TOML_TRACE_ERROR").is_ok_and(|v| v == "1") => Err(anyhow!(
                "failed to parse TOML config at {}: {err:#?}",
                path.display()
            )),
            Err(_) => Err(anyhow!(
                "failed to parse TOML config at: {}. Set TOML_TRACE_ERROR=1 to print parsing \
                 error but this may leak secrets.",
                path.display()
            )),
        }
    }

    /// Resolves the network to deploy to: `name` when given, the configured
    /// default network otherwise.
    pub fn network<'a>(&'a self, name: Option<&'a str>) -> Result<(&'a str, &'a Network)> {
        let name = name
            .or(self.default_network.as_deref())
            .context("no network selected and no default-network configured")?;
        let network = self
            .networks
            .get(name)
            .with_context(|| format!("network {name:?} is not configured"))?;
        Ok((name, network))
    }
}

fn default_artifacts() -> PathBuf {
    "artifacts".into()
}

fn default_manifest() -> PathBuf {
    "local-contracts.json".into()
}

fn default_dependency_manifest() -> PathBuf {
    "local-dependency-contracts.json".into()
}

fn default_dependency_artifacts() -> PathBuf {
    "syncswap-contracts/artifacts-zk".into()
}

fn default_verification_delay() -> Duration {
    Duration::from_secs(5)
}

fn default_confirmations() -> u64 {
    1
}

fn default_transaction_timeout() -> Duration {
    Duration::from_secs(300)
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(3)
}

fn default_max_attempts() -> usize {
    20
}
