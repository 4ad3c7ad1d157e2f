use {
    crate::{
        arguments::Arguments,
        artifacts::Artifacts,
        config::{Configuration, Network, secrets::Secrets},
        contracts::Contract,
        dependencies::{self, DependencyAbis, DependencyContracts},
        deployment::{Deploying, OnchainDeployer},
        http_client::HttpClientFactory,
        manifest::{DeployedAbis, DeployedContracts, Manifest},
    },
    alloy::{
        dyn_abi::DynSolValue,
        primitives::{Address, U256},
    },
    anyhow::{Context, Result},
    explorer::{ContractVerifying, EtherscanApi, Verification, VerificationRequest},
    std::{path::Path, sync::Arc, time::Duration},
    url::Url,
};

pub async fn run(args: Arguments) -> Result<()> {
    let config = Configuration::from_path(&args.config).await?;
    let (network_name, network) = config.network(args.network.as_deref())?;
    let secrets = Secrets::from_path(&args.secrets).await?;
    tracing::info!(network = network_name, url = %network.url, "deploying");

    let dependency_contracts =
        dependencies::fetch_contracts(&config.dependencies.manifest).await?;
    tracing::debug!(?dependency_contracts, "loaded dependency contracts");
    let dependency_abis = dependencies::fetch_abis(&config.dependencies.artifacts).await?;

    let http = HttpClientFactory::new(&args.http_client).create()?;
    let signer = ethrpc::alloy::signer_from_private_key(secrets.private_key(network_name)?)?;
    let web3 = ethrpc::Web3::with_signer(http.clone(), &network.url, signer);
    let chain = OnchainDeployer::new(web3, network.confirmations, network.transaction_timeout);
    chain.ensure_chain_id(network.chain_id).await?;
    chain.log_account().await?;

    let verifier = verifier(&args, &secrets, network_name, network, http)?;
    let explorer = network.explorer.as_ref();
    let service = DeploymentService {
        artifacts: Artifacts::new(&config.artifacts),
        chain: Arc::new(chain),
        verifier,
        verification_delay: config.verification_delay,
        browser: Box::new(move |address| explorer.and_then(|e| e.address_url(address))),
    };
    let token = TokenParameters {
        premint_receiver: config.hands_token.premint_receiver,
        premint_amount: config.hands_token.premint_amount()?,
        supply_cap: config.hands_token.supply_cap()?,
    };

    let manifest = service
        .run(dependency_contracts, dependency_abis, &token, &config.manifest)
        .await?;
    tracing::info!(
        manifest = %config.manifest.display(),
        contracts = ?manifest.deployed_contracts,
        "deployment finished"
    );
    Ok(())
}

fn verifier(
    args: &Arguments,
    secrets: &Secrets,
    network_name: &str,
    network: &Network,
    client: reqwest::Client,
) -> Result<Option<Arc<dyn ContractVerifying>>> {
    if args.skip_verification {
        tracing::warn!("contract verification disabled");
        return Ok(None);
    }
    let Some(explorer) = &network.explorer else {
        tracing::warn!(
            network = network_name,
            "no explorer configured, contracts will not be verified"
        );
        return Ok(None);
    };
    let api_key = args
        .explorer_api_key
        .as_deref()
        .or(secrets.explorer_api_key(network_name))
        .with_context(|| format!("no explorer API key for network {network_name:?}"))?;

    Ok(Some(Arc::new(EtherscanApi::new(
        client,
        explorer::Config {
            api_url: explorer.api_url.clone(),
            api_key: api_key.to_string(),
            poll_interval: explorer.poll_interval,
            max_attempts: explorer.max_attempts,
        },
    ))))
}

/// Constructor parameters of the `HandsToken` contract.
#[derive(Clone, Debug)]
pub struct TokenParameters {
    /// Defaults to the deployer account.
    pub premint_receiver: Option<Address>,
    pub premint_amount: U256,
    pub supply_cap: U256,
}

/// A contract of the suite after deployment.
#[derive(Clone, Debug)]
pub struct Deployed {
    pub address: Address,
    pub abi: serde_json::Value,
}

/// Deploys the suite one contract after the other and writes the manifest.
pub struct DeploymentService<'a> {
    pub artifacts: Artifacts,
    pub chain: Arc<dyn Deploying>,
    /// `None` skips verification.
    pub verifier: Option<Arc<dyn ContractVerifying>>,
    pub verification_delay: Duration,
    /// Explorer page of an address, only used for logging.
    pub browser: Box<dyn Fn(Address) -> Option<Url> + Send + Sync + 'a>,
}

impl DeploymentService<'_> {
    /// Deploys every contract and, once all of them succeeded, writes the
    /// manifest to `output`.
    pub async fn run(
        &self,
        dependency_contracts: DependencyContracts,
        dependency_abis: DependencyAbis,
        token: &TokenParameters,
        output: &Path,
    ) -> Result<Manifest> {
        let (deployed_contracts, deployed_abis) = self.deploy_all(token).await?;
        let manifest = Manifest {
            dependency_contracts,
            dependency_abis,
            deployed_contracts,
            deployed_abis,
        };
        manifest.write(output).await?;
        Ok(manifest)
    }

    /// Deploys the suite. Each step waits for the previous one because later
    /// constructors take the addresses of earlier deployments.
    async fn deploy_all(
        &self,
        token: &TokenParameters,
    ) -> Result<(DeployedContracts, DeployedAbis)> {
        let premint_receiver = token
            .premint_receiver
            .unwrap_or_else(|| self.chain.deployer());

        let hands_token = self
            .deploy(
                Contract::HandsToken,
                vec![
                    DynSolValue::Address(premint_receiver),
                    DynSolValue::Uint(token.premint_amount, 256),
                    DynSolValue::Uint(token.supply_cap, 256),
                ],
            )
            .await?;
        let affiliate = self.deploy(Contract::Affiliate, vec![]).await?;
        let staking = self
            .deploy(
                Contract::Staking,
                vec![DynSolValue::Address(hands_token.address)],
            )
            .await?;
        let bank = self
            .deploy(Contract::Bank, vec![DynSolValue::Address(staking.address)])
            .await?;
        let hands = self
            .deploy(Contract::Hands, vec![DynSolValue::Address(bank.address)])
            .await?;
        let session = self.deploy(Contract::Session, vec![]).await?;

        Ok((
            DeployedContracts {
                hands_token: hands_token.address,
                bank: bank.address,
                staking: staking.address,
                hands: hands.address,
                affiliate: affiliate.address,
                session: session.address,
            },
            DeployedAbis {
                hands_token: hands_token.abi,
                bank: bank.abi,
                staking: staking.abi,
                hands: hands.abi,
                affiliate: affiliate.abi,
                session: session.abi,
            },
        ))
    }

    async fn deploy(&self, contract: Contract, args: Vec<DynSolValue>) -> Result<Deployed> {
        let artifact = self.artifacts.read(&contract.artifact_name()).await?;
        let constructor_arguments = artifact.encode_constructor(&args)?;
        let code = artifact.deploy_code(&constructor_arguments)?;
        let build_info = match &self.verifier {
            Some(_) => Some(self.artifacts.build_info(&artifact).await?),
            None => None,
        };

        let deployment = self.chain.deploy(contract, code).await?;
        let url = (self.browser)(deployment.address);
        let url = url.as_ref().map_or("-", Url::as_str);
        tracing::info!(
            %contract,
            address = %deployment.address,
            transaction = ?deployment.transaction,
            block = ?deployment.block,
            url,
            "deployed"
        );

        if let (Some(verifier), Some(build_info)) = (&self.verifier, build_info) {
            tokio::time::sleep(self.verification_delay).await;
            let request = VerificationRequest {
                address: deployment.address,
                contract_name: artifact.fully_qualified_name(),
                compiler_version: format!("v{}", build_info.solc_long_version),
                source: build_info.input,
                constructor_arguments,
            };
            let verification = verifier
                .verify(&request)
                .await
                .with_context(|| format!("failed to verify {contract}"))?;
            match verification {
                Verification::Verified => tracing::info!(%contract, "verified"),
                Verification::AlreadyVerified => tracing::info!(%contract, "already verified"),
            }
        }

        Ok(Deployed {
            address: deployment.address,
            abi: artifact.abi,
        })
    }
}
