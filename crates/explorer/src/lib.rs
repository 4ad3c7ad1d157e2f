//! Client for the contract verification API of Etherscan-compatible block
//! explorers (Etherscan, Arbiscan, Basescan, Blockscout, ...).

pub mod dto;

use {
    alloy::primitives::{Address, Bytes},
    reqwest::{Client, StatusCode},
    std::time::Duration,
    thiserror::Error,
    url::Url,
};

/// Everything the explorer needs to recompile a contract and compare it with
/// the bytecode deployed at `address`.
#[derive(Clone, Debug, PartialEq)]
pub struct VerificationRequest {
    pub address: Address,
    /// Fully qualified name, `<source path>:<contract name>`.
    pub contract_name: String,
    /// Full compiler version including the commit, e.g.
    /// `v0.8.17+commit.8df45f5f`.
    pub compiler_version: String,
    /// Solidity standard JSON input the contract was compiled from.
    pub source: serde_json::Value,
    /// ABI encoded constructor arguments.
    pub constructor_arguments: Bytes,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Verification {
    /// The explorer accepted and verified the submitted sources.
    Verified,
    /// The sources were published before, nothing was submitted.
    AlreadyVerified,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to send explorer request")]
    Send(#[source] reqwest::Error),

    #[error("explorer responded with HTTP status {0}")]
    Status(StatusCode),

    #[error("could not deserialize explorer response {1:?}")]
    Deserialize(#[source] serde_json::Error, String),

    #[error("explorer rejected the request: {0}")]
    Rejected(String),

    #[error("verification failed: {0}")]
    Failed(String),

    #[error("verification still pending after {0} status checks")]
    Timeout(usize),
}

/// Abstract contract verification. Provides a mockable implementation.
#[cfg_attr(any(test, feature = "test-util"), mockall::automock)]
#[async_trait::async_trait]
pub trait ContractVerifying: Send + Sync {
    /// Publishes the sources of a deployed contract and waits until the
    /// explorer finished checking them.
    async fn verify(&self, request: &VerificationRequest) -> Result<Verification, Error>;
}

#[derive(Clone, Debug)]
pub struct Config {
    /// Endpoint of the API, e.g. `https://api-goerli.arbiscan.io/api`.
    pub api_url: Url,
    pub api_key: String,
    /// Time between two `checkverifystatus` calls.
    pub poll_interval: Duration,
    /// How often the status is checked before giving up.
    pub max_attempts: usize,
}

/// Etherscan HTTP API.
#[derive(Debug)]
pub struct EtherscanApi {
    client: Client,
    config: Config,
}

enum Submission {
    Guid(String),
    AlreadyVerified,
}

impl EtherscanApi {
    pub fn new(client: Client, config: Config) -> Self {
        Self { client, config }
    }

    /// Returns whether the explorer already has sources for `address`.
    async fn is_verified(&self, address: Address) -> Result<bool, Error> {
        let response = self
            .get(&[
                ("module", "contract"),
                ("action", "getsourcecode"),
                ("address", &address.to_string()),
            ])
            .await?;
        if !response.is_ok() {
            // Rate limits and not yet indexed addresses end up here. The
            // submission decides whether the sources are accepted.
            tracing::debug!(%address, reason = %response.reason(), "source code lookup failed");
            return Ok(false);
        }
        let sources: Vec<dto::SourceCode> = serde_json::from_value(response.result.clone())
            .map_err(|err| Error::Deserialize(err, response.result.to_string()))?;
        Ok(sources
            .first()
            .is_some_and(|source| !source.source_code.is_empty()))
    }

    async fn submit(&self, request: &VerificationRequest) -> Result<Submission, Error> {
        let form = dto::VerifySourceCode {
            apikey: &self.config.api_key,
            module: "contract",
            action: "verifysourcecode",
            contract_address: request.address.to_string(),
            source_code: request.source.to_string(),
            code_format: "solidity-standard-json-input",
            contract_name: &request.contract_name,
            compiler_version: &request.compiler_version,
            constructor_arguments: alloy::primitives::hex::encode(&request.constructor_arguments),
        };
        let response = self
            .client
            .post(self.config.api_url.clone())
            .form(&form)
            .send()
            .await
            .map_err(Error::Send)?;
        let response = parse(response).await?;

        let reason = response.reason();
        match response.result {
            serde_json::Value::String(guid) if response.status == "1" => Ok(Submission::Guid(guid)),
            _ if reason.to_lowercase().contains(dto::ALREADY_VERIFIED) => {
                Ok(Submission::AlreadyVerified)
            }
            _ => Err(Error::Rejected(reason)),
        }
    }

    async fn await_verification(&self, guid: &str) -> Result<Verification, Error> {
        for attempt in 1..=self.config.max_attempts {
            tokio::time::sleep(self.config.poll_interval).await;
            let response = self
                .get(&[
                    ("module", "contract"),
                    ("action", "checkverifystatus"),
                    ("guid", guid),
                ])
                .await?;
            let status = response.reason();
            tracing::debug!(%guid, attempt, %status, "verification status");

            if status == dto::PENDING {
                continue;
            }
            if status == dto::VERIFIED {
                return Ok(Verification::Verified);
            }
            if status.to_lowercase().contains(dto::ALREADY_VERIFIED) {
                return Ok(Verification::AlreadyVerified);
            }
            return Err(Error::Failed(status));
        }
        Err(Error::Timeout(self.config.max_attempts))
    }

    async fn get(&self, query: &[(&str, &str)]) -> Result<dto::Response, Error> {
        let response = self
            .client
            .get(self.config.api_url.clone())
            .query(&[("apikey", self.config.api_key.as_str())])
            .query(query)
            .send()
            .await
            .map_err(Error::Send)?;
        parse(response).await
    }
}

async fn parse(response: reqwest::Response) -> Result<dto::Response, Error> {
    let status = response.status();
    if !status.is_success() {
        return Err(Error::Status(status));
    }
    let body = response.text().await.map_err(Error::Send)?;
    serde_json::from_str(&body).map_err(|err| Error::Deserialize(err, body))
}

#[async_trait::async_trait]
impl ContractVerifying for EtherscanApi {
    async fn verify(&self, request: &VerificationRequest) -> Result<Verification, Error> {
        if self.is_verified(request.address).await? {
            tracing::debug!(address = %request.address, "sources already published");
            return Ok(Verification::AlreadyVerified);
        }

        match self.submit(request).await? {
            Submission::AlreadyVerified => Ok(Verification::AlreadyVerified),
            Submission::Guid(guid) => {
                tracing::debug!(%guid, contract = %request.contract_name, "submitted sources");
                self.await_verification(&guid).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        alloy::primitives::{address, bytes},
        axum::{
            Form,
            Json,
            Router,
            extract::{Query, State},
            routing::get,
        },
        maplit::hashmap,
        serde_json::json,
        std::{
            collections::{HashMap, VecDeque},
            net::SocketAddr,
            sync::{Arc, Mutex},
        },
    };

    type Params = HashMap<String, String>;

    /// Canned explorer: answers `getsourcecode` with `published`, every
    /// submission with `submission` and status checks from `statuses`.
    #[derive(Clone, Default)]
    struct Explorer {
        published: bool,
        /// Answer `getsourcecode` with this reason and status `0`.
        lookup_error: Option<&'static str>,
        submission: serde_json::Value,
        statuses: Arc<Mutex<VecDeque<String>>>,
        submitted: Arc<Mutex<Vec<Params>>>,
    }

    async fn handle_get(
        State(explorer): State<Explorer>,
        Query(params): Query<Params>,
    ) -> Json<serde_json::Value> {
        assert_eq!(params["apikey"], "key");
        match params["action"].as_str() {
            "getsourcecode" => {
                if let Some(reason) = explorer.lookup_error {
                    return Json(json!({ "status": "0", "message": "NOTOK", "result": reason }));
                }
                let source = if explorer.published { "pragma solidity;" } else { "" };
                Json(json!({
                    "status": "1",
                    "message": "OK",
                    "result": [{ "SourceCode": source, "ContractName": "" }],
                }))
            }
            "checkverifystatus" => {
                assert_eq!(params["guid"], "guid-1");
                let status = explorer
                    .statuses
                    .lock()
                    .unwrap()
                    .pop_front()
                    .unwrap_or_else(|| dto::PENDING.to_string());
                Json(json!({ "status": "1", "message": "OK", "result": status }))
            }
            action => panic!("unexpected action {action}"),
        }
    }

    async fn handle_post(
        State(explorer): State<Explorer>,
        Form(params): Form<Params>,
    ) -> Json<serde_json::Value> {
        explorer.submitted.lock().unwrap().push(params);
        Json(explorer.submission.clone())
    }

    async fn serve(explorer: Explorer) -> SocketAddr {
        let app = Router::new()
            .route("/api", get(handle_get).post(handle_post))
            .with_state(explorer);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        addr
    }

    fn api(addr: SocketAddr, max_attempts: usize) -> EtherscanApi {
        EtherscanApi::new(
            Client::new(),
            Config {
                api_url: format!("http://{addr}/api").parse().unwrap(),
                api_key: "key".to_string(),
                poll_interval: Duration::from_millis(1),
                max_attempts,
            },
        )
    }

    fn request() -> VerificationRequest {
        VerificationRequest {
            address: address!("5FbDB2315678afecb367f032d93F642f64180aa3"),
            contract_name: "contracts/Staking.sol:Staking".to_string(),
            compiler_version: "v0.8.17+commit.8df45f5f".to_string(),
            source: json!({
                "language": "Solidity",
                "sources": { "contracts/Staking.sol": { "content": "contract Staking {}" } },
            }),
            constructor_arguments: bytes!(
                "000000000000000000000000e7f1725e7734ce288f8367e1bb143e90bb3f0512"
            ),
        }
    }

    fn accepted() -> serde_json::Value {
        json!({ "status": "1", "message": "OK", "result": "guid-1" })
    }

    #[tokio::test]
    async fn submits_sources_and_polls_until_verified() {
        let explorer = Explorer {
            submission: accepted(),
            statuses: Arc::new(Mutex::new(
                [dto::PENDING, dto::PENDING, dto::VERIFIED]
                    .map(String::from)
                    .into(),
            )),
            ..Default::default()
        };
        let addr = serve(explorer.clone()).await;

        let result = api(addr, 5).verify(&request()).await.unwrap();
        assert_eq!(result, Verification::Verified);

        let submitted = explorer.submitted.lock().unwrap();
        assert_eq!(submitted.len(), 1);
        let form = &submitted[0];
        let expected = hashmap! {
            "apikey" => "key",
            "module" => "contract",
            "action" => "verifysourcecode",
            "contractaddress" => "0x5FbDB2315678afecb367f032d93F642f64180aa3",
            "codeformat" => "solidity-standard-json-input",
            "contractname" => "contracts/Staking.sol:Staking",
            "compilerversion" => "v0.8.17+commit.8df45f5f",
            "constructorArguements" =>
                "000000000000000000000000e7f1725e7734ce288f8367e1bb143e90bb3f0512",
        };
        for (key, value) in expected {
            assert_eq!(form[key], value, "form field {key}");
        }
        let source: serde_json::Value = serde_json::from_str(&form["sourceCode"]).unwrap();
        assert_eq!(source, request().source);
    }

    #[tokio::test]
    async fn skips_submission_when_already_published() {
        let explorer = Explorer {
            published: true,
            ..Default::default()
        };
        let addr = serve(explorer.clone()).await;

        let result = api(addr, 5).verify(&request()).await.unwrap();
        assert_eq!(result, Verification::AlreadyVerified);
        assert!(explorer.submitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_source_lookup_still_submits() {
        let explorer = Explorer {
            lookup_error: Some("Max rate limit reached"),
            submission: accepted(),
            statuses: Arc::new(Mutex::new([dto::VERIFIED.to_string()].into())),
            ..Default::default()
        };
        let addr = serve(explorer.clone()).await;

        let result = api(addr, 5).verify(&request()).await.unwrap();
        assert_eq!(result, Verification::Verified);
        assert_eq!(explorer.submitted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejected_submission_of_verified_contract_is_not_an_error() {
        let explorer = Explorer {
            submission: json!({
                "status": "0",
                "message": "NOTOK",
                "result": "Contract source code already verified",
            }),
            ..Default::default()
        };
        let addr = serve(explorer).await;

        let result = api(addr, 5).verify(&request()).await.unwrap();
        assert_eq!(result, Verification::AlreadyVerified);
    }

    #[tokio::test]
    async fn rejected_submission_is_an_error() {
        let explorer = Explorer {
            submission: json!({
                "status": "0",
                "message": "NOTOK",
                "result": "Unable to locate ContractCode at 0x5fbdb2315678afecb367f032d93f642f64180aa3",
            }),
            ..Default::default()
        };
        let addr = serve(explorer).await;

        let err = api(addr, 5).verify(&request()).await.unwrap_err();
        assert!(
            matches!(&err, Error::Rejected(reason) if reason.starts_with("Unable to locate")),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn failed_verification_is_an_error() {
        let explorer = Explorer {
            submission: accepted(),
            statuses: Arc::new(Mutex::new(
                ["Fail - Unable to verify".to_string()].into(),
            )),
            ..Default::default()
        };
        let addr = serve(explorer).await;

        let err = api(addr, 5).verify(&request()).await.unwrap_err();
        assert!(
            matches!(&err, Error::Failed(status) if status == "Fail - Unable to verify"),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let explorer = Explorer {
            submission: accepted(),
            ..Default::default()
        };
        let addr = serve(explorer).await;

        let err = api(addr, 3).verify(&request()).await.unwrap_err();
        assert!(matches!(err, Error::Timeout(3)), "{err:?}");
    }
}
