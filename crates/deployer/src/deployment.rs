use {
    crate::contracts::Contract,
    alloy::{
        network::{ReceiptResponse, TransactionBuilder},
        primitives::{Address, Bytes, TxHash, utils::format_ether},
        providers::Provider,
        rpc::types::TransactionRequest,
    },
    anyhow::{Context, Result, ensure},
    ethrpc::Web3,
    std::time::Duration,
};

/// A mined contract creation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Deployment {
    pub address: Address,
    pub transaction: TxHash,
    pub block: Option<u64>,
}

/// Abstract contract creation. Provides a mockable implementation.
#[cfg_attr(any(test, feature = "test-util"), mockall::automock)]
#[async_trait::async_trait]
pub trait Deploying: Send + Sync {
    /// The account deployments are sent from.
    fn deployer(&self) -> Address;

    /// Sends a creation transaction with `code` (creation bytecode followed
    /// by the encoded constructor arguments) and waits until it is mined.
    async fn deploy(&self, contract: Contract, code: Bytes) -> Result<Deployment>;
}

/// Deploys contracts through a node, signing with a local account.
pub struct OnchainDeployer {
    web3: Web3,
    confirmations: u64,
    timeout: Duration,
}

impl OnchainDeployer {
    pub fn new(web3: Web3, confirmations: u64, timeout: Duration) -> Self {
        Self {
            web3,
            confirmations,
            timeout,
        }
    }

    /// Fails when the node is connected to a different chain than expected.
    pub async fn ensure_chain_id(&self, expected: u64) -> Result<()> {
        let chain_id = self
            .web3
            .provider
            .get_chain_id()
            .await
            .context("could not fetch current chain id")?;
        ensure!(
            chain_id == expected,
            "node reports chain id {chain_id} but {expected} is configured"
        );
        Ok(())
    }

    /// Logs the state of the deployer account.
    pub async fn log_account(&self) -> Result<()> {
        let address = self.web3.address;
        let nonce = self
            .web3
            .provider
            .get_transaction_count(address)
            .pending()
            .await
            .context("could not fetch deployer nonce")?;
        let balance = self
            .web3
            .provider
            .get_balance(address)
            .await
            .context("could not fetch deployer balance")?;
        tracing::info!(
            %address,
            nonce,
            balance = %format_ether(balance),
            "deployer account"
        );
        if balance.is_zero() {
            tracing::warn!(%address, "deployer account has no funds");
        }
        Ok(())
    }
}

/// Checks that a mined creation transaction succeeded and created a contract.
fn created_contract(
    contract: Contract,
    transaction: TxHash,
    receipt: &impl ReceiptResponse,
) -> Result<Deployment> {
    ensure!(
        receipt.status(),
        "{contract} deployment {transaction:?} reverted"
    );
    let address = receipt.contract_address().with_context(|| {
        format!("receipt of {contract} deployment {transaction:?} has no contract address")
    })?;
    Ok(Deployment {
        address,
        transaction,
        block: receipt.block_number(),
    })
}

#[async_trait::async_trait]
impl Deploying for OnchainDeployer {
    fn deployer(&self) -> Address {
        self.web3.address
    }

    async fn deploy(&self, contract: Contract, code: Bytes) -> Result<Deployment> {
        let tx = TransactionRequest::default()
            .with_from(self.web3.address)
            .with_deploy_code(code);
        let pending = self
            .web3
            .provider
            .send_transaction(tx)
            .await
            .with_context(|| format!("failed to send {contract} deployment"))?;
        let transaction = *pending.tx_hash();
        tracing::debug!(%contract, ?transaction, "sent deployment transaction");

        let receipt = pending
            .with_required_confirmations(self.confirmations)
            .with_timeout(Some(self.timeout))
            .get_receipt()
            .await
            .with_context(|| format!("{contract} deployment {transaction:?} was not mined"))?;
        created_contract(contract, transaction, &receipt)
    }
}
