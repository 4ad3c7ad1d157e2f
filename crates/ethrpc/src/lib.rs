pub mod alloy;

use {
    ::alloy::{
        network::EthereumWallet,
        primitives::Address,
        providers::DynProvider,
        signers::local::PrivateKeySigner,
    },
    url::Url,
};

pub type AlloyProvider = DynProvider;

/// A provider together with the account it signs transactions for.
#[derive(Debug, Clone)]
pub struct Web3 {
    pub provider: AlloyProvider,
    pub wallet: EthereumWallet,
    /// Address of the account transactions are sent from by default.
    pub address: Address,
}

impl Web3 {
    /// Connects to the node at `url` through `client`, signing every
    /// transaction with `signer`.
    pub fn with_signer(client: reqwest::Client, url: &Url, signer: PrivateKeySigner) -> Self {
        let address = signer.address();
        let wallet = EthereumWallet::new(signer);
        Self {
            provider: crate::alloy::provider_with_wallet(client, url, wallet.clone()),
            wallet,
            address,
        }
    }
}
