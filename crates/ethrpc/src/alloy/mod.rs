mod instrumentation;

use {
    crate::AlloyProvider,
    alloy::{
        network::EthereumWallet,
        providers::{Provider, ProviderBuilder},
        rpc::client::ClientBuilder,
        signers::local::PrivateKeySigner,
    },
    anyhow::{Context, Result},
    instrumentation::InstrumentationLayer,
    url::Url,
};

/// Creates a provider that fills and signs transactions with `wallet`. Requests
/// are sent with `client`, so its timeout applies to every RPC call.
pub fn provider_with_wallet(
    client: reqwest::Client,
    url: &Url,
    wallet: EthereumWallet,
) -> AlloyProvider {
    let rpc = ClientBuilder::default()
        .layer(InstrumentationLayer)
        .http_with_client(client, url.clone());
    ProviderBuilder::new()
        .wallet(wallet)
        .connect_client(rpc)
        .erased()
}

/// Parses a hex encoded private key, with or without `0x` prefix.
pub fn signer_from_private_key(key: &str) -> Result<PrivateKeySigner> {
    key.trim()
        .parse()
        .context("private key is not a valid 32 byte hex string")
}
