//! Contracts deployed before this suite (WETH, vault, pool factories, ...)
//! whose addresses and ABIs are passed through to the manifest.

use {
    alloy::primitives::Address,
    anyhow::{Context, Result},
    serde::{Deserialize, Serialize},
    serde_with::{DisplayFromStr, serde_as},
    std::path::Path,
};

const MISSING_HINT: &str = "deploy the dependency contracts locally first";

#[serde_as]
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyContracts {
    #[serde(rename = "wETH")]
    #[serde_as(as = "DisplayFromStr")]
    pub weth: Address,
    #[serde_as(as = "DisplayFromStr")]
    pub vault: Address,
    #[serde_as(as = "DisplayFromStr")]
    pub master: Address,
    #[serde_as(as = "DisplayFromStr")]
    pub classic_factory: Address,
    #[serde_as(as = "DisplayFromStr")]
    pub stable_factory: Address,
    #[serde_as(as = "DisplayFromStr")]
    pub router: Address,
    #[serde_as(as = "DisplayFromStr")]
    pub fee_manager: Address,
    #[serde_as(as = "DisplayFromStr")]
    pub fee_recipient: Address,
    #[serde_as(as = "DisplayFromStr")]
    pub fee_registry: Address,
    #[serde_as(as = "DisplayFromStr")]
    pub forward_registry: Address,
    /// Any further entries, passed through to the manifest unchanged.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyAbis {
    #[serde(rename = "wETH")]
    pub weth: serde_json::Value,
    pub vault: serde_json::Value,
    pub master: serde_json::Value,
    pub classic_factory: serde_json::Value,
    pub stable_factory: serde_json::Value,
    pub router: serde_json::Value,
    pub fee_manager: serde_json::Value,
    pub fee_recipient: serde_json::Value,
    pub fee_registry: serde_json::Value,
    pub forward_registry: serde_json::Value,
    pub classic_pool: serde_json::Value,
}

/// Reads the dependency address manifest.
pub async fn fetch_contracts(path: &Path) -> Result<DependencyContracts> {
    let data = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}, {MISSING_HINT}", path.display()))?;
    serde_json::from_str(&data)
        .with_context(|| format!("malformed dependency manifest {}", path.display()))
}

/// Reads the ABIs of the dependency contracts from their artifacts below
/// `root`.
pub async fn fetch_abis(root: &Path) -> Result<DependencyAbis> {
    Ok(DependencyAbis {
        weth: read_abi(root, "contracts/WETH.sol/WETH.json").await?,
        vault: read_abi(root, "contracts/vault/SyncSwapVault.sol/SyncSwapVault.json").await?,
        master: read_abi(
            root,
            "contracts/master/SyncSwapPoolMaster.sol/SyncSwapPoolMaster.json",
        )
        .await?,
        classic_factory: read_abi(
            root,
            "contracts/pool/classic/SyncSwapClassicPoolFactory.sol/SyncSwapClassicPoolFactory.json",
        )
        .await?,
        stable_factory: read_abi(
            root,
            "contracts/pool/stable/SyncSwapStablePoolFactory.sol/SyncSwapStablePoolFactory.json",
        )
        .await?,
        router: read_abi(root, "contracts/SyncSwapRouter.sol/SyncSwapRouter.json").await?,
        fee_manager: read_abi(
            root,
            "contracts/master/SyncSwapFeeManager.sol/SyncSwapFeeManager.json",
        )
        .await?,
        fee_recipient: read_abi(
            root,
            "contracts/master/SyncSwapFeeRecipient.sol/SyncSwapFeeRecipient.json",
        )
        .await?,
        fee_registry: read_abi(root, "contracts/master/FeeRegistry.sol/FeeRegistry.json").await?,
        forward_registry: read_abi(
            root,
            "contracts/master/ForwarderRegistry.sol/ForwarderRegistry.json",
        )
        .await?,
        classic_pool: read_abi(
            root,
            "contracts/pool/classic/SyncSwapClassicPool.sol/SyncSwapClassicPool.json",
        )
        .await?,
    })
}

async fn read_abi(root: &Path, artifact: &str) -> Result<serde_json::Value> {
    let path = root.join(artifact);
    let data = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("failed to read {}, {MISSING_HINT}", path.display()))?;
    let mut artifact: serde_json::Value = serde_json::from_str(&data)
        .with_context(|| format!("malformed artifact {}", path.display()))?;
    match artifact.get_mut("abi").map(serde_json::Value::take) {
        Some(abi) if !abi.is_null() => Ok(abi),
        _ => anyhow::bail!("artifact {} has no ABI, {MISSING_HINT}", path.display()),
    }
}
