use {
    crate::dependencies::{DependencyAbis, DependencyContracts},
    alloy::primitives::Address,
    anyhow::{Context, Result},
    serde::{Deserialize, Serialize},
    serde_with::{DisplayFromStr, serde_as},
    std::path::Path,
};

/// Everything downstream consumers need to talk to the deployed suite.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub dependency_contracts: DependencyContracts,
    pub dependency_abis: DependencyAbis,
    pub deployed_contracts: DeployedContracts,
    pub deployed_abis: DeployedAbis,
}

#[serde_as]
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeployedContracts {
    #[serde_as(as = "DisplayFromStr")]
    pub hands_token: Address,
    #[serde_as(as = "DisplayFromStr")]
    pub bank: Address,
    #[serde_as(as = "DisplayFromStr")]
    pub staking: Address,
    #[serde_as(as = "DisplayFromStr")]
    pub hands: Address,
    #[serde_as(as = "DisplayFromStr")]
    pub affiliate: Address,
    #[serde_as(as = "DisplayFromStr")]
    pub session: Address,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeployedAbis {
    pub hands_token: serde_json::Value,
    pub bank: serde_json::Value,
    pub staking: serde_json::Value,
    pub hands: serde_json::Value,
    pub affiliate: serde_json::Value,
    pub session: serde_json::Value,
}

impl Manifest {
    /// Serializes the manifest, pretty printed with four space indentation.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        self.serialize(&mut serializer)
            .context("failed to serialize manifest")?;
        Ok(buffer)
    }

    pub async fn write(&self, path: &Path) -> Result<()> {
        tokio::fs::write(path, self.to_json()?)
            .await
            .with_context(|| format!("failed to write manifest {}", path.display()))
    }

    /// Loads a manifest written by [`Manifest::write`], for tools that talk to
    /// the deployed suite.
    pub async fn read(path: &Path) -> Result<Self> {
        let data = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read manifest {}", path.display()))?;
        serde_json::from_str(&data).with_context(|| format!("malformed manifest {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::dependencies::test_util,
        alloy::primitives::address,
        serde_json::json,
    };

    fn manifest() -> Manifest {
        let abi = |name: &str| json!([{ "type": "function", "name": name, "inputs": [] }]);
        Manifest {
            dependency_contracts: test_util::contracts(),
            dependency_abis: DependencyAbis {
                weth: abi("deposit"),
                vault: abi("vault"),
                master: abi("master"),
                classic_factory: abi("createPool"),
                stable_factory: abi("createPool"),
                router: abi("swap"),
                fee_manager: abi("fee"),
                fee_recipient: abi("recipient"),
                fee_registry: abi("registry"),
                forward_registry: abi("forwarders"),
                classic_pool: abi("mint"),
            },
            deployed_contracts: DeployedContracts {
                hands_token: address!("5FbDB2315678afecb367f032d93F642f64180aa3"),
                bank: address!("9fE46736679d2D9a65F0992F2272dE9f3c7fa6e0"),
                staking: address!("Cf7Ed3AccA5a467e9e704C703E8D87F634fB0Fc9"),
                hands: address!("Dc64a140Aa3E981100a9becA4E685f962f0cF6C9"),
                affiliate: address!("e7f1725e7734ce288f8367e1bb143e90bb3f0512"),
                session: address!("5FC8d32690cc91D4c39d9d3abcBD16989F875707"),
            },
            deployed_abis: DeployedAbis {
                hands_token: abi("transfer"),
                bank: abi("deposit"),
                staking: abi("stake"),
                hands: abi("play"),
                affiliate: abi("refer"),
                session: abi("start"),
            },
        }
    }

    #[test]
    fn serializes_in_expected_shape() {
        let json: serde_json::Value =
            serde_json::from_slice(&manifest().to_json().unwrap()).unwrap();

        let keys = |value: &serde_json::Value| {
            let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
            keys.sort();
            keys
        };
        assert_eq!(
            keys(&json),
            [
                "dependencyAbis",
                "dependencyContracts",
                "deployedAbis",
                "deployedContracts"
            ]
        );
        assert_eq!(
            keys(&json["deployedContracts"]),
            ["Affiliate", "Bank", "Hands", "HandsToken", "Session", "Staking"]
        );
        assert_eq!(keys(&json["deployedAbis"]), keys(&json["deployedContracts"]));
        assert_eq!(
            keys(&json["dependencyContracts"]),
            [
                "classicFactory",
                "feeManager",
                "feeRecipient",
                "feeRegistry",
                "forwardRegistry",
                "master",
                "router",
                "stableFactory",
                "vault",
                "wETH"
            ]
        );
        assert!(json["dependencyAbis"]["classicPool"].is_array());

        // Addresses are checksummed.
        assert_eq!(
            json["deployedContracts"]["Affiliate"],
            "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512"
        );
        assert_eq!(json["deployedAbis"]["Staking"][0]["name"], "stake");
    }

    #[test]
    fn indents_with_four_spaces() {
        let text = String::from_utf8(manifest().to_json().unwrap()).unwrap();
        assert!(text.starts_with("{\n    \"dependencyContracts\": {\n        \"wETH\": "));
    }

    #[tokio::test]
    async fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local-contracts.json");

        manifest().write(&path).await.unwrap();
        assert_eq!(Manifest::read(&path).await.unwrap(), manifest());

        std::fs::write(&path, "{}").unwrap();
        let err = Manifest::read(&path).await.unwrap_err();
        assert!(err.to_string().contains("malformed manifest"), "{err}");
    }
}
