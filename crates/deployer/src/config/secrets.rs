use {
    anyhow::{Context, Result},
    serde::Deserialize,
    std::{collections::HashMap, fmt, path::Path},
};

/// Keys that must never end up in logs, loaded from a JSON file:
///
/// ```json
/// {
///     "privateKeys": { "arbitrum-goerli": "0x…" },
///     "explorerApiKeys": { "arbitrum-goerli": "…" }
/// }
/// ```
#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Secrets {
    /// Deployer private keys by network name.
    #[serde(default)]
    private_keys: HashMap<String, String>,

    /// Block explorer API keys by network name.
    #[serde(default)]
    explorer_api_keys: HashMap<String, String>,
}

impl Secrets {
    pub async fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read secrets file {}", path.display()))?;
        // The parser error may quote the offending input, so it is dropped.
        serde_json::from_str(&data)
            .map_err(|_| anyhow::anyhow!("secrets file {} is malformed", path.display()))
    }

    pub fn private_key(&self, network: &str) -> Result<&str> {
        self.private_keys
            .get(network)
            .map(String::as_str)
            .with_context(|| format!("no private key for network {network:?} in secrets file"))
    }

    pub fn explorer_api_key(&self, network: &str) -> Option<&str> {
        self.explorer_api_keys.get(network).map(String::as_str)
    }
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("private_keys", &self.private_keys.keys().collect::<Vec<_>>())
            .field(
                "explorer_api_keys",
                &self.explorer_api_keys.keys().collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use {super::*, std::io::Write};

    #[tokio::test]
    async fn loads_keys_by_network() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"{
                "privateKeys": { "arbitrum-goerli": "0x01" },
                "explorerApiKeys": { "arbitrum-goerli": "api-key" }
            }"#,
        )
        .unwrap();

        let secrets = Secrets::from_path(file.path()).await.unwrap();
        assert_eq!(secrets.private_key("arbitrum-goerli").unwrap(), "0x01");
        assert_eq!(secrets.explorer_api_key("arbitrum-goerli"), Some("api-key"));
        assert!(secrets.private_key("base-goerli").is_err());
        assert_eq!(secrets.explorer_api_key("base-goerli"), None);
    }

    #[tokio::test]
    async fn malformed_file_does_not_leak_content() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{ "privateKeys": { "net": 0xsecret } }"#)
            .unwrap();

        let err = Secrets::from_path(file.path()).await.unwrap_err();
        assert!(!format!("{err:?}").contains("0xsecret"));
    }

    #[test]
    fn debug_only_shows_network_names() {
        let secrets: Secrets = serde_json::from_str(
            r#"{ "privateKeys": { "localhost": "0xabcdef" }, "explorerApiKeys": {} }"#,
        )
        .unwrap();
        let debug = format!("{secrets:?}");
        assert!(debug.contains("localhost"));
        assert!(!debug.contains("abcdef"));
    }
}
