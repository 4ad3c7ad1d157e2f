//! Access to compiled contract artifacts in Hardhat's layout:
//!
//! ```text
//! artifacts/
//! ├── build-info/<id>.json
//! └── contracts/Staking.sol/
//!     ├── Staking.json
//!     └── Staking.dbg.json
//! ```

use {
    alloy::{
        dyn_abi::{DynSolValue, JsonAbiExt},
        json_abi::JsonAbi,
        primitives::Bytes,
    },
    anyhow::{Context, Result, bail, ensure},
    serde::Deserialize,
    std::path::{Path, PathBuf},
};

const BUILD_INFO_DIR: &str = "build-info";
const DEBUG_SUFFIX: &str = ".dbg.json";

/// A compiled contract.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub contract_name: String,
    pub source_name: String,
    /// The ABI as found in the artifact, kept verbatim for the manifest.
    pub abi: serde_json::Value,
    /// Creation code.
    pub bytecode: Bytes,
    #[serde(default)]
    pub link_references: serde_json::Map<String, serde_json::Value>,
    #[serde(skip)]
    path: PathBuf,
}

/// The compiler run an artifact came out of.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    /// Version including the commit hash, e.g. `0.8.17+commit.8df45f5f`.
    pub solc_long_version: String,
    /// Solidity standard JSON input.
    pub input: serde_json::Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DebugFile {
    build_info: PathBuf,
}

impl Artifact {
    /// `<source>:<name>`, the form explorers expect.
    pub fn fully_qualified_name(&self) -> String {
        format!("{}:{}", self.source_name, self.contract_name)
    }

    pub fn json_abi(&self) -> Result<JsonAbi> {
        serde_json::from_value(self.abi.clone())
            .with_context(|| format!("artifact of {} has a malformed ABI", self.contract_name))
    }

    /// ABI encodes `args` for the contract's constructor.
    pub fn encode_constructor(&self, args: &[DynSolValue]) -> Result<Bytes> {
        let abi = self.json_abi()?;
        match abi.constructor() {
            Some(constructor) => constructor
                .abi_encode_input(args)
                .map(Bytes::from)
                .with_context(|| {
                    format!(
                        "arguments do not match the constructor of {}",
                        self.contract_name
                    )
                }),
            None if args.is_empty() => Ok(Bytes::new()),
            None => bail!(
                "{} has no constructor but {} arguments were given",
                self.contract_name,
                args.len()
            ),
        }
    }

    /// Creation code followed by the encoded constructor arguments.
    pub fn deploy_code(&self, constructor_arguments: &Bytes) -> Result<Bytes> {
        ensure!(
            !self.bytecode.is_empty(),
            "{} has no bytecode, is it abstract or an interface?",
            self.contract_name
        );
        ensure!(
            self.link_references.is_empty(),
            "{} needs linking against libraries {:?}",
            self.contract_name,
            self.link_references.keys().collect::<Vec<_>>()
        );
        Ok([self.bytecode.as_ref(), constructor_arguments.as_ref()]
            .concat()
            .into())
    }
}

/// Reads artifacts below a root directory.
#[derive(Clone, Debug)]
pub struct Artifacts {
    root: PathBuf,
}

impl Artifacts {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Reads the artifact of the contract called `name`.
    pub async fn read(&self, name: &str) -> Result<Artifact> {
        let path = self.find(name).await?;
        let data = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read artifact {}", path.display()))?;
        let mut artifact: Artifact = serde_json::from_str(&data)
            .with_context(|| format!("malformed artifact {}", path.display()))?;
        artifact.path = path;
        Ok(artifact)
    }

    /// Reads the build info `artifact` was compiled in, following the
    /// artifact's debug file.
    pub async fn build_info(&self, artifact: &Artifact) -> Result<BuildInfo> {
        let debug_path = debug_file_path(&artifact.path)?;
        let debug: DebugFile = read_json(&debug_path).await?;
        let dir = debug_path
            .parent()
            .context("artifact debug file has no parent directory")?;
        read_json(&dir.join(debug.build_info)).await
    }

    /// Finds `<name>.json`, failing when no or more than one artifact carries
    /// that name.
    async fn find(&self, name: &str) -> Result<PathBuf> {
        let file_name = format!("{name}.json");
        let matches = collect(&self.root, &file_name)
            .await
            .with_context(|| format!("failed to scan artifacts in {}", self.root.display()))?;
        match matches.as_slice() {
            [] => bail!(
                "artifact for {name} not found in {}, are the contracts compiled?",
                self.root.display()
            ),
            [path] => Ok(path.clone()),
            paths => bail!("artifact name {name} is ambiguous: {paths:?}"),
        }
    }
}

/// Walks `root` for files called `file_name`, leaving out build info.
async fn collect(root: &Path, file_name: &str) -> std::io::Result<Vec<PathBuf>> {
    let mut matches = Vec::new();
    let mut dirs = vec![root.to_path_buf()];
    while let Some(dir) = dirs.pop() {
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                if entry.file_name() != BUILD_INFO_DIR {
                    dirs.push(entry.path());
                }
            } else if entry.file_name().to_str() == Some(file_name) {
                matches.push(entry.path());
            }
        }
    }
    matches.sort();
    Ok(matches)
}

fn debug_file_path(artifact: &Path) -> Result<PathBuf> {
    let stem = artifact
        .file_stem()
        .and_then(|stem| stem.to_str())
        .with_context(|| format!("artifact path {} has no file name", artifact.display()))?;
    Ok(artifact.with_file_name(format!("{stem}{DEBUG_SUFFIX}")))
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let data = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("malformed JSON in {}", path.display()))
}
