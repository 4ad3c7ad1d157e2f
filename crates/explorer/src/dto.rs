//! Wire types of the Etherscan-compatible contract API.

use serde::{Deserialize, Serialize};

/// Envelope every endpoint of the API answers with. `status` is `"1"` on
/// success and `"0"` otherwise, in which case `result` usually carries a
/// human readable reason.
#[derive(Clone, Debug, Deserialize)]
pub struct Response {
    pub status: String,
    #[serde(default)]
    pub message: String,
    pub result: serde_json::Value,
}

impl Response {
    pub fn is_ok(&self) -> bool {
        self.status == "1"
    }

    /// The `result` field when it is a plain string, otherwise the message.
    pub fn reason(&self) -> String {
        match &self.result {
            serde_json::Value::String(result) => result.clone(),
            _ => self.message.clone(),
        }
    }
}

/// Single entry of a `getsourcecode` result.
#[derive(Clone, Debug, Deserialize)]
pub struct SourceCode {
    #[serde(rename = "SourceCode", default)]
    pub source_code: String,
}

/// Form body of a `verifysourcecode` submission.
#[derive(Clone, Debug, Serialize)]
pub struct VerifySourceCode<'a> {
    pub apikey: &'a str,
    pub module: &'static str,
    pub action: &'static str,
    #[serde(rename = "contractaddress")]
    pub contract_address: String,
    #[serde(rename = "sourceCode")]
    pub source_code: String,
    #[serde(rename = "codeformat")]
    pub code_format: &'static str,
    #[serde(rename = "contractname")]
    pub contract_name: &'a str,
    #[serde(rename = "compilerversion")]
    pub compiler_version: &'a str,
    /// Misspelled on purpose, this is the parameter name the API expects.
    #[serde(rename = "constructorArguements")]
    pub constructor_arguments: String,
}

/// Status values returned by `checkverifystatus`.
pub const PENDING: &str = "Pending in queue";
pub const VERIFIED: &str = "Pass - Verified";
pub const ALREADY_VERIFIED: &str = "already verified";
