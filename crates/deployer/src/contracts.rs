/// The contracts this tool deploys, in deployment order.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, strum::Display, strum::EnumIter)]
pub enum Contract {
    HandsToken,
    Affiliate,
    Staking,
    Bank,
    Hands,
    Session,
}

impl Contract {
    /// Name of the compiled artifact, which is also the Solidity contract
    /// name.
    pub fn artifact_name(self) -> String {
        self.to_string()
    }
}
