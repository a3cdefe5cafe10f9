use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("wallet provider unreachable: {0}")]
    Transport(String),

    #[error("wallet error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("invalid wallet response: {0}")]
    InvalidResponse(String),
}

impl WalletError {
    /// EIP-1193 code for a request the user declined.
    pub const USER_REJECTED: i64 = 4001;
    /// JSON-RPC code for an unsupported method.
    pub const METHOD_NOT_FOUND: i64 = -32601;

    pub fn user_rejected(message: impl Into<String>) -> Self {
        Self::Rpc {
            code: Self::USER_REJECTED,
            message: message.into(),
        }
    }

    pub fn is_user_rejection(&self) -> bool {
        matches!(self, Self::Rpc { code, .. } if *code == Self::USER_REJECTED)
    }

    pub fn is_method_not_found(&self) -> bool {
        matches!(self, Self::Rpc { code, .. } if *code == Self::METHOD_NOT_FOUND)
    }

    /// The provider could not be reached at all.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
