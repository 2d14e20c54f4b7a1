use thiserror::Error;

/// Errors produced by the credential vault and execution registry
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CustodyError {
    /// Vault accessed while locked
    #[error("application is locked: signing material is not available")]
    AppLocked,

    /// Unknown account id during key resolution
    #[error("account not found: {0}")]
    AccountNotFound(String),

    /// Unknown execution id
    #[error("execution not found: {0}")]
    ExecutionNotFound(String),

    /// The session's close operation failed (the record is already removed)
    #[error("session close failed for execution {execution_id}: {message}")]
    SessionClose {
        execution_id: String,
        message: String,
    },

    /// The session's initialize operation failed (no record was registered)
    #[error("session initialization failed for execution {execution_id}: {message}")]
    SessionInit {
        execution_id: String,
        message: String,
    },

    /// One-time decrypt path failed (bad password or corrupt blob)
    #[error("decrypt error for account {account_id}: {message}")]
    Decrypt {
        account_id: String,
        message: String,
    },

    /// Persisted account store failure
    #[error("account store error: {0}")]
    Storage(String),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Rejected signing material (empty or all-zero)
    #[error("invalid signing key: {0}")]
    InvalidKey(String),

    /// Invalid request reaching the registry boundary
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Response class a route handler should map an error to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Caller must unlock first
    Locked,
    /// The referenced entity does not exist
    NotFound,
    /// Malformed request, reject before touching state
    BadRequest,
    /// Internal or downstream failure
    Internal,
}

impl CustodyError {
    /// Classify this error for the caller-facing response
    pub fn class(&self) -> ErrorClass {
        match self {
            CustodyError::AppLocked => ErrorClass::Locked,
            CustodyError::AccountNotFound(_) => ErrorClass::NotFound,
            CustodyError::ExecutionNotFound(_) => ErrorClass::NotFound,
            CustodyError::InvalidRequest(_) => ErrorClass::BadRequest,
            CustodyError::SessionClose { .. } => ErrorClass::Internal,
            CustodyError::SessionInit { .. } => ErrorClass::Internal,
            CustodyError::Decrypt { .. } => ErrorClass::Internal,
            CustodyError::Storage(_) => ErrorClass::Internal,
            CustodyError::Configuration(_) => ErrorClass::Internal,
            CustodyError::InvalidKey(_) => ErrorClass::Internal,
        }
    }

    /// True for the absence errors callers may treat as a checkable condition
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CustodyError::AccountNotFound(_) | CustodyError::ExecutionNotFound(_)
        )
    }
}

/// Result type for vault and registry operations
pub type CustodyResult<T> = Result<T, CustodyError>;
