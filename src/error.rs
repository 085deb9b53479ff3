use thiserror::Error;

#[derive(Error, Debug)]
pub enum TeamLedgerError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Push gateway error: {0}")]
    Push(#[from] reqwest::Error),

    #[error("Push gateway rejected message ({status}): {message}")]
    PushRejected { status: u16, message: String },

    /// 汇率表中不存在的币种，说明上游数据与枚举不一致
    #[error("Unknown currency code: {code}")]
    UnknownCurrency { code: String },

    #[error("Invalid document at {path}: {message}")]
    InvalidDocument { path: String, message: String },

    /// 创建类写入命中已存在且内容不同的文档
    #[error("Document already exists with different content: {path}")]
    Conflict { path: String },

    #[error("Invalid document path: {path}")]
    InvalidPath { path: String },

    #[error("User not found: {user_id}")]
    LookupMiss { user_id: String },

    #[error("Delivery failed: {message}")]
    DeliveryFailure { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    Env(#[from] std::env::VarError),
}

pub type Result<T> = std::result::Result<T, TeamLedgerError>;

impl TeamLedgerError {
    pub fn unknown_currency(code: impl Into<String>) -> Self {
        Self::UnknownCurrency { code: code.into() }
    }

    pub fn invalid_document(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn conflict(path: impl Into<String>) -> Self {
        Self::Conflict { path: path.into() }
    }

    pub fn invalid_path(path: impl Into<String>) -> Self {
        Self::InvalidPath { path: path.into() }
    }

    pub fn lookup_miss(user_id: impl Into<String>) -> Self {
        Self::LookupMiss {
            user_id: user_id.into(),
        }
    }

    pub fn delivery_failure(message: impl Into<String>) -> Self {
        Self::DeliveryFailure {
            message: message.into(),
        }
    }

    pub fn is_lookup_miss(&self) -> bool {
        matches!(self, TeamLedgerError::LookupMiss { .. })
    }

    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TeamLedgerError::Config(_) => ErrorSeverity::Critical,
            TeamLedgerError::UnknownCurrency { .. } => ErrorSeverity::Critical,
            TeamLedgerError::Env(_) => ErrorSeverity::Critical,
            TeamLedgerError::Database(_) => ErrorSeverity::High,
            TeamLedgerError::InvalidDocument { .. } => ErrorSeverity::High,
            TeamLedgerError::InvalidPath { .. } => ErrorSeverity::High,
            TeamLedgerError::Conflict { .. } => ErrorSeverity::Medium,
            TeamLedgerError::Serialization(_) => ErrorSeverity::Medium,
            TeamLedgerError::Push(_) => ErrorSeverity::Medium,
            TeamLedgerError::PushRejected { .. } => ErrorSeverity::Medium,
            TeamLedgerError::DeliveryFailure { .. } => ErrorSeverity::Medium,
            TeamLedgerError::Io(_) => ErrorSeverity::Medium,
            TeamLedgerError::LookupMiss { .. } => ErrorSeverity::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Low => write!(f, "LOW"),
            ErrorSeverity::Medium => write!(f, "MEDIUM"),
            ErrorSeverity::High => write!(f, "HIGH"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
