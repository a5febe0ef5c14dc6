use thiserror::Error;

#[derive(Error, Debug)]
pub enum BillnoteError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A single password attempt did not open the document.
    #[error("Password did not open the document")]
    DecryptionFailed,

    #[error("Not a readable PDF: {0}")]
    CorruptDocument(String),

    /// The document is locked by a scheme no password can open here.
    #[error("Unsupported PDF encryption: {0}")]
    UnsupportedEncryption(String),

    #[error("All passwords failed ({attempts} attempts)")]
    AllPasswordsExhausted { attempts: usize },

    #[error("No suitable parser found for this PDF")]
    NoMatchingParser,

    /// A write was rejected mid-batch. `imported` rows before it stay committed.
    #[error("Import stopped after {imported} transactions: {source}")]
    Persistence {
        imported: usize,
        source: Box<BillnoteError>,
    },

    #[error("Unknown owner: {0}")]
    UnknownOwner(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Invalid filename rules: {0}")]
    InvalidRules(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, BillnoteError>;
