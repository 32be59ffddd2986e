use thiserror::Error;

/// Which input stream a raw record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSource {
    Orders,
    Spend,
}

impl std::fmt::Display for RecordSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordSource::Orders => f.write_str("orders"),
            RecordSource::Spend  => f.write_str("spend"),
        }
    }
}

#[derive(Error, Debug)]
pub enum CohortError {
    #[error("Malformed {source_kind} record at line {line}: {reason}")]
    MalformedRecord {
        source_kind: RecordSource,
        line:        usize,
        reason:      String,
    },

    #[error("Order '{order_id}' references customer '{customer_id}' with no cohort assignment")]
    OrphanOrder { order_id: String, customer_id: String },

    #[error("Order '{order_id}' has offset {offset} from the cohort month of customer '{customer_id}'")]
    NegativeOffset {
        order_id:    String,
        customer_id: String,
        offset:      i64,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CohortError {
    pub fn malformed(source_kind: RecordSource, line: usize, reason: impl Into<String>) -> Self {
        CohortError::MalformedRecord {
            source_kind,
            line,
            reason: reason.into(),
        }
    }
}

pub type CohortResult<T> = Result<T, CohortError>;
