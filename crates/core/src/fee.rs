//! Fee records, keyed by phone.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const FEE_STATUS_PAID: &str = "paid";
pub const FEE_STATUS_DUE: &str = "due";
pub const FEE_STATUS_ADVANCE: &str = "advance";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FeeStatus {
    Paid,
    Due,
    Advance,
    Other(String),
}

impl FeeStatus {
    pub fn from_str_value(s: &str) -> Self {
        match s {
            FEE_STATUS_PAID => Self::Paid,
            FEE_STATUS_DUE => Self::Due,
            FEE_STATUS_ADVANCE => Self::Advance,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Paid => FEE_STATUS_PAID,
            Self::Due => FEE_STATUS_DUE,
            Self::Advance => FEE_STATUS_ADVANCE,
            Self::Other(s) => s,
        }
    }

    /// Whether the account holder still owes money.
    pub fn is_outstanding(&self) -> bool {
        matches!(self, Self::Due)
    }
}

impl From<String> for FeeStatus {
    fn from(value: String) -> Self {
        Self::from_str_value(&value)
    }
}

impl From<FeeStatus> for String {
    fn from(status: FeeStatus) -> Self {
        match status {
            FeeStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for FeeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fee {
    pub status: FeeStatus,
    pub amount: u64,
}

impl Fee {
    pub fn new(status: FeeStatus, amount: u64) -> Self {
        Self { status, amount }
    }
}
