//! Business document types and number formatting

use serde::{Deserialize, Serialize};

use crate::ParseError;

/// Minimum number of digits in a formatted document number
pub const DOCUMENT_NUMBER_WIDTH: usize = 6;

/// Category of business document that needs a sequential number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    /// Sale ticket / invoice
    Sale,
    /// Payment receipt
    Payment,
    /// Cash-in ledger movement
    CashIn,
    /// Cash-out ledger movement
    CashOut,
    /// Credit note
    CreditNote,
    /// Debit note
    DebitNote,
    /// Quote / estimate
    Quote,
}

impl DocumentType {
    /// Every document type, in declaration order
    pub const ALL: [Self; 7] = [
        Self::Sale,
        Self::Payment,
        Self::CashIn,
        Self::CashOut,
        Self::CreditNote,
        Self::DebitNote,
        Self::Quote,
    ];

    /// Stored / wire representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sale => "SALE",
            Self::Payment => "PAYMENT",
            Self::CashIn => "CASH_IN",
            Self::CashOut => "CASH_OUT",
            Self::CreditNote => "CREDIT_NOTE",
            Self::DebitNote => "DEBIT_NOTE",
            Self::Quote => "QUOTE",
        }
    }

    /// Prefix stamped in front of every number of this type
    pub const fn prefix(&self) -> &'static str {
        match self {
            Self::Sale => "VTA-",
            Self::Payment => "REC-",
            Self::CashIn => "ING-",
            Self::CashOut => "EGR-",
            Self::CreditNote => "NC-",
            Self::DebitNote => "ND-",
            Self::Quote => "COT-",
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| ParseError::new("document type", s))
    }
}

/// Format a document number as `prefix` followed by the counter padded to
/// six digits. Counters wider than six digits are printed in full.
pub fn format_document_number(prefix: &str, number: u64) -> String {
    format!("{prefix}{number:0width$}", width = DOCUMENT_NUMBER_WIDTH)
}
