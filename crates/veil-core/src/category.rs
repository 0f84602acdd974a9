use std::fmt;

use serde::{Deserialize, Serialize};

/// PII recognizer classes, declared in the order they are applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PiiCategory {
    CreditCard,
    Email,
    IpAddress,
    Ssn,
    Phone,
    Date,
}

impl PiiCategory {
    pub const ALL: [PiiCategory; 6] = [
        PiiCategory::CreditCard,
        PiiCategory::Email,
        PiiCategory::IpAddress,
        PiiCategory::Ssn,
        PiiCategory::Phone,
        PiiCategory::Date,
    ];

    /// Label used inside placeholders, e.g. `EMAIL` in `[EMAIL_1]`
    pub fn label(self) -> &'static str {
        match self {
            PiiCategory::CreditCard => "CREDIT_CARD",
            PiiCategory::Email => "EMAIL",
            PiiCategory::IpAddress => "IP_ADDRESS",
            PiiCategory::Ssn => "SSN",
            PiiCategory::Phone => "PHONE",
            PiiCategory::Date => "DATE",
        }
    }
}

impl fmt::Display for PiiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
