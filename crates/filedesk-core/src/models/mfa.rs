use serde::{Deserialize, Serialize};

/// Kind of second factor registered with the auth backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactorType {
    Totp,
    Phone,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactorStatus {
    Verified,
    Unverified,
    #[serde(other)]
    Other,
}

/// A registered MFA factor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Factor {
    pub id: String,
    pub factor_type: FactorType,
    pub status: FactorStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<String>,
}

impl Factor {
    pub fn is_verified_totp(&self) -> bool {
        self.factor_type == FactorType::Totp && self.status == FactorStatus::Verified
    }
}

/// True when any factor is a verified TOTP factor.
pub fn has_verified_totp(factors: &[Factor]) -> bool {
    factors.iter().any(Factor::is_verified_totp)
}
