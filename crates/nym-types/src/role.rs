use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Ledger role granted to an identity.
///
/// Serialized as the numeric role code used on the ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    Trustee,
    Steward,
    /// May write its own records without sponsorship.
    Endorser,
    NetworkMonitor,
}

impl Role {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Trustee => "0",
            Self::Steward => "2",
            Self::Endorser => "101",
            Self::NetworkMonitor => "201",
        }
    }

    pub fn from_code(code: &str) -> Result<Self, TypeError> {
        match code {
            "0" => Ok(Self::Trustee),
            "2" => Ok(Self::Steward),
            "101" => Ok(Self::Endorser),
            "201" => Ok(Self::NetworkMonitor),
            other => Err(TypeError::UnknownRole(other.to_string())),
        }
    }

    /// Parse either a role code or a role name (case-insensitive).
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        match s.to_ascii_lowercase().as_str() {
            "trustee" => Ok(Self::Trustee),
            "steward" => Ok(Self::Steward),
            "endorser" => Ok(Self::Endorser),
            "network_monitor" | "networkmonitor" => Ok(Self::NetworkMonitor),
            _ => Self::from_code(s),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_code(&value)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.code().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Trustee => "TRUSTEE",
            Self::Steward => "STEWARD",
            Self::Endorser => "ENDORSER",
            Self::NetworkMonitor => "NETWORK_MONITOR",
        };
        f.write_str(name)
    }
}
