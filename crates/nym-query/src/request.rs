use serde::{Deserialize, Serialize};

/// A GET_NYM request as received from the calling layer.
///
/// DIDs are kept as raw strings here; [`crate::QueryValidator`] checks them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetNymRequest {
    /// Requester DID.
    pub identifier: String,
    /// Identity to resolve.
    pub dest: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq_no: Option<u64>,
    /// Unix seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

impl GetNymRequest {
    /// Request for the current state of `dest`.
    pub fn latest(identifier: impl Into<String>, dest: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            dest: dest.into(),
            seq_no: None,
            timestamp: None,
        }
    }

    pub fn at_seq_no(mut self, seq_no: u64) -> Self {
        self.seq_no = Some(seq_no);
        self
    }

    pub fn at_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}
