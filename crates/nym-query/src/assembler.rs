//! Rendering of resolved records into replies.

use nym_types::{Did, NymVersion, Role, SeqNo, TxnTime};
use serde::{Deserialize, Serialize};

use crate::error::{QueryError, QueryResult};
use crate::record::EffectiveRecord;
use crate::validator::ValidatedQuery;

/// Attribute map of a resolved identity.
///
/// Attributes never set for the identity are left out of the encoding
/// entirely. A cleared role is a set value and encodes as `null`. Field order
/// is fixed, so the same record always encodes to the same bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NymData {
    pub dest: Did,
    pub identifier: Did,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verkey: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "nym_types::field::deserialize_present"
    )]
    pub role: Option<Option<Role>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diddoc_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<NymVersion>,
    pub seq_no: SeqNo,
    pub txn_time: TxnTime,
}

impl From<&EffectiveRecord> for NymData {
    fn from(record: &EffectiveRecord) -> Self {
        Self {
            dest: record.dest.clone(),
            identifier: record.identifier.clone(),
            verkey: record.verkey.clone(),
            role: record.role,
            diddoc_content: record.diddoc_content.clone(),
            version: record.version,
            seq_no: record.seq_no,
            txn_time: record.txn_time,
        }
    }
}

/// Successful GET_NYM reply.
///
/// `identifier` is the requester; `seq_no`/`txn_time` are the provenance of
/// the resolved record, which can precede the requested bound.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetNymReply {
    /// Requester DID.
    pub identifier: Did,
    pub dest: Did,
    /// seqNo of the update the record was resolved at.
    pub seq_no: SeqNo,
    /// txnTime of that update.
    pub txn_time: TxnTime,
    /// JSON-encoded [`NymData`].
    pub data: String,
}

impl GetNymReply {
    /// Decode the attribute map.
    pub fn nym_data(&self) -> QueryResult<NymData> {
        serde_json::from_str(&self.data).map_err(|e| QueryError::Encoding(e.to_string()))
    }
}

/// Turns effective records into replies.
pub struct ResultAssembler;

impl ResultAssembler {
    pub fn assemble(query: &ValidatedQuery, record: &EffectiveRecord) -> QueryResult<GetNymReply> {
        let data = serde_json::to_string(&NymData::from(record))
            .map_err(|e| QueryError::Encoding(e.to_string()))?;
        Ok(GetNymReply {
            identifier: query.identifier.clone(),
            dest: record.dest.clone(),
            seq_no: record.seq_no,
            txn_time: record.txn_time,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::validator::ResolutionBound;

    use super::*;

    fn did(seed: u8) -> Did {
        Did::from_bytes(&[seed; 16]).unwrap()
    }

    fn record() -> EffectiveRecord {
        EffectiveRecord {
            dest: did(2),
            identifier: did(1),
            verkey: None,
            role: None,
            diddoc_content: None,
            version: None,
            seq_no: 10,
            txn_time: 100,
        }
    }

    fn query() -> ValidatedQuery {
        ValidatedQuery {
            identifier: did(3),
            dest: did(2),
            bound: ResolutionBound::Latest,
        }
    }

    #[test]
    fn never_set_attributes_are_omitted() {
        let reply = ResultAssembler::assemble(&query(), &record()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&reply.data).unwrap();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        for absent in ["verkey", "role", "diddocContent", "version"] {
            assert!(!keys.contains(&absent.to_string()), "{absent} present");
        }
        assert_eq!(value["seqNo"], 10);
        assert_eq!(value["txnTime"], 100);
        assert_eq!(reply.identifier, did(3));
        assert_eq!((reply.seq_no, reply.txn_time), (10, 100));
    }

    #[test]
    fn cleared_role_renders_as_null() {
        let mut r = record();
        r.role = Some(None);
        let reply = ResultAssembler::assemble(&query(), &r).unwrap();
        let value: serde_json::Value = serde_json::from_str(&reply.data).unwrap();
        assert!(value.get("role").unwrap().is_null());
        assert_eq!(reply.nym_data().unwrap().role, Some(None));

        r.role = Some(Some(Role::Endorser));
        let reply = ResultAssembler::assemble(&query(), &r).unwrap();
        assert!(reply.data.contains(r#""role":"101""#));
    }

    #[test]
    fn diddoc_content_is_preserved_byte_for_byte() {
        let doc = "{ \"service\" : [ {\"id\":\"#a\",\"serviceEndpoint\":\"https://x/\u{e9}\"} ] }";
        let mut r = record();
        r.diddoc_content = Some(doc.to_string());
        r.version = Some(NymVersion::SelfCertified);

        let first = ResultAssembler::assemble(&query(), &r).unwrap();
        let second = ResultAssembler::assemble(&query(), &r).unwrap();
        assert_eq!(first.data, second.data);

        let data = first.nym_data().unwrap();
        assert_eq!(data.diddoc_content.as_deref(), Some(doc));
        assert_eq!(data.version, Some(NymVersion::SelfCertified));
    }

    #[test]
    fn keys_follow_fixed_order() {
        let mut r = record();
        r.verkey = Some("~v".into());
        r.diddoc_content = Some(String::new());
        let reply = ResultAssembler::assemble(&query(), &r).unwrap();
        let pos = |k: &str| reply.data.find(&format!("\"{k}\"")).unwrap();
        assert!(pos("dest") < pos("identifier"));
        assert!(pos("verkey") < pos("diddocContent"));
        assert!(pos("diddocContent") < pos("seqNo"));
        assert!(pos("seqNo") < pos("txnTime"));
        assert!(reply.data.contains(r#""diddocContent":"""#));
    }
}
