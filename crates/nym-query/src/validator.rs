use std::fmt;

use nym_types::{Did, SeqNo, TxnTime};

use crate::error::{QueryError, QueryResult};
use crate::request::GetNymRequest;

/// Fixed rejection message for requests carrying both bounds.
pub const BOTH_BOUNDS_MESSAGE: &str = "Cannot resolve nym with both seqNo and timestamp present.";

/// The single point in history a query resolves against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolutionBound {
    /// Current state, as of the tail captured at query start.
    Latest,
    SeqNo(SeqNo),
    Timestamp(TxnTime),
}

impl fmt::Display for ResolutionBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => f.write_str("latest"),
            Self::SeqNo(s) => write!(f, "seqNo {s}"),
            Self::Timestamp(t) => write!(f, "timestamp {t}"),
        }
    }
}

/// A request that passed validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedQuery {
    /// Requester.
    pub identifier: Did,
    /// Identity to resolve.
    pub dest: Did,
    pub bound: ResolutionBound,
}

/// Rejects ill-formed or ambiguous requests. Never touches the ledger.
pub struct QueryValidator;

impl QueryValidator {
    pub fn validate(request: &GetNymRequest) -> QueryResult<ValidatedQuery> {
        let bound = match (request.seq_no, request.timestamp) {
            (Some(_), Some(_)) => return Err(QueryError::Validation(BOTH_BOUNDS_MESSAGE.into())),
            (Some(seq_no), None) => ResolutionBound::SeqNo(seq_no),
            (None, Some(timestamp)) => ResolutionBound::Timestamp(timestamp),
            (None, None) => ResolutionBound::Latest,
        };

        let identifier = Did::parse(&request.identifier)
            .map_err(|e| QueryError::Validation(format!("identifier: {e}")))?;
        let dest =
            Did::parse(&request.dest).map_err(|e| QueryError::Validation(format!("dest: {e}")))?;

        Ok(ValidatedQuery {
            identifier,
            dest,
            bound,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn did(seed: u8) -> String {
        Did::from_bytes(&[seed; 16]).unwrap().to_string()
    }

    #[test]
    fn no_bound_means_latest() {
        let q = QueryValidator::validate(&GetNymRequest::latest(did(1), did(2))).unwrap();
        assert_eq!(q.bound, ResolutionBound::Latest);
        assert_eq!(q.dest.as_str(), did(2));
    }

    #[test]
    fn single_bounds_pass_through_verbatim() {
        let by_seq = GetNymRequest::latest(did(1), did(2)).at_seq_no(0);
        assert_eq!(
            QueryValidator::validate(&by_seq).unwrap().bound,
            ResolutionBound::SeqNo(0)
        );
        let by_time = GetNymRequest::latest(did(1), did(2)).at_timestamp(115);
        assert_eq!(
            QueryValidator::validate(&by_time).unwrap().bound,
            ResolutionBound::Timestamp(115)
        );
    }

    #[test]
    fn both_bounds_rejected_with_fixed_message() {
        let req = GetNymRequest::latest(did(1), did(2))
            .at_seq_no(10)
            .at_timestamp(100);
        let err = QueryValidator::validate(&req).unwrap_err();
        assert_eq!(err, QueryError::Validation(BOTH_BOUNDS_MESSAGE.into()));
        assert_eq!(err.to_reply().message, BOTH_BOUNDS_MESSAGE);
        assert_eq!(err.code(), "InvalidClientRequest");
    }

    #[test]
    fn both_bounds_rejected_even_with_malformed_dids() {
        let req = GetNymRequest::latest("x", "y").at_seq_no(1).at_timestamp(1);
        assert_eq!(
            QueryValidator::validate(&req).unwrap_err(),
            QueryError::Validation(BOTH_BOUNDS_MESSAGE.into())
        );
    }

    #[test]
    fn malformed_dest_is_a_validation_error() {
        let err = QueryValidator::validate(&GetNymRequest::latest(did(1), "nope")).unwrap_err();
        assert!(matches!(err, QueryError::Validation(m) if m.starts_with("dest:")));
    }
}
