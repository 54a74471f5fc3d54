use nym_types::SeqNo;

use crate::error::LedgerError;
use crate::records::NymTxn;
use crate::traits::LedgerReader;

/// Result of stream validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationReport {
    /// Number of records scanned.
    pub txn_count: u64,
    /// seqNos run 1..=n without gaps or repeats.
    pub sequence_contiguous: bool,
    /// txnTime never decreases.
    pub time_monotonic: bool,
    /// Every `prev_hash` links to its predecessor and every hash recomputes.
    pub hash_chain_valid: bool,
    /// All violations found, in log order.
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Returns `true` if all checks passed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Convert the first violation into an error.
    pub fn into_result(self) -> Result<(), LedgerError> {
        match self.violations.into_iter().next() {
            None => Ok(()),
            Some(v) => Err(LedgerError::IntegrityViolation {
                seq_no: v.seq_no,
                reason: v.description,
            }),
        }
    }
}

/// A specific integrity violation detected during validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    /// Record at which the violation was detected.
    pub seq_no: SeqNo,
    pub kind: ViolationKind,
    /// Human-readable detail.
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    SequenceGap,
    DuplicateSeqNo,
    TimeRegression,
    HashChainBreak,
    HashMismatch,
}

/// Stream integrity validator.
pub struct StreamValidator;

impl StreamValidator {
    /// Validate the whole log behind `reader`.
    pub fn validate_log<R: LedgerReader>(reader: &R) -> Result<ValidationReport, LedgerError> {
        let tail = reader.tail();
        if tail == 0 {
            return Ok(Self::validate_records(std::iter::empty::<&NymTxn>()));
        }
        let txns = reader.read_range(1, tail)?;
        Ok(Self::validate_records(txns.iter().map(|t| t.as_ref())))
    }

    /// Validate a stream of records that should form a log starting at
    /// seqNo 1.
    pub fn validate_records<'a, I>(records: I) -> ValidationReport
    where
        I: IntoIterator<Item = &'a NymTxn>,
    {
        let mut violations = Vec::new();
        let mut sequence_contiguous = true;
        let mut time_monotonic = true;
        let mut hash_chain_valid = true;
        let mut previous: Option<&NymTxn> = None;
        let mut count = 0u64;

        for txn in records {
            count += 1;
            let expected_seq = previous.map(|p| p.seq_no + 1).unwrap_or(1);

            if txn.seq_no != expected_seq {
                sequence_contiguous = false;
                let duplicate = previous.is_some_and(|p| txn.seq_no <= p.seq_no);
                violations.push(Violation {
                    seq_no: txn.seq_no,
                    kind: if duplicate {
                        ViolationKind::DuplicateSeqNo
                    } else {
                        ViolationKind::SequenceGap
                    },
                    description: format!("expected seqNo {expected_seq}, found {}", txn.seq_no),
                });
            }

            if let Some(prev) = previous {
                if txn.txn_time < prev.txn_time {
                    time_monotonic = false;
                    violations.push(Violation {
                        seq_no: txn.seq_no,
                        kind: ViolationKind::TimeRegression,
                        description: format!(
                            "txnTime {} precedes previous txnTime {}",
                            txn.txn_time, prev.txn_time
                        ),
                    });
                }
            }

            if txn.prev_hash != previous.map(|p| p.txn_hash) {
                hash_chain_valid = false;
                violations.push(Violation {
                    seq_no: txn.seq_no,
                    kind: ViolationKind::HashChainBreak,
                    description: "previous hash link mismatch".into(),
                });
            }

            if let Ok(computed) = txn.compute_hash() {
                if computed != txn.txn_hash {
                    hash_chain_valid = false;
                    violations.push(Violation {
                        seq_no: txn.seq_no,
                        kind: ViolationKind::HashMismatch,
                        description: "transaction hash does not match computed".into(),
                    });
                }
            }

            previous = Some(txn);
        }

        ValidationReport {
            txn_count: count,
            sequence_contiguous,
            time_monotonic,
            hash_chain_valid,
            violations,
        }
    }
}
