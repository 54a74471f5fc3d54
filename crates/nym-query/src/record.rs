use nym_ledger::NymTxn;
use nym_types::{Did, NymVersion, Role, SeqNo, TxnTime};

/// An identity's state folded from its updates up to some seqNo.
///
/// Each attribute is `None` until some update sets it; after that it holds
/// the last value written. `role` nests a second `Option` because a role can
/// be explicitly cleared, which is a value in its own right.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EffectiveRecord {
    pub dest: Did,
    /// Author of the update that created the identity.
    pub identifier: Did,
    /// `None` when no update ever set the attribute.
    pub verkey: Option<String>,
    /// `Some(None)` when the role was set and later cleared.
    pub role: Option<Option<Role>>,
    pub diddoc_content: Option<String>,
    pub version: Option<NymVersion>,
    /// Provenance: the last update folded into this record.
    pub seq_no: SeqNo,
    /// txnTime of that update.
    pub txn_time: TxnTime,
}

impl EffectiveRecord {
    /// Start a record from an identity's first update.
    pub fn baseline(txn: &NymTxn) -> Self {
        let mut record = Self {
            dest: txn.update.dest.clone(),
            identifier: txn.update.identifier.clone(),
            verkey: None,
            role: None,
            diddoc_content: None,
            version: None,
            seq_no: txn.seq_no,
            txn_time: txn.txn_time,
        };
        record.apply(txn);
        record
    }

    /// Fold one later update into the record.
    pub fn apply(&mut self, txn: &NymTxn) {
        debug_assert_eq!(txn.dest(), &self.dest);
        debug_assert!(txn.seq_no >= self.seq_no);

        let update = &txn.update;
        update.verkey.apply_to(&mut self.verkey);
        update.role.apply_to(&mut self.role);
        update.diddoc_content.apply_to(&mut self.diddoc_content);
        update.version.apply_to(&mut self.version);
        self.seq_no = txn.seq_no;
        self.txn_time = txn.txn_time;
    }

    /// Whether both records expose the same attribute values, ignoring
    /// provenance.
    pub fn same_attributes(&self, other: &Self) -> bool {
        self.dest == other.dest
            && self.identifier == other.identifier
            && self.verkey == other.verkey
            && self.role == other.role
            && self.diddoc_content == other.diddoc_content
            && self.version == other.version
    }
}

#[cfg(test)]
mod tests {
    use nym_types::AttributeUpdate;

    use super::*;

    fn did(seed: u8) -> Did {
        Did::from_bytes(&[seed; 16]).unwrap()
    }

    fn txn(seq_no: SeqNo, txn_time: TxnTime, update: AttributeUpdate) -> NymTxn {
        NymTxn::seal(seq_no, txn_time, None, update).unwrap()
    }

    #[test]
    fn baseline_keeps_unset_fields_absent() {
        let record = EffectiveRecord::baseline(&txn(
            10,
            100,
            AttributeUpdate::new(did(1), did(2)).with_verkey("~v"),
        ));
        assert_eq!(record.verkey.as_deref(), Some("~v"));
        assert_eq!(record.role, None);
        assert_eq!(record.diddoc_content, None);
        assert_eq!(record.version, None);
        assert_eq!(record.identifier, did(1));
        assert_eq!((record.seq_no, record.txn_time), (10, 100));
    }

    #[test]
    fn apply_overwrites_set_and_inherits_unset() {
        let mut record = EffectiveRecord::baseline(&txn(
            10,
            100,
            AttributeUpdate::new(did(1), did(2))
                .with_verkey("~v")
                .with_role(Some(Role::Endorser))
                .with_diddoc_content("A"),
        ));
        record.apply(&txn(
            14,
            130,
            AttributeUpdate::new(did(2), did(2))
                .with_diddoc_content("B")
                .with_role(None),
        ));

        assert_eq!(record.verkey.as_deref(), Some("~v"));
        assert_eq!(record.diddoc_content.as_deref(), Some("B"));
        assert_eq!(record.role, Some(None));
        assert_eq!(record.identifier, did(1));
        assert_eq!((record.seq_no, record.txn_time), (14, 130));
    }

    #[test]
    fn same_attributes_ignores_provenance() {
        let a = EffectiveRecord::baseline(&txn(1, 1, AttributeUpdate::new(did(1), did(1))));
        let mut b = a.clone();
        b.apply(&txn(2, 5, AttributeUpdate::new(did(1), did(1))));
        assert!(a.same_attributes(&b));
        assert_ne!(a, b);
    }
}
