use std::sync::Arc;
use std::thread;

use nym_ledger::{Clock, ManualClock};
use nym_query::{GetNymRequest, NodeConfig, NymLedger, QueryError, BOTH_BOUNDS_MESSAGE};
use nym_types::{AttributeUpdate, Did, NymVersion, Role};

fn did(seed: u8) -> Did {
    Did::from_bytes(&[seed; 16]).unwrap()
}

/// Identity `did(1)` created at seqNo 10 / t=100 with diddocContent A and
/// updated at seqNo 14 / t=130 with diddocContent B, verkey left unset.
fn populate(ledger: &NymLedger, clock: &ManualClock) {
    for _ in 0..9 {
        ledger
            .append(AttributeUpdate::new(did(9), did(8)).with_verkey("~other"))
            .unwrap();
    }
    ledger
        .append(
            AttributeUpdate::new(did(9), did(1))
                .with_verkey("~v1")
                .with_role(Some(Role::Endorser))
                .with_diddoc_content(r#"{"service":"A"}"#),
        )
        .unwrap();
    for _ in 0..3 {
        ledger
            .append(AttributeUpdate::new(did(9), did(8)))
            .unwrap();
    }
    clock.set(130);
    ledger
        .append(AttributeUpdate::new(did(1), did(1)).with_diddoc_content(r#"{"service":"B"}"#))
        .unwrap();
}

fn scenario(checkpoint_interval: usize) -> NymLedger {
    let clock = Arc::new(ManualClock::new(100));
    let ledger = NymLedger::in_memory(clock.clone(), checkpoint_interval);
    populate(&ledger, &clock);
    ledger
}

fn request() -> GetNymRequest {
    GetNymRequest::latest(did(5).to_string(), did(1).to_string())
}

fn diddoc(ledger: &NymLedger, req: &GetNymRequest) -> String {
    ledger
        .get_nym(req)
        .unwrap()
        .nym_data()
        .unwrap()
        .diddoc_content
        .unwrap()
}

#[test]
fn acceptance_scenario() {
    for interval in [0, 1, 3] {
        let ledger = scenario(interval);
        assert_eq!(diddoc(&ledger, &request().at_timestamp(100)), r#"{"service":"A"}"#);
        assert_eq!(diddoc(&ledger, &request().at_timestamp(115)), r#"{"service":"A"}"#);
        assert_eq!(diddoc(&ledger, &request().at_timestamp(130)), r#"{"service":"B"}"#);
        assert_eq!(diddoc(&ledger, &request().at_seq_no(10)), r#"{"service":"A"}"#);
        assert_eq!(diddoc(&ledger, &request()), r#"{"service":"B"}"#);

        let err = ledger
            .get_nym(&request().at_seq_no(10).at_timestamp(100))
            .unwrap_err();
        assert_eq!(err.code(), "InvalidClientRequest");
        assert_eq!(err.to_reply().message, BOTH_BOUNDS_MESSAGE);
    }
}

#[test]
fn updated_record_inherits_unset_verkey() {
    let ledger = scenario(0);
    let data = ledger.get_nym(&request()).unwrap().nym_data().unwrap();
    assert_eq!(data.verkey.as_deref(), Some("~v1"));
    assert_eq!(data.role, Some(Some(Role::Endorser)));
    assert_eq!((data.seq_no, data.txn_time), (14, 130));
    assert_eq!(data.identifier, did(9));
}

#[test]
fn timestamp_equal_to_txn_time_matches_seq_no() {
    let ledger = scenario(0);
    let by_time = ledger.get_nym(&request().at_timestamp(130)).unwrap();
    let by_seq = ledger.get_nym(&request().at_seq_no(14)).unwrap();
    assert_eq!(by_time.data, by_seq.data);

    let between = ledger.get_nym(&request().at_timestamp(129)).unwrap();
    assert_eq!(between.data, ledger.get_nym(&request().at_seq_no(10)).unwrap().data);
}

#[test]
fn bound_between_updates_keeps_provenance_of_earlier_update() {
    let ledger = scenario(0);
    let reply = ledger.get_nym(&request().at_seq_no(12)).unwrap();
    assert_eq!((reply.seq_no, reply.txn_time), (10, 100));
}

#[test]
fn both_bounds_rejected_even_when_they_agree() {
    let ledger = scenario(0);
    for (seq_no, timestamp) in [(10, 100), (14, 130), (1, 0)] {
        let err = ledger
            .get_nym(&request().at_seq_no(seq_no).at_timestamp(timestamp))
            .unwrap_err();
        assert_eq!(err, QueryError::Validation(BOTH_BOUNDS_MESSAGE.into()));
    }
}

#[test]
fn not_found_and_out_of_range_are_distinct() {
    let ledger = scenario(0);

    let before_creation = ledger.get_nym(&request().at_seq_no(9)).unwrap_err();
    assert_eq!(before_creation.code(), "NotFound");
    let before_time = ledger.get_nym(&request().at_timestamp(99)).unwrap_err();
    assert_eq!(before_time.code(), "NotFound");

    let beyond = ledger.get_nym(&request().at_seq_no(15)).unwrap_err();
    assert_eq!(beyond, QueryError::OutOfRange { seq_no: 15, tail: 14 });
    assert_eq!(beyond.code(), "OutOfRange");
}

#[test]
fn never_set_attributes_are_absent() {
    let ledger = scenario(0);
    let reply = ledger.get_nym(&request()).unwrap();
    assert!(!reply.data.contains("version"));
    assert!(!reply.data.contains("null"));

    ledger
        .append(AttributeUpdate::new(did(1), did(1)).with_version(NymVersion::SelfCertAware))
        .unwrap();
    let reply = ledger.get_nym(&request()).unwrap();
    assert!(reply.data.contains(r#""version":1"#));

    let old = ledger.get_nym(&request().at_seq_no(14)).unwrap();
    assert!(!old.data.contains("version"));
}

#[test]
fn repeated_resolution_is_byte_identical() {
    let ledger = scenario(2);
    let doc = "{\n  \"@context\": [\"https://w3id.org/did/v1\"],\t\"k\": \"\u{1F511}\" }";
    ledger
        .append(AttributeUpdate::new(did(1), did(1)).with_diddoc_content(doc))
        .unwrap();

    let replies: Vec<_> = (0..5)
        .map(|_| ledger.get_nym(&request().at_seq_no(15)).unwrap())
        .collect();
    assert!(replies.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(replies[0].nym_data().unwrap().diddoc_content.as_deref(), Some(doc));
}

#[test]
fn durable_ledger_reopens_with_same_answers() {
    let dir = tempfile::tempdir().unwrap();
    let config = NodeConfig {
        log_path: Some(dir.path().join("nym.wal")),
        checkpoint_interval: 2,
        ..NodeConfig::default()
    };
    let clock = Arc::new(ManualClock::new(100));

    let ledger = NymLedger::open(&config, clock.clone()).unwrap();
    populate(&ledger, &clock);
    let before = ledger.get_nym(&request().at_timestamp(115)).unwrap();
    ledger.close().unwrap();

    let reopened = NymLedger::open(&config, clock.clone()).unwrap();
    assert_eq!(reopened.tail(), 14);
    assert_eq!(reopened.get_nym(&request().at_timestamp(115)).unwrap(), before);
    assert_eq!(reopened.checkpoints().count(&did(8)), 6);

    clock.advance(5);
    assert_eq!(
        reopened
            .append(AttributeUpdate::new(did(1), did(1)).with_verkey("~v2"))
            .unwrap(),
        15
    );
    assert!(reopened.verify().unwrap().is_valid());
}

#[test]
fn readers_see_consistent_snapshots_while_writer_appends() {
    let clock = Arc::new(ManualClock::new(100));
    let ledger = Arc::new(NymLedger::in_memory(clock.clone(), 4));
    ledger
        .append(AttributeUpdate::new(did(1), did(1)).with_verkey("~0"))
        .unwrap();

    let writer = {
        let ledger = ledger.clone();
        let clock = clock.clone();
        thread::spawn(move || {
            for i in 1..200u32 {
                clock.advance(1);
                ledger
                    .append(AttributeUpdate::new(did(1), did(1)).with_verkey(format!("~{i}")))
                    .unwrap();
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let ledger = ledger.clone();
            thread::spawn(move || {
                for _ in 0..200 {
                    let reply = ledger.get_nym(&request()).unwrap();
                    let data = reply.nym_data().unwrap();
                    // Every update of did(1) sets the verkey to its own index.
                    let expected = format!("~{}", reply.seq_no - 1);
                    assert_eq!(data.verkey.as_deref(), Some(expected.as_str()));

                    let at_time = ledger
                        .get_nym(&request().at_timestamp(reply.txn_time))
                        .unwrap();
                    assert!(at_time.seq_no >= reply.seq_no);
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for r in readers {
        r.join().unwrap();
    }
    assert_eq!(ledger.tail(), 200);
    assert_eq!(clock.now(), 299);
}

#[test]
fn corrupt_wal_frame_refuses_to_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nym.wal");
    let config = NodeConfig {
        log_path: Some(path.clone()),
        ..NodeConfig::default()
    };
    let clock = Arc::new(ManualClock::new(100));

    let ledger = NymLedger::open(&config, clock.clone()).unwrap();
    populate(&ledger, &clock);
    ledger.close().unwrap();

    // Flip a payload byte of the second frame; twelve intact frames follow.
    let mut bytes = std::fs::read(&path).unwrap();
    let first_len = u32::from_le_bytes(bytes[0..4].try_into().unwrap()) as usize;
    bytes[8 + first_len + 8] ^= 0xFF;
    std::fs::write(&path, &bytes).unwrap();

    let err = NymLedger::open(&config, clock).err().unwrap();
    assert_eq!(err.code(), "LedgerIntegrity");
    assert!(matches!(err, QueryError::Integrity(_)));
    assert_eq!(std::fs::read(&path).unwrap(), bytes);
}
