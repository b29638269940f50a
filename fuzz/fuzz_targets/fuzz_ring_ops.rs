#![no_main]

use arbitrary::Arbitrary;
use concord_core::{FullPeerInfo, PrivateKey};
use concord_ring::{signing, Ring, RingKindTag};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Op {
    AddPeer(u8),
    AddApplicant(u8),
    AddRejection(u8),
    Remove(u8),
    Payload(Vec<u8>),
    GenerationSign(u8),
    ConcordanceSign(u8),
    ResetToEmpty,
}

#[derive(Debug, Arbitrary)]
struct Input {
    backup: bool,
    ops: Vec<Op>,
}

fn device(seed: u8) -> FullPeerInfo {
    // seeds 1..=16 are always valid scalars
    let key = PrivateKey::from_bytes(&[seed % 16 + 1; 32]).unwrap();
    FullPeerInfo::new(key, Vec::<String>::new()).unwrap()
}

fuzz_target!(|input: Input| {
    let kind = if input.backup {
        RingKindTag::Backup
    } else {
        RingKindTag::Basic
    };
    let mut ring = Ring::create("fuzz", kind).unwrap();

    for op in input.ops.into_iter().take(64) {
        match op {
            Op::AddPeer(id) => {
                let _ = ring.add_peer_id(&format!("peer-{}", id));
            }
            Op::AddApplicant(id) => {
                let _ = ring.add_applicant(&format!("peer-{}", id));
            }
            Op::AddRejection(id) => {
                let _ = ring.add_rejection(&format!("peer-{}", id));
            }
            Op::Remove(id) => {
                let id = format!("peer-{}", id);
                ring.remove_peer_id(&id);
                ring.remove_applicant(&id);
                ring.remove_rejection(&id);
            }
            Op::Payload(bytes) => ring.put_payload(bytes),
            Op::GenerationSign(seed) => {
                let signer = device(seed);
                let before = ring.generation();
                ring.generation_sign(None, &signer).unwrap();
                assert!(before.is_older_than(&ring.generation()));
                assert_eq!(ring.signatures().len(), 1);
            }
            Op::ConcordanceSign(seed) => {
                let signer = device(seed);
                ring.concordance_sign(&signer).unwrap();
                assert!(signing::verify_peer_signed(&ring, signer.peer_info()));
            }
            Op::ResetToEmpty => {
                ring.reset_to_empty("fuzz").unwrap();
                assert!(ring.is_empty());
            }
        }
    }

    let decoded = Ring::decode(&ring.encode().unwrap()).unwrap();
    assert_eq!(decoded, ring);
});
