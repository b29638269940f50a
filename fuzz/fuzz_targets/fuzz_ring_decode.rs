#![no_main]

use concord_core::PeerSet;
use concord_ring::{concordance_trust, ConcordanceRequest, Ring};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(ring) = Ring::decode(data) {
        // Absent optional sets come back as empty ones, so compare after
        // one normalizing pass
        if ring.payload().is_some() {
            let reencoded = ring.encode().unwrap();
            let again = Ring::decode(&reencoded).unwrap();
            assert_eq!(again, ring);
            assert_eq!(again.encode().unwrap(), reencoded);
        }

        // Evaluation should not panic, whatever the ring claims
        let peers = PeerSet::new();
        let req = ConcordanceRequest::new(&peers, &ring).with_known_ring(&ring);
        let _ = concordance_trust(&req);
        let _ = ring.describe();
    }
});
