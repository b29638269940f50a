#![no_main]

use concord_core::{BackupSliceKeyBag, RecoveryKeyBag};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(bag) = BackupSliceKeyBag::decode(data) {
        let reencoded = bag.encode().unwrap();
        assert_eq!(BackupSliceKeyBag::decode(&reencoded).unwrap(), bag);
    }

    if let Ok(bag) = RecoveryKeyBag::decode(data) {
        let reencoded = bag.encode().unwrap();
        assert_eq!(RecoveryKeyBag::decode(&reencoded).unwrap(), bag);
    }
});
