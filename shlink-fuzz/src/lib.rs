//! Fuzzing entry points for shlink-core
//!
//! To use with cargo-fuzz:
//! 1. Install cargo-fuzz: cargo install cargo-fuzz
//! 2. Run fuzzer: cargo fuzz run fuzz_decode

pub fn fuzz_decode(data: &[u8]) {
    use shlink_core::decoder::decode_link_from_bytes;
    use shlink_core::encoder::encode_link;

    // Anything that decodes must encode again and decode to the same record
    if let Ok(link) = decode_link_from_bytes(data) {
        let encoded = encode_link(&link).expect("decoded record failed to encode");
        let again = decode_link_from_bytes(&encoded).expect("re-encoded record failed to decode");
        assert_eq!(again, link);
    }
}

pub fn fuzz_scan(data: &[u8]) {
    use shlink_core::scanner::scan_jump_list;

    let _ = scan_jump_list(data);
}

pub fn fuzz_identifier(data: &[u8]) {
    use shlink_core::Identifier;

    let _ = Identifier::parse(&String::from_utf8_lossy(data));
}
