use super::*;

static LSACK1: Lazy<(Vec<u8>, LsAck)> = Lazy::new(|| {
    (
        [&LSA1.0[..20], &LSA2.0[..20]].concat(),
        LsAck::new(vec![LSA1.1.hdr, LSA2.1.hdr]),
    )
});

#[test]
fn test_encode_lsack1() {
    let (ref bytes, ref packet) = *LSACK1;
    test_encode_packet(bytes, packet);
}

#[test]
fn test_decode_lsack1() {
    let (ref bytes, ref packet) = *LSACK1;
    test_decode_packet(bytes, packet);
}

#[test]
fn test_decode_lsack_partial_hdr() {
    let (ref bytes, _) = *LSACK1;
    test_decode_packet_error::<LsAck>(
        &bytes[..21],
        DecodeError::InvalidLength(21),
    );
}
