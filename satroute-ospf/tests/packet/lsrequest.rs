use super::*;

static LSREQUEST1: Lazy<(Vec<u8>, LsRequest)> = Lazy::new(|| {
    (
        vec![
            0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00,
            0x02, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x04, 0x00, 0x00,
            0x00, 0x04,
        ],
        LsRequest::new(vec![
            LsaKey::new(LsaType(1), ip4!("0.0.0.2"), ip4!("0.0.0.2")),
            LsaKey::new(LsaType(1), ip4!("0.0.0.4"), ip4!("0.0.0.4")),
        ]),
    )
});

#[test]
fn test_encode_lsrequest1() {
    let (ref bytes, ref packet) = *LSREQUEST1;
    test_encode_packet(bytes, packet);
}

#[test]
fn test_decode_lsrequest1() {
    let (ref bytes, ref packet) = *LSREQUEST1;
    test_decode_packet(bytes, packet);
}

#[test]
fn test_decode_lsrequest_empty() {
    test_decode_packet(&[], &LsRequest::default());
}

#[test]
fn test_decode_lsrequest_partial_entry() {
    let (ref bytes, _) = *LSREQUEST1;
    test_decode_packet_error::<LsRequest>(
        &bytes[..13],
        DecodeError::InvalidLength(13),
    );
}
