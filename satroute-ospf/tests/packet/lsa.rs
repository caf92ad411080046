use super::*;

#[test]
fn test_encode_lsa1() {
    let (ref bytes, ref lsa) = *LSA1;
    test_encode_lsa(bytes, lsa);
}

#[test]
fn test_decode_lsa1() {
    let (ref bytes, ref lsa) = *LSA1;
    test_decode_lsa(bytes, lsa);
}

#[test]
fn test_encode_lsa2() {
    let (ref bytes, ref lsa) = *LSA2;
    test_encode_lsa(bytes, lsa);
}

#[test]
fn test_decode_lsa2() {
    let (ref bytes, ref lsa) = *LSA2;
    test_decode_lsa(bytes, lsa);
}

#[test]
fn test_lsa_hdr_fields() {
    let (_, ref lsa) = *LSA1;
    assert_eq!(lsa.hdr.length, 48);
    assert_eq!(lsa.hdr.lsa_type.type_code(), Some(LsaTypeCode::Router));
    assert_eq!(lsa.hdr.cksum, 0);
    assert_eq!(
        lsa.hdr.key(),
        LsaKey::new(LsaType(1), ip4!("0.0.0.2"), ip4!("0.0.0.2"))
    );
    assert_eq!(lsa.body.links[0].link_type, LsaLink::POINT_TO_POINT);
    assert_eq!(lsa.body.links[0].tos_count, 0);
}

#[test]
fn test_generated_at_truncation() {
    // Only the low-order 16 bits of the origination time are transmitted.
    let (ref bytes, ref lsa) = *LSA2;
    let mut lsa_70000 = lsa.clone();
    lsa_70000.hdr.generated_at = 70000;
    test_encode_lsa(bytes, &lsa_70000);
    test_decode_lsa(bytes, lsa);
}

#[test]
fn test_unknown_fields_preserved() {
    let mut lsa = LSA1.1.clone();
    lsa.hdr.options = Options::from_bits_retain(0x83);
    lsa.body.flags = LsaRouterFlags::V | LsaRouterFlags::E;
    lsa.body.links[1].link_type = 4;
    lsa.body.links[1].tos_count = 2;

    let mut buf = BytesMut::new();
    lsa.encode(&mut buf);
    let mut buf = buf.freeze();
    assert_eq!(Lsa::decode(&mut buf).unwrap(), lsa);
}

#[test]
fn test_lsa_key_order() {
    // Keys are ordered by type, then subject, then originator.
    let key1 = LsaKey::new(LsaType(1), ip4!("0.0.0.9"), ip4!("0.0.0.9"));
    let key2 = LsaKey::new(LsaType(2), ip4!("0.0.0.1"), ip4!("0.0.0.1"));
    let key3 = LsaKey::new(LsaType(2), ip4!("0.0.0.1"), ip4!("0.0.0.2"));
    let key4 = LsaKey::new(LsaType(2), ip4!("0.0.0.2"), ip4!("0.0.0.1"));
    assert!(key1 < key2);
    assert!(key2 < key3);
    assert!(key3 < key4);
}

#[test]
fn test_decode_lsa_short_hdr() {
    let (ref bytes, _) = *LSA1;
    let mut buf = Bytes::copy_from_slice(&bytes[..19]);
    assert_eq!(
        LsaHdr::decode(&mut buf),
        Err(DecodeError::InvalidLength(19))
    );
}

#[test]
fn test_decode_lsa_truncated_body() {
    let (ref bytes, _) = *LSA1;
    let mut buf = Bytes::copy_from_slice(&bytes[..47]);
    assert_eq!(Lsa::decode(&mut buf), Err(DecodeError::InvalidLsaLength(48)));
}

#[test]
fn test_decode_lsa_length_too_small() {
    let mut bytes = LSA1.0.clone();
    bytes[19] = 0x0a;
    let mut buf = Bytes::from(bytes);
    assert_eq!(Lsa::decode(&mut buf), Err(DecodeError::InvalidLsaLength(10)));
}

#[test]
fn test_decode_lsa_length_mismatch() {
    // The declared length covers four bytes the link records don't use.
    let mut bytes = LSA1.0.clone();
    bytes[19] = 0x34;
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    let mut buf = Bytes::from(bytes);
    assert_eq!(Lsa::decode(&mut buf), Err(DecodeError::InvalidLsaLength(52)));
}

#[test]
fn test_decode_body_missing_links() {
    // Three links announced, only two present.
    let (ref bytes, _) = *LSA1;
    let mut body = bytes[20..].to_vec();
    body[3] = 0x03;
    let mut buf = Bytes::from(body);
    assert_eq!(LsaBody::decode(&mut buf), Err(DecodeError::InvalidLength(24)));
}
