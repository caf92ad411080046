//
// Copyright (c) The Satroute Core Contributors
//
// See LICENSE for license details.
//

mod lsa;
mod lsack;
mod lsrequest;

use std::sync::LazyLock as Lazy;

use bytes::{Bytes, BytesMut};
use const_addrs::ip4;
use satroute_ospf::packet::error::DecodeError;
use satroute_ospf::packet::lsa::*;
use satroute_ospf::packet::*;

//
// Helper functions.
//

fn test_encode_lsa(bytes_expected: &[u8], lsa: &Lsa) {
    let mut bytes_actual = BytesMut::with_capacity(1500);
    lsa.encode(&mut bytes_actual);
    assert_eq!(bytes_expected, bytes_actual.as_ref());
    assert_eq!(lsa.length() as usize, bytes_actual.len());
}

fn test_decode_lsa(bytes: &[u8], lsa_expected: &Lsa) {
    let mut buf = Bytes::copy_from_slice(bytes);
    let lsa_actual = Lsa::decode(&mut buf).unwrap();
    assert_eq!(*lsa_expected, lsa_actual);
    assert!(buf.is_empty());
}

fn test_encode_packet<P: PacketBase>(bytes_expected: &[u8], packet: &P) {
    let bytes_actual = packet.encode();
    assert_eq!(bytes_expected, bytes_actual.as_ref());
    assert_eq!(packet.length(), bytes_actual.len());
}

fn test_decode_packet<P>(bytes: &[u8], packet_expected: &P)
where
    P: PacketBase + std::fmt::Debug + PartialEq,
{
    let mut buf = Bytes::copy_from_slice(bytes);
    let packet_actual = P::decode(&mut buf).unwrap();
    assert_eq!(*packet_expected, packet_actual);
}

fn test_decode_packet_error<P>(bytes: &[u8], error_expected: DecodeError)
where
    P: PacketBase + std::fmt::Debug,
{
    let mut buf = Bytes::copy_from_slice(bytes);
    let error_actual = P::decode(&mut buf).unwrap_err();
    assert_eq!(error_expected, error_actual);
}

//
// Test LSAs.
//

// Satellite router-LSA with two links.
static LSA1: Lazy<(Vec<u8>, Lsa)> = Lazy::new(|| {
    (
        vec![
            0x00, 0x31, 0x02, 0x01, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00,
            0x02, 0x00, 0x00, 0x00, 0x05, 0x00, 0x64, 0x00, 0x30, 0x00, 0x00,
            0x00, 0x02, 0x00, 0x00, 0x00, 0x01, 0x0a, 0x00, 0x00, 0x02, 0x01,
            0x00, 0x00, 0x0a, 0x00, 0x00, 0x00, 0x03, 0x0a, 0x00, 0x01, 0x02,
            0x01, 0x00, 0x00, 0x14,
        ],
        Lsa::new(
            49,
            Options::E,
            ip4!("0.0.0.2"),
            ip4!("0.0.0.2"),
            5,
            100,
            LsaBody::new(
                LsaRouterFlags::empty(),
                vec![
                    LsaLink::new(ip4!("0.0.0.1"), ip4!("10.0.0.2"), 10),
                    LsaLink::new(ip4!("0.0.0.3"), ip4!("10.0.1.2"), 20),
                ],
            ),
        ),
    )
});

// Ground station router-LSA, attached to a single satellite.
static LSA2: Lazy<(Vec<u8>, Lsa)> = Lazy::new(|| {
    (
        vec![
            0x00, 0x00, 0x02, 0x01, 0x00, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00,
            0x04, 0x00, 0x00, 0x00, 0x01, 0x11, 0x70, 0x00, 0x24, 0x01, 0x00,
            0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x0a, 0x00, 0x02, 0x04, 0x01,
            0x00, 0x00, 0x01,
        ],
        Lsa::new(
            0,
            Options::E,
            ip4!("0.0.0.4"),
            ip4!("0.0.0.4"),
            1,
            4464,
            LsaBody::new(
                LsaRouterFlags::B,
                vec![LsaLink::new(ip4!("0.0.0.1"), ip4!("10.0.2.4"), 1)],
            ),
        ),
    )
});
