//
// Copyright (c) The Satroute Core Contributors
//
// See LICENSE for license details.
//

use std::net::Ipv4Addr;

use bitflags::bitflags;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use derive_new::new;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use satroute_utils::bytes::{BytesExt, BytesMutExt};
use serde::{Deserialize, Serialize};

use crate::packet::error::{DecodeError, DecodeResult};

// LSA.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct Lsa {
    // LSA header.
    pub hdr: LsaHdr,
    // LSA body.
    pub body: LsaBody,
}

// LSA key. It serves both as a global LSA identifier and as a key to store
// LSAs in the LSDB.
//
// Please be aware that modifying the order of the fields will impact
// operations such as iterating over the LSDB.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, new)]
#[derive(Deserialize, Serialize)]
pub struct LsaKey {
    // LSA type.
    pub lsa_type: LsaType,
    // Router described by the LSA.
    pub lsa_id: Ipv4Addr,
    // LSA advertising router.
    pub adv_rtr: Ipv4Addr,
}

// LSA type.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
#[serde(transparent)]
pub struct LsaType(pub u8);

// LSA type code.
#[derive(Clone, Copy, Debug, Eq, Ord, FromPrimitive, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub enum LsaTypeCode {
    Router = 1,
}

// LSA Options field.
bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    #[derive(Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct Options: u8 {
        const E = 0x02;
        const MC = 0x04;
        const NP = 0x08;
        const DC = 0x20;
        const O = 0x40;
    }
}

//
// LSA header.
//
// The slot that carries the LS checksum in OSPFv2 transports the low-order
// 16 bits of the instance's origination time instead. The checksum is kept
// locally only, and decoded headers always have it set to zero.
//
// Encoding format:
//
//  0                   1                   2                   3
//  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |            LS age             |    Options    |    LS type    |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                        Link State ID                          |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                     Advertising Router                        |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                     LS sequence number                        |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |     Generated at (low 16)     |             length            |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct LsaHdr {
    pub age: u16,
    pub options: Options,
    pub lsa_type: LsaType,
    pub lsa_id: Ipv4Addr,
    pub adv_rtr: Ipv4Addr,
    pub seq_no: u32,
    #[serde(default)]
    pub cksum: u16,
    // Simulation time (in seconds) at which this instance was generated.
    pub generated_at: u32,
    pub length: u16,
}

//
// Router-LSA body.
//
// Encoding format (LSA body):
//
//  0                   1                   2                   3
//  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |    0    |V|E|B|        0      |            # links            |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                          Link ID                              |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                         Link Data                             |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |     Type      |     # TOS     |            metric             |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                              ...                              |
//
#[derive(Clone, Debug, Default, Eq, PartialEq, new)]
#[derive(Deserialize, Serialize)]
pub struct LsaBody {
    pub flags: LsaRouterFlags,
    pub links: Vec<LsaLink>,
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    #[derive(Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct LsaRouterFlags: u8 {
        const B = 0x01;
        const E = 0x02;
        const V = 0x04;
    }
}

// Router-LSA link record. The link ID carries the neighbor's router ID and
// the link data carries the local interface address.
#[derive(Clone, Copy, Debug, Eq, PartialEq, new)]
#[derive(Deserialize, Serialize)]
pub struct LsaLink {
    pub nbr_id: Ipv4Addr,
    pub local_addr: Ipv4Addr,
    #[new(value = "LsaLink::POINT_TO_POINT")]
    pub link_type: u8,
    #[new(value = "0")]
    pub tos_count: u8,
    pub metric: u16,
}

// ===== impl Lsa =====

impl Lsa {
    pub fn new(
        age: u16,
        options: Options,
        lsa_id: Ipv4Addr,
        adv_rtr: Ipv4Addr,
        seq_no: u32,
        generated_at: u32,
        body: LsaBody,
    ) -> Self {
        let mut hdr = LsaHdr::new(
            age,
            options,
            LsaTypeCode::Router.into(),
            lsa_id,
            adv_rtr,
            seq_no,
        );
        hdr.generated_at = generated_at;
        hdr.length = LsaHdr::LENGTH.saturating_add(body.length());

        Lsa { hdr, body }
    }

    // Returns the encoded LSA length.
    pub fn length(&self) -> u16 {
        LsaHdr::LENGTH.saturating_add(self.body.length())
    }

    // Decodes LSA from a bytes buffer.
    pub fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        // Decode LSA header.
        let hdr = LsaHdr::decode(buf)?;
        let lsa_len = hdr.length;
        if lsa_len < LsaHdr::LENGTH {
            return Err(DecodeError::InvalidLsaLength(lsa_len));
        }
        let lsa_body_len = (lsa_len - LsaHdr::LENGTH) as usize;

        // Decode LSA body. The body must fill the declared length exactly.
        if buf.remaining() < lsa_body_len {
            return Err(DecodeError::InvalidLsaLength(lsa_len));
        }
        let mut buf_lsa = buf.copy_to_bytes(lsa_body_len);
        let body = LsaBody::decode(&mut buf_lsa)?;
        if buf_lsa.has_remaining() {
            return Err(DecodeError::InvalidLsaLength(lsa_len));
        }

        Ok(Lsa { hdr, body })
    }

    // Encodes LSA into a bytes buffer.
    pub fn encode(&self, buf: &mut BytesMut) {
        self.hdr.encode(buf);
        self.body.encode(buf);
    }
}

// ===== impl LsaType =====

impl LsaType {
    pub fn type_code(&self) -> Option<LsaTypeCode> {
        LsaTypeCode::from_u8(self.0)
    }
}

impl std::fmt::Display for LsaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<LsaTypeCode> for LsaType {
    fn from(code: LsaTypeCode) -> LsaType {
        LsaType(code as u8)
    }
}

// ===== impl LsaKey =====

impl std::fmt::Display for LsaKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.lsa_type, self.lsa_id, self.adv_rtr)
    }
}

// ===== impl LsaHdr =====

impl LsaHdr {
    pub const LENGTH: u16 = 20;

    pub fn new(
        age: u16,
        options: Options,
        lsa_type: LsaType,
        lsa_id: Ipv4Addr,
        adv_rtr: Ipv4Addr,
        seq_no: u32,
    ) -> Self {
        LsaHdr {
            age,
            options,
            lsa_type,
            lsa_id,
            adv_rtr,
            seq_no,
            cksum: 0,
            generated_at: 0,
            length: 0,
        }
    }

    pub fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        if buf.remaining() < Self::LENGTH as usize {
            return Err(DecodeError::InvalidLength(buf.remaining()));
        }

        let age = buf.get_u16();
        let options = Options::from_bits_retain(buf.get_u8());
        let lsa_type = LsaType(buf.get_u8());
        let lsa_id = buf.get_ipv4();
        let adv_rtr = buf.get_ipv4();
        let seq_no = buf.get_u32();
        let generated_at = buf.get_u16() as u32;
        let length = buf.get_u16();

        Ok(LsaHdr {
            age,
            options,
            lsa_type,
            lsa_id,
            adv_rtr,
            seq_no,
            cksum: 0,
            generated_at,
            length,
        })
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u16(self.age);
        buf.put_u8(self.options.bits());
        buf.put_u8(self.lsa_type.0);
        buf.put_ipv4(&self.lsa_id);
        buf.put_ipv4(&self.adv_rtr);
        buf.put_u32(self.seq_no);
        // Truncated to 16 bits.
        buf.put_u16(self.generated_at as u16);
        buf.put_u16(self.length);
    }

    pub fn key(&self) -> LsaKey {
        LsaKey {
            lsa_type: self.lsa_type,
            lsa_id: self.lsa_id,
            adv_rtr: self.adv_rtr,
        }
    }

    pub fn is_maxage(&self, max_age: u16) -> bool {
        self.age >= max_age
    }
}

// ===== impl LsaBody =====

impl LsaBody {
    pub const BASE_LENGTH: u16 = 4;
    // Largest number of links whose LSA length fits in 16 bits.
    pub const MAX_LINKS: usize = ((u16::MAX
        - LsaHdr::LENGTH
        - Self::BASE_LENGTH)
        / LsaLink::LENGTH) as usize;

    // Saturates for bodies with more than `MAX_LINKS` links, which can't be
    // encoded.
    pub fn length(&self) -> u16 {
        let links_len =
            self.links.len().saturating_mul(LsaLink::LENGTH as usize);
        u16::try_from(links_len)
            .unwrap_or(u16::MAX)
            .saturating_add(Self::BASE_LENGTH)
    }

    pub fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        // Validate minimum LSA length.
        if buf.remaining() < Self::BASE_LENGTH as usize {
            return Err(DecodeError::InvalidLength(buf.remaining()));
        }
        let flags = LsaRouterFlags::from_bits_retain(buf.get_u8());
        let _ = buf.get_u8();
        let links_cnt = buf.get_u16();

        // Validate the link records fit in the remaining data.
        let links_len = links_cnt as usize * LsaLink::LENGTH as usize;
        if buf.remaining() < links_len {
            return Err(DecodeError::InvalidLength(buf.remaining()));
        }

        let mut links = Vec::with_capacity(links_cnt as usize);
        for _ in 0..links_cnt {
            let link = LsaLink::decode(buf)?;
            links.push(link);
        }

        Ok(LsaBody { flags, links })
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(self.flags.bits());
        buf.put_u8(0);
        buf.put_u16(self.links.len() as u16);
        for link in &self.links {
            link.encode(buf);
        }
    }
}

// ===== impl LsaLink =====

impl LsaLink {
    pub const LENGTH: u16 = 12;
    pub const POINT_TO_POINT: u8 = 1;

    pub fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        if buf.remaining() < Self::LENGTH as usize {
            return Err(DecodeError::InvalidLength(buf.remaining()));
        }

        let nbr_id = buf.get_ipv4();
        let local_addr = buf.get_ipv4();
        let link_type = buf.get_u8();
        let tos_count = buf.get_u8();
        let metric = buf.get_u16();

        Ok(LsaLink {
            nbr_id,
            local_addr,
            link_type,
            tos_count,
            metric,
        })
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_ipv4(&self.nbr_id);
        buf.put_ipv4(&self.local_addr);
        buf.put_u8(self.link_type);
        buf.put_u8(self.tos_count);
        buf.put_u16(self.metric);
    }
}
