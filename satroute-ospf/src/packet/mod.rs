//
// Copyright (c) The Satroute Core Contributors
//
// See LICENSE for license details.
//

pub mod error;
pub mod lsa;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use derive_new::new;
use satroute_utils::bytes::{BytesExt, BytesMutExt, TLS_BUF};
use serde::{Deserialize, Serialize};

use crate::packet::error::{DecodeError, DecodeResult};
use crate::packet::lsa::{Lsa, LsaHdr, LsaKey, LsaType};

// Common interface of the packets exchanged by the flooding layer.
pub trait PacketBase
where
    Self: Sized,
{
    // Decodes a whole packet from a bytes buffer. The buffer must be
    // consumed entirely.
    fn decode(buf: &mut Bytes) -> DecodeResult<Self>;

    // Encodes the packet into a new bytes buffer.
    fn encode(&self) -> Bytes;

    // Returns the encoded packet length.
    fn length(&self) -> usize;
}

//
// Bulk-update packet.
//
// Encoding format:
//
//  0                   1                   2                   3
//  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                            # LSAs                             |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                                                               |
// +-                                                            +-+
// |                             LSAs                              |
// +-                                                            +-+
// |                              ...                              |
//
#[derive(Clone, Debug, Default, Eq, PartialEq, new)]
#[derive(Deserialize, Serialize)]
pub struct LsUpdate {
    pub lsas: Vec<Lsa>,
}

//
// Request packet.
//
// The number of entries isn't encoded, it's inferred from the packet length.
//
// Encoding format:
//
//  0                   1                   2                   3
//  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                          LS type                              |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                       Link State ID                           |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                     Advertising Router                        |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                              ...                              |
//
#[derive(Clone, Debug, Default, Eq, PartialEq, new)]
#[derive(Deserialize, Serialize)]
pub struct LsRequest {
    pub entries: Vec<LsaKey>,
}

//
// Acknowledgment packet.
//
// A flat list of LSA headers. As with requests, the number of headers is
// inferred from the packet length.
//
#[derive(Clone, Debug, Default, Eq, PartialEq, new)]
#[derive(Deserialize, Serialize)]
pub struct LsAck {
    pub lsa_hdrs: Vec<LsaHdr>,
}

// ===== impl LsUpdate =====

impl LsUpdate {
    pub const BASE_LENGTH: u16 = 4;
}

impl PacketBase for LsUpdate {
    fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        if buf.remaining() < Self::BASE_LENGTH as usize {
            return Err(DecodeError::InvalidLength(buf.remaining()));
        }

        // Parse list of LSAs.
        let lsas_cnt = buf.get_u32();
        let mut lsas = vec![];
        for _ in 0..lsas_cnt {
            let lsa = Lsa::decode(buf)?;
            lsas.push(lsa);
        }

        if buf.has_remaining() {
            return Err(DecodeError::TrailingData(buf.remaining()));
        }

        Ok(LsUpdate { lsas })
    }

    fn encode(&self) -> Bytes {
        TLS_BUF.with(|buf| {
            let mut buf = buf.borrow_mut();
            buf.clear();

            buf.put_u32(self.lsas.len() as u32);
            for lsa in &self.lsas {
                lsa.encode(&mut buf);
            }

            buf.clone().freeze()
        })
    }

    fn length(&self) -> usize {
        Self::BASE_LENGTH as usize
            + self
                .lsas
                .iter()
                .map(|lsa| lsa.length() as usize)
                .sum::<usize>()
    }
}

// ===== impl LsRequest =====

impl LsRequest {
    pub const ENTRY_LENGTH: u16 = 12;

    fn encode_entry(buf: &mut BytesMut, entry: &LsaKey) {
        buf.put_u32(entry.lsa_type.0 as u32);
        buf.put_ipv4(&entry.lsa_id);
        buf.put_ipv4(&entry.adv_rtr);
    }
}

impl PacketBase for LsRequest {
    fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        let entry_len = Self::ENTRY_LENGTH as usize;
        if buf.remaining() % entry_len != 0 {
            return Err(DecodeError::InvalidLength(buf.remaining()));
        }

        // Parse list of LSA global IDs.
        let entries_cnt = buf.remaining() / entry_len;
        let mut entries = Vec::with_capacity(entries_cnt);
        for _ in 0..entries_cnt {
            let lsa_type = LsaType(buf.get_u32() as u8);
            let lsa_id = buf.get_ipv4();
            let adv_rtr = buf.get_ipv4();
            entries.push(LsaKey::new(lsa_type, lsa_id, adv_rtr));
        }

        Ok(LsRequest { entries })
    }

    fn encode(&self) -> Bytes {
        TLS_BUF.with(|buf| {
            let mut buf = buf.borrow_mut();
            buf.clear();

            for entry in &self.entries {
                Self::encode_entry(&mut buf, entry);
            }

            buf.clone().freeze()
        })
    }

    fn length(&self) -> usize {
        self.entries.len() * Self::ENTRY_LENGTH as usize
    }
}

// ===== impl LsAck =====

impl PacketBase for LsAck {
    fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        let hdr_len = LsaHdr::LENGTH as usize;
        if buf.remaining() % hdr_len != 0 {
            return Err(DecodeError::InvalidLength(buf.remaining()));
        }

        // Parse list of LSA headers.
        let lsa_hdrs_cnt = buf.remaining() / hdr_len;
        let mut lsa_hdrs = Vec::with_capacity(lsa_hdrs_cnt);
        for _ in 0..lsa_hdrs_cnt {
            let lsa_hdr = LsaHdr::decode(buf)?;
            lsa_hdrs.push(lsa_hdr);
        }

        Ok(LsAck { lsa_hdrs })
    }

    fn encode(&self) -> Bytes {
        TLS_BUF.with(|buf| {
            let mut buf = buf.borrow_mut();
            buf.clear();

            for lsa_hdr in &self.lsa_hdrs {
                lsa_hdr.encode(&mut buf);
            }

            buf.clone().freeze()
        })
    }

    fn length(&self) -> usize {
        self.lsa_hdrs.len() * LsaHdr::LENGTH as usize
    }
}
