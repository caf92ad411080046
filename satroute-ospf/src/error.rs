//
// Copyright (c) The Satroute Core Contributors
//
// See LICENSE for license details.
//

use std::net::Ipv4Addr;
use std::path::PathBuf;

use tracing::{error, warn};

use crate::packet::error::DecodeError;

// Routing core errors.
//
// Every variant except `PacketDecodeError` signals a condition the routing
// core can't recover from by itself, and is meant to be propagated to the
// caller.
#[derive(Debug)]
pub enum Error {
    // Packet input
    PacketDecodeError(DecodeError),
    // LSDB
    SeqNoExhausted(Ipv4Addr),
    LsaTooManyLinks(usize),
    // Route computation
    NexthopAddrNotFound(Ipv4Addr, Ipv4Addr),
    DestinationAddrNotFound(Ipv4Addr),
    // Precomputed routes
    PrecomputedRouteIo(PathBuf, std::io::Error),
    PrecomputedRouteParse(PathBuf, usize, String),
}

// ===== impl Error =====

impl Error {
    pub fn log(&self) {
        match self {
            Error::PacketDecodeError(error) => {
                warn!(%error, "{}", self);
            }
            Error::SeqNoExhausted(router_id) => {
                error!(%router_id, "{}", self);
            }
            Error::LsaTooManyLinks(links) => {
                error!(%links, "{}", self);
            }
            Error::NexthopAddrNotFound(destination, nexthop) => {
                error!(%destination, %nexthop, "{}", self);
            }
            Error::DestinationAddrNotFound(destination) => {
                error!(%destination, "{}", self);
            }
            Error::PrecomputedRouteIo(path, error) => {
                error!(path = %path.display(), %error, "{}", self);
            }
            Error::PrecomputedRouteParse(path, line, reason) => {
                error!(path = %path.display(), %line, %reason, "{}", self);
            }
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::PacketDecodeError(..) => {
                write!(f, "failed to decode packet")
            }
            Error::SeqNoExhausted(..) => {
                write!(f, "LSA sequence number space exhausted")
            }
            Error::LsaTooManyLinks(..) => {
                write!(f, "too many links to fit in a router-LSA")
            }
            Error::NexthopAddrNotFound(..) => {
                write!(f, "no interface address for the first-hop neighbor")
            }
            Error::DestinationAddrNotFound(..) => {
                write!(f, "no interface address for the destination")
            }
            Error::PrecomputedRouteIo(..) => {
                write!(f, "failed to read precomputed route file")
            }
            Error::PrecomputedRouteParse(..) => {
                write!(f, "malformed precomputed route file")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::PacketDecodeError(error) => Some(error),
            Error::PrecomputedRouteIo(_, error) => Some(error),
            _ => None,
        }
    }
}

impl From<DecodeError> for Error {
    fn from(error: DecodeError) -> Error {
        Error::PacketDecodeError(error)
    }
}
