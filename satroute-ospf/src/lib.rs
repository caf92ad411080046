//
// Copyright (c) The Satroute Core Contributors
//
// See LICENSE for license details.
//

pub mod config;
pub mod debug;
pub mod error;
pub mod lsdb;
pub mod packet;
pub mod precomputed;
pub mod route;
pub mod router;
pub mod spf;
pub mod tasks;
