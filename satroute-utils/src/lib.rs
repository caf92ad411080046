//
// Copyright (c) The Satroute Core Contributors
//
// See LICENSE for license details.
//

pub mod bytes;
pub mod sim;
pub mod southbound;
