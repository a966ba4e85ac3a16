//! Protocol module - HID framing, device commands and status words.
//!
//! This module implements the device side of the wire:
//! - 64-byte frame layout and header validation
//! - Fragmentation of commands into frames ([`pack`])
//! - Reassembly of responses from frames ([`unpack`], [`FrameBuffer`])
//! - Command encoding and status word interpretation

mod apdu;
mod frame;
mod frame_buffer;
mod status;
mod wire_format;

pub use apdu::{ins, Command, CLA, MAX_PAYLOAD, P2_SSH};
pub use frame::{pack, pack_to_bytes, Frame};
pub use frame_buffer::{unpack, FrameBuffer, Unpacked};
pub use status::StatusWord;
pub use wire_format::{
    framed_len, FrameHeader, CHANNEL, CONTINUATION_DATA_SIZE, FIRST_DATA_SIZE,
    FIRST_HEADER_SIZE, HEADER_SIZE, PACKET_SIZE, REPORT_ID, TAG,
};
