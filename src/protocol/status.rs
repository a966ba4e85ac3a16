//! Device status words.
//!
//! The last two bytes of every response. The exchange engine only splits
//! them off; interpretation happens in the callers.

use std::fmt;

/// 16-bit status word returned by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusWord(pub u16);

impl StatusWord {
    pub const SUCCESS: StatusWord = StatusWord(0x9000);
    pub const SECURITY_NOT_SATISFIED: StatusWord = StatusWord(0x6982);
    pub const USER_REJECTED: StatusWord = StatusWord(0x6985);
    pub const INVALID_PARAM: StatusWord = StatusWord(0x6B01);

    #[inline]
    pub fn is_success(self) -> bool {
        self == Self::SUCCESS
    }

    /// `0x61xx` / `0x6Cxx`: more data available, not a failure.
    #[inline]
    pub fn is_more_data(self) -> bool {
        matches!(self.0 & 0xFF00, 0x6100 | 0x6C00)
    }

    /// Human-readable diagnosis, for logs only.
    pub fn cause(self) -> &'static str {
        match self.0 {
            0x9000 => "success",
            0x6982 => "security status not satisfied (is a custom CA still installed?)",
            0x6985 => "condition of use not satisfied (denied by the user?)",
            0x6A83 => "the application requires a library that is not installed",
            0x6A84 | 0x6A85 => "not enough space on the device",
            0x6484 => "wrong target id",
            0x6B01 => "invalid parameter",
            0x6D00 | 0x6E00 => "unexpected device state (is the right application open?)",
            _ if self.is_more_data() => "more data available",
            _ => "unknown reason (device disconnected?)",
        }
    }
}

impl From<u16> for StatusWord {
    fn from(code: u16) -> Self {
        StatusWord(code)
    }
}

impl fmt::Display for StatusWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04X}", self.0)
    }
}
