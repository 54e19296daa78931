//! EOSIO-style base32 account/action names, packed into a `u64`.
//!
//! Names are at most 12 base32 symbols (`.12345a-z`) plus an optional
//! 13th symbol restricted to 4 bits, packed big-endian into 64 bits —
//! the same representation `chain::name` uses in the node this plugin
//! is embedded in, which is why every document id in `model::docs` is
//! derived from the numeric form rather than the display string.

use std::fmt;

const CHARMAP: &[u8; 32] = b".12345abcdefghijklmnopqrstuvwxyz";

fn char_to_value(c: u8) -> Option<u64> {
    match c {
        b'.' => Some(0),
        b'1'..=b'5' => Some((c - b'1') as u64 + 1),
        b'a'..=b'z' => Some((c - b'a') as u64 + 6),
        _ => None,
    }
}

/// A packed account, action, or permission name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Name(pub u64);

impl Name {
    pub const EMPTY: Name = Name(0);

    /// Parse a display-form name (e.g. `"eosio.token"`) into its packed form.
    ///
    /// Returns `None` if the string contains a character outside the
    /// name alphabet or is longer than 13 symbols.
    pub fn parse(s: &str) -> Option<Name> {
        if s.len() > 13 {
            return None;
        }
        let bytes = s.as_bytes();
        let mut value: u64 = 0;
        let mut i = 0usize;
        while i < bytes.len() && i < 12 {
            value <<= 5;
            value |= char_to_value(bytes[i])?;
            i += 1;
        }
        if i > 0 {
            value <<= 4 + 5 * (12 - i);
        }
        if bytes.len() == 13 {
            value |= char_to_value(bytes[12])? & 0x0f;
        }
        Some(Name(value))
    }

    /// Render back to display form, trimming trailing `.` padding.
    pub fn to_display_string(self) -> String {
        let mut s = [b'.'; 13];
        let mut value = self.0;
        for i in 0..13 {
            let idx = 12 - i;
            let bits = if idx == 12 { 4 } else { 5 };
            let mask = (1u64 << bits) - 1;
            let sym = (value & mask) as usize;
            s[idx] = CHARMAP[sym.min(31)];
            value >>= bits;
        }
        let end = s.iter().rposition(|&b| b != b'.').map_or(0, |p| p + 1);
        String::from_utf8_lossy(&s[..end]).into_owned()
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

/// The chain's system account (`eosio`), whose ABI specializes `setabi`.
pub const SYSTEM_ACCOUNT: Name = Name(6138663577826885632);

pub const ACTION_NEWACCOUNT: &str = "newaccount";
pub const ACTION_SETABI: &str = "setabi";
pub const ACTION_UPDATEAUTH: &str = "updateauth";
pub const ACTION_DELETEAUTH: &str = "deleteauth";

pub const PERMISSION_OWNER: &str = "owner";
pub const PERMISSION_ACTIVE: &str = "active";
