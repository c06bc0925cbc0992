use std::fmt;
use std::str::FromStr;

/// Joypad key bitmask, in the device's hardware pin order.
///
/// The same layout is used for key state reported by the device and for
/// input state sent to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct JoypadKeys(u8);

impl JoypadKeys {
    pub const NONE: JoypadKeys = JoypadKeys(0);
    pub const LEFT: JoypadKeys = JoypadKeys(1 << 7);
    pub const UP: JoypadKeys = JoypadKeys(1 << 6);
    pub const DOWN: JoypadKeys = JoypadKeys(1 << 5);
    pub const SELECT: JoypadKeys = JoypadKeys(1 << 4);
    pub const START: JoypadKeys = JoypadKeys(1 << 3);
    pub const RIGHT: JoypadKeys = JoypadKeys(1 << 2);
    pub const OPTION: JoypadKeys = JoypadKeys(1 << 1);
    pub const EDIT: JoypadKeys = JoypadKeys(1 << 0);

    /// All keys, most significant bit first.
    pub const ALL: [(JoypadKeys, &'static str); 8] = [
        (Self::LEFT, "left"),
        (Self::UP, "up"),
        (Self::DOWN, "down"),
        (Self::SELECT, "select"),
        (Self::START, "start"),
        (Self::RIGHT, "right"),
        (Self::OPTION, "option"),
        (Self::EDIT, "edit"),
    ];

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Every key in `other` is pressed in `self`.
    pub const fn contains(self, other: JoypadKeys) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: JoypadKeys) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: JoypadKeys) {
        self.0 &= !other.0;
    }

    /// Names of the pressed keys, most significant bit first.
    pub fn names(self) -> Vec<&'static str> {
        Self::ALL
            .iter()
            .filter(|(key, _)| self.contains(*key))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl std::ops::BitOr for JoypadKeys {
    type Output = JoypadKeys;

    fn bitor(self, rhs: JoypadKeys) -> JoypadKeys {
        JoypadKeys(self.0 | rhs.0)
    }
}

impl fmt::Display for JoypadKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        f.write_str(&self.names().join("|"))
    }
}

/// Error returned when parsing a key list fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown joypad key '{0}' (expected left, up, down, select, start, right, option, edit)")]
pub struct ParseKeysError(pub String);

impl FromStr for JoypadKeys {
    type Err = ParseKeysError;

    /// Parse a comma-separated key list such as `left,up,edit`.
    ///
    /// `none` or an empty string parse to no keys. `opt` is accepted for
    /// `option`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut keys = JoypadKeys::NONE;
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let lowered = part.to_ascii_lowercase();
            let key = match lowered.as_str() {
                "none" => JoypadKeys::NONE,
                "opt" => JoypadKeys::OPTION,
                name => Self::ALL
                    .iter()
                    .find(|(_, n)| *n == name)
                    .map(|(key, _)| *key)
                    .ok_or_else(|| ParseKeysError(part.to_string()))?,
            };
            keys.insert(key);
        }
        Ok(keys)
    }
}
