use crate::errors::StoreError;

/// Object type recorded in the top 4 bits of an index entry's mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModeType {
    #[default]
    Regular,
    Symlink,
    GitLink,
}

impl ModeType {
    pub fn as_bits(&self) -> u16 {
        match self {
            ModeType::Regular => 0b1000,
            ModeType::Symlink => 0b1010,
            ModeType::GitLink => 0b1110,
        }
    }

    pub fn from_bits(bits: u16) -> anyhow::Result<Self> {
        match bits {
            0b1000 => Ok(ModeType::Regular),
            0b1010 => Ok(ModeType::Symlink),
            0b1110 => Ok(ModeType::GitLink),
            _ => Err(StoreError::malformed(format!(
                "unknown index entry mode type {bits:#06b}"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModeType::Regular => "regular file",
            ModeType::Symlink => "symlink",
            ModeType::GitLink => "git link",
        }
    }
}

/// Mode of an index entry: a 4-bit type and 12 permission bits
///
/// All 12 low bits are kept (not just the 9 rwx bits) so the field round-trips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntryMode {
    pub mode_type: ModeType,
    pub permissions: u16,
}

impl EntryMode {
    pub fn regular(executable: bool) -> Self {
        EntryMode {
            mode_type: ModeType::Regular,
            permissions: if executable { 0o755 } else { 0o644 },
        }
    }

    pub fn symlink() -> Self {
        EntryMode {
            mode_type: ModeType::Symlink,
            permissions: 0,
        }
    }

    pub fn from_u16(raw: u16) -> anyhow::Result<Self> {
        Ok(EntryMode {
            mode_type: ModeType::from_bits(raw >> 12)?,
            permissions: raw & 0o7777,
        })
    }

    pub fn as_u16(&self) -> u16 {
        (self.mode_type.as_bits() << 12) | (self.permissions & 0o7777)
    }

    /// Six-digit octal mode as written into tree entries
    pub fn as_tree_mode(&self) -> String {
        format!("{:06o}", self.as_u16())
    }

    pub fn is_executable(&self) -> bool {
        self.permissions & 0o111 != 0
    }
}
