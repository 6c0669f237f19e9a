//! Attribute access modes
//!
//! Written in definitions as `rxx` (read only), `rwx` (read/write) or
//! `rwd` (read/write/delete), optionally suffixed with `-weak` to store the
//! resolved value as a non-owning handle.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessMode {
    #[default]
    ReadOnly,
    ReadWrite,
    ReadWriteDelete,
}

impl AccessMode {
    pub fn code(&self) -> &'static str {
        match self {
            AccessMode::ReadOnly => "rxx",
            AccessMode::ReadWrite => "rwx",
            AccessMode::ReadWriteDelete => "rwd",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Access {
    pub mode: AccessMode,
    pub weak: bool,
}

impl Access {
    pub const READ_ONLY: Access = Access {
        mode: AccessMode::ReadOnly,
        weak: false,
    };

    pub const READ_WRITE: Access = Access {
        mode: AccessMode::ReadWrite,
        weak: false,
    };

    pub const READ_WRITE_DELETE: Access = Access {
        mode: AccessMode::ReadWriteDelete,
        weak: false,
    };

    pub fn weak(self) -> Self {
        Access { weak: true, ..self }
    }

    pub fn can_write(&self) -> bool {
        self.mode != AccessMode::ReadOnly
    }

    pub fn can_delete(&self) -> bool {
        self.mode == AccessMode::ReadWriteDelete
    }

    /// Fail with [`Error::ReadOnly`] unless `op` is allowed on `attr`.
    pub fn check(&self, attr: &str, op: &'static str) -> Result<()> {
        let allowed = match op {
            "set" => self.can_write(),
            "delete" => self.can_delete(),
            _ => true,
        };
        if allowed {
            Ok(())
        } else {
            Err(Error::ReadOnly {
                attr: attr.to_string(),
                op,
            })
        }
    }
}

impl FromStr for Access {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_lowercase();
        let (code, weak) = match s.strip_suffix("-weak") {
            Some(code) => (code, true),
            None => (s.as_str(), false),
        };
        let mode = match code {
            "rxx" => AccessMode::ReadOnly,
            "rwx" => AccessMode::ReadWrite,
            "rwd" => AccessMode::ReadWriteDelete,
            other => {
                return Err(Error::InvalidDefinition(format!("Unknown access mode `{other}`")));
            }
        };
        Ok(Access { mode, weak })
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mode.code())?;
        if self.weak {
            write!(f, "-weak")?;
        }
        Ok(())
    }
}
