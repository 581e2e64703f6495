//! Declarative field layouts shared by the command encoder and the response
//! decoder.

use core::fmt;

use crate::error::SchemaError;
use crate::response::{DecodedRecord, FieldValue};

/// How many payload bytes a field occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldLength {
    Fixed(usize),
    /// Bytes up to a single zero byte, which is consumed but not kept
    NullTerminated,
    /// Everything left in the payload. Only valid as the last field.
    ToEnd,
}

impl fmt::Display for FieldLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldLength::Fixed(n) => write!(f, "length {}", n),
            FieldLength::NullTerminated => write!(f, "null-terminated"),
            FieldLength::ToEnd => write!(f, "rest of frame"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub length: FieldLength,
    /// Only consulted when encoding. `Some(&[0])` is a real default.
    pub default: Option<&'static [u8]>,
}

impl FieldSpec {
    pub const fn fixed(name: &'static str, length: usize) -> FieldSpec {
        FieldSpec {
            name,
            length: FieldLength::Fixed(length),
            default: None,
        }
    }

    pub const fn null_terminated(name: &'static str) -> FieldSpec {
        FieldSpec {
            name,
            length: FieldLength::NullTerminated,
            default: None,
        }
    }

    pub const fn to_end(name: &'static str) -> FieldSpec {
        FieldSpec {
            name,
            length: FieldLength::ToEnd,
            default: None,
        }
    }

    pub const fn with_default(self, default: &'static [u8]) -> FieldSpec {
        FieldSpec {
            default: Some(default),
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
}

impl CommandSpec {
    /// The identifier byte this command puts on the wire, taken from the
    /// default of its leading one-byte field.
    pub fn id(&self) -> Option<u8> {
        match self.fields.first()?.default? {
            [id] => Some(*id),
            _ => None,
        }
    }
}

/// Rewrites one field of a decoded record. Receives the record as built so far.
pub type Transform = fn(&DecodedRecord) -> FieldValue;

#[derive(Debug, Clone, Copy)]
pub struct ResponseSpec {
    pub id: u8,
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
    /// Applied in order after all fields are sliced
    pub transforms: &'static [(&'static str, Transform)],
}

/// Static tables of every command and response a device speaks.
///
/// Tables are trusted as written: run [`Registry::validate`] on any table you
/// define. [`crate::ApiConnection`] checks it in debug builds.
#[derive(Debug, Clone, Copy)]
pub struct Registry {
    pub commands: &'static [CommandSpec],
    pub responses: &'static [ResponseSpec],
}

impl Registry {
    pub const fn new(
        commands: &'static [CommandSpec],
        responses: &'static [ResponseSpec],
    ) -> Registry {
        Registry {
            commands,
            responses,
        }
    }

    pub fn command(&self, name: &str) -> Option<&CommandSpec> {
        self.commands.iter().find(|c| c.name == name)
    }

    pub fn response(&self, id: u8) -> Option<&ResponseSpec> {
        self.responses.iter().find(|r| r.id == id)
    }

    /// Command whose identifier byte is `id`, if any
    pub fn command_with_id(&self, id: u8) -> Option<&CommandSpec> {
        self.commands.iter().find(|c| c.id() == Some(id))
    }

    pub fn validate(&self) -> Result<(), SchemaError> {
        for (i, c) in self.commands.iter().enumerate() {
            if self.commands[..i].iter().any(|o| o.name == c.name) {
                return Err(SchemaError::DuplicateCommand(c.name));
            }
            validate_fields(c.name, c.fields)?;
        }
        for (i, r) in self.responses.iter().enumerate() {
            if self.responses[..i].iter().any(|o| o.id == r.id) {
                return Err(SchemaError::DuplicateResponseId(r.id));
            }
            validate_fields(r.name, r.fields)?;
        }
        Ok(())
    }
}

fn validate_fields(schema: &'static str, fields: &[FieldSpec]) -> Result<(), SchemaError> {
    let last = fields.len().saturating_sub(1);
    for (i, f) in fields.iter().enumerate() {
        match f.length {
            FieldLength::Fixed(0) => {
                return Err(SchemaError::ZeroLength {
                    schema,
                    field: f.name,
                });
            }
            FieldLength::ToEnd if i != last => {
                return Err(SchemaError::ToEndNotLast {
                    schema,
                    field: f.name,
                });
            }
            _ => {}
        }
    }
    Ok(())
}
