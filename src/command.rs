use log::warn;

use crate::error::EncodeError;
use crate::schema::{FieldLength, Registry};

/// Values supplied by the caller for a command, by field name
pub type Fields<'a> = [(&'a str, &'a [u8])];

impl Registry {
    /// Serialize `fields` into the payload of command `name`.
    ///
    /// Fields are written in schema order. A field that was not supplied falls
    /// back to its default; a rest-of-frame field may be left out entirely.
    pub fn build_command(&self, name: &str, fields: &Fields<'_>) -> Result<Vec<u8>, EncodeError> {
        if self.commands.is_empty() {
            return Err(EncodeError::NotImplemented);
        }
        let spec = self
            .command(name)
            .ok_or_else(|| EncodeError::UnknownCommand(name.into()))?;

        for (given, _) in fields {
            if !spec.fields.iter().any(|f| f.name == *given) {
                warn!("command '{}' has no field '{}', ignoring it", name, given);
            }
        }

        let mut packet = Vec::new();
        for field in spec.fields {
            let supplied = fields
                .iter()
                .find(|(n, _)| *n == field.name)
                .map(|(_, v)| *v);
            let value = match (supplied, field.default, field.length) {
                (Some(v), _, _) => v,
                (None, Some(d), _) => d,
                (None, None, FieldLength::ToEnd) => continue,
                (None, None, length) => {
                    return Err(EncodeError::MissingField {
                        field: field.name,
                        length,
                    });
                }
            };

            match field.length {
                FieldLength::Fixed(expected) if value.len() != expected => {
                    return Err(EncodeError::FieldLengthMismatch {
                        field: field.name,
                        expected,
                        found: value.len(),
                    });
                }
                FieldLength::NullTerminated => {
                    if value.contains(&0) {
                        return Err(EncodeError::InteriorNul { field: field.name });
                    }
                    packet.extend_from_slice(value);
                    packet.push(0);
                }
                _ => packet.extend_from_slice(value),
            }
        }
        Ok(packet)
    }
}
