use std::collections::BTreeMap;

use crate::error::DecodeError;
use crate::schema::{FieldLength, Registry};

/// Value of one decoded field. Fields are sliced as `Bytes`; a transform may
/// replace them with something more convenient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Bytes(Vec<u8>),
    Unsigned(u64),
    Text(String),
}

impl FieldValue {
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            FieldValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Big-endian interpretation of a byte field of at most eight bytes
    pub fn as_unsigned(&self) -> Option<u64> {
        match self {
            FieldValue::Unsigned(v) => Some(*v),
            FieldValue::Bytes(b) if b.len() <= 8 => {
                Some(b.iter().fold(0u64, |acc, x| (acc << 8) | *x as u64))
            }
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// A response payload split into named fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedRecord {
    /// Name of the response kind
    pub id: &'static str,
    pub fields: BTreeMap<&'static str, FieldValue>,
}

impl DecodedRecord {
    pub fn new(id: &'static str) -> DecodedRecord {
        DecodedRecord {
            id,
            fields: BTreeMap::new(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Raw bytes of `field`, if present and untransformed
    pub fn bytes(&self, field: &str) -> Option<&[u8]> {
        self.get(field)?.as_bytes()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (*k, v))
    }
}

impl Registry {
    /// Split a response payload into fields according to the schema selected
    /// by its first byte.
    pub fn parse_response(&self, data: &[u8]) -> Result<DecodedRecord, DecodeError> {
        if self.responses.is_empty() {
            return Err(DecodeError::NotImplemented);
        }
        let Some(&id) = data.first() else {
            return Err(DecodeError::FrameTooShort {
                expected: 1,
                actual: 0,
            });
        };
        let Some(spec) = self.response(id) else {
            if let Some(cmd) = self.command_with_id(id) {
                return Err(DecodeError::CommandFrame {
                    id,
                    command: cmd.name,
                });
            }
            return Err(DecodeError::UnrecognizedResponse(id));
        };

        let mut record = DecodedRecord::new(spec.name);
        let mut index = 1;
        for field in spec.fields {
            match field.length {
                FieldLength::Fixed(n) => {
                    if index + n > data.len() {
                        return Err(DecodeError::FrameTooShort {
                            expected: index + n,
                            actual: data.len(),
                        });
                    }
                    record
                        .fields
                        .insert(field.name, FieldValue::Bytes(data[index..index + n].to_vec()));
                    index += n;
                }
                FieldLength::NullTerminated => {
                    let Some(end) = data[index..].iter().position(|b| *b == 0) else {
                        return Err(DecodeError::FrameTooShort {
                            expected: data.len() + 1,
                            actual: data.len(),
                        });
                    };
                    record
                        .fields
                        .insert(field.name, FieldValue::Bytes(data[index..index + end].to_vec()));
                    index += end + 1;
                }
                FieldLength::ToEnd => {
                    if index < data.len() {
                        record
                            .fields
                            .insert(field.name, FieldValue::Bytes(data[index..].to_vec()));
                        index = data.len();
                    }
                    break;
                }
            }
        }

        if index < data.len() {
            return Err(DecodeError::FrameTooLong {
                expected: index,
                actual: data.len(),
            });
        }

        for (name, transform) in spec.transforms {
            if record.contains(name) {
                let value = transform(&record);
                record.fields.insert(*name, value);
            }
        }
        Ok(record)
    }
}
