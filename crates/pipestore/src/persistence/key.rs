//! Composite identifier codec
//!
//! Callers only ever see a flat string. Internally an object is identified by
//! the store-assigned [`ObjectId`], the caller-supplied correlation [`Uuid`],
//! or both. Encoded forms:
//!
//! - `<uuid>` for an object that has not been persisted yet
//! - `<object-id>` for a restored object without a correlation UUID
//! - `<object-id>:<uuid>` once both halves are known

use std::fmt;
use std::str::FromStr;

use bson::oid::ObjectId;
use uuid::Uuid;

use super::store::StoreError;

/// Separator between the object-id and uuid segments
pub const KEY_SEPARATOR: char = ':';

/// Length of a hex-encoded ObjectId
const OBJECT_ID_HEX_LEN: usize = 24;

/// Identity of a stored object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKey {
    /// Not yet assigned an id by the store
    Unassigned { uuid: Uuid },

    /// Store id only
    Opaque(ObjectId),

    /// Store id plus correlation UUID
    Assigned { object_id: ObjectId, uuid: Uuid },
}

impl ObjectKey {
    /// A fresh unassigned key with a newly generated correlation UUID
    pub fn new() -> Self {
        Self::Unassigned {
            uuid: Uuid::new_v4(),
        }
    }

    /// Decode a composite identifier
    ///
    /// An empty string is not an error: it decodes to a fresh
    /// [`ObjectKey::Unassigned`], meaning "not yet persisted".
    pub fn decode(id: &str) -> Result<Self, StoreError> {
        if id.is_empty() {
            return Ok(Self::new());
        }

        match id.split_once(KEY_SEPARATOR) {
            Some((object_id, uuid)) => Ok(Self::Assigned {
                object_id: parse_object_id(object_id, id)?,
                uuid: parse_uuid(uuid, id)?,
            }),
            None if id.len() == OBJECT_ID_HEX_LEN => Ok(Self::Opaque(parse_object_id(id, id)?)),
            None => Ok(Self::Unassigned {
                uuid: parse_uuid(id, id)?,
            }),
        }
    }

    /// Encode into the flat string form accepted by [`ObjectKey::decode`]
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// The store-assigned id, if any
    pub fn object_id(&self) -> Option<ObjectId> {
        match self {
            Self::Unassigned { .. } => None,
            Self::Opaque(object_id) | Self::Assigned { object_id, .. } => Some(*object_id),
        }
    }

    /// The correlation UUID, if any
    pub fn uuid(&self) -> Option<Uuid> {
        match self {
            Self::Unassigned { uuid } | Self::Assigned { uuid, .. } => Some(*uuid),
            Self::Opaque(_) => None,
        }
    }

    pub fn is_assigned(&self) -> bool {
        self.object_id().is_some()
    }

    /// The key after the store has assigned `object_id`
    pub fn assign(self, object_id: ObjectId) -> Self {
        match self.uuid() {
            Some(uuid) => Self::Assigned { object_id, uuid },
            None => Self::Opaque(object_id),
        }
    }

    /// Rebuild a key from the two halves stored on a document
    pub fn from_parts(object_id: ObjectId, uuid: Option<Uuid>) -> Self {
        match uuid {
            Some(uuid) => Self::Assigned { object_id, uuid },
            None => Self::Opaque(object_id),
        }
    }
}

impl Default for ObjectKey {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unassigned { uuid } => write!(f, "{}", uuid),
            Self::Opaque(object_id) => write!(f, "{}", object_id.to_hex()),
            Self::Assigned { object_id, uuid } => {
                write!(f, "{}{}{}", object_id.to_hex(), KEY_SEPARATOR, uuid)
            }
        }
    }
}

impl FromStr for ObjectKey {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

fn parse_object_id(segment: &str, id: &str) -> Result<ObjectId, StoreError> {
    if segment.len() != OBJECT_ID_HEX_LEN {
        return Err(StoreError::MalformedIdentifier(format!(
            "{}: object id segment must be {} hex characters",
            id, OBJECT_ID_HEX_LEN
        )));
    }

    let object_id = ObjectId::parse_str(segment)
        .map_err(|e| StoreError::MalformedIdentifier(format!("{}: {}", id, e)))?;

    // The zero id means "unassigned" and is never a real store id
    if object_id.bytes() == [0u8; 12] {
        return Err(StoreError::MalformedIdentifier(format!(
            "{}: object id segment is the reserved zero id",
            id
        )));
    }

    Ok(object_id)
}

fn parse_uuid(segment: &str, id: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(segment).map_err(|e| StoreError::MalformedIdentifier(format!("{}: {}", id, e)))
}
