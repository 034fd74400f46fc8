//! Data types and type-tagged entity payloads.
//!
//! On the wire an entity payload is a map of *slots* keyed by data type.
//! A stored entity carries at most one slot; the GetUpdates filter may
//! carry any number of them. [`EntitySpecifics`] enforces the former when
//! it is built, so an entity that made it through decoding always has a
//! well-defined type.

use crate::error::{ProtocolError, ProtocolResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// The kinds of data that can be synced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// The type of the top-level container. Has no payload slot.
    TopLevel,
    /// Form autofill entries.
    Autofill,
    /// Bookmarks and bookmark folders.
    Bookmark,
    /// Installed extensions.
    Extension,
    /// Encryption key material.
    Nigori,
    /// Saved passwords.
    Password,
    /// Preferences.
    Preference,
    /// Themes.
    Theme,
    /// Typed URLs.
    TypedUrl,
}

impl DataType {
    /// Every data type, in declaration order.
    pub const ALL: [DataType; 9] = [
        DataType::TopLevel,
        DataType::Autofill,
        DataType::Bookmark,
        DataType::Extension,
        DataType::Nigori,
        DataType::Password,
        DataType::Preference,
        DataType::Theme,
        DataType::TypedUrl,
    ];

    /// Returns true if entities of this type carry a payload slot.
    pub fn has_payload(self) -> bool {
        !matches!(self, DataType::TopLevel)
    }
}

/// Payload slots keyed by data type, as they appear on the wire.
pub type PayloadSlots = BTreeMap<DataType, Vec<u8>>;

/// Capability to list the recognized data-type tags present on a payload.
pub trait TypeTags {
    /// Returns every recognized tag, in [`DataType`] order.
    fn type_tags(&self) -> Vec<DataType>;

    /// Returns the single tag, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::MultipleTypeTags`] if more than one tag is
    /// present.
    fn single_type_tag(&self) -> ProtocolResult<Option<DataType>> {
        let mut tags = self.type_tags();
        match tags.len() {
            0 => Ok(None),
            1 => Ok(tags.pop()),
            _ => Err(ProtocolError::MultipleTypeTags { found: tags }),
        }
    }
}

impl TypeTags for PayloadSlots {
    fn type_tags(&self) -> Vec<DataType> {
        self.keys().copied().collect()
    }
}

/// The type-tagged payload of a single entity.
///
/// The payload bytes are opaque to the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PayloadSlots", into = "PayloadSlots")]
pub enum EntitySpecifics {
    /// No payload. Tombstones and the top-level container are untyped.
    #[default]
    Untyped,
    /// A payload in exactly one slot.
    Typed {
        /// The slot's data type. Never [`DataType::TopLevel`].
        data_type: DataType,
        /// Opaque payload bytes.
        payload: Vec<u8>,
    },
}

impl EntitySpecifics {
    /// Creates a typed payload.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::PayloadlessType`] for [`DataType::TopLevel`].
    pub fn typed(data_type: DataType, payload: Vec<u8>) -> ProtocolResult<Self> {
        if !data_type.has_payload() {
            return Err(ProtocolError::PayloadlessType(data_type));
        }
        Ok(Self::Typed { data_type, payload })
    }

    /// Returns the default (empty) payload for a data type.
    pub fn default_for(data_type: DataType) -> Self {
        if data_type.has_payload() {
            Self::Typed {
                data_type,
                payload: Vec::new(),
            }
        } else {
            Self::Untyped
        }
    }

    /// Returns the payload's data type, if it has one.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Self::Untyped => None,
            Self::Typed { data_type, .. } => Some(*data_type),
        }
    }

    /// Returns true when there is no payload.
    pub fn is_untyped(&self) -> bool {
        matches!(self, Self::Untyped)
    }

    /// Returns the payload bytes, if any.
    pub fn payload(&self) -> Option<&[u8]> {
        match self {
            Self::Untyped => None,
            Self::Typed { payload, .. } => Some(payload),
        }
    }
}

impl TypeTags for EntitySpecifics {
    fn type_tags(&self) -> Vec<DataType> {
        self.data_type().into_iter().collect()
    }
}

impl TryFrom<PayloadSlots> for EntitySpecifics {
    type Error = ProtocolError;

    fn try_from(slots: PayloadSlots) -> ProtocolResult<Self> {
        if slots.contains_key(&DataType::TopLevel) {
            return Err(ProtocolError::PayloadlessType(DataType::TopLevel));
        }
        match slots.single_type_tag()? {
            None => Ok(Self::Untyped),
            Some(data_type) => {
                let payload = slots.into_values().next().unwrap_or_default();
                Ok(Self::Typed { data_type, payload })
            }
        }
    }
}

impl From<EntitySpecifics> for PayloadSlots {
    fn from(specifics: EntitySpecifics) -> Self {
        match specifics {
            EntitySpecifics::Untyped => PayloadSlots::new(),
            EntitySpecifics::Typed { data_type, payload } => {
                PayloadSlots::from([(data_type, payload)])
            }
        }
    }
}

/// The "requested types" filter of a GetUpdates request.
///
/// Each present slot requests one data type; slot contents are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeFilter(PayloadSlots);

impl TypeFilter {
    /// Creates a filter requesting the given types.
    pub fn of(types: impl IntoIterator<Item = DataType>) -> Self {
        Self(types.into_iter().map(|t| (t, Vec::new())).collect())
    }

    /// Returns the set of requested types.
    ///
    /// The top-level type is implied whenever anything is requested, so the
    /// shared root container is always delivered alongside typed data.
    pub fn requested_types(&self) -> BTreeSet<DataType> {
        let mut types: BTreeSet<DataType> = self.0.type_tags().into_iter().collect();
        if !types.is_empty() {
            types.insert(DataType::TopLevel);
        }
        types
    }
}

impl TypeTags for TypeFilter {
    fn type_tags(&self) -> Vec<DataType> {
        self.0.type_tags()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn default_payloads() {
        assert_eq!(
            EntitySpecifics::default_for(DataType::TopLevel),
            EntitySpecifics::Untyped
        );
        let bookmark = EntitySpecifics::default_for(DataType::Bookmark);
        assert_eq!(bookmark.data_type(), Some(DataType::Bookmark));
        assert_eq!(bookmark.payload(), Some(&[][..]));
    }

    #[test]
    fn top_level_has_no_slot() {
        assert_eq!(
            EntitySpecifics::typed(DataType::TopLevel, vec![1]),
            Err(ProtocolError::PayloadlessType(DataType::TopLevel))
        );
        let slots = PayloadSlots::from([(DataType::TopLevel, vec![])]);
        assert!(EntitySpecifics::try_from(slots).is_err());
    }

    #[test]
    fn two_slots_are_malformed() {
        let slots = PayloadSlots::from([
            (DataType::Bookmark, vec![1]),
            (DataType::Theme, vec![2]),
        ]);
        assert_eq!(
            EntitySpecifics::try_from(slots),
            Err(ProtocolError::MultipleTypeTags {
                found: vec![DataType::Bookmark, DataType::Theme],
            })
        );
    }

    #[test]
    fn single_slot_keeps_payload() {
        let slots = PayloadSlots::from([(DataType::Password, vec![7, 8])]);
        let specifics = EntitySpecifics::try_from(slots).unwrap();
        assert_eq!(specifics.data_type(), Some(DataType::Password));
        assert_eq!(specifics.payload(), Some(&[7, 8][..]));
        assert_eq!(specifics.single_type_tag(), Ok(Some(DataType::Password)));
    }

    #[test]
    fn requested_types_imply_top_level() {
        assert!(TypeFilter::default().requested_types().is_empty());

        let types = TypeFilter::of([DataType::Bookmark]).requested_types();
        assert_eq!(
            types.into_iter().collect::<Vec<_>>(),
            vec![DataType::TopLevel, DataType::Bookmark]
        );
    }

    #[test]
    fn specifics_json_shape() {
        let specifics = EntitySpecifics::typed(DataType::TypedUrl, vec![3]).unwrap();
        let json = serde_json::to_string(&specifics).unwrap();
        assert_eq!(json, r#"{"typed_url":[3]}"#);

        let back: EntitySpecifics = serde_json::from_str(&json).unwrap();
        assert_eq!(back, specifics);

        let err = serde_json::from_str::<EntitySpecifics>(r#"{"theme":[],"nigori":[]}"#);
        assert!(err.is_err());
    }

    proptest! {
        #[test]
        fn slot_count_decides_validity(
            types in prop::collection::btree_set(1usize..DataType::ALL.len(), 0..5)
        ) {
            let slots: PayloadSlots = types
                .iter()
                .map(|&i| (DataType::ALL[i], vec![i as u8]))
                .collect();
            let result = EntitySpecifics::try_from(slots);
            prop_assert_eq!(result.is_ok(), types.len() <= 1);
        }
    }
}
