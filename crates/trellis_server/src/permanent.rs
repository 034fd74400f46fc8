//! Server-created permanent items.

use trellis_protocol::{DataType, ROOT_ID, TOP_LEVEL_TAG};

/// One server-created container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermanentItem {
    /// Tag known to clients; determines the item's id.
    pub tag: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Tag of the parent permanent item, or [`ROOT_ID`].
    pub parent_tag: &'static str,
    /// GetUpdates requests for this type cause the item to be created.
    pub data_type: DataType,
}

impl PermanentItem {
    const fn new(
        tag: &'static str,
        name: &'static str,
        parent_tag: &'static str,
        data_type: DataType,
    ) -> Self {
        Self {
            tag,
            name,
            parent_tag,
            data_type,
        }
    }
}

/// Every permanent item, parents before children.
pub const PERMANENT_ITEMS: &[PermanentItem] = &[
    PermanentItem::new(TOP_LEVEL_TAG, "Top Level", ROOT_ID, DataType::TopLevel),
    PermanentItem::new("bookmarks", "Bookmarks", TOP_LEVEL_TAG, DataType::Bookmark),
    PermanentItem::new("bookmark_bar", "Bookmark Bar", "bookmarks", DataType::Bookmark),
    PermanentItem::new("other_bookmarks", "Other Bookmarks", "bookmarks", DataType::Bookmark),
    PermanentItem::new("preferences", "Preferences", TOP_LEVEL_TAG, DataType::Preference),
    PermanentItem::new("autofill", "Autofill", TOP_LEVEL_TAG, DataType::Autofill),
    PermanentItem::new("extensions", "Extensions", TOP_LEVEL_TAG, DataType::Extension),
    PermanentItem::new("passwords", "Passwords", TOP_LEVEL_TAG, DataType::Password),
    PermanentItem::new("themes", "Themes", TOP_LEVEL_TAG, DataType::Theme),
    PermanentItem::new("typed_urls", "Typed URLs", TOP_LEVEL_TAG, DataType::TypedUrl),
    PermanentItem::new("nigori", "Nigori", TOP_LEVEL_TAG, DataType::Nigori),
];
