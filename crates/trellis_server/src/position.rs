//! Conversion from relative to absolute sibling positions.
//!
//! Clients order siblings by naming a predecessor; the server stores a
//! sparse integer key instead. New keys are placed past the ends with a
//! large gap, or interpolated between two neighbours, so existing siblings
//! are never renumbered. Interpolation is biased toward the predecessor;
//! once two neighbours are closer than eight apart the interpolated key
//! collides with the predecessor. That precision loss is accepted.

use trellis_protocol::SyncEntity;

/// Distance kept when extending past the first or last sibling.
pub const POSITION_GAP: i64 = 1 << 20;

/// Position of the first child placed in an empty folder.
pub const FIRST_POSITION: i64 = 0;

/// Where a committed entity should go among its siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predecessor<'a> {
    /// After the last sibling.
    Last,
    /// Before the first sibling.
    First,
    /// Immediately after the named sibling.
    After(&'a str),
}

impl<'a> Predecessor<'a> {
    /// Interprets an entity's `insert_after_item_id` field.
    ///
    /// An absent field appends, an empty one inserts first, and naming the
    /// entity itself is treated as absent.
    pub fn for_entity(entity: &'a SyncEntity) -> Self {
        match entity.insert_after_item_id.as_deref() {
            None => Predecessor::Last,
            Some("") => Predecessor::First,
            Some(id) if id == entity.id_string => Predecessor::Last,
            Some(id) => Predecessor::After(id),
        }
    }
}

/// Computes the absolute position for `entity_id` among `siblings`.
///
/// `siblings` are the live children of the target parent, in any order;
/// they may include the entity itself when it is being moved within the
/// same folder. A predecessor that is not among them appends.
pub fn place<'s>(
    siblings: impl IntoIterator<Item = &'s SyncEntity>,
    entity_id: &str,
    predecessor: Predecessor<'_>,
) -> i64 {
    let mut siblings: Vec<&SyncEntity> = siblings.into_iter().collect();
    siblings.sort_by(|a, b| {
        a.position_in_parent
            .cmp(&b.position_in_parent)
            .then_with(|| a.id_string.cmp(&b.id_string))
    });

    let (Some(&first), Some(&last)) = (siblings.first(), siblings.last()) else {
        return FIRST_POSITION;
    };

    let extend = |limit: &SyncEntity, direction: i64| {
        if limit.id_string == entity_id {
            limit.position_in_parent
        } else {
            limit
                .position_in_parent
                .saturating_add(direction * POSITION_GAP)
        }
    };

    match predecessor {
        Predecessor::First => extend(first, -1),
        Predecessor::Last => extend(last, 1),
        Predecessor::After(prev_id) => {
            for pair in siblings.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                if a.id_string != prev_id {
                    continue;
                }
                if b.id_string == entity_id {
                    return b.position_in_parent;
                }
                return interpolate(a.position_in_parent, b.position_in_parent);
            }
            extend(last, 1)
        }
    }
}

/// `floor((7a + b) / 8)`, without overflow.
fn interpolate(a: i64, b: i64) -> i64 {
    let value = (7 * i128::from(a) + i128::from(b)).div_euclid(8);
    // Always within [a, b], so it fits back into i64.
    i64::try_from(value).unwrap_or(a)
}
