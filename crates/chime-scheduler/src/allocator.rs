//! Intent ID allocation: lowest non-negative integer not currently in use.

use chime_core::types::IntentId;
use std::collections::BTreeSet;

/// Lowest intent ID absent from `live`.
///
/// Callers must hold the scheduler lock from reading `live` until the
/// returned ID has been inserted, otherwise two schedules can claim it.
pub fn allocate(live: &BTreeSet<IntentId>) -> IntentId {
    let mut candidate = 0u32;
    for id in live {
        // Sorted ascending, so the first gap is the answer.
        if id.get() != candidate {
            break;
        }
        candidate += 1;
    }
    let id = IntentId(candidate);
    tracing::debug!("Found unique intent id {id}");
    id
}
