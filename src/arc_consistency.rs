//! AC-3 over the crossing constraints of a grid. A pair of slots `(x, y)` is arc-consistent when
//! every option left for `x` has at least one option for `y` that puts the same letter in their
//! shared cell.

use std::collections::{HashSet, VecDeque};

use crate::domains::Domains;
use crate::grid_config::{GridConfig, SlotId};
use crate::word_list::WordId;

/// Work list of arcs still to be revised. An arc is never queued twice at the same time.
#[derive(Debug)]
struct ConsistencyQueue {
    queue: VecDeque<(SlotId, SlotId)>,
    queued: HashSet<(SlotId, SlotId)>,
}

impl ConsistencyQueue {
    fn with_initial_queue<Items>(items: Items) -> ConsistencyQueue
    where
        Items: IntoIterator<Item = (SlotId, SlotId)>,
    {
        let mut queue = ConsistencyQueue {
            queue: VecDeque::new(),
            queued: HashSet::new(),
        };
        for arc in items {
            queue.enqueue(arc);
        }
        queue
    }

    fn pop_front(&mut self) -> Option<(SlotId, SlotId)> {
        let arc = self.queue.pop_front()?;
        let _ = self.queued.remove(&arc);
        Some(arc)
    }

    fn enqueue(&mut self, arc: (SlotId, SlotId)) {
        if self.queued.insert(arc) {
            self.queue.push_back(arc);
        }
    }
}

/// Results from a call to `establish_arc_consistency`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArcConsistencySuccess {
    /// How many arcs were popped off the queue.
    pub revisions: usize,
    /// How many options were removed across all slots.
    pub eliminations: usize,
}

/// Returned when propagation empties a slot's domain, meaning the grid has no fill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArcConsistencyFailure {
    pub slot_id: SlotId,
}

pub type ArcConsistencyResult = Result<ArcConsistencySuccess, ArcConsistencyFailure>;

/// Make `slot_id` arc-consistent with `other_slot_id` by removing every option for `slot_id` whose
/// letter at the shared cell doesn't appear at that cell in any of `other_slot_id`'s options.
/// Returns the number of options removed; slots that don't cross are left alone.
pub fn revise(
    config: &GridConfig,
    domains: &mut Domains,
    slot_id: SlotId,
    other_slot_id: SlotId,
) -> usize {
    let Some((cell_idx, other_cell_idx)) = config.overlap(slot_id, other_slot_id) else {
        return 0;
    };

    // Which letters can the crossing slot still place in the shared cell?
    let supported_glyphs: HashSet<char> = domains
        .options(other_slot_id)
        .filter_map(|word_id| config.word_list.get(word_id).glyph(other_cell_idx))
        .collect();

    let unsupported: Vec<WordId> = domains
        .options(slot_id)
        .filter(|&word_id| {
            config
                .word_list
                .get(word_id)
                .glyph(cell_idx)
                .map_or(true, |glyph| !supported_glyphs.contains(&glyph))
        })
        .collect();

    for &word_id in &unsupported {
        let _ = domains.remove(slot_id, word_id);
    }

    unsupported.len()
}

/// Run AC-3 to quiescence. If `arcs` is `None` we start from every ordered pair of crossing slots;
/// otherwise only the given arcs are queued initially. Whenever a slot loses options, every arc
/// pointing into it (other than from the slot that caused the loss) is queued again.
///
/// Domains only ever shrink. On failure the domains are left in whatever state propagation had
/// reached when the wipeout happened.
pub fn establish_arc_consistency(
    config: &GridConfig,
    domains: &mut Domains,
    arcs: Option<&[(SlotId, SlotId)]>,
) -> ArcConsistencyResult {
    let mut queue = match arcs {
        Some(arcs) => ConsistencyQueue::with_initial_queue(arcs.iter().copied()),
        None => ConsistencyQueue::with_initial_queue(config.arcs()),
    };

    let mut success = ArcConsistencySuccess {
        revisions: 0,
        eliminations: 0,
    };

    while let Some((slot_id, other_slot_id)) = queue.pop_front() {
        success.revisions += 1;

        let removed = revise(config, domains, slot_id, other_slot_id);
        if removed == 0 {
            continue;
        }
        success.eliminations += removed;

        if domains.is_empty(slot_id) {
            log::debug!(
                "Arc consistency wiped out slot {slot_id} after {} revisions",
                success.revisions
            );
            return Err(ArcConsistencyFailure { slot_id });
        }

        for neighbor_id in config.neighbors(slot_id) {
            if neighbor_id != other_slot_id {
                queue.enqueue((neighbor_id, slot_id));
            }
        }
    }

    log::debug!(
        "Arc consistency reached after {} revisions, {} options eliminated",
        success.revisions,
        success.eliminations
    );

    Ok(success)
}
