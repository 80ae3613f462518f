use std::fmt::{Debug, Formatter};

use bit_set::BitSet;

use crate::grid_config::{GridConfig, SlotId};
use crate::word_list::WordId;

/// The candidate words for each slot, as bit sets over `WordId`s. Domains start out holding the
/// whole word list and only ever shrink.
#[derive(Clone, PartialEq, Eq)]
pub struct Domains {
    options_by_slot: Vec<BitSet>,
}

impl Debug for Domains {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.options_by_slot.iter().map(BitSet::len))
            .finish()
    }
}

/// Iterator over the options of one slot. `bit_set::Iter` under-reports its upper size bound once
/// it has loaded a block, which adapters like `Filter::count` rely on, so no hint is forwarded.
pub struct Options<'a> {
    inner: bit_set::Iter<'a, u32>,
}

impl Iterator for Options<'_> {
    type Item = WordId;

    fn next(&mut self) -> Option<WordId> {
        self.inner.next()
    }
}

impl Domains {
    /// Give every slot in the grid every word in the word list.
    pub fn new(config: &GridConfig) -> Domains {
        let word_count = config.word_list.len();

        Domains {
            options_by_slot: config
                .slot_configs
                .iter()
                .map(|_| {
                    let mut options = BitSet::with_capacity(word_count);
                    for word_id in 0..word_count {
                        let _ = options.insert(word_id);
                    }
                    options
                })
                .collect(),
        }
    }

    pub fn len(&self, slot_id: SlotId) -> usize {
        self.options_by_slot[slot_id].len()
    }

    pub fn is_empty(&self, slot_id: SlotId) -> bool {
        self.options_by_slot[slot_id].is_empty()
    }

    /// The remaining options for a slot, in ascending `WordId` order.
    pub fn options(&self, slot_id: SlotId) -> Options<'_> {
        Options {
            inner: self.options_by_slot[slot_id].iter(),
        }
    }

    /// Remove a word from a slot's domain, returning whether it was present.
    pub fn remove(&mut self, slot_id: SlotId, word_id: WordId) -> bool {
        self.options_by_slot[slot_id].remove(word_id)
    }

    /// The first slot whose domain has been wiped out, if any.
    pub fn first_empty_slot(&self) -> Option<SlotId> {
        self.options_by_slot.iter().position(BitSet::is_empty)
    }

    /// Remove every option whose length differs from its slot's length, returning how many options
    /// were removed in total. Running this again is a no-op.
    pub fn enforce_node_consistency(&mut self, config: &GridConfig) -> usize {
        let mut removed = 0;

        for slot_config in &config.slot_configs {
            let options = &mut self.options_by_slot[slot_config.id];
            let mismatched: Vec<WordId> = options
                .iter()
                .filter(|&word_id| config.word_list.get(word_id).len() != slot_config.length)
                .collect();

            for word_id in mismatched {
                let _ = options.remove(word_id);
                removed += 1;
            }
        }

        log::debug!("Node consistency removed {removed} options");

        removed
    }
}
