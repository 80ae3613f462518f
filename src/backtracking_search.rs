//! Depth-first backtracking search over the arc-consistent domains. Variables are ordered by
//! minimum remaining values with degree as the tie-break, and values by how few options they rule
//! out for unassigned crossing slots. The domains themselves are never touched during search; the
//! in-progress state lives entirely in the `Assignment`.

use std::cmp::Reverse;

use bit_set::BitSet;
use instant::{Duration, Instant};

use crate::arc_consistency::{establish_arc_consistency, ArcConsistencyFailure};
use crate::domains::Domains;
use crate::grid_config::{GridConfig, SlotId};
use crate::word_list::WordId;

/// A struct recording a slot assignment made during the filling process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice {
    pub slot_id: SlotId,
    pub word_id: WordId,
}

/// A partial or complete mapping from slots to words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    words: Vec<Option<WordId>>,
    assigned_slot_ids: BitSet,
}

impl Assignment {
    /// An empty assignment for a grid with `slot_count` slots.
    pub fn new(slot_count: usize) -> Assignment {
        Assignment {
            words: vec![None; slot_count],
            assigned_slot_ids: BitSet::with_capacity(slot_count),
        }
    }

    pub fn get(&self, slot_id: SlotId) -> Option<WordId> {
        self.words[slot_id]
    }

    pub fn is_assigned(&self, slot_id: SlotId) -> bool {
        self.assigned_slot_ids.contains(slot_id)
    }

    /// Number of slots that have a word.
    pub fn len(&self) -> usize {
        self.assigned_slot_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned_slot_ids.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.len() == self.words.len()
    }

    pub fn assign(&mut self, slot_id: SlotId, word_id: WordId) {
        self.words[slot_id] = Some(word_id);
        let _ = self.assigned_slot_ids.insert(slot_id);
    }

    pub fn unassign(&mut self, slot_id: SlotId) {
        self.words[slot_id] = None;
        let _ = self.assigned_slot_ids.remove(slot_id);
    }

    /// The assigned slots in ascending slot order.
    pub fn choices(&self) -> impl Iterator<Item = Choice> + '_ {
        self.words
            .iter()
            .enumerate()
            .filter_map(|(slot_id, word_id)| {
                word_id.map(|word_id| Choice { slot_id, word_id })
            })
    }
}

/// A struct tracking statistics about the filling process.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    pub states: u64,
    pub backtracks: u64,
    pub duration: Duration,
}

/// A struct representing the results of a fill operation.
#[derive(Debug)]
pub struct FillSuccess {
    pub statistics: Statistics,
    pub assignment: Assignment,
}

/// Why no fill was found. Either is a normal outcome for an unsatisfiable grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillFailure {
    /// Node or arc consistency left a slot with no options, so search never ran.
    DomainWipeout { slot_id: SlotId },
    /// Search tried every option without finding a fill.
    HardFailure,
}

/// Can `word_id` go in `slot_id` alongside everything already in the assignment? Checks the
/// length, that the word isn't used elsewhere, and that it agrees with every assigned crossing.
pub fn is_consistent_choice(
    config: &GridConfig,
    assignment: &Assignment,
    slot_id: SlotId,
    word_id: WordId,
) -> bool {
    let word = config.word_list.get(word_id);
    let slot_config = &config.slot_configs[slot_id];

    if word.len() != slot_config.length {
        return false;
    }

    let used_elsewhere = assignment
        .choices()
        .any(|choice| choice.slot_id != slot_id && choice.word_id == word_id);
    if used_elsewhere {
        return false;
    }

    slot_config
        .crossings
        .iter()
        .enumerate()
        .all(|(cell_idx, crossing)| {
            let Some(crossing) = crossing else {
                return true;
            };
            match assignment.get(crossing.other_slot_id) {
                Some(other_word_id) => {
                    let other_word = config.word_list.get(other_word_id);
                    word.glyph(cell_idx) == other_word.glyph(crossing.other_slot_cell)
                }
                None => true,
            }
        })
}

/// Is the whole assignment consistent: distinct words, correct lengths, and agreeing letters in
/// every shared cell?
pub fn is_consistent(config: &GridConfig, assignment: &Assignment) -> bool {
    assignment
        .choices()
        .all(|choice| is_consistent_choice(config, assignment, choice.slot_id, choice.word_id))
}

fn unassigned_neighbor_count(
    config: &GridConfig,
    assignment: &Assignment,
    slot_id: SlotId,
) -> usize {
    config
        .neighbors(slot_id)
        .filter(|&neighbor_id| !assignment.is_assigned(neighbor_id))
        .count()
}

/// Choose the unassigned slot with the fewest remaining options, preferring the one crossing the
/// most unassigned slots on a tie. Remaining ties go to the lowest slot id.
pub fn select_unassigned_slot(
    config: &GridConfig,
    domains: &Domains,
    assignment: &Assignment,
) -> Option<SlotId> {
    (0..config.slot_count())
        .filter(|&slot_id| !assignment.is_assigned(slot_id))
        .min_by_key(|&slot_id| {
            (
                domains.len(slot_id),
                Reverse(unassigned_neighbor_count(config, assignment, slot_id)),
            )
        })
}

/// Return the options for `slot_id` ordered so that the word ruling out the fewest options among
/// unassigned crossing slots comes first. A neighbor's option counts as ruled out if it disagrees
/// with the word in the shared cell. Ties keep `WordId` order.
pub fn order_domain_values(
    config: &GridConfig,
    domains: &Domains,
    assignment: &Assignment,
    slot_id: SlotId,
) -> Vec<WordId> {
    let slot_config = &config.slot_configs[slot_id];
    let mut options: Vec<WordId> = domains.options(slot_id).collect();

    options.sort_by_cached_key(|&word_id| {
        let word = config.word_list.get(word_id);

        slot_config
            .crossings
            .iter()
            .enumerate()
            .filter_map(|(cell_idx, crossing)| crossing.as_ref().map(|c| (cell_idx, c)))
            .filter(|(_, crossing)| !assignment.is_assigned(crossing.other_slot_id))
            .map(|(cell_idx, crossing)| {
                domains
                    .options(crossing.other_slot_id)
                    .fold(0, |ruled_out, other_word_id| {
                        let other_glyph =
                            config.word_list.get(other_word_id).glyph(crossing.other_slot_cell);
                        ruled_out + usize::from(other_glyph != word.glyph(cell_idx))
                    })
            })
            .sum::<usize>()
    });

    options
}

fn backtrack(
    config: &GridConfig,
    domains: &Domains,
    assignment: &mut Assignment,
    statistics: &mut Statistics,
) -> bool {
    statistics.states += 1;

    let Some(slot_id) = select_unassigned_slot(config, domains, assignment) else {
        return true;
    };

    for word_id in order_domain_values(config, domains, assignment, slot_id) {
        if !is_consistent_choice(config, assignment, slot_id, word_id) {
            continue;
        }

        assignment.assign(slot_id, word_id);
        debug_assert!(is_consistent(config, assignment));

        if backtrack(config, domains, assignment, statistics) {
            return true;
        }

        assignment.unassign(slot_id);
        statistics.backtracks += 1;
    }

    false
}

/// Extend `assignment` to a complete, consistent fill using only the options in `domains`. The
/// starting assignment is trusted to be consistent.
pub fn backtracking_search(
    config: &GridConfig,
    domains: &Domains,
    mut assignment: Assignment,
) -> Result<FillSuccess, FillFailure> {
    let start = Instant::now();
    let mut statistics = Statistics::default();

    let found = backtrack(config, domains, &mut assignment, &mut statistics);
    statistics.duration = start.elapsed();

    if found {
        log::debug!("Fill found: {statistics:?}");
        Ok(FillSuccess {
            statistics,
            assignment,
        })
    } else {
        log::debug!("Search exhausted: {statistics:?}");
        Err(FillFailure::HardFailure)
    }
}

/// Search for a valid fill for the given grid: enforce node consistency, then arc consistency,
/// then run backtracking search from an empty assignment.
pub fn solve(config: &GridConfig) -> Result<FillSuccess, FillFailure> {
    let start = Instant::now();

    let mut domains = Domains::new(config);
    let _ = domains.enforce_node_consistency(config);

    if let Some(slot_id) = domains.first_empty_slot() {
        log::info!("No words fit slot {:?}", config.slot_configs[slot_id].key());
        return Err(FillFailure::DomainWipeout { slot_id });
    }

    if let Err(ArcConsistencyFailure { slot_id }) =
        establish_arc_consistency(config, &mut domains, None)
    {
        log::info!("Crossings leave no words for slot {:?}", config.slot_configs[slot_id].key());
        return Err(FillFailure::DomainWipeout { slot_id });
    }

    let mut result = backtracking_search(config, &domains, Assignment::new(config.slot_count()))?;
    result.statistics.duration = start.elapsed();

    log::info!(
        "Filled {} slots in {:?} ({} states, {} backtracks)",
        config.slot_count(),
        result.statistics.duration,
        result.statistics.states,
        result.statistics.backtracks
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use crate::backtracking_search::{
        backtracking_search, is_consistent, order_domain_values, select_unassigned_slot, solve,
        Assignment, FillFailure,
    };
    use crate::domains::Domains;
    use crate::grid_config::{generate_grid_config_from_template_string, Direction, GridConfig};
    use crate::render::render_grid;
    use crate::word_list::WordList;

    fn generate_config(words: &[&str], template: &str) -> GridConfig {
        generate_grid_config_from_template_string(WordList::new(words), template)
            .expect("valid template")
    }

    fn word_at(grid_config: &GridConfig, assignment: &Assignment, slot_id: usize) -> String {
        let word_id = assignment.get(slot_id).expect("slot should be assigned");
        grid_config.word_list.get(word_id).string.clone()
    }

    fn assert_valid_fill(grid_config: &GridConfig, assignment: &Assignment) {
        assert!(assignment.is_complete());
        assert!(is_consistent(grid_config, assignment));

        for slot_config in &grid_config.slot_configs {
            let word = word_at(grid_config, assignment, slot_config.id);
            assert_eq!(word.chars().count(), slot_config.length);

            for other_slot_id in grid_config.neighbors(slot_config.id) {
                let (cell, other_cell) = grid_config
                    .overlap(slot_config.id, other_slot_id)
                    .expect("neighbors overlap");
                let other_word = word_at(grid_config, assignment, other_slot_id);
                assert_eq!(word.chars().nth(cell), other_word.chars().nth(other_cell));
            }
        }

        let mut words: Vec<String> = assignment
            .choices()
            .map(|choice| grid_config.word_list.get(choice.word_id).string.clone())
            .collect();
        let total = words.len();
        words.sort();
        words.dedup();
        assert_eq!(words.len(), total, "words must be distinct");
    }

    /// ___
    /// #_#
    /// #_#
    #[test]
    fn test_find_fill_for_two_crossing_slots() {
        let grid_config = generate_config(
            &["CAT", "DOG", "ACT"],
            "
            ___
            #_#
            #_#
            ",
        );

        let result = solve(&grid_config).expect("Failed to find a fill");
        assert_valid_fill(&grid_config, &result.assignment);

        let across = word_at(&grid_config, &result.assignment, 0);
        let down = word_at(&grid_config, &result.assignment, 1);
        assert_eq!(across.chars().nth(1), down.chars().nth(0));

        let mut pair = vec![across, down];
        pair.sort();
        assert_eq!(pair, vec!["ACT", "CAT"]);

        println!("{:?}", result.statistics);
        println!("{}", render_grid(&grid_config, &result.assignment));
    }

    /// _____
    /// _#_#_
    /// _____
    #[test]
    fn test_find_fill_with_unique_solution() {
        let grid_config = generate_config(
            &[
                "CAT", "SUN", "APPLE", "DOG", "TIGER", "BASES", "TIMER", "BAT", "SUM", "SIR",
            ],
            "
            _____
            _#_#_
            _____
            ",
        );

        let result = solve(&grid_config).expect("Failed to find a fill");
        assert_valid_fill(&grid_config, &result.assignment);

        let expected = [
            ((0, 0), Direction::Across, "BASES"),
            ((2, 0), Direction::Across, "TIMER"),
            ((0, 0), Direction::Down, "BAT"),
            ((0, 2), Direction::Down, "SUM"),
            ((0, 4), Direction::Down, "SIR"),
        ];
        for (start_cell, direction, word) in expected {
            let slot_id = grid_config.slot_at(start_cell, direction).expect("slot exists");
            assert_eq!(word_at(&grid_config, &result.assignment, slot_id), word);
        }
    }

    #[test]
    fn test_fill_fails_without_matching_lengths() {
        let grid_config = generate_config(
            &["CAT", "DOG", "HI"],
            "
            ____
            _###
            _###
            ",
        );

        assert_eq!(solve(&grid_config).unwrap_err(), FillFailure::DomainWipeout { slot_id: 0 });
    }

    #[test]
    fn test_fill_fails_when_crossings_cannot_agree() {
        let grid_config = generate_config(
            &["CAT", "DOG"],
            "
            ___
            #_#
            #_#
            ",
        );

        assert_eq!(solve(&grid_config).unwrap_err(), FillFailure::DomainWipeout { slot_id: 0 });
    }

    #[test]
    fn test_non_crossing_slots_accept_any_distinct_pairing() {
        let grid_config = generate_config(&["CAT", "DOG", "HI", "OK"], "___#__#___");

        let result = solve(&grid_config).expect("Failed to find a fill");
        assert_valid_fill(&grid_config, &result.assignment);
        assert_eq!(result.statistics.backtracks, 0);
    }

    #[test]
    fn test_words_must_be_distinct() {
        // Arc consistency has nothing to prune here, so it's search that has to reject reusing
        // the only word.
        let grid_config = generate_config(&["CAT"], "___#___");

        assert_eq!(solve(&grid_config).unwrap_err(), FillFailure::HardFailure);
    }

    /// __
    /// __
    #[test]
    fn test_fill_fails_gracefully() {
        // Every crossing is satisfiable on its own, but filling the square needs four words.
        let grid_config = generate_config(&["AA", "AB", "BA"], "__\n__");

        let result = solve(&grid_config);

        assert_eq!(result.unwrap_err(), FillFailure::HardFailure);
    }

    /// ___
    /// _#_
    /// ___
    #[test]
    fn test_find_fill_for_ring() {
        let grid_config = generate_config(
            &["BAT", "BIT", "TON", "TEN", "XYZ", "ZOO", "NOT", "TAN"],
            "
            ___
            _#_
            ___
            ",
        );

        let result = solve(&grid_config).expect("Failed to find a fill");
        assert_valid_fill(&grid_config, &result.assignment);
    }

    #[test]
    fn test_search_extends_partial_assignment() {
        let grid_config = generate_config(
            &["CAT", "DOG", "ACT"],
            "
            ___
            #_#
            #_#
            ",
        );
        let mut domains = Domains::new(&grid_config);
        let _ = domains.enforce_node_consistency(&grid_config);

        let act = grid_config
            .word_list
            .words
            .iter()
            .position(|word| word.string == "ACT")
            .expect("word exists");
        let mut assignment = Assignment::new(grid_config.slot_count());
        assignment.assign(0, act);

        let result =
            backtracking_search(&grid_config, &domains, assignment).expect("Failed to find a fill");

        assert_eq!(word_at(&grid_config, &result.assignment, 0), "ACT");
        assert_eq!(word_at(&grid_config, &result.assignment, 1), "CAT");
    }

    #[test]
    fn test_select_unassigned_slot_prefers_fewest_options_then_degree() {
        let grid_config = generate_config(
            &["BAT", "BIT", "TON"],
            "
            ____
            _#__
            ____
            ",
        );
        let mut domains = Domains::new(&grid_config);
        let _ = domains.enforce_node_consistency(&grid_config);
        let assignment = Assignment::new(grid_config.slot_count());

        // Only the downs have options, so an across comes first. The top across crosses more
        // slots than the short one in row 1 and beats the bottom across on id.
        assert_eq!(select_unassigned_slot(&grid_config, &domains, &assignment), Some(0));

        let grid_config = generate_config(
            &["BAT", "BIT", "TON"],
            "
            ___
            _##
            ___
            ",
        );
        let mut domains = Domains::new(&grid_config);
        let _ = domains.enforce_node_consistency(&grid_config);
        let mut assignment = Assignment::new(grid_config.slot_count());

        // Slots: 0 top across, 1 bottom across, 2 the down crossing both. Domain sizes are equal,
        // so the down wins on degree.
        assert_eq!(select_unassigned_slot(&grid_config, &domains, &assignment), Some(2));
        assignment.assign(2, 0);
        assert_eq!(select_unassigned_slot(&grid_config, &domains, &assignment), Some(0));
    }

    #[test]
    fn test_order_domain_values_puts_least_constraining_first() {
        let grid_config = generate_config(
            &["TAX", "CAR", "AXE", "ARK", "ASH"],
            "
            ___
            _##
            _##
            ",
        );
        let mut domains = Domains::new(&grid_config);
        let _ = domains.enforce_node_consistency(&grid_config);
        let assignment = Assignment::new(grid_config.slot_count());

        let ordered: Vec<String> = order_domain_values(&grid_config, &domains, &assignment, 0)
            .into_iter()
            .map(|word_id| grid_config.word_list.get(word_id).string.clone())
            .collect();

        // Across and down share their first cell. Three options start with A, so the A-words only
        // rule out two options each, while TAX and CAR rule out four.
        assert_eq!(ordered, vec!["AXE", "ARK", "ASH", "TAX", "CAR"]);
    }

    #[test]
    fn test_order_domain_values_with_many_crossing_options() {
        let words: Vec<String> = ('A'..='Z')
            .map(|glyph| format!("A{glyph}"))
            .chain(('A'..='N').map(|glyph| format!("B{glyph}")))
            .collect();
        let words: Vec<&str> = words.iter().map(String::as_str).collect();
        let grid_config = generate_config(
            &words,
            "
            __
            _#
            ",
        );
        let mut domains = Domains::new(&grid_config);
        let _ = domains.enforce_node_consistency(&grid_config);
        let assignment = Assignment::new(grid_config.slot_count());

        let ordered: Vec<String> = order_domain_values(&grid_config, &domains, &assignment, 0)
            .into_iter()
            .map(|word_id| grid_config.word_list.get(word_id).string.clone())
            .collect();

        // The crossing slot has 40 options spread over two blocks of its bit set. Each A-word
        // rules out the 14 B-words and each B-word rules out the 26 A-words.
        assert_eq!(ordered.len(), 40);
        assert!(ordered[..26].iter().all(|word| word.starts_with('A')));
        assert!(ordered[26..].iter().all(|word| word.starts_with('B')));
        assert_eq!(ordered[0], "AA");
        assert_eq!(ordered[26], "BA");
    }
}
