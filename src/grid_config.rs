use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::fs;
use std::path::Path;

use smallvec::SmallVec;

use crate::error::{CrosswordError, CrosswordResult};
use crate::word_list::WordList;
use crate::MAX_SLOT_LENGTH;

/// An identifier for a given slot, based on its index in the GridConfig's `slot_configs` field.
pub type SlotId = usize;

/// Zero-indexed row and column for a cell in the grid, where row 0 is the top row.
pub type GridCoord = (usize, usize);

/// The pair of cell indices at which two slots intersect: the first index is within the slot the
/// overlap was looked up from, the second within the other slot.
pub type Overlap = (usize, usize);

/// Direction that a slot is facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Across,
    Down,
}

/// Value identity of a slot. Two slots starting in the same cell are still distinct because their
/// directions differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotKey {
    pub row: usize,
    pub col: usize,
    pub direction: Direction,
    pub length: usize,
}

/// The cell layout of a puzzle, with `true` marking cells that letters go in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Structure {
    pub width: usize,
    pub height: usize,
    cells: Vec<Vec<bool>>,
}

impl Structure {
    /// Parse a structure from text, with `#` representing blocks and `_` or `.` representing
    /// open cells. Every line up to the last non-blank one is a row, so a blank line inside the
    /// structure is a row with no cells and stray whitespace is an invalid cell.
    pub fn parse(template: &str) -> CrosswordResult<Structure> {
        let mut lines: Vec<&str> = template
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .collect();
        while lines.last().is_some_and(|line| line.trim().is_empty()) {
            let _ = lines.pop();
        }

        let mut cells: Vec<Vec<bool>> = vec![];

        for line in lines {
            let row = cells.len();
            let parsed_row = line
                .chars()
                .enumerate()
                .map(|(col, character)| match character {
                    '#' => Ok(false),
                    '_' | '.' => Ok(true),
                    _ => Err(CrosswordError::InvalidCell { row, col, character }),
                })
                .collect::<CrosswordResult<Vec<bool>>>()?;

            if let Some(first_row) = cells.first() {
                if first_row.len() != parsed_row.len() {
                    return Err(CrosswordError::RaggedStructure {
                        row,
                        expected: first_row.len(),
                        actual: parsed_row.len(),
                    });
                }
            }

            cells.push(parsed_row);
        }

        let width = cells.first().map(Vec::len).ok_or(CrosswordError::EmptyStructure)?;

        Ok(Structure {
            width,
            height: cells.len(),
            cells,
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> CrosswordResult<Structure> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|err| CrosswordError::read(path, err))?;

        Structure::parse(&contents)
    }

    /// Is the cell at the given coords open? Out-of-bounds coords count as blocked.
    pub fn is_open(&self, (row, col): GridCoord) -> bool {
        self.cells
            .get(row)
            .and_then(|cells| cells.get(col))
            .copied()
            .unwrap_or(false)
    }
}

/// A struct representing a crossing between one slot and another, referencing the other slot's id
/// and the location of the intersection within the other slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crossing {
    pub other_slot_id: SlotId,
    pub other_slot_cell: usize,
}

/// A struct representing the aspects of a slot in the grid that are static during filling.
#[derive(Clone)]
pub struct SlotConfig {
    pub id: SlotId,
    pub start_cell: GridCoord,
    pub direction: Direction,
    pub length: usize,
    pub crossings: SmallVec<[Option<Crossing>; MAX_SLOT_LENGTH]>,
}

impl Debug for SlotConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotConfig")
            .field("id", &self.id)
            .field("start_cell", &self.start_cell)
            .field("direction", &self.direction)
            .field("length", &self.length)
            .field("crossings", &self.crossings)
            .finish()
    }
}

impl SlotConfig {
    pub fn key(&self) -> SlotKey {
        SlotKey {
            row: self.start_cell.0,
            col: self.start_cell.1,
            direction: self.direction,
            length: self.length,
        }
    }

    /// Generate the coords for each cell of this slot.
    pub fn cell_coords(&self) -> Vec<GridCoord> {
        (0..self.length)
            .map(|cell_idx| self.cell_coord(cell_idx))
            .collect()
    }

    pub fn cell_coord(&self, cell_idx: usize) -> GridCoord {
        let (row, col) = self.start_cell;
        match self.direction {
            Direction::Across => (row, col + cell_idx),
            Direction::Down => (row + cell_idx, col),
        }
    }
}

/// A struct representing the aspects of a grid that are static during filling.
pub struct GridConfig {
    pub structure: Structure,
    pub word_list: WordList,
    pub slot_configs: Vec<SlotConfig>,
}

impl Debug for GridConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridConfig")
            .field("width", &self.structure.width)
            .field("height", &self.structure.height)
            .field("slot_configs", &self.slot_configs)
            .field("words", &format!("({} entries)", self.word_list.len()))
            .finish()
    }
}

impl GridConfig {
    pub fn slot_count(&self) -> usize {
        self.slot_configs.len()
    }

    /// Find the slot with the given start cell and direction, whatever its length.
    pub fn slot_at(&self, start_cell: GridCoord, direction: Direction) -> Option<SlotId> {
        self.slot_configs
            .iter()
            .find(|slot_config| {
                slot_config.start_cell == start_cell && slot_config.direction == direction
            })
            .map(|slot_config| slot_config.id)
    }

    /// The cell indices at which `slot_id` and `other_slot_id` intersect, if they do.
    pub fn overlap(&self, slot_id: SlotId, other_slot_id: SlotId) -> Option<Overlap> {
        if slot_id == other_slot_id {
            return None;
        }

        self.slot_configs[slot_id]
            .crossings
            .iter()
            .enumerate()
            .find_map(|(cell_idx, crossing)| match crossing {
                Some(crossing) if crossing.other_slot_id == other_slot_id => {
                    Some((cell_idx, crossing.other_slot_cell))
                }
                _ => None,
            })
    }

    /// All slots sharing a cell with the given slot.
    pub fn neighbors(&self, slot_id: SlotId) -> impl Iterator<Item = SlotId> + '_ {
        self.slot_configs[slot_id]
            .crossings
            .iter()
            .flatten()
            .map(|crossing| crossing.other_slot_id)
    }

    /// Every ordered pair of crossing slots, which is the initial work list for AC-3.
    pub fn arcs(&self) -> Vec<(SlotId, SlotId)> {
        self.slot_configs
            .iter()
            .flat_map(|slot_config| {
                self.neighbors(slot_config.id)
                    .map(move |neighbor_id| (slot_config.id, neighbor_id))
            })
            .collect()
    }
}

/// Find each maximal run of open cells of length 2 or more along the rows of `cells`, returning
/// the (row, col) of its first cell and its length.
fn find_runs(cells: &[Vec<bool>]) -> Vec<(GridCoord, usize)> {
    let mut result: Vec<(GridCoord, usize)> = vec![];

    for (row, line) in cells.iter().enumerate() {
        let mut run_start: Option<usize> = None;

        for (col, &open) in line.iter().enumerate() {
            match (open, run_start) {
                (true, None) => run_start = Some(col),
                (false, Some(start)) => {
                    if col - start > 1 {
                        result.push(((row, start), col - start));
                    }
                    run_start = None;
                }
                _ => {}
            }
        }

        if let Some(start) = run_start {
            if line.len() - start > 1 {
                result.push(((row, start), line.len() - start));
            }
        }
    }

    result
}

/// Generate a GridConfig for the given structure, deriving every across and down slot and the
/// crossings between them.
pub fn generate_grid_config(word_list: WordList, structure: Structure) -> GridConfig {
    let mut slot_configs: Vec<SlotConfig> = vec![];

    for (start_cell, length) in find_runs(&structure.cells) {
        slot_configs.push(SlotConfig {
            id: slot_configs.len(),
            start_cell,
            direction: Direction::Across,
            length,
            crossings: SmallVec::new(),
        });
    }

    let transposed_cells: Vec<Vec<bool>> = (0..structure.width)
        .map(|col| (0..structure.height).map(|row| structure.cells[row][col]).collect())
        .collect();

    for ((col, row), length) in find_runs(&transposed_cells) {
        slot_configs.push(SlotConfig {
            id: slot_configs.len(),
            start_cell: (row, col),
            direction: Direction::Down,
            length,
            crossings: SmallVec::new(),
        });
    }

    // Build a map from cell location to the (slot id, cell index) pairs covering it, which we can
    // then use to calculate crossings. An across and a down slot are the most a cell can hold.
    let mut entries_by_loc: HashMap<GridCoord, SmallVec<[(SlotId, usize); 2]>> = HashMap::new();
    for slot_config in &slot_configs {
        for (cell_idx, loc) in slot_config.cell_coords().into_iter().enumerate() {
            entries_by_loc
                .entry(loc)
                .or_default()
                .push((slot_config.id, cell_idx));
        }
    }

    for slot_config in &mut slot_configs {
        let slot_id = slot_config.id;

        slot_config.crossings = slot_config
            .cell_coords()
            .iter()
            .map(|loc| {
                entries_by_loc[loc]
                    .iter()
                    .find(|&&(other_slot_id, _)| other_slot_id != slot_id)
                    .map(|&(other_slot_id, other_slot_cell)| Crossing {
                        other_slot_id,
                        other_slot_cell,
                    })
            })
            .collect();
    }

    log::debug!(
        "Derived {} slots from a {}x{} structure",
        slot_configs.len(),
        structure.width,
        structure.height
    );

    GridConfig {
        structure,
        word_list,
        slot_configs,
    }
}

/// Generate a grid config from a string template, with `_` or `.` representing empty cells and
/// `#` representing blocks. Unlike `Structure::parse`, lines are trimmed and blank lines dropped,
/// so templates can be indented inside source code.
pub fn generate_grid_config_from_template_string(
    word_list: WordList,
    template: &str,
) -> CrosswordResult<GridConfig> {
    let template: Vec<&str> = template
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    Ok(generate_grid_config(word_list, Structure::parse(&template.join("\n"))?))
}
