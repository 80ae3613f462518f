pub mod arc_consistency;
pub mod backtracking_search;
pub mod domains;
pub mod error;
pub mod grid_config;
pub mod render;
pub mod word_list;

pub use backtracking_search::{solve, Assignment, FillFailure, FillSuccess, Statistics};
pub use error::{CrosswordError, CrosswordResult};
pub use grid_config::{generate_grid_config, GridConfig, Structure};
pub use render::{render_grid, save_svg};
pub use word_list::WordList;

/// The expected maximum length for a single slot.
pub const MAX_SLOT_LENGTH: usize = 21;
