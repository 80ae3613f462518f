use std::fmt::Write;
use std::fs;
use std::path::Path;

use crate::backtracking_search::Assignment;
use crate::error::{CrosswordError, CrosswordResult};
use crate::grid_config::GridConfig;

/// Glyph printed for blocked cells.
pub const BLOCK_GLYPH: char = '█';

/// Side length of one cell in the SVG output, in pixels.
pub const CELL_SIZE: usize = 100;

/// Gap left around each open cell in the SVG output, in pixels.
pub const CELL_BORDER: usize = 2;

const FONT_SIZE: usize = 80;

/// Lay the assigned words out on the grid. Cells not covered by an assigned word are `None`.
pub fn letter_grid(config: &GridConfig, assignment: &Assignment) -> Vec<Vec<Option<char>>> {
    let mut letters = vec![vec![None; config.structure.width]; config.structure.height];

    for choice in assignment.choices() {
        let slot_config = &config.slot_configs[choice.slot_id];
        let word = config.word_list.get(choice.word_id);

        for (cell_idx, &glyph) in word.glyphs.iter().enumerate().take(slot_config.length) {
            let (row, col) = slot_config.cell_coord(cell_idx);
            letters[row][col] = Some(glyph);
        }
    }

    letters
}

/// Turn the given grid config and assignment into a rendered string, one line per row.
pub fn render_grid(config: &GridConfig, assignment: &Assignment) -> String {
    let letters = letter_grid(config, assignment);

    letters
        .iter()
        .enumerate()
        .map(|(row, line)| {
            line.iter()
                .enumerate()
                .map(|(col, letter)| {
                    if config.structure.is_open((row, col)) {
                        letter.unwrap_or(' ')
                    } else {
                        BLOCK_GLYPH
                    }
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn escape_xml(glyph: char) -> String {
    match glyph {
        '&' => "&amp;".to_string(),
        '<' => "&lt;".to_string(),
        '>' => "&gt;".to_string(),
        '"' => "&quot;".to_string(),
        '\'' => "&apos;".to_string(),
        _ => glyph.to_string(),
    }
}

/// Render the assignment as an SVG image: a black board with a white square for each open cell and
/// the assigned letter centred in it.
pub fn render_svg(config: &GridConfig, assignment: &Assignment) -> String {
    let letters = letter_grid(config, assignment);
    let width = config.structure.width * CELL_SIZE;
    let height = config.structure.height * CELL_SIZE;
    let interior_size = CELL_SIZE - 2 * CELL_BORDER;

    let mut svg = String::new();

    // Writing into a String can't fail.
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
    );
    let _ = writeln!(svg, r#"  <rect width="{width}" height="{height}" fill="black"/>"#);

    for (row, line) in letters.iter().enumerate() {
        for (col, letter) in line.iter().enumerate() {
            if !config.structure.is_open((row, col)) {
                continue;
            }

            let x = col * CELL_SIZE + CELL_BORDER;
            let y = row * CELL_SIZE + CELL_BORDER;
            let _ = writeln!(
                svg,
                r#"  <rect x="{x}" y="{y}" width="{interior_size}" height="{interior_size}" fill="white"/>"#
            );

            if let Some(letter) = letter {
                let _ = writeln!(
                    svg,
                    r#"  <text x="{}" y="{}" font-family="sans-serif" font-size="{FONT_SIZE}" text-anchor="middle" dominant-baseline="central" fill="black">{}</text>"#,
                    x + interior_size / 2,
                    y + interior_size / 2,
                    escape_xml(*letter)
                );
            }
        }
    }

    svg.push_str("</svg>\n");
    svg
}

/// Write the SVG rendering of the assignment to `path`.
pub fn save_svg(
    config: &GridConfig,
    assignment: &Assignment,
    path: impl AsRef<Path>,
) -> CrosswordResult<()> {
    let path = path.as_ref();

    if path.extension().and_then(|ext| ext.to_str()) != Some("svg") {
        log::warn!("Writing SVG data to {}, which lacks an .svg extension", path.display());
    }

    fs::write(path, render_svg(config, assignment)).map_err(|err| CrosswordError::write(path, err))
}
