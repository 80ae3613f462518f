use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use crossword::{
    generate_grid_config, render_grid, save_svg, solve, CrosswordResult, Structure, WordList,
};
use log::{error, info, LevelFilter};

/// Fill a crossword structure with words from a word list.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// The grid structure: one line per row, `#` for blocked cells and `_` for open ones.
    structure: PathBuf,

    /// The candidate words, one per line.
    words: PathBuf,

    /// Where to save an SVG image of the filled grid.
    output: Option<PathBuf>,

    /// Log propagation and search progress to stderr.
    #[arg(short, long)]
    verbose: bool,
}

fn configure_logging(verbose: bool) {
    let level_filter = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    env_logger::Builder::new()
        .format(move |buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .filter_level(level_filter)
        .target(env_logger::Target::Stderr)
        .init();
}

fn main() {
    let args = Args::parse();
    configure_logging(args.verbose);

    match run(&args) {
        Ok(()) => {}
        Err(e) => {
            error!("Execution failed, error: {e}");
            std::process::exit(1);
        }
    }
}

fn run(args: &Args) -> CrosswordResult<()> {
    let structure = Structure::from_file(&args.structure)?;
    let word_list = WordList::from_file(&args.words)?;
    let grid_config = generate_grid_config(word_list, structure);

    match solve(&grid_config) {
        Ok(result) => {
            println!("{}", render_grid(&grid_config, &result.assignment));

            if let Some(output) = &args.output {
                save_svg(&grid_config, &result.assignment, output)?;
                info!("Saved the filled grid to {}", output.display());
            }
        }
        Err(failure) => {
            info!("No fill: {failure:?}");
            println!("No solution.");
        }
    }

    Ok(())
}
