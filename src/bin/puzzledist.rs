//! Counts the configurations of the 24-puzzle by distance from the
//! solved state, walking the puzzle graph breadth-first in the packed
//! representation. Generation sizes are exact while the depth stays
//! below the length of the shortest cycle in the move graph.

use std::process::ExitCode;

use clap::Parser;

use quint::puzzle::compact::{pack, round, CompactPuzzle};
use quint::puzzle::puzzle::Puzzle;

#[derive(Parser)]
#[command(about = "Count 24-puzzle configurations by distance from solved")]
struct Args {
    /// Deepest generation to enumerate.
    #[arg(value_name = "depth")]
    depth: u32,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let mut cur = vec![pack(&Puzzle::solved(), 0)];
    let mut next: Vec<CompactPuzzle> = Vec::new();
    println!("0: 1");

    for depth in 1..=args.depth {
        round(&mut next, &cur);
        println!("{depth}: {}", next.len());
        std::mem::swap(&mut cur, &mut next);
    }

    ExitCode::SUCCESS
}
