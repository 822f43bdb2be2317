//! Solves a batch of puzzles optimally against one set of pattern
//! databases.

use std::fs::File;
use std::io::{self, BufReader, Write as _};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::warn;

use quint::catalogue::{Catalogue, CatalogueFlags};
use quint::pdb::parallel::MAX_JOBS;
use quint::search::driver::lookup_multiple;
use quint::search::fsm::Fsm;
use quint::search::ida::IdaFlags;

#[derive(Parser)]
#[command(about = "Solve 24-puzzles optimally with pattern database heuristics")]
struct Args {
    /// Complete the final search iteration exhaustively so expansion
    /// counts are comparable.
    #[arg(short = 'F')]
    full_last: bool,

    /// Directory holding pattern database files; missing ones are
    /// generated and saved there.
    #[arg(short = 'd', value_name = "pdbdir")]
    pdbdir: Option<PathBuf>,

    /// Treat blank-line groups in the catalogue as additive.
    #[arg(short = 'i')]
    identify: bool,

    /// Number of worker threads.
    #[arg(short = 'j', value_name = "nproc")]
    jobs: Option<usize>,

    /// Move-pruning automaton image; on load failure the built-in
    /// reversal pruner is kept.
    #[arg(short = 'm', value_name = "fsmfile")]
    fsmfile: Option<PathBuf>,

    /// Also query each pattern database's diagonal-transpose twin.
    #[arg(short = 't')]
    transpose: bool,

    /// Catalogue manifest listing the tilesets to load.
    catalogue: PathBuf,

    /// File with one puzzle per line.
    puzzles: PathBuf,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let jobs = args.jobs.unwrap_or_else(|| num_cpus::get().min(MAX_JOBS));
    if jobs < 1 || jobs > MAX_JOBS {
        eprintln!("Number of threads must be between 1 and {MAX_JOBS}");
        return ExitCode::FAILURE;
    }

    let mut fsm = Fsm::simple();
    if let Some(path) = &args.fsmfile {
        match File::open(path) {
            Ok(f) => match Fsm::load(&mut BufReader::new(f)) {
                Ok(loaded) => fsm = loaded,
                Err(e) => warn!("{}: {e}; keeping the built-in pruner", path.display()),
            },
            Err(e) => warn!("{}: {e}; keeping the built-in pruner", path.display()),
        }
    }

    let mut flags = CatalogueFlags::empty();
    if args.identify {
        flags |= CatalogueFlags::IDENTIFY;
    }
    let mut cat = match Catalogue::load(&args.catalogue, args.pdbdir.as_deref(), flags, jobs) {
        Ok(cat) => cat,
        Err(e) => {
            eprintln!("{}: {e}", args.catalogue.display());
            return ExitCode::FAILURE;
        }
    };
    if args.transpose {
        cat.add_transpositions();
    }

    let puzzles = match File::open(&args.puzzles) {
        Ok(f) => BufReader::new(f),
        Err(e) => {
            eprintln!("{}: {e}", args.puzzles.display());
            return ExitCode::FAILURE;
        }
    };

    let mut idaflags = IdaFlags::empty();
    if args.full_last {
        idaflags |= IdaFlags::LAST_FULL;
    }

    let stdout = io::stdout();
    if let Err(e) = lookup_multiple(&cat, &fsm, jobs, puzzles, stdout, idaflags) {
        eprintln!("spawning search workers: {e}");
        return ExitCode::FAILURE;
    }
    let _ = io::stdout().lock().flush();

    ExitCode::SUCCESS
}
