//! Prints distance statistics of a pattern database file.

use std::fs::File;
use std::io::{self, BufReader, Write as _};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use quint::pdb::stats::{gather_histogram, write_eta, write_histogram, write_histogram_line};

#[derive(Parser)]
#[command(about = "Print histogram, entropy and eta of a pattern database")]
struct Args {
    /// Print a single-line histogram suitable for concatenation into
    /// a summary file.
    #[arg(short = 'p')]
    single_line: bool,

    /// Tileset label to prefix the single-line histogram with.
    #[arg(short = 't', value_name = "tileset")]
    tileset: Option<String>,

    /// The pattern database file.
    pdbfile: PathBuf,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let file = match File::open(&args.pdbfile) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("{}: {e}", args.pdbfile.display());
            return ExitCode::FAILURE;
        }
    };

    let (histogram, size) = match gather_histogram(&mut BufReader::new(file)) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("{}: {e}", args.pdbfile.display());
            return ExitCode::FAILURE;
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = if args.single_line {
        write_histogram_line(&mut out, args.tileset.as_deref(), &histogram)
    } else {
        writeln!(out, "size {size}B\n")
            .and_then(|()| write_histogram(&mut out, &histogram, size))
            .and_then(|()| write_eta(&mut out, &histogram, size))
    };

    if let Err(e) = result {
        eprintln!("writing output: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
