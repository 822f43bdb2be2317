//! Solves many puzzles against one catalogue with a pool of worker
//! threads.
//!
//! Workers take turns reading one line from the shared puzzle source
//! under a mutex, solve it independently, and emit one result line
//! atomically. Output order across puzzles is unspecified; each line
//! is written whole.

use std::io::{self, BufRead, Write};
use std::sync::Mutex;
use std::thread;

use log::warn;

use crate::catalogue::Catalogue;
use crate::pdb::parallel::MAX_JOBS;
use crate::puzzle::puzzle::Puzzle;
use crate::search::fsm::Fsm;
use crate::search::ida::{search_ida, IdaFlags};

/// Reads puzzles line by line from `puzzles`, solves each with
/// [`search_ida`], and writes one line per solved puzzle to `output`:
/// the original line, the path length, the expansion count and the
/// move sequence. Invalid lines are skipped with a diagnostic. Up to
/// `jobs` workers run concurrently; with one job everything happens
/// on the calling thread.
///
/// An error is returned only when not a single worker could be
/// spawned; losing part of the pool degrades throughput, not
/// correctness.
pub fn lookup_multiple<R, W>(
    cat: &Catalogue,
    fsm: &Fsm,
    jobs: usize,
    puzzles: R,
    output: W,
    flags: IdaFlags,
) -> io::Result<()>
where
    R: BufRead + Send,
    W: Write + Send,
{
    let input = Mutex::new(puzzles);
    let output = Mutex::new(output);

    if jobs <= 1 {
        worker(cat, fsm, &input, &output, flags);
        return Ok(());
    }

    let mut result = Ok(());
    thread::scope(|s| {
        let mut spawned = 0;
        for _ in 0..jobs.min(MAX_JOBS) {
            let spawn = thread::Builder::new()
                .spawn_scoped(s, || worker(cat, fsm, &input, &output, flags));
            match spawn {
                Ok(_) => spawned += 1,
                Err(e) => {
                    if spawned == 0 {
                        result = Err(e);
                    } else {
                        warn!("running with {spawned} of {jobs} search workers: {e}");
                    }
                    break;
                }
            }
        }
    });
    result
}

fn worker<R, W>(
    cat: &Catalogue,
    fsm: &Fsm,
    input: &Mutex<R>,
    output: &Mutex<W>,
    flags: IdaFlags,
) where
    R: BufRead,
    W: Write,
{
    loop {
        let mut line = String::new();
        let read = input.lock().unwrap().read_line(&mut line);
        match read {
            Ok(0) => return,
            Ok(_) => {}
            Err(e) => {
                warn!("reading puzzles: {e}");
                return;
            }
        }

        let line = line.trim_end();
        let puzzle = match line.parse::<Puzzle>() {
            Ok(p) if p.is_valid() => p,
            Ok(_) | Err(_) => {
                warn!("invalid puzzle, ignoring: {line}");
                continue;
            }
        };

        let (path, expansions) = search_ida(cat, fsm, &puzzle, flags, None);

        let mut out = output.lock().unwrap();
        let _ = writeln!(out, "{line} {:3} {expansions:12} {path}", path.len());
        let _ = out.flush();
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::lookup_multiple;
    use crate::catalogue::{Catalogue, CatalogueFlags};
    use crate::puzzle::puzzle::Puzzle;
    use crate::search::fsm::Fsm;
    use crate::search::ida::IdaFlags;

    fn test_catalogue() -> Catalogue {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"1,2,5\n3,4,9\n").unwrap();
        Catalogue::load(f.path(), None, CatalogueFlags::empty(), 1).unwrap()
    }

    fn scrambled(slides: &[usize]) -> String {
        let mut p = Puzzle::solved();
        for &m in slides {
            p.slide(m);
        }
        p.to_string()
    }

    #[test]
    fn test_each_puzzle_answered_once() {
        let cat = test_catalogue();
        let fsm = Fsm::simple();
        let a = scrambled(&[1, 6]);
        let b = scrambled(&[5, 10, 11]);
        let input = format!("{a}\n{b}\n");

        let mut output = Vec::new();
        lookup_multiple(
            &cat,
            &fsm,
            4,
            input.as_bytes(),
            &mut output,
            IdaFlags::empty(),
        )
        .unwrap();

        let text = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        for (puzzle, len) in [(&a, 2), (&b, 3)] {
            let line = lines
                .iter()
                .find(|l| l.starts_with(puzzle.as_str()))
                .expect("missing result line");
            let rest: Vec<&str> = line[puzzle.len()..].split_whitespace().collect();
            assert_eq!(rest[0].parse::<usize>().unwrap(), len);
            assert_eq!(rest.len(), 2 + len);
        }
    }

    #[test]
    fn test_invalid_lines_are_skipped() {
        let cat = test_catalogue();
        let fsm = Fsm::simple();
        let good = scrambled(&[1]);
        let input = format!("not a puzzle\n\n{good}\n");

        let mut output = Vec::new();
        lookup_multiple(
            &cat,
            &fsm,
            1,
            input.as_bytes(),
            &mut output,
            IdaFlags::empty(),
        )
        .unwrap();

        let text = String::from_utf8(output).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with(&good));
    }

    #[test]
    fn test_result_line_replays_to_solved() {
        let cat = test_catalogue();
        let fsm = Fsm::simple();
        let start = scrambled(&[1, 2, 7]);

        let mut output = Vec::new();
        lookup_multiple(
            &cat,
            &fsm,
            1,
            format!("{start}\n").as_bytes(),
            &mut output,
            IdaFlags::empty(),
        )
        .unwrap();

        let text = String::from_utf8(output).unwrap();
        let fields: Vec<&str> = text.split_whitespace().collect();
        let mut p: Puzzle = start.parse().unwrap();
        for tile in &fields[27..] {
            let tile: u8 = tile.parse().unwrap();
            p.slide(p.position_of(tile));
        }
        assert!(p.is_solved());
    }
}
