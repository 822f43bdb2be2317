//! Defines the [`Catalogue`] type: an ordered collection of pattern
//! databases combined into one admissible heuristic.
//!
//! A manifest lists one tileset per line. Under
//! [`CatalogueFlags::IDENTIFY`], blank lines split the list into
//! additive groups whose members are summed as a single heuristic
//! term; groups must be disjoint on their non-zero tiles. Every
//! tileset is folded onto its canonical automorphism before its
//! pattern database is looked up, so symmetric tilesets share one
//! table on disk and in memory.

use std::collections::HashMap;
use std::fs;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;

use bitflags::bitflags;
use log::{debug, info, warn};
use thiserror::Error;

use crate::index::MAX_PATTERN_TILES;
use crate::pdb::generate::generate;
use crate::pdb::pdb::{PatternDb, PdbError};
use crate::puzzle::automorphism::{
    canonical_automorphism, compose_morphisms, is_admissible_morphism, tileset_morph, TRANSPOSE,
};
use crate::puzzle::puzzle::{Puzzle, ZERO_TILE};
use crate::tileset::{Tileset, TilesetError};

bitflags! {
    /// Options for [`Catalogue::load`].
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct CatalogueFlags: u32 {
        /// Honor blank-line grouping in the manifest and sum each
        /// group as one additive heuristic term.
        const IDENTIFY = 1 << 0;
    }
}

/// One manifest entry: its tileset, the automorphism folding it onto
/// the canonical tileset, and the shared pattern database index.
#[derive(Clone, Copy)]
struct Component {
    ts: Tileset,
    morphism: usize,
    pdb: usize,
}

/// A collection of pattern databases forming an admissible heuristic.
pub struct Catalogue {
    pdbs: Vec<PatternDb>,
    components: Vec<Component>,
    parts: Vec<Vec<usize>>,
}

/// Error type for [`Catalogue::load`].
#[derive(Debug, Error)]
pub enum CatalogueError {
    #[error("Io: {0}")]
    Io(#[from] io::Error),

    /// A manifest line is not a tileset.
    #[error("Manifest: line {line}: {source}")]
    Manifest { line: usize, source: TilesetError },

    /// A manifest tileset is too large to index.
    #[error("PatternTooLarge: line {line}: {tiles} tiles cannot be indexed")]
    PatternTooLarge { line: usize, tiles: usize },

    /// Two tilesets of one additive group share a non-zero tile.
    #[error("OverlappingGroup: line {line}: group tilesets must be disjoint")]
    OverlappingGroup { line: usize },

    #[error("Pdb: {0}")]
    Pdb(#[from] PdbError),
}

impl Catalogue {
    /// Loads a catalogue from a manifest file. Pattern databases are
    /// memory-mapped from `pdbdir` when present; missing ones are
    /// generated with up to `jobs` threads and, when a directory was
    /// given, saved there for the next run.
    pub fn load(
        manifest: &Path,
        pdbdir: Option<&Path>,
        flags: CatalogueFlags,
        jobs: usize,
    ) -> Result<Self, CatalogueError> {
        let text = fs::read_to_string(manifest)?;
        let mut cat = Self {
            pdbs: Vec::new(),
            components: Vec::new(),
            parts: Vec::new(),
        };
        let mut loaded: HashMap<Tileset, usize> = HashMap::new();
        let mut group: Vec<usize> = Vec::new();
        let identify = flags.contains(CatalogueFlags::IDENTIFY);

        for (i, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                if identify && !group.is_empty() {
                    cat.parts.push(std::mem::take(&mut group));
                }
                continue;
            }

            let ts: Tileset = line.parse().map_err(|source| CatalogueError::Manifest {
                line: i + 1,
                source,
            })?;
            if ts.len() > MAX_PATTERN_TILES {
                return Err(CatalogueError::PatternTooLarge {
                    line: i + 1,
                    tiles: ts.len(),
                });
            }

            let morphism = canonical_automorphism(ts);
            let mut canonical = tileset_morph(ts.remove(ZERO_TILE), morphism);
            if ts.contains(ZERO_TILE) {
                canonical = canonical.add(ZERO_TILE);
            }
            debug!("catalogue: {ts} folds onto {canonical} through automorphism {morphism}");

            let pdb = match loaded.get(&canonical) {
                Some(&idx) => idx,
                None => {
                    let idx = cat.pdbs.len();
                    cat.pdbs.push(acquire(canonical, pdbdir, jobs)?);
                    loaded.insert(canonical, idx);
                    idx
                }
            };

            let component = cat.components.len();
            cat.components.push(Component { ts, morphism, pdb });

            if identify {
                let tsnz = ts.remove(ZERO_TILE);
                for &other in &group {
                    let overlap = cat.components[other].ts.remove(ZERO_TILE).bits() & tsnz.bits();
                    if overlap != 0 {
                        return Err(CatalogueError::OverlappingGroup { line: i + 1 });
                    }
                }
                group.push(component);
            } else {
                cat.parts.push(vec![component]);
            }
        }
        if !group.is_empty() {
            cat.parts.push(group);
        }

        info!(
            "catalogue: {} components in {} heuristic terms over {} pattern databases",
            cat.components.len(),
            cat.parts.len(),
            cat.pdbs.len()
        );
        Ok(cat)
    }

    /// Adds, for every heuristic term whose diagonal transpose is a
    /// distinct admissible family, the transposed twin as another
    /// term. The twins reuse the already loaded tables.
    pub fn add_transpositions(&mut self) {
        let parts = self.parts.clone();
        for part in parts {
            let mut twins = Vec::new();
            let mut distinct = false;
            for &c in &part {
                let Component { ts, morphism, pdb } = self.components[c];
                // The twin folds onto the same canonical tileset: it
                // transposes first and then applies the original
                // folding on top.
                let twin_morphism = compose_morphisms(morphism, TRANSPOSE);
                let mut twin_ts = tileset_morph(ts.remove(ZERO_TILE), TRANSPOSE);
                if ts.contains(ZERO_TILE) {
                    twin_ts = twin_ts.add(ZERO_TILE);
                }
                if !is_admissible_morphism(twin_ts, twin_morphism) {
                    twins.clear();
                    break;
                }
                if twin_ts != ts {
                    distinct = true;
                }
                twins.push(Component {
                    ts: twin_ts,
                    morphism: twin_morphism,
                    pdb,
                });
            }
            if twins.is_empty() || !distinct {
                continue;
            }

            let part: Vec<usize> = twins
                .into_iter()
                .map(|t| {
                    debug!("catalogue: transposition twin {} (automorphism {})", t.ts, t.morphism);
                    self.components.push(t);
                    self.components.len() - 1
                })
                .collect();
            self.parts.push(part);
        }
    }

    /// The admissible heuristic: the maximum over all terms of the
    /// term's summed pattern database distances.
    #[must_use]
    pub fn hval(&self, p: &Puzzle) -> u32 {
        self.parts
            .iter()
            .map(|part| {
                part.iter()
                    .map(|&c| {
                        let component = &self.components[c];
                        let mut q = p.clone();
                        q.morph(component.morphism);
                        self.pdbs[component.pdb].hval(&q)
                    })
                    .sum::<u32>()
            })
            .max()
            .unwrap_or(0)
    }

    /// The number of heuristic terms.
    #[must_use]
    pub fn terms(&self) -> usize {
        self.parts.len()
    }

    /// The loaded pattern databases (one per canonical tileset).
    #[must_use]
    pub fn pdbs(&self) -> &[PatternDb] {
        &self.pdbs
    }
}

/// Maps the pattern database for `ts` from `pdbdir`, or generates it,
/// saving the result when a directory is configured.
fn acquire(ts: Tileset, pdbdir: Option<&Path>, jobs: usize) -> Result<PatternDb, PdbError> {
    let Some(dir) = pdbdir else {
        info!("catalogue: generating {ts} in memory");
        return Ok(generate(ts, jobs));
    };

    let path = dir.join(format!("{ts}.pdb"));
    if path.exists() {
        info!("catalogue: mapping {}", path.display());
        return PatternDb::map_file(ts, &path);
    }

    info!("catalogue: generating missing {}", path.display());
    let pdb = generate(ts, jobs);
    match File::create(&path) {
        Ok(file) => {
            if let Err(e) = pdb.save(&mut BufWriter::new(file)) {
                warn!("cannot save {}: {e}", path.display());
            }
        }
        Err(e) => warn!("cannot save {}: {e}", path.display()),
    }
    Ok(pdb)
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::{Catalogue, CatalogueError, CatalogueFlags};
    use crate::puzzle::scrambler::scramble_with_rng;
    use rand::SeedableRng as _;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn manifest(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_load_plain() {
        let m = manifest("1,2\n3,4\n");
        let cat = Catalogue::load(m.path(), None, CatalogueFlags::empty(), 1).unwrap();
        assert_eq!(cat.terms(), 2);
    }

    #[test]
    fn test_identify_groups_sum() {
        let m = manifest("1,2\n3,4\n");
        let split = Catalogue::load(m.path(), None, CatalogueFlags::empty(), 1).unwrap();
        let m = manifest("1,2\n3,4\n");
        let joined = Catalogue::load(m.path(), None, CatalogueFlags::IDENTIFY, 1).unwrap();
        assert_eq!(joined.terms(), 1);

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(21);
        for _ in 0..16 {
            let p = scramble_with_rng(&mut rng);
            assert!(joined.hval(&p) >= split.hval(&p));
        }
    }

    #[test]
    fn test_identify_rejects_overlap() {
        let m = manifest("1,2\n2,3\n");
        assert!(matches!(
            Catalogue::load(m.path(), None, CatalogueFlags::IDENTIFY, 1),
            Err(CatalogueError::OverlappingGroup { line: 2 })
        ));
    }

    #[test]
    fn test_symmetric_tilesets_share_a_table() {
        // 1,2 and its diagonal mirror 5,10 fold onto one canonical
        // tileset.
        let m = manifest("1,2\n5,10\n");
        let cat = Catalogue::load(m.path(), None, CatalogueFlags::empty(), 1).unwrap();
        assert_eq!(cat.pdbs().len(), 1);
        assert_eq!(cat.terms(), 2);
    }

    #[test]
    fn test_folded_lookup_matches_direct_table() {
        // 5,10 and 0,5,6 both fold onto other canonical tilesets; the
        // folded lookups must agree with tables generated for the
        // original tilesets directly.
        for s in ["5,10", "0,5,6"] {
            let m = manifest(&format!("{s}\n"));
            let cat = Catalogue::load(m.path(), None, CatalogueFlags::empty(), 1).unwrap();
            let ts: crate::tileset::Tileset = s.parse().unwrap();
            let direct = crate::pdb::generate::generate(ts, 1);

            let mut rng = Xoshiro256PlusPlus::seed_from_u64(23);
            for _ in 0..32 {
                let p = scramble_with_rng(&mut rng);
                assert_eq!(cat.hval(&p), direct.hval(&p), "tileset {s}");
            }
        }
    }

    #[test]
    fn test_heuristic_is_zero_on_solved() {
        let m = manifest("1,2\n0,5,6\n");
        let cat = Catalogue::load(m.path(), None, CatalogueFlags::empty(), 1).unwrap();
        assert_eq!(cat.hval(&crate::puzzle::puzzle::Puzzle::solved()), 0);
    }

    #[test]
    fn test_transpositions_make_heuristic_symmetric() {
        let m = manifest("1,2,3\n");
        let mut cat = Catalogue::load(m.path(), None, CatalogueFlags::empty(), 1).unwrap();
        cat.add_transpositions();
        assert_eq!(cat.terms(), 2);

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(22);
        for _ in 0..16 {
            let p = scramble_with_rng(&mut rng);
            let mut t = p.clone();
            t.transpose();
            assert_eq!(cat.hval(&p), cat.hval(&t));
        }
    }

    #[test]
    fn test_transpositions_skip_symmetric_terms() {
        // 6,12 lies on the main diagonal; its transpose is itself.
        let m = manifest("6,12\n");
        let mut cat = Catalogue::load(m.path(), None, CatalogueFlags::empty(), 1).unwrap();
        cat.add_transpositions();
        assert_eq!(cat.terms(), 1);
    }
}
