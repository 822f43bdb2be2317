//! Pattern database statistics: distance histograms, per-bucket and
//! total entropy, and the effective branching factor accumulator eta
//! that predicts search effort.

use std::io::{self, Read, Write};

use crate::pdb::pdb::HISTOGRAM_LEN;

/// The asymptotic branching factor of the 5x5 sliding-tile puzzle.
pub const B: f64 = 2.30278;

/// Reads a byte stream and counts how often each value occurs.
/// Returns the histogram and the number of bytes read.
pub fn gather_histogram<R: Read>(r: &mut R) -> io::Result<([u64; HISTOGRAM_LEN], u64)> {
    let mut histogram = [0u64; HISTOGRAM_LEN];
    let mut size = 0u64;
    let mut buf = [0u8; 1 << 16];
    loop {
        let n = r.read(&mut buf)?;
        if n == 0 {
            return Ok((histogram, size));
        }
        size += n as u64;
        for &b in &buf[..n] {
            histogram[b as usize] += 1;
        }
    }
}

/// Writes the histogram with each bucket's entropy contribution,
/// followed by the total entropy in bits and bytes.
pub fn write_histogram<W: Write>(
    w: &mut W,
    histogram: &[u64; HISTOGRAM_LEN],
    size: u64,
) -> io::Result<()> {
    let quotient = 1.0 / size as f64;
    let mut accum = 0.0;

    writeln!(w, "histogram:")?;
    for (i, &count) in histogram.iter().enumerate() {
        if count == 0 {
            continue;
        }

        let prob = count as f64 * quotient;
        let entropy = -prob.log2();
        let bits = count as f64 * entropy;
        accum += bits;

        writeln!(
            w,
            "0x{i:02x}: {count:20} * {entropy:6.2}b ({:6.2}%) = {bits:23.2}b ({:23.2}B)",
            100.0 * prob,
            bits / 8.0
        )?;
    }

    writeln!(w, "total {accum:.2}b ({:.2}B)\n", accum / 8.0)
}

/// The effective branching factor accumulator:
/// `eta = sum(histogram[255 - i] * B^-i) / size`. Smaller is better;
/// eta predicts the fraction of the search tree a lookup into this
/// table leaves unpruned.
#[must_use]
pub fn eta(histogram: &[u64; HISTOGRAM_LEN], size: u64) -> f64 {
    let invb = 1.0 / B;
    let mut eta = 0.0;
    for i in 1..=HISTOGRAM_LEN {
        eta = eta * invb + histogram[HISTOGRAM_LEN - i] as f64;
    }
    eta / size as f64
}

/// Writes eta in the fixed exponent format.
pub fn write_eta<W: Write>(
    w: &mut W,
    histogram: &[u64; HISTOGRAM_LEN],
    size: u64,
) -> io::Result<()> {
    writeln!(w, "eta = {:.20e}", eta(histogram, size))
}

/// Writes the single-line histogram form: an optional tileset label,
/// the counts up to the first empty bucket, and a closing zero. Lines
/// in this form concatenate into a summary file.
pub fn write_histogram_line<W: Write>(
    w: &mut W,
    label: Option<&str>,
    histogram: &[u64; HISTOGRAM_LEN],
) -> io::Result<()> {
    if let Some(label) = label {
        write!(w, "{label} ")?;
    }
    for &count in histogram.iter().take_while(|&&c| c != 0) {
        write!(w, "{count} ")?;
    }
    writeln!(w, "0")
}
