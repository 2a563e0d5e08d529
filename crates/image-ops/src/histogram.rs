//! Adaptive pixel-value histogram used for display stretches.
//!
//! The histogram has [`HIST_SIZE`] regular bins plus one overflow bin. If
//! the first pass leaves the populated bins too narrow, the range is cut
//! down to the populated part and the data is binned once more.

use num_traits::Float;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Number of regular bins.
pub const HIST_SIZE: usize = 4096;

/// Data above this length is binned in parallel.
const PARALLEL_THRESHOLD: usize = 10_000;

/// Pixels per rayon work unit.
const CHUNK_LEN: usize = 8192;

/// Fraction of pixels falling outside the range that forces a rebuild.
const SPILL_FRACTION: f64 = 0.01;

/// Fraction of good pixels ignored at each tail when measuring spread.
const TAIL_FRACTION: f64 = 0.0005;

/// Counts for one binning pass.
#[derive(Debug, Clone)]
struct BinPass {
    counts: Vec<u64>,
    underflow: u64,
    overflow: u64,
    min: f64,
    max: f64,
}

impl BinPass {
    fn empty() -> Self {
        Self {
            counts: vec![0; HIST_SIZE + 1],
            underflow: 0,
            overflow: 0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    fn merge(mut self, other: BinPass) -> Self {
        for (a, b) in self.counts.iter_mut().zip(&other.counts) {
            *a += b;
        }
        self.underflow += other.underflow;
        self.overflow += other.overflow;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self
    }

    fn has_data(&self) -> bool {
        self.min <= self.max
    }
}

/// Histogram of the good pixels of an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    counts: Vec<u64>,
    hist_min: f64,
    bin_size: f64,
    data_min: f64,
    data_max: f64,
}

impl Histogram {
    /// Build a histogram over `data`. Non-finite values are skipped.
    ///
    /// `datamin`/`datamax` give the initial range; if either is NaN the
    /// range is taken from the data.
    pub fn new<T: Float + Send + Sync>(data: &[T], datamin: f64, datamax: f64) -> Self {
        Self::with_blank(data, datamin, datamax, None)
    }

    /// Like [`Histogram::new`], also skipping pixels equal to `blank`.
    pub fn with_blank<T: Float + Send + Sync>(
        data: &[T],
        datamin: f64,
        datamax: f64,
        blank: Option<f64>,
    ) -> Self {
        let (mut lo, mut hi) = (datamin, datamax);
        if lo.is_nan() || hi.is_nan() {
            match scan_range(data, blank) {
                Some((a, b)) => {
                    lo = a;
                    hi = b;
                }
                None => return Self::empty(datamin, datamax),
            }
        }

        let total = data.len() as f64;
        let mut redoing = false;
        loop {
            let bin_size = bin_size_for(lo, hi);
            let pass = bin_data(data, lo, bin_size, blank);
            if !pass.has_data() {
                return Self::empty(datamin, datamax);
            }

            let spilled = pass.underflow as f64 > total * SPILL_FRACTION
                || pass.overflow as f64 > total * SPILL_FRACTION;
            let mut rebuild = false;

            if !spilled && !redoing {
                let (min_index, max_index) = populated_span(&pass.counts);
                if max_index.saturating_sub(min_index) < HIST_SIZE / 2 {
                    hi = max_index as f64 * bin_size + lo;
                    lo += min_index as f64 * bin_size;
                    rebuild = true;
                }
            } else if !redoing {
                lo = pass.min;
                hi = pass.max;
                rebuild = true;
            }

            if rebuild && !redoing {
                debug!(hist_min = lo, hist_max = hi, "Rebuilding histogram");
                redoing = true;
                continue;
            }

            return Self {
                counts: pass.counts,
                hist_min: lo,
                bin_size,
                data_min: pass.min,
                data_max: pass.max,
            };
        }
    }

    /// Histogram with no counts, used when every pixel is blank.
    fn empty(datamin: f64, datamax: f64) -> Self {
        warn!("No good pixels to build histogram from");
        let min = if datamin.is_nan() { 0.0 } else { datamin };
        let max = if datamax.is_nan() { min } else { datamax };
        Self {
            counts: vec![0; HIST_SIZE + 1],
            hist_min: min,
            bin_size: 1.0,
            data_min: min,
            data_max: max,
        }
    }

    /// Bin counts, including the trailing overflow bin.
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Smallest good pixel value.
    pub fn data_min(&self) -> f64 {
        self.data_min
    }

    /// Largest good pixel value.
    pub fn data_max(&self) -> f64 {
        self.data_max
    }

    /// Lower edge of bin 0.
    pub fn hist_min(&self) -> f64 {
        self.hist_min
    }

    pub fn bin_size(&self) -> f64 {
        self.bin_size
    }

    /// Count over the regular bins.
    pub fn total(&self) -> u64 {
        self.counts[..HIST_SIZE].iter().sum()
    }

    /// Value below which `pct` percent of good pixels fall.
    ///
    /// 0 and 100 return the data extremes. `round_up` returns the upper
    /// edge of the bin instead of the lower.
    pub fn percentile(&self, pct: f64, round_up: bool) -> f64 {
        if pct == 0.0 {
            return self.data_min;
        }
        if pct == 100.0 {
            return self.data_max;
        }
        let good = self.total();
        let goal = ((good as f64 * pct / 100.0) as u64).min(good);

        let mut sum = 0;
        let mut index = 0;
        for (i, &c) in self.counts[..HIST_SIZE].iter().enumerate() {
            index = i;
            sum += c;
            if sum >= goal {
                break;
            }
        }

        let edge = if round_up { index + 1 } else { index };
        edge as f64 * self.bin_size + self.hist_min
    }

    /// Fraction of all bins, overflow included, holding more than 40% of
    /// the fullest bin's count.
    pub fn large_bin_percent(&self) -> f64 {
        let peak = self.counts.iter().copied().max().unwrap_or(0);
        let marker = (peak as f64 * 0.4) as u64;
        let large = self.counts.iter().filter(|&&c| c > marker).count();
        large as f64 / self.counts.len() as f64
    }

    /// Median plus `k` times the half-width of the 16-84 percentile band.
    pub fn sigma(&self, k: f64, round_up: bool) -> f64 {
        let p16 = self.percentile(16.0, round_up);
        let p50 = self.percentile(50.0, round_up);
        let p84 = self.percentile(84.0, round_up);
        p50 + k * (p84 - p16) / 2.0
    }

    /// Lower edge of `bin`.
    pub fn value_from_bin(&self, bin: usize) -> f64 {
        bin as f64 * self.bin_size + self.hist_min
    }

    /// Bin holding `value`, clamped to the regular bins.
    pub fn bin_from_value(&self, value: f64) -> usize {
        let bin = ((value - self.hist_min) / self.bin_size) as i64;
        bin.clamp(0, HIST_SIZE as i64 - 1) as usize
    }

    pub fn bin_from_percentile(&self, pct: f64, round_up: bool) -> usize {
        self.bin_from_value(self.percentile(pct, round_up))
    }

    pub fn bin_from_sigma(&self, k: f64, round_up: bool) -> usize {
        self.bin_from_value(self.sigma(k, round_up))
    }

    /// Histogram-equalization table: 255 thresholds splitting the good
    /// pixels into equal-count bands, with `f64::MAX` as the last entry.
    pub fn stretch_table(&self) -> [f64; 256] {
        let mut tbl = [0.0; 256];
        let steps = self.equalize();
        tbl[..255].copy_from_slice(&steps.map(|bin| self.value_from_bin(bin))[..255]);
        tbl[0] = self.hist_min;
        tbl[255] = f64::MAX;
        tbl
    }

    /// Integer form of [`Histogram::stretch_table`].
    pub fn eq_table(&self) -> [i32; 256] {
        let mut tbl = [0; 256];
        let steps = self.equalize();
        for (slot, &bin) in tbl.iter_mut().zip(steps.iter()).take(255) {
            *slot = self.value_from_bin(bin) as i32;
        }
        tbl[0] = self.hist_min as i32;
        tbl[255] = i32::MAX;
        tbl
    }

    /// Bin index where each of the first 255 table entries falls.
    fn equalize(&self) -> [usize; 256] {
        let step = self.total() as f64 / 255.0;
        let mut bins = [0usize; 256];
        let mut next_goal = step;
        let mut accum = 0u64;
        let mut hist_index = 0;
        let mut tbl_index = 1;

        while hist_index < HIST_SIZE && tbl_index < 255 {
            if accum as f64 >= next_goal {
                bins[tbl_index] = hist_index;
                tbl_index += 1;
                next_goal += step;
            } else {
                accum += self.counts[hist_index];
                hist_index += 1;
            }
        }
        for slot in bins.iter_mut().take(255).skip(tbl_index) {
            *slot = hist_index;
        }
        bins
    }
}

fn is_good<T: Float>(v: T, blank: Option<f64>) -> Option<f64> {
    let v = v.to_f64()?;
    if !v.is_finite() || blank == Some(v) {
        return None;
    }
    Some(v)
}

fn bin_size_for(lo: f64, hi: f64) -> f64 {
    let size = (hi - lo) / HIST_SIZE as f64;
    if size == 0.0 || !size.is_finite() {
        1.0
    } else {
        size
    }
}

fn scan_range<T: Float + Send + Sync>(data: &[T], blank: Option<f64>) -> Option<(f64, f64)> {
    let fold = |acc: (f64, f64), v: &T| match is_good(*v, blank) {
        Some(v) => (acc.0.min(v), acc.1.max(v)),
        None => acc,
    };
    let init = (f64::INFINITY, f64::NEG_INFINITY);
    let (lo, hi) = if data.len() >= PARALLEL_THRESHOLD {
        data.par_chunks(CHUNK_LEN)
            .map(|chunk| chunk.iter().fold(init, fold))
            .reduce(|| init, |a, b| (a.0.min(b.0), a.1.max(b.1)))
    } else {
        data.iter().fold(init, fold)
    };
    (lo <= hi).then_some((lo, hi))
}

fn bin_chunk<T: Float>(chunk: &[T], hist_min: f64, bin_size: f64, blank: Option<f64>) -> BinPass {
    let mut pass = BinPass::empty();
    for &v in chunk {
        let Some(v) = is_good(v, blank) else {
            continue;
        };
        // truncation toward zero, so values just under hist_min land in bin 0
        let i = ((v - hist_min) / bin_size) as i64;
        if i < 0 {
            pass.underflow += 1;
        } else if i > HIST_SIZE as i64 {
            pass.overflow += 1;
        } else {
            pass.counts[i as usize] += 1;
        }
        pass.min = pass.min.min(v);
        pass.max = pass.max.max(v);
    }
    pass
}

fn bin_data<T: Float + Send + Sync>(data: &[T], hist_min: f64, bin_size: f64, blank: Option<f64>) -> BinPass {
    if data.len() >= PARALLEL_THRESHOLD {
        data.par_chunks(CHUNK_LEN)
            .map(|chunk| bin_chunk(chunk, hist_min, bin_size, blank))
            .reduce(BinPass::empty, BinPass::merge)
    } else {
        bin_chunk(data, hist_min, bin_size, blank)
    }
}

/// First and one-past-last populated bin after dropping the tails.
fn populated_span(counts: &[u64]) -> (usize, usize) {
    let good: u64 = counts[..HIST_SIZE].iter().sum();
    let limit = (good as f64 * TAIL_FRACTION) as u64;

    let mut high = 0;
    let mut sum = 0;
    for i in (0..=HIST_SIZE).rev() {
        sum += counts[i];
        high = i;
        if sum > limit {
            break;
        }
    }

    let mut low = 0;
    sum = 0;
    for (i, &c) in counts[..HIST_SIZE].iter().enumerate() {
        sum += c;
        low = i;
        if sum > limit {
            break;
        }
    }
    (low, high + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> Vec<f32> {
        (0..n).map(|v| v as f32).collect()
    }

    #[test]
    fn test_wide_ramp_single_pass() {
        let h = Histogram::new(&ramp(8192), f64::NAN, f64::NAN);
        assert_eq!(h.data_min(), 0.0);
        assert_eq!(h.data_max(), 8191.0);
        assert_eq!(h.hist_min(), 0.0);
        assert!((h.bin_size() - 8191.0 / 4096.0).abs() < 1e-12);
        assert_eq!(h.total() + h.counts()[HIST_SIZE], 8192);
    }

    #[test]
    fn test_narrow_data_is_rebinned() {
        // declared range far wider than the data
        let data = ramp(1000);
        let h = Histogram::new(&data, 0.0, 100_000.0);
        assert!(h.bin_size() < 1.0);
        assert_eq!(h.data_max(), 999.0);
    }

    #[test]
    fn test_percentile_extremes_and_order() {
        let h = Histogram::new(&ramp(5000), f64::NAN, f64::NAN);
        assert_eq!(h.percentile(0.0, false), 0.0);
        assert_eq!(h.percentile(100.0, false), 4999.0);
        let p25 = h.percentile(25.0, false);
        let p75 = h.percentile(75.0, false);
        assert!(p25 < p75);
        assert!((p25 - 1250.0).abs() < 5.0);
        assert!(h.percentile(25.0, true) > p25);
    }

    #[test]
    fn test_bin_from_value_clamps() {
        let h = Histogram::new(&ramp(5000), f64::NAN, f64::NAN);
        assert_eq!(h.bin_from_value(-1e9), 0);
        assert_eq!(h.bin_from_value(1e9), HIST_SIZE - 1);
    }

    #[test]
    fn test_all_blank_is_empty() {
        let data = vec![f32::NAN; 64];
        let h = Histogram::new(&data, f64::NAN, f64::NAN);
        assert_eq!(h.total(), 0);
        assert_eq!(h.data_min(), 0.0);
        assert_eq!(h.stretch_table()[255], f64::MAX);
    }

    #[test]
    fn test_blank_value_skipped() {
        let mut data = ramp(100);
        data.extend(std::iter::repeat(-999.0).take(50));
        let h = Histogram::with_blank(&data, f64::NAN, f64::NAN, Some(-999.0));
        assert_eq!(h.data_min(), 0.0);
        assert_eq!(h.total() + h.counts()[HIST_SIZE], 100);
    }

    #[test]
    fn test_populated_span() {
        let mut counts = vec![0u64; HIST_SIZE + 1];
        counts[10] = 5;
        counts[20] = 5;
        assert_eq!(populated_span(&counts), (10, 21));
    }
}
