//! All-vs-all score matrix between contigs.
use super::aligner::Aligner;
use super::config::{AssemblyConfig, BackendKind};
use super::device::{DeviceBackend, HostDevice};
use super::error::Result;
use std::ops::Range;

/// Square matrix of signed scores, row-major.
/// `get(i, j)` is the score of contig j aligned onto contig i;
/// negative values mean the reverse complement of j aligned better.
/// It is not symmetric in general.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreMatrix {
    size: usize,
    cells: Vec<i8>,
}

impl ScoreMatrix {
    /// Zero-filled matrix.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![0; size * size],
        }
    }
    /// Wrap a row-major buffer. Returns `None` if the length is not `size * size`.
    pub fn from_cells(size: usize, cells: Vec<i8>) -> Option<Self> {
        if cells.len() == size * size {
            Some(Self { size, cells })
        } else {
            None
        }
    }
    pub fn size(&self) -> usize {
        self.size
    }
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> i8 {
        self.cells[i * self.size + j]
    }
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, score: i8) {
        self.cells[i * self.size + j] = score;
    }
    pub fn row(&self, i: usize) -> &[i8] {
        &self.cells[i * self.size..(i + 1) * self.size]
    }
    pub fn cells(&self) -> &[i8] {
        &self.cells
    }
    /// The off-diagonal entry with the largest absolute value, as (row, column, score).
    /// The first one in row-major order wins a tie. `None` if every entry is zero.
    pub fn max_abs_entry(&self) -> Option<(usize, usize, i8)> {
        let mut best: Option<(usize, usize, i8)> = None;
        for i in 0..self.size {
            for (j, &score) in self.row(i).iter().enumerate() {
                let is_better = match best {
                    Some((_, _, b)) => score.unsigned_abs() > b.unsigned_abs(),
                    None => score != 0,
                };
                if i != j && is_better {
                    best = Some((i, j, score));
                }
            }
        }
        best
    }
    /// Remove the entries made impossible by merging `b` into `a` with `score`.
    pub fn invalidate_after_merge(&mut self, a: usize, b: usize, score: i8) {
        let n = self.size;
        self.set(a, b, 0);
        self.set(b, a, 0);
        // The end of `a` is used.
        for j in 0..n {
            self.set(a, j, 0);
        }
        for i in 0..n {
            if self.get(i, a) < 0 {
                self.set(i, a, 0);
            }
        }
        if score >= 0 {
            // The begin of `b` is used.
            for i in 0..n {
                if self.get(i, b) > 0 {
                    self.set(i, b, 0);
                }
            }
        } else {
            // The end of `b` is used.
            for j in 0..n {
                self.set(b, j, 0);
            }
            for i in 0..n {
                if self.get(i, b) < 0 {
                    self.set(i, b, 0);
                }
            }
        }
    }
}

impl std::fmt::Display for ScoreMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for j in 0..self.size {
            write!(f, "\t{}", j)?;
        }
        for i in 0..self.size {
            writeln!(f)?;
            write!(f, "{}", i)?;
            for score in self.row(i) {
                write!(f, "\t{}", score)?;
            }
        }
        Ok(())
    }
}

/// Something computing the score matrix of a set of sequences.
/// Entry (i, j) should be `Aligner::score(seqs[i], seqs[j])` and the diagonal should be zero.
pub trait MatrixBackend: Send + Sync {
    fn name(&self) -> &str;
    fn compute(&self, seqs: &[&[u8]]) -> Result<ScoreMatrix>;
}

/// Fill `rows`, the rows in `range`, of the score matrix.
fn fill_rows(aligner: &Aligner, seqs: &[&[u8]], range: Range<usize>, rows: &mut [i8]) {
    let n = seqs.len();
    for (i, row) in range.zip(rows.chunks_mut(n)) {
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = if i == j {
                0
            } else {
                aligner.score(seqs[i], seqs[j])
            };
        }
    }
}

/// Sequential computation of the score matrix. Used as the reference.
pub fn score_matrix(aligner: &Aligner, seqs: &[&[u8]]) -> ScoreMatrix {
    let mut matrix = ScoreMatrix::new(seqs.len());
    fill_rows(aligner, seqs, 0..seqs.len(), &mut matrix.cells);
    matrix
}

/// Split `0..n` into `w` contiguous ranges as even as possible.
/// The first `n % w` ranges are one longer than the others.
pub fn partition_rows(n: usize, w: usize) -> Vec<Range<usize>> {
    let w = w.max(1);
    let mut start = 0;
    (0..w)
        .map(|k| {
            let len = n / w + if k < n % w { 1 } else { 0 };
            let range = start..start + len;
            start += len;
            range
        })
        .collect()
}

/// Computes the matrix on `threads` threads, the calling one included.
/// Each thread owns a disjoint block of rows.
#[derive(Debug, Clone)]
pub struct ThreadedBackend {
    aligner: Aligner,
    threads: usize,
}

impl ThreadedBackend {
    pub fn new(aligner: Aligner, threads: usize) -> Self {
        let threads = threads.max(1);
        Self { aligner, threads }
    }
}

impl MatrixBackend for ThreadedBackend {
    fn name(&self) -> &str {
        "cpu"
    }
    fn compute(&self, seqs: &[&[u8]]) -> Result<ScoreMatrix> {
        let n = seqs.len();
        if self.threads == 1 || n < 2 {
            return Ok(score_matrix(&self.aligner, seqs));
        }
        let mut matrix = ScoreMatrix::new(n);
        let aligner = &self.aligner;
        let mut jobs = vec![];
        let mut rest: &mut [i8] = &mut matrix.cells;
        for range in partition_rows(n, self.threads) {
            let (rows, tail) = std::mem::take(&mut rest).split_at_mut(range.len() * n);
            rest = tail;
            if !range.is_empty() {
                jobs.push((range, rows));
            }
        }
        std::thread::scope(|scope| {
            let last = jobs.pop();
            for (range, rows) in jobs {
                trace!("Worker on rows {:?}", range);
                scope.spawn(move || fill_rows(aligner, seqs, range, rows));
            }
            if let Some((range, rows)) = last {
                trace!("Main thread on rows {:?}", range);
                fill_rows(aligner, seqs, range, rows);
            }
        });
        Ok(matrix)
    }
}

/// Select the backend at startup. Device initialization errors are returned here,
/// before any cycle starts.
pub fn build_backend(config: &AssemblyConfig, aligner: Aligner) -> Result<Box<dyn MatrixBackend>> {
    match config.backend {
        BackendKind::Cpu => Ok(Box::new(ThreadedBackend::new(aligner, config.threads))),
        BackendKind::Device { platform, device } => {
            let device = HostDevice::initialize(platform, device, aligner)?;
            Ok(Box::new(DeviceBackend::new(device, config.work_group_size)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_xoshiro::Xoshiro256StarStar;
    fn random_seqs(seed: u64, num: usize) -> Vec<Vec<u8>> {
        let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(seed);
        (0..num)
            .map(|_| {
                let len = rng.gen_range(5..30);
                (0..len).map(|_| b"ATGC"[rng.gen_range(0..4)]).collect()
            })
            .collect()
    }
    #[test]
    fn partition() {
        assert_eq!(partition_rows(10, 3), vec![0..4, 4..7, 7..10]);
        assert_eq!(partition_rows(2, 4), vec![0..1, 1..2, 2..2, 2..2]);
        assert_eq!(partition_rows(0, 2), vec![0..0, 0..0]);
        assert_eq!(partition_rows(5, 1), vec![0..5]);
    }
    #[test]
    fn reference_matrix() {
        let seqs: Vec<&[u8]> = vec![&b"AAAA"[..], &b"TTTT"[..], &b"GGGG"[..]];
        let matrix = score_matrix(&Aligner::default(), &seqs);
        assert_eq!(matrix.size(), 3);
        assert_eq!(matrix.row(0), &[0, -100, 0]);
        assert_eq!(matrix.row(1), &[-100, 0, 0]);
        assert_eq!(matrix.row(2), &[0, 0, 0]);
    }
    #[test]
    fn threaded_equals_reference() {
        let aligner = Aligner::default();
        for (seed, num) in vec![(1, 1), (2, 3), (3, 7), (4, 12)] {
            let seqs = random_seqs(seed, num);
            let seqs: Vec<&[u8]> = seqs.iter().map(|s| s.as_slice()).collect();
            let reference = score_matrix(&aligner, &seqs);
            for threads in 1..6 {
                let backend = ThreadedBackend::new(aligner, threads);
                assert_eq!(backend.compute(&seqs).unwrap(), reference);
            }
        }
    }
    #[test]
    fn max_abs() {
        let mut matrix = ScoreMatrix::new(3);
        assert_eq!(matrix.max_abs_entry(), None);
        matrix.set(0, 2, 40);
        matrix.set(1, 0, -70);
        matrix.set(2, 1, 70);
        assert_eq!(matrix.max_abs_entry(), Some((1, 0, -70)));
        matrix.set(1, 1, 100);
        assert_eq!(matrix.max_abs_entry(), Some((1, 0, -70)));
    }
    #[test]
    fn invalidate_direct() {
        let cells = vec![
            0, 80, 10, -20, //
            30, 0, 40, -50, //
            60, 70, 0, -10, //
            -90, 20, 30, 0,
        ];
        let mut matrix = ScoreMatrix::from_cells(4, cells).unwrap();
        matrix.invalidate_after_merge(0, 1, 80);
        let expected = vec![
            0, 0, 0, 0, //
            0, 0, 40, -50, //
            60, 0, 0, -10, //
            0, 0, 30, 0,
        ];
        assert_eq!(matrix.cells(), expected.as_slice());
    }
    #[test]
    fn invalidate_reverse() {
        let cells = vec![
            0, -80, 10, -20, //
            30, 0, 40, -50, //
            60, -70, 0, -10, //
            -90, 20, 30, 0,
        ];
        let mut matrix = ScoreMatrix::from_cells(4, cells).unwrap();
        matrix.invalidate_after_merge(0, 1, -80);
        let expected = vec![
            0, 0, 0, 0, //
            0, 0, 0, 0, //
            60, 0, 0, -10, //
            0, 20, 30, 0,
        ];
        assert_eq!(matrix.cells(), expected.as_slice());
    }
    #[test]
    fn display() {
        let matrix = ScoreMatrix::from_cells(2, vec![0, 12, -3, 0]).unwrap();
        assert_eq!(format!("{}", matrix), "\t0\t1\n0\t0\t12\n1\t-3\t0");
        assert!(ScoreMatrix::from_cells(2, vec![0; 3]).is_none());
    }
}
