//! Pairwise alignment between contigs.
//! `score` is a semi-global, orientation-aware similarity in [-100,100],
//! and `consensus` merges two sequences along their best alignment.
use super::config::ScoringScheme;

/// Upper bound of the absolute value of a score.
pub const MAX_SCORE: i8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trace {
    Stop,
    Diagonal,
    // Consume seq2 only.
    Left,
    // Consume seq1 only.
    Up,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Aligner {
    scheme: ScoringScheme,
}

impl Aligner {
    pub fn new(scheme: ScoringScheme) -> Self {
        Self { scheme }
    }
    pub fn scheme(&self) -> &ScoringScheme {
        &self.scheme
    }
    /// Score of `read2` aligned onto `read1`.
    /// The alignment can start anywhere in `read1`, but `read2` is anchored at its start.
    /// Either read may end early.
    /// The same is done for the reverse complement of `read2`, and
    /// the larger one is returned, negated if the reverse complement wins.
    /// Ties go to the direct orientation.
    pub fn score(&self, read1: &[u8], read2: &[u8]) -> i8 {
        let direct = self.directed_score(read1, read2);
        let reverse = self.directed_score(read1, &revcmp(read2));
        if direct < reverse {
            -reverse
        } else {
            direct
        }
    }
    /// Normalized score in [0,100] without reversing.
    /// Only two rows of the DP table are kept.
    fn directed_score(&self, read1: &[u8], read2: &[u8]) -> i8 {
        if read1.is_empty() || read2.is_empty() {
            return 0;
        }
        let gap = self.scheme.gap as i32;
        let n2 = read2.len();
        let mut prev: Vec<i32> = (0..=n2 as i32).map(|j| j * gap).collect();
        let mut next = vec![0; n2 + 1];
        let mut best = prev[n2];
        for &x in read1 {
            next[0] = 0;
            for j in 1..=n2 {
                let diag = prev[j - 1] + self.scheme.score(x, read2[j - 1]);
                let left = next[j - 1] + gap;
                let up = prev[j] + gap;
                next[j] = diag.max(left).max(up);
            }
            best = best.max(next[n2]);
            std::mem::swap(&mut prev, &mut next);
        }
        // `prev` is the last row.
        best = prev.iter().fold(best, |best, &x| best.max(x));
        let max = self.scheme.best() as i64 * read1.len().min(read2.len()) as i64;
        if max <= 0 {
            return 0;
        }
        (100 * best as i64 / max).max(0).min(MAX_SCORE as i64) as i8
    }
    /// Merge two sequences along their alignment.
    /// `seq1` may start anywhere, while leading gaps on `seq2` are penalized.
    /// Gaps after the end of either sequence are free.
    /// Mismatched columns become `X`, gapped columns keep the present base.
    pub fn consensus(&self, seq1: &[u8], seq2: &[u8]) -> Vec<u8> {
        let (n1, n2) = (seq1.len(), seq2.len());
        let gap = self.scheme.gap as i32;
        let width = n2 + 1;
        let mut dp = vec![0i32; (n1 + 1) * width];
        let mut trace = vec![Trace::Stop; (n1 + 1) * width];
        for j in 1..=n2 {
            dp[j] = dp[j - 1] + gap;
            trace[j] = Trace::Left;
        }
        for i in 1..=n1 {
            trace[i * width] = Trace::Up;
            let left_gap = if i == n1 { 0 } else { gap };
            for j in 1..=n2 {
                let up_gap = if j == n2 { 0 } else { gap };
                let mut score =
                    dp[(i - 1) * width + j - 1] + self.scheme.score(seq1[i - 1], seq2[j - 1]);
                let mut from = Trace::Diagonal;
                let left = dp[i * width + j - 1] + left_gap;
                if left > score {
                    score = left;
                    from = Trace::Left;
                }
                let up = dp[(i - 1) * width + j] + up_gap;
                if up > score {
                    score = up;
                    from = Trace::Up;
                }
                dp[i * width + j] = score;
                trace[i * width + j] = from;
            }
        }
        let (mut i, mut j) = (n1, n2);
        let mut consensus = Vec::with_capacity(n1 + n2);
        loop {
            match trace[i * width + j] {
                Trace::Stop => break,
                Trace::Diagonal => {
                    let (x, y) = (seq1[i - 1], seq2[j - 1]);
                    consensus.push(if x == y { x } else { b'X' });
                    i -= 1;
                    j -= 1;
                }
                Trace::Left => {
                    consensus.push(seq2[j - 1]);
                    j -= 1;
                }
                Trace::Up => {
                    consensus.push(seq1[i - 1]);
                    i -= 1;
                }
            }
        }
        consensus.reverse();
        consensus
    }
}

/// Reverse complement. Symbols other than A, T, G, and C are kept as they are.
pub fn revcmp(seq: &[u8]) -> Vec<u8> {
    seq.iter()
        .rev()
        .map(|&base| match base {
            b'A' => b'T',
            b'T' => b'A',
            b'G' => b'C',
            b'C' => b'G',
            b'X' => b'X',
            other => {
                trace!("Non-standard symbol '{}' kept in reverse complement.", other as char);
                other
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_xoshiro::Xoshiro256StarStar;
    fn random_seq<R: Rng>(rng: &mut R, len: usize) -> Vec<u8> {
        (0..len).map(|_| b"ATGC"[rng.gen_range(0..4)]).collect()
    }
    #[test]
    fn revcmp_test() {
        assert_eq!(revcmp(b"AATGC"), b"GCATT".to_vec());
        assert_eq!(revcmp(b"AXN"), b"NXT".to_vec());
        assert!(revcmp(b"").is_empty());
    }
    #[test]
    fn self_score() {
        let aligner = Aligner::default();
        let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(42);
        for len in 1..60 {
            let read = random_seq(&mut rng, len);
            assert_eq!(aligner.directed_score(&read, &read), 100);
            assert_eq!(aligner.score(&read, &read), 100);
        }
    }
    #[test]
    fn score_bound() {
        let aligner = Aligner::default();
        let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(4_324);
        for _ in 0..200 {
            let len1 = rng.gen_range(0..40);
            let len2 = rng.gen_range(0..40);
            let read1 = random_seq(&mut rng, len1);
            let read2 = random_seq(&mut rng, len2);
            let score = aligner.score(&read1, &read2);
            assert!(-100 <= score && score <= 100, "{}", score);
        }
    }
    #[test]
    fn orientation() {
        let aligner = Aligner::default();
        assert_eq!(aligner.score(b"AAAA", b"TTTT"), -100);
        assert_eq!(aligner.score(b"TTTT", b"AAAA"), -100);
        assert_eq!(aligner.score(b"AAAA", b"GGGG"), 0);
        assert_eq!(aligner.score(b"AAAA", b""), 0);
        assert_eq!(aligner.score(b"", b"AAAA"), 0);
    }
    #[test]
    fn overlap_and_containment() {
        let aligner = Aligner::default();
        // The last five bases of read1 are the first five of read2.
        assert_eq!(aligner.score(b"AAAACCCGT", b"CCCGTGGGG"), 55);
        assert_eq!(aligner.score(b"ACGTACGTAA", b"GTAC"), 100);
    }
    #[test]
    fn consensus_simple() {
        let aligner = Aligner::default();
        assert_eq!(aligner.consensus(b"AAAA", b"AAAA"), b"AAAA".to_vec());
        assert_eq!(aligner.consensus(b"ACGT", b"AGGT"), b"AXGT".to_vec());
        assert_eq!(
            aligner.consensus(b"AAAACCCGT", b"CCCGTGGGG"),
            b"AAAACCCGTGGGG".to_vec()
        );
        assert_eq!(
            aligner.consensus(b"ACGTACGTAA", b"GTAC"),
            b"ACGTACGTAA".to_vec()
        );
        assert_eq!(aligner.consensus(b"", b"ACG"), b"ACG".to_vec());
        assert_eq!(aligner.consensus(b"ACG", b""), b"ACG".to_vec());
    }
    #[test]
    fn consensus_bound() {
        let aligner = Aligner::default();
        let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(9_832);
        for _ in 0..200 {
            let len1 = rng.gen_range(0..50);
            let len2 = rng.gen_range(0..50);
            let seq1 = random_seq(&mut rng, len1);
            let seq2 = random_seq(&mut rng, len2);
            let consensus = aligner.consensus(&seq1, &seq2);
            assert!(consensus.len() <= len1 + len2);
            assert!(consensus.len() >= len1.max(len2));
            assert!(consensus.iter().all(|b| b"ATGCX".contains(b)));
        }
    }
}
