use super::error::{AssemblyError, Result};

/// Index of each symbol in the scoring table.
/// Any symbol other than A, T, G, and C is treated as X.
#[inline]
pub fn symbol_index(base: u8) -> usize {
    match base {
        b'A' => 0,
        b'T' => 1,
        b'G' => 2,
        b'C' => 3,
        _ => 4,
    }
}

pub const DEFAULT_SCHEME: ScoringScheme = ScoringScheme {
    table: [
        // A, T, G, C, X
        [1, -1, -1, -1, -1],
        [-1, 1, -1, -1, -1],
        [-1, -1, 1, -1, -1],
        [-1, -1, -1, 1, -1],
        [-1, -1, -1, -1, -1],
    ],
    gap: -1,
};

/// Substitution table over A,T,G,C, and X with a linear gap penalty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringScheme {
    /// table[x][y] is the score of aligning x to y, in the order of A,T,G,C,X.
    pub table: [[i8; 5]; 5],
    /// Score of a gap. Should be negative.
    pub gap: i8,
}

impl Default for ScoringScheme {
    fn default() -> Self {
        DEFAULT_SCHEME
    }
}

impl ScoringScheme {
    pub fn new(table: [[i8; 5]; 5], gap: i8) -> Self {
        Self { table, gap }
    }
    #[inline]
    pub fn score(&self, x: u8, y: u8) -> i32 {
        self.table[symbol_index(x)][symbol_index(y)] as i32
    }
    /// The best value in the table, i.e., the score of a perfect column.
    pub fn best(&self) -> i32 {
        self.table
            .iter()
            .flat_map(|row| row.iter())
            .copied()
            .max()
            .unwrap_or(0) as i32
    }
}

pub const DEFAULT_CONFIG: AssemblyConfig = AssemblyConfig {
    required_score: 60,
    threads: 1,
    backend: BackendKind::Cpu,
    work_group_size: 1,
};

/// Where the score matrix is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Cpu,
    Device { platform: usize, device: usize },
}

/// Parameters of an assembly run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyConfig {
    /// Minimum absolute score to merge two contigs. (0,100].
    pub required_score: u32,
    /// Number of threads including the calling one.
    pub threads: usize,
    pub backend: BackendKind,
    /// Number of cells in a work group of the device backend.
    pub work_group_size: usize,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        DEFAULT_CONFIG
    }
}

impl std::fmt::Display for AssemblyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "requiredScore={}", self.required_score)?;
        writeln!(f, "threads={}", self.threads)?;
        match self.backend {
            BackendKind::Cpu => write!(f, "backend=cpu"),
            BackendKind::Device { platform, device } => {
                writeln!(f, "backend=device")?;
                writeln!(f, "platform={}", platform)?;
                writeln!(f, "device={}", device)?;
                write!(f, "workGroupSize={}", self.work_group_size)
            }
        }
    }
}

impl AssemblyConfig {
    pub fn new(required_score: u32, threads: usize) -> Self {
        Self {
            required_score,
            threads,
            ..DEFAULT_CONFIG
        }
    }
    pub fn with_device(mut self, platform: usize, device: usize, work_group_size: usize) -> Self {
        self.backend = BackendKind::Device { platform, device };
        self.work_group_size = work_group_size;
        self
    }
    pub fn validate(&self) -> Result<()> {
        if self.required_score == 0 || self.required_score > 100 {
            return Err(AssemblyError::InvalidConfig(format!(
                "expected a required score in (0,100], got {}",
                self.required_score
            )));
        }
        if self.threads == 0 {
            return Err(AssemblyError::InvalidConfig(
                "expected a number of threads >= 1".to_string(),
            ));
        }
        if self.work_group_size == 0 {
            return Err(AssemblyError::InvalidConfig(
                "expected a work group size >= 1".to_string(),
            ));
        }
        Ok(())
    }
    /// Whether more threads are requested than the hardware runs in parallel.
    /// `None` if the hardware limit is unknown.
    pub fn exceeds_hardware(&self) -> Option<bool> {
        std::thread::available_parallelism()
            .ok()
            .map(|max| max.get() < self.threads)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn default_scheme() {
        assert_eq!(DEFAULT_SCHEME.best(), 1);
        assert_eq!(DEFAULT_SCHEME.score(b'A', b'A'), 1);
        assert_eq!(DEFAULT_SCHEME.score(b'A', b'T'), -1);
        assert_eq!(DEFAULT_SCHEME.score(b'X', b'X'), -1);
        assert_eq!(DEFAULT_SCHEME.score(b'N', b'N'), -1);
        for x in b"ATGCX" {
            for y in b"ATGCX" {
                assert_eq!(DEFAULT_SCHEME.score(*x, *y), DEFAULT_SCHEME.score(*y, *x));
            }
        }
    }
    #[test]
    fn validate() {
        assert!(DEFAULT_CONFIG.validate().is_ok());
        assert!(AssemblyConfig::new(100, 2).validate().is_ok());
        assert!(AssemblyConfig::new(0, 1).validate().is_err());
        assert!(AssemblyConfig::new(101, 1).validate().is_err());
        assert!(AssemblyConfig::new(60, 0).validate().is_err());
        let config = AssemblyConfig::new(60, 1).with_device(0, 0, 0);
        assert!(config.validate().is_err());
    }
    #[test]
    fn out_of_range_score() {
        match AssemblyConfig::new(300, 1).validate() {
            Err(AssemblyError::InvalidConfig(msg)) => {
                assert!(msg.contains("(0,100]"));
                assert!(msg.contains("300"));
            }
            x => panic!("{:?}", x),
        }
    }
    #[test]
    fn hardware_limit() {
        assert_ne!(AssemblyConfig::new(60, usize::MAX).exceeds_hardware(), Some(false));
        assert_ne!(AssemblyConfig::new(60, 1).exceeds_hardware(), Some(true));
    }
    #[test]
    fn display() {
        let config = AssemblyConfig::new(70, 4);
        assert_eq!(format!("{}", config), "requiredScore=70\nthreads=4\nbackend=cpu");
    }
}
