//! Greedy iterative assembly.
//!
//! Each cycle computes the score matrix of the current contigs, merges the best pairs
//! as long as their score reaches the required score, and synchronizes the contig store.
//! The assembly stops when a cycle does not reduce the number of contigs.
use super::aligner::Aligner;
use super::config::AssemblyConfig;
use super::contigs::ContigStore;
use super::error::{AssemblyError, Result};
use super::score_matrix::{MatrixBackend, ScoreMatrix};
use packed_sequence::EncodedSequence;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Scoring,
    Merging,
    Syncing,
    CheckConverged,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleSummary {
    pub cycle: usize,
    pub contigs_before: usize,
    pub merges: usize,
    pub contigs_after: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyReport {
    pub cycles: Vec<CycleSummary>,
}

impl AssemblyReport {
    pub fn num_cycles(&self) -> usize {
        self.cycles.len()
    }
    pub fn total_merges(&self) -> usize {
        self.cycles.iter().map(|c| c.merges).sum()
    }
}

/// A final contig with the names of its reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssembledContig {
    pub reads: Vec<String>,
    pub seq: String,
}

pub struct Assembler<'a> {
    store: ContigStore,
    backend: &'a dyn MatrixBackend,
    required_score: u32,
    phase: Phase,
    matrix: Option<ScoreMatrix>,
    current: CycleSummary,
    report: AssemblyReport,
}

impl<'a> Assembler<'a> {
    /// Create one contig per read. Fails if there is no read.
    pub fn new(
        reads: &[EncodedSequence],
        aligner: Aligner,
        config: &AssemblyConfig,
        backend: &'a dyn MatrixBackend,
    ) -> Result<Self> {
        config.validate()?;
        match config.exceeds_hardware() {
            Some(true) => warn!(
                "{} threads requested, more than the hardware runs in parallel.",
                config.threads
            ),
            Some(false) => {}
            None => warn!("Impossible to know the hardware limit on the number of threads."),
        }
        if reads.is_empty() {
            return Err(AssemblyError::Input("no reads to assemble".to_string()));
        }
        let store = ContigStore::new(reads, aligner);
        info!("number of contigs = {}", store.num_contigs());
        Ok(Self {
            store,
            backend,
            required_score: config.required_score,
            phase: Phase::Scoring,
            matrix: None,
            current: CycleSummary {
                cycle: 0,
                contigs_before: 0,
                merges: 0,
                contigs_after: 0,
            },
            report: AssemblyReport::default(),
        })
    }
    pub fn phase(&self) -> Phase {
        self.phase
    }
    pub fn store(&self) -> &ContigStore {
        &self.store
    }
    pub fn report(&self) -> &AssemblyReport {
        &self.report
    }
    /// Run one phase, and return the next one.
    pub fn step(&mut self) -> Result<Phase> {
        self.phase = match self.phase {
            Phase::Scoring => self.scoring()?,
            Phase::Merging => self.merging()?,
            Phase::Syncing => self.syncing(),
            Phase::CheckConverged => self.check_converged(),
            Phase::Done => Phase::Done,
        };
        Ok(self.phase)
    }
    /// Run until no merge happens in a cycle.
    pub fn run(&mut self) -> Result<&AssemblyReport> {
        while self.step()? != Phase::Done {}
        Ok(&self.report)
    }
    fn scoring(&mut self) -> Result<Phase> {
        let cycle = self.report.num_cycles() + 1;
        let contigs_before = self.store.num_contigs();
        info!("===== Cycle {} start =====", cycle);
        self.current = CycleSummary {
            cycle,
            contigs_before,
            merges: 0,
            contigs_after: contigs_before,
        };
        debug!("Scoring {} contigs on {}", contigs_before, self.backend.name());
        let matrix = self.backend.compute(&self.store.sequences())?;
        debug!("---- matrix of scores ----\n{}", matrix);
        self.matrix = Some(matrix);
        Ok(Phase::Merging)
    }
    fn merging(&mut self) -> Result<Phase> {
        let mut matrix = match self.matrix.take() {
            Some(matrix) => matrix,
            None => return Ok(Phase::Syncing),
        };
        let required = self.required_score;
        while let Some((i, j, score)) = matrix.max_abs_entry() {
            if u32::from(score.unsigned_abs()) < required {
                break;
            }
            if self.store.same_contig(i, j) {
                trace!("{} and {} are already merged.", i, j);
                matrix.set(i, j, 0);
                continue;
            }
            self.store.merge(i, j, score)?;
            debug!("Merged {} <- {} (score {})", i, j, score);
            matrix.invalidate_after_merge(i, j, score);
            self.current.merges += 1;
        }
        Ok(Phase::Syncing)
    }
    fn syncing(&mut self) -> Phase {
        self.store.sync();
        self.current.contigs_after = self.store.num_contigs();
        Phase::CheckConverged
    }
    fn check_converged(&mut self) -> Phase {
        let summary = self.current;
        info!("nb contigs merged = {}", summary.contigs_before - summary.contigs_after);
        info!("nb contigs remaining = {}", summary.contigs_after);
        self.report.cycles.push(summary);
        if summary.contigs_before == summary.contigs_after {
            info!("No evolution. Stopping.");
            Phase::Done
        } else {
            Phase::Scoring
        }
    }
    /// The final contigs with the names of their reads.
    pub fn contigs(&self) -> Vec<AssembledContig> {
        let names = self.store.read_names();
        self.store
            .contigs()
            .map(|contig| AssembledContig {
                reads: contig.reads().iter().map(|&r| names[r].clone()).collect(),
                seq: contig.seq().iter().map(|&b| b as char).collect(),
            })
            .collect()
    }
}
