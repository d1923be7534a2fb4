//! The set of contigs under assembly.
//!
//! Contigs live in an arena and are addressed by handles. Two lists of handles are kept:
//! the authoritative list, which only contains live contigs, and the working list,
//! which is what positions (the rows and columns of the score matrix) refer to.
//! While merging, several slots of the working list may point to the same contig.
//! `sync` makes the working list equal to the authoritative list again,
//! and reclaims the arena slots of the absorbed contigs.
use super::aligner::{revcmp, Aligner};
use super::error::{AssemblyError, Result};
use packed_sequence::EncodedSequence;
use std::collections::BTreeSet;

/// Handle to a contig in the arena. Valid until the next `sync`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContigId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contig {
    reads: BTreeSet<usize>,
    seq: Vec<u8>,
}

impl Contig {
    /// Indices of the reads merged into this contig.
    pub fn reads(&self) -> &BTreeSet<usize> {
        &self.reads
    }
    /// Consensus sequence over A,T,G,C, and X.
    pub fn seq(&self) -> &[u8] {
        &self.seq
    }
}

#[derive(Debug, Clone)]
pub struct ContigStore {
    aligner: Aligner,
    read_names: Vec<String>,
    arena: Vec<Option<Contig>>,
    authoritative: Vec<ContigId>,
    working: Vec<ContigId>,
}

impl ContigStore {
    /// Create one contig per read.
    pub fn new(reads: &[EncodedSequence], aligner: Aligner) -> Self {
        let arena: Vec<_> = reads
            .iter()
            .enumerate()
            .map(|(idx, read)| {
                let mut ids = BTreeSet::new();
                ids.insert(idx);
                Some(Contig {
                    reads: ids,
                    seq: read.decode(),
                })
            })
            .collect();
        let read_names = reads.iter().map(|r| r.name().to_string()).collect();
        let authoritative = (0..arena.len()).map(ContigId).collect();
        let mut store = Self {
            aligner,
            read_names,
            arena,
            authoritative,
            working: vec![],
        };
        store.sync();
        store
    }
    /// Number of live contigs.
    pub fn num_contigs(&self) -> usize {
        self.authoritative.len()
    }
    /// Number of addressable positions, fixed at the last sync.
    pub fn num_slots(&self) -> usize {
        self.working.len()
    }
    pub fn read_names(&self) -> &[String] {
        &self.read_names
    }
    fn resolve(&self, slot: usize) -> Option<&Contig> {
        self.working
            .get(slot)
            .and_then(|&ContigId(h)| self.arena[h].as_ref())
    }
    /// The contig at `slot` of the working list.
    pub fn get(&self, slot: usize) -> Option<&Contig> {
        self.resolve(slot)
    }
    /// The sequence of the contig at `slot`.
    /// # Panics
    /// If `slot` is out of range.
    pub fn seq(&self, slot: usize) -> &[u8] {
        match self.resolve(slot) {
            Some(contig) => contig.seq(),
            None => panic!("slot {} is out of {} slots", slot, self.num_slots()),
        }
    }
    /// The length of the contig at `slot`.
    pub fn size(&self, slot: usize) -> usize {
        self.seq(slot).len()
    }
    /// Snapshot of the sequences in the working list order.
    pub fn sequences(&self) -> Vec<&[u8]> {
        (0..self.num_slots()).map(|slot| self.seq(slot)).collect()
    }
    /// Whether two slots point to the same contig.
    pub fn same_contig(&self, slot1: usize, slot2: usize) -> bool {
        match (self.working.get(slot1), self.working.get(slot2)) {
            (Some(h1), Some(h2)) => h1 == h2,
            _ => false,
        }
    }
    /// Live contigs in the authoritative order.
    pub fn contigs(&self) -> impl Iterator<Item = &Contig> {
        self.authoritative
            .iter()
            .filter_map(move |&ContigId(h)| self.arena[h].as_ref())
    }
    /// Merge the contig at `slot2` into the contig at `slot1`.
    /// If `score` is negative, the sequence of the second contig is reverse-complemented
    /// before merging. Every slot pointing to the second contig is redirected to the first,
    /// and the second contig is removed from the authoritative list.
    /// On error, nothing is modified.
    pub fn merge(&mut self, slot1: usize, slot2: usize, score: i8) -> Result<()> {
        let slots = self.num_slots();
        if slot1 >= slots || slot2 >= slots {
            return Err(AssemblyError::InvalidArgument(format!(
                "contig ids ({}, {}) out of {} known contigs",
                slot1, slot2, slots
            )));
        }
        if slot1 == slot2 {
            return Err(AssemblyError::InvalidArgument(format!(
                "first and second id have the same value ({})",
                slot1
            )));
        }
        let (keep, gone) = (self.working[slot1], self.working[slot2]);
        if keep == gone {
            return Err(AssemblyError::InvalidArgument(format!(
                "ids {} and {} already point to the same contig",
                slot1, slot2
            )));
        }
        let seq = match (self.arena[keep.0].as_ref(), self.arena[gone.0].as_ref()) {
            (Some(c1), Some(c2)) if score >= 0 => self.aligner.consensus(&c1.seq, &c2.seq),
            (Some(c1), Some(c2)) => self.aligner.consensus(&c1.seq, &revcmp(&c2.seq)),
            _ => {
                return Err(AssemblyError::InvalidArgument(format!(
                    "ids {} and {} refer to a removed contig",
                    slot1, slot2
                )))
            }
        };
        // From here, no failure.
        let absorbed = self.arena[gone.0].take().map(|c| c.reads).unwrap_or_default();
        if let Some(contig) = self.arena[keep.0].as_mut() {
            contig.seq = seq;
            contig.reads.extend(absorbed);
        }
        self.working
            .iter_mut()
            .filter(|h| **h == gone)
            .for_each(|h| *h = keep);
        self.authoritative.retain(|&h| h != gone);
        Ok(())
    }
    /// Make the working list equal to the authoritative list, and compact the arena.
    pub fn sync(&mut self) {
        let old = &mut self.arena;
        let arena: Vec<_> = self
            .authoritative
            .iter()
            .filter_map(|&ContigId(h)| old[h].take())
            .map(Some)
            .collect();
        self.arena = arena;
        self.authoritative = (0..self.arena.len()).map(ContigId).collect();
        self.working = self.authoritative.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    fn store(seqs: &[&[u8]]) -> ContigStore {
        let reads: Vec<_> = seqs
            .iter()
            .enumerate()
            .map(|(i, s)| EncodedSequence::encode(&format!("r{}", i), s).unwrap())
            .collect();
        ContigStore::new(&reads, Aligner::default())
    }
    fn all_reads(store: &ContigStore) -> Vec<usize> {
        let mut reads: Vec<_> = store.contigs().flat_map(|c| c.reads().iter().copied()).collect();
        reads.sort();
        reads
    }
    #[test]
    fn init() {
        let store = store(&[b"ACGT", b"GGA", b""]);
        assert_eq!(store.num_contigs(), 3);
        assert_eq!(store.num_slots(), 3);
        assert_eq!(store.seq(0), b"ACGT");
        assert_eq!(store.size(1), 3);
        assert_eq!(store.size(2), 0);
        assert_eq!(store.read_names(), &["r0", "r1", "r2"]);
        assert_eq!(all_reads(&store), vec![0, 1, 2]);
    }
    #[test]
    fn merge_direct() {
        let mut store = store(&[b"AAAACCCGT", b"CCCGTGGGG", b"TTT"]);
        store.merge(0, 1, 55).unwrap();
        assert_eq!(store.num_contigs(), 2);
        assert_eq!(store.num_slots(), 3);
        assert!(store.same_contig(0, 1));
        assert_eq!(store.seq(1), b"AAAACCCGTGGGG");
        assert_eq!(all_reads(&store), vec![0, 1, 2]);
        store.sync();
        assert_eq!(store.num_slots(), 2);
        assert_eq!(store.seq(0), b"AAAACCCGTGGGG");
        assert_eq!(store.seq(1), b"TTT");
        let first: Vec<_> = store.get(0).unwrap().reads().iter().copied().collect();
        assert_eq!(first, vec![0, 1]);
    }
    #[test]
    fn merge_reverse() {
        let mut store = store(&[b"AAAA", b"TTTT"]);
        store.merge(0, 1, -100).unwrap();
        store.sync();
        assert_eq!(store.num_contigs(), 1);
        assert_eq!(store.seq(0), b"AAAA");
    }
    #[test]
    fn merge_chain_before_sync() {
        let mut store = store(&[b"ACGTT", b"GTTCA", b"TCAGG", b"CCCC"]);
        store.merge(0, 1, 60).unwrap();
        // Slot 1 now refers to contig 0.
        store.merge(2, 1, 60).unwrap();
        assert!(store.same_contig(0, 2));
        assert!(store.same_contig(1, 2));
        assert_eq!(store.num_contigs(), 2);
        assert_eq!(all_reads(&store), vec![0, 1, 2, 3]);
        store.sync();
        assert_eq!(store.num_slots(), 2);
        let sizes: Vec<_> = store.contigs().map(|c| c.reads().len()).collect();
        assert_eq!(sizes, vec![3, 1]);
    }
    #[test]
    fn sync_compacts_arena() {
        let mut store = store(&[b"AAAA", b"AAAA", b"CCGG", b"CCGG", b"TTAT"]);
        store.merge(0, 1, 100).unwrap();
        store.merge(3, 2, 100).unwrap();
        store.merge(1, 4, 10).unwrap();
        assert_eq!(store.num_contigs(), 2);
        assert_eq!(store.num_slots(), 5);
        store.sync();
        assert_eq!(store.num_slots(), 2);
        assert!(!store.same_contig(0, 1));
        let reads: Vec<Vec<usize>> = store
            .contigs()
            .map(|c| c.reads().iter().copied().collect())
            .collect();
        assert_eq!(reads, vec![vec![0, 1, 4], vec![2, 3]]);
        assert_eq!(all_reads(&store), vec![0, 1, 2, 3, 4]);
        // A second sync is a no-op.
        store.sync();
        assert_eq!(store.num_slots(), 2);
        assert_eq!(store.num_contigs(), 2);
    }
    #[test]
    fn invalid_merge() {
        let mut store = store(&[b"ACGT", b"ACGT", b"TTGA"]);
        assert!(store.merge(0, 0, 10).is_err());
        assert!(store.merge(0, 3, 10).is_err());
        assert!(store.merge(5, 1, 10).is_err());
        store.merge(0, 1, 100).unwrap();
        let before: Vec<_> = store.contigs().cloned().collect();
        assert!(store.merge(1, 0, 100).is_err());
        let after: Vec<_> = store.contigs().cloned().collect();
        assert_eq!(before, after);
        assert_eq!(store.num_contigs(), 2);
    }
}
