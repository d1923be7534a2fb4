//! Reading reads from FASTA files.
//!
//! Ambiguous IUPAC codes are resolved into A, T, G, or C according to an explicit
//! [AmbiguityPolicy], so that the same file with the same policy always gives the same reads.
use super::error::{AssemblyError, Result};
use packed_sequence::EncodedSequence;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;
use std::io::{BufRead, BufReader};
use std::path::Path;

pub const DEFAULT_SEED: u64 = 24_039_880;

/// What to do with a base other than A, T, G, and C.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmbiguityPolicy {
    /// Pick one of the candidates at random, with a seeded generator.
    Random { seed: u64 },
    /// Pick the first candidate, e.g., A for N and G for S.
    First,
    /// Fail.
    Reject,
}

impl Default for AmbiguityPolicy {
    fn default() -> Self {
        AmbiguityPolicy::Random { seed: DEFAULT_SEED }
    }
}

impl std::str::FromStr for AmbiguityPolicy {
    type Err = AssemblyError;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "random" => Ok(Self::default()),
            "first" => Ok(AmbiguityPolicy::First),
            "reject" => Ok(AmbiguityPolicy::Reject),
            _ => Err(AssemblyError::InvalidConfig(format!(
                "unknown ambiguity policy '{}' (random, first, or reject)",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    id: String,
    seq: Vec<u8>,
}

impl Record {
    pub fn new(id: &str, seq: &[u8]) -> Self {
        Self {
            id: id.to_string(),
            seq: seq.to_vec(),
        }
    }
    pub fn id(&self) -> &str {
        &self.id
    }
    pub fn seq(&self) -> &[u8] {
        &self.seq
    }
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, ">{}", self.id)?;
        write!(f, "{}", String::from_utf8_lossy(&self.seq))
    }
}

/// Candidates of an IUPAC code. Unknown letters are treated as N.
fn candidates(base: u8) -> &'static [u8] {
    match base {
        b'A' => b"A",
        b'T' | b'U' => b"T",
        b'G' => b"G",
        b'C' => b"C",
        b'R' => b"AG",
        b'Y' => b"TC",
        b'K' => b"TG",
        b'M' => b"AC",
        b'S' => b"GC",
        b'W' => b"AT",
        b'B' => b"TGC",
        b'D' => b"ATG",
        b'H' => b"ATC",
        b'V' => b"AGC",
        b'N' => b"ATGC",
        _ => {
            warn!("Unknown letter: {}. Treated as N.", base as char);
            b"ATGC"
        }
    }
}

struct Resolver {
    policy: AmbiguityPolicy,
    rng: Xoshiro256StarStar,
}

impl Resolver {
    fn new(policy: AmbiguityPolicy) -> Self {
        let seed = match policy {
            AmbiguityPolicy::Random { seed } => seed,
            _ => DEFAULT_SEED,
        };
        let rng = SeedableRng::seed_from_u64(seed);
        Self { policy, rng }
    }
    fn resolve(&mut self, base: u8, id: &str) -> Result<u8> {
        let cands = candidates(base.to_ascii_uppercase());
        if cands.len() == 1 {
            return Ok(cands[0]);
        }
        match self.policy {
            AmbiguityPolicy::First => Ok(cands[0]),
            AmbiguityPolicy::Random { .. } => Ok(cands[self.rng.gen_range(0..cands.len())]),
            AmbiguityPolicy::Reject => Err(AssemblyError::Input(format!(
                "ambiguous base '{}' in {}",
                base as char, id
            ))),
        }
    }
}

/// Parse FASTA records from `reader`.
/// A line starting with '>' opens a record, and an empty line closes it.
/// A sequence line containing a space discards the whole record.
/// Records without any base are dropped.
pub fn parse<R: std::io::Read>(reader: R, policy: AmbiguityPolicy) -> Result<Vec<Record>> {
    let mut resolver = Resolver::new(policy);
    let mut records = vec![];
    let mut name: Option<String> = None;
    let mut seq = vec![];
    for line in BufReader::new(reader).lines() {
        let line = line?;
        let line = line.trim_end_matches(|c| c == '\r' || c == '\n');
        if line.is_empty() || line.starts_with('>') {
            if let Some(id) = name.take() {
                push_record(&mut records, id, std::mem::take(&mut seq));
            }
            seq.clear();
            if let Some(header) = line.strip_prefix('>') {
                name = Some(header.to_string());
            }
        } else if let Some(id) = name.as_ref() {
            if line.contains(' ') {
                warn!("Space in the sequence of {}. Discarded.", id);
                name = None;
                seq.clear();
                continue;
            }
            for &base in line.as_bytes() {
                let base = resolver.resolve(base, id)?;
                seq.push(base);
            }
        }
    }
    if let Some(id) = name.take() {
        push_record(&mut records, id, seq);
    }
    debug!("{} records parsed.", records.len());
    Ok(records)
}

fn push_record(records: &mut Vec<Record>, id: String, seq: Vec<u8>) {
    if seq.is_empty() {
        debug!("{} has no bases. Skipped.", id);
    } else {
        records.push(Record { id, seq });
    }
}

/// Parse a FASTA file.
pub fn parse_into_vec<P: AsRef<Path>>(file: P, policy: AmbiguityPolicy) -> Result<Vec<Record>> {
    let file = std::fs::File::open(file)?;
    parse(file, policy)
}

/// Pack the records into reads. An empty set of records is an error.
pub fn encode_records(records: &[Record]) -> Result<Vec<EncodedSequence>> {
    if records.is_empty() {
        return Err(AssemblyError::Input("no reads".to_string()));
    }
    records
        .iter()
        .map(|r| EncodedSequence::encode(&r.id, &r.seq).map_err(AssemblyError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    const INPUT: &str = ">r1 first\nACGT\nacgt\r\n>r2\nTT GA\n>r3\n\n>r4\nGGCC\n\n>r5\nAAAA";
    #[test]
    fn parse_records() {
        let records = parse(INPUT.as_bytes(), AmbiguityPolicy::Reject).unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["r1 first", "r4", "r5"]);
        assert_eq!(records[0].seq(), b"ACGTACGT");
        assert_eq!(records[1].seq(), b"GGCC");
        assert_eq!(records[2].seq(), b"AAAA");
    }
    #[test]
    fn ambiguity() {
        let input = ">a\nANRS\n";
        let first = parse(input.as_bytes(), AmbiguityPolicy::First).unwrap();
        assert_eq!(first[0].seq(), b"AAAG");
        assert!(parse(input.as_bytes(), AmbiguityPolicy::Reject).is_err());
        let policy = AmbiguityPolicy::Random { seed: 10 };
        let r1 = parse(input.as_bytes(), policy).unwrap();
        let r2 = parse(input.as_bytes(), policy).unwrap();
        assert_eq!(r1, r2);
        let seq = r1[0].seq();
        assert_eq!(seq[0], b'A');
        assert!(b"ATGC".contains(&seq[1]));
        assert!(b"AG".contains(&seq[2]));
        assert!(b"GC".contains(&seq[3]));
    }
    #[test]
    fn policy_from_str() {
        assert_eq!("first".parse::<AmbiguityPolicy>().unwrap(), AmbiguityPolicy::First);
        assert_eq!(
            "random".parse::<AmbiguityPolicy>().unwrap(),
            AmbiguityPolicy::default()
        );
        assert!("coin".parse::<AmbiguityPolicy>().is_err());
    }
    #[test]
    fn encode() {
        let records = parse(INPUT.as_bytes(), AmbiguityPolicy::First).unwrap();
        let reads = encode_records(&records).unwrap();
        assert_eq!(reads.len(), 3);
        assert_eq!(reads[0].name(), "r1 first");
        assert_eq!(reads[0].decode(), b"ACGTACGT".to_vec());
        match encode_records(&[]) {
            Err(AssemblyError::Input(_)) => {}
            x => panic!("{:?}", x),
        }
    }
}
