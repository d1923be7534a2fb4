//! This is a library to assemble short reads into contigs
//! by greedily merging the best-scoring pairs until nothing can be merged.
//! # Example
//! ```
//! use greedy_assembler::*;
//! use packed_sequence::EncodedSequence;
//! let reads = vec![
//!     EncodedSequence::encode("r1", b"AAAACCCGT").unwrap(),
//!     EncodedSequence::encode("r2", b"CCCGTGGGG").unwrap(),
//! ];
//! let config = AssemblyConfig::new(50, 2);
//! let aligner = Aligner::new(DEFAULT_SCHEME);
//! let backend = build_backend(&config, aligner).unwrap();
//! let mut assembler = Assembler::new(&reads, aligner, &config, backend.as_ref()).unwrap();
//! assembler.run().unwrap();
//! let contigs = assembler.contigs();
//! assert_eq!(contigs.len(), 1);
//! assert_eq!(contigs[0].seq, "AAAACCCGTGGGG");
//! ```
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde;
extern crate packed_sequence;
extern crate rand;
extern crate rand_xoshiro;
extern crate rayon;
pub mod aligner;
pub mod config;
pub mod contigs;
pub mod device;
pub mod driver;
pub mod error;
pub mod fasta;
pub mod score_matrix;
pub use aligner::{revcmp, Aligner};
pub use config::*;
pub use contigs::{Contig, ContigStore};
pub use device::{list_available_devices, ComputeDevice, DeviceBackend, HostDevice};
pub use driver::{AssembledContig, Assembler, AssemblyReport, CycleSummary, Phase};
pub use error::{AssemblyError, Result};
pub use score_matrix::{build_backend, MatrixBackend, ScoreMatrix, ThreadedBackend};
