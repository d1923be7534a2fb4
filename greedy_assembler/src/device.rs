//! Offloading the score matrix to a batch-parallel compute device.
//!
//! The device receives every contig concatenated into one "ultrasequence" together with
//! the table of contig lengths, and returns the N×N matrix as a flat row-major buffer.
//! The bundled device executes work groups on the rayon thread pool.
use super::aligner::Aligner;
use super::error::{AssemblyError, Result};
use super::score_matrix::{MatrixBackend, ScoreMatrix};
use rayon::prelude::*;

/// A compute device able to score all pairs of sequences in one synchronous call.
pub trait ComputeDevice: Send + Sync {
    fn describe(&self) -> String;
    /// `ultra` is the concatenation of all sequences, `lengths[i]` the length of the i-th one.
    /// The returned buffer should be row-major with `lengths.len()^2` cells.
    fn compute_matrix(&self, ultra: &[u8], lengths: &[u64], work_group_size: usize)
        -> Result<Vec<i8>>;
}

const HOST_PLATFORM: &str = "rayon-host";
const HOST_VENDOR: &str = "greedy_assembler";
const HOST_VERSION: &str = "1.0";

/// A device running on the host's rayon pool.
/// There is exactly one platform with exactly one device.
#[derive(Debug, Clone)]
pub struct HostDevice {
    aligner: Aligner,
    compute_units: usize,
}

impl HostDevice {
    /// Select the device `device` of the platform `platform`.
    pub fn initialize(platform: usize, device: usize, aligner: Aligner) -> Result<Self> {
        if platform != 0 {
            return Err(AssemblyError::DeviceUnavailable(format!(
                "no platform of id {} (1 platform)",
                platform
            )));
        }
        if device != 0 {
            return Err(AssemblyError::DeviceUnavailable(format!(
                "no device of id {} on platform {} (1 device)",
                device, platform
            )));
        }
        let compute_units = rayon::current_num_threads();
        debug!("Device initialized with {} compute units.", compute_units);
        Ok(Self {
            aligner,
            compute_units,
        })
    }
}

impl ComputeDevice for HostDevice {
    fn describe(&self) -> String {
        format!("{} ({} compute units)", HOST_PLATFORM, self.compute_units)
    }
    fn compute_matrix(
        &self,
        ultra: &[u8],
        lengths: &[u64],
        work_group_size: usize,
    ) -> Result<Vec<i8>> {
        if work_group_size == 0 {
            return Err(AssemblyError::DeviceOperationFailed(
                "work group size should be positive".to_string(),
            ));
        }
        let total: u64 = lengths.iter().sum();
        if total != ultra.len() as u64 {
            return Err(AssemblyError::DeviceOperationFailed(format!(
                "length table sums to {} while the ultrasequence has {} bases",
                total,
                ultra.len()
            )));
        }
        // Transfer: split the ultrasequence back into sequences.
        let mut seqs = Vec::with_capacity(lengths.len());
        let mut start = 0;
        for &len in lengths {
            let end = start + len as usize;
            seqs.push(&ultra[start..end]);
            start = end;
        }
        let n = seqs.len();
        let mut scores = vec![0i8; n * n];
        let aligner = &self.aligner;
        scores
            .par_chunks_mut(work_group_size)
            .enumerate()
            .for_each(|(group, cells)| {
                for (k, cell) in cells.iter_mut().enumerate() {
                    let id = group * work_group_size + k;
                    let (i, j) = (id / n, id % n);
                    if i != j {
                        *cell = aligner.score(seqs[i], seqs[j]);
                    }
                }
            });
        Ok(scores)
    }
}

/// Tab-separated description of the platforms and devices. Diagnostic only.
pub fn list_available_devices() -> String {
    let mut txt = String::new();
    txt += "[Platforms list]\n";
    txt += "platform_id\tplatform_name\tplatform_vendor\tplatform_version\n";
    txt += &format!("0\t{}\t{}\t{}\n", HOST_PLATFORM, HOST_VENDOR, HOST_VERSION);
    txt += "[Devices list]\n";
    txt += "platform_id\tdevice_id\tdevice_name\tcompute_units\n";
    txt += &format!("0\t0\thost-cpu\t{}", rayon::current_num_threads());
    txt
}

/// Score matrix engine delegating to a compute device.
#[derive(Debug, Clone)]
pub struct DeviceBackend<D: ComputeDevice> {
    device: D,
    work_group_size: usize,
}

impl<D: ComputeDevice> DeviceBackend<D> {
    pub fn new(device: D, work_group_size: usize) -> Self {
        Self {
            device,
            work_group_size,
        }
    }
    pub fn device(&self) -> &D {
        &self.device
    }
}

impl<D: ComputeDevice> MatrixBackend for DeviceBackend<D> {
    fn name(&self) -> &str {
        "device"
    }
    fn compute(&self, seqs: &[&[u8]]) -> Result<ScoreMatrix> {
        let n = seqs.len();
        let lengths: Vec<u64> = seqs.iter().map(|s| s.len() as u64).collect();
        let ultra: Vec<u8> = seqs.iter().flat_map(|s| s.iter().copied()).collect();
        debug!(
            "Sending {} sequences ({} bases) to {}",
            n,
            ultra.len(),
            self.device.describe()
        );
        let cells = self
            .device
            .compute_matrix(&ultra, &lengths, self.work_group_size)?;
        let len = cells.len();
        ScoreMatrix::from_cells(n, cells).ok_or_else(|| {
            AssemblyError::DeviceOperationFailed(format!(
                "device returned {} cells for {} sequences",
                len, n
            ))
        })
    }
}
