//! 2-bit packed nucleotide sequences.

/// A named DNA sequence packed four bases per byte.
/// The first base of each group of four occupies the most significant two bits,
/// and the unused low bits of the last byte are always zero.
/// Thus, the buffer has exactly `ceil(len / 4)` bytes.
/// # Example
///```
/// use packed_sequence::EncodedSequence;
/// let seq = EncodedSequence::encode("read1", b"ATGCA").unwrap();
/// assert_eq!(seq.len(), 5);
/// assert_eq!(seq.as_bytes(), &[0b0011_1001, 0b0000_0000]);
/// assert_eq!(seq.decode(), b"ATGCA".to_vec());
///```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodedSequence {
    name: String,
    len: usize,
    buf: Vec<u8>,
}

/// Error on packing a sequence.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("invalid base '{base}' at position {position}. Only A, T, G, and C can be packed.")]
    InvalidBase { base: char, position: usize },
}

const BASES_PER_BYTE: usize = 4;

#[inline]
fn pack(base: u8) -> Option<u8> {
    match base {
        b'A' => Some(0b00),
        b'C' => Some(0b01),
        b'G' => Some(0b10),
        b'T' => Some(0b11),
        _ => None,
    }
}

#[inline]
fn unpack(bits: u8) -> u8 {
    match bits & 0b11 {
        0b00 => b'A',
        0b01 => b'C',
        0b10 => b'G',
        _ => b'T',
    }
}

impl EncodedSequence {
    /// Pack `seq`, which should be a string over b"ATGC".
    /// Lower case letters and ambiguity codes are rejected; they should be resolved
    /// before calling this function.
    pub fn encode(name: &str, seq: &[u8]) -> Result<Self, CodecError> {
        let mut buf = Vec::with_capacity((seq.len() + BASES_PER_BYTE - 1) / BASES_PER_BYTE);
        for (chunk_idx, chunk) in seq.chunks(BASES_PER_BYTE).enumerate() {
            let mut byte = 0u8;
            for (i, &base) in chunk.iter().enumerate() {
                let bits = pack(base).ok_or(CodecError::InvalidBase {
                    base: base as char,
                    position: chunk_idx * BASES_PER_BYTE + i,
                })?;
                byte = (byte << 2) | bits;
            }
            // Fill empty spaces of the last byte.
            byte <<= 2 * (BASES_PER_BYTE - chunk.len());
            buf.push(byte);
        }
        Ok(Self {
            name: name.to_string(),
            len: seq.len(),
            buf,
        })
    }
    /// Unpack the sequence into usual ASCII encoding.
    pub fn decode(&self) -> Vec<u8> {
        (0..self.len).map(|i| self.get_nth(i)).collect()
    }
    /// Same as `decode`, but into a `String`.
    pub fn decode_string(&self) -> String {
        self.decode().into_iter().map(|b| b as char).collect()
    }
    /// Get the n-th base in the original sequence.
    pub fn get_nth(&self, n: usize) -> u8 {
        assert!(
            n < self.len,
            "Index out of range. The length is {} but the index is {}",
            self.len,
            n
        );
        let byte = self.buf[n / BASES_PER_BYTE];
        let shift = 2 * (BASES_PER_BYTE - 1 - n % BASES_PER_BYTE);
        unpack(byte >> shift)
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    /// The number of bases, not the number of bytes.
    pub fn len(&self) -> usize {
        self.len
    }
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
    /// The packed buffer.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
    /// Move the content out, leaving an empty sequence (no name, zero length, no buffer) behind.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }
}

impl std::fmt::Display for EncodedSequence {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, ">{}", self.name)?;
        write!(f, "{}", self.decode_string())
    }
}
