//! Bioinformatics utilities.
//!
//! The 2-bit nucleotide encoding used to pack k-mers into integers, and the
//! reverse complement over that packed representation.

pub mod kmers;

pub use kmers::KmerTable;

/// 2-bit encoding of a base: A=0, C=1, G=2, T=3. `None` for anything else.
/// Case-insensitive.
pub fn encode_base(base: u8) -> Option<u64> {
    match base.to_ascii_uppercase() {
        b'A' => Some(0),
        b'C' => Some(1),
        b'G' => Some(2),
        b'T' => Some(3),
        _ => None,
    }
}

/// Reverse complement of a 2-bit packed k-mer of length `k`.
pub fn reverse_complement_packed(kmer: u64, k: usize) -> u64 {
    let mut rc = 0u64;
    let mut fwd = kmer;
    for _ in 0..k {
        rc = (rc << 2) | (3 - (fwd & 3));
        fwd >>= 2;
    }
    rc
}
