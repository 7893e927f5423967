//! Canonical k-mer hashing and signature extraction.
//!
//! A [`KmerTable`] maps every k-mer of a chosen word length to a dense bin
//! index, collapsing each k-mer with its reverse complement into one
//! canonical class. The table is built once per clustering run and shared
//! immutably; sequence signatures are sparse (bin, count) vectors over its
//! bins.

use log::debug;
use std::collections::HashMap;

use crate::bio::{encode_base, reverse_complement_packed};
use crate::error::{Error, Result};

/// Word lengths above this would need gigabyte-scale lookup tables.
const MAX_WORD_LENGTH: usize = 12;

/// Lookup structure from 2-bit packed k-mers to canonical bin indices.
///
/// Bins are assigned in ascending packed order of the canonical (smaller of
/// forward/reverse-complement) representation, so bin numbering is stable
/// for a given word length.
#[derive(Debug, Clone)]
pub struct KmerTable {
    k: usize,
    /// Indexed by packed k-mer code; maps to the bin of its canonical class.
    bins: Vec<usize>,
    n_bins: usize,
}

impl KmerTable {
    /// Builds the canonical bin table for word length `k`.
    pub fn new(k: usize) -> Result<Self> {
        if k == 0 || k > MAX_WORD_LENGTH {
            return Err(Error::Config {
                parameter: "kmer",
                message: format!("word length must be in 1..={}, got {}", MAX_WORD_LENGTH, k),
            });
        }

        let n_kmers = 1usize << (2 * k);
        let mut bins = vec![usize::MAX; n_kmers];
        let mut next_bin = 0usize;

        for code in 0..n_kmers as u64 {
            let rc = reverse_complement_packed(code, k);
            let canonical = code.min(rc);
            if canonical == code {
                bins[code as usize] = next_bin;
                next_bin += 1;
            }
        }
        // Second pass: point non-canonical codes at their class's bin.
        for code in 0..n_kmers as u64 {
            if bins[code as usize] == usize::MAX {
                let rc = reverse_complement_packed(code, k);
                bins[code as usize] = bins[rc as usize];
            }
        }

        debug!("built k-mer table: k={}, {} canonical bins", k, next_bin);
        Ok(KmerTable {
            k,
            bins,
            n_bins: next_bin,
        })
    }

    /// The word length this table was built for.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Number of canonical k-mer classes, i.e. the feature dimensionality.
    pub fn n_bins(&self) -> usize {
        self.n_bins
    }

    /// Bin index of a packed k-mer code.
    pub fn bin(&self, code: u64) -> usize {
        self.bins[code as usize]
    }

    /// Counts canonical k-mers of `seq` into a sparse signature.
    ///
    /// Windows containing a non-ACGT base are skipped; the rolling window
    /// restarts after the offending base. The result is sorted by bin index.
    pub fn signature(&self, seq: &[u8]) -> Vec<(usize, u64)> {
        let mut counts: HashMap<usize, u64> = HashMap::new();
        let mask = (1u64 << (2 * self.k)) - 1;
        let mut code = 0u64;
        let mut filled = 0usize;

        for &base in seq {
            match encode_base(base) {
                Some(b) => {
                    code = ((code << 2) | b) & mask;
                    filled += 1;
                    if filled >= self.k {
                        *counts.entry(self.bin(code)).or_insert(0) += 1;
                    }
                }
                None => {
                    filled = 0;
                    code = 0;
                }
            }
        }

        let mut signature: Vec<(usize, u64)> = counts.into_iter().collect();
        signature.sort_unstable_by_key(|&(bin, _)| bin);
        signature
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // (4^k + 4^(k/2)) / 2 for even k, 4^k / 2 for odd k.
    fn expected_bins(k: usize) -> usize {
        let total = 1usize << (2 * k);
        if k % 2 == 0 {
            (total + (1usize << k)) / 2
        } else {
            total / 2
        }
    }

    #[test]
    fn test_bin_counts_match_canonical_classes() {
        for k in 1..=5 {
            let table = KmerTable::new(k).unwrap();
            assert_eq!(table.n_bins(), expected_bins(k), "k={}", k);
        }
    }

    #[test]
    fn test_invalid_word_length() {
        assert!(KmerTable::new(0).is_err());
        assert!(KmerTable::new(13).is_err());
    }

    #[test]
    fn test_kmer_and_revcomp_share_bin() {
        let table = KmerTable::new(3).unwrap();
        // ACG = 0b000110, its reverse complement CGT = 0b011011.
        assert_eq!(table.bin(0b000110), table.bin(0b011011));
    }

    #[test]
    fn test_signature_simple() {
        let table = KmerTable::new(3).unwrap();
        let sig = table.signature(b"ACGTACGT");
        // 3-mers: ACG, CGT, GTA, TAC, ACG, CGT; canonical classes: ACG x4
        // (CGT collapses onto ACG), GTA/TAC collapse onto one class x2.
        let total: u64 = sig.iter().map(|&(_, c)| c).sum();
        assert_eq!(total, 6);
        assert_eq!(sig.len(), 2);
    }

    #[test]
    fn test_signature_skips_invalid_bases() {
        let table = KmerTable::new(3).unwrap();
        assert!(table.signature(b"ACNGT").is_empty());
        // Window restarts after the N; only GTT counts.
        let sig = table.signature(b"ACNGTT");
        let total: u64 = sig.iter().map(|&(_, c)| c).sum();
        assert_eq!(total, 1);
    }

    #[test]
    fn test_signature_short_sequence() {
        let table = KmerTable::new(4).unwrap();
        assert!(table.signature(b"ACG").is_empty());
        assert!(table.signature(b"").is_empty());
    }

    #[test]
    fn test_signature_bins_in_range_and_sorted() {
        let table = KmerTable::new(4).unwrap();
        let sig = table.signature(b"ACGTTGCAACGTGGCCTTAA");
        for window in sig.windows(2) {
            assert!(window[0].0 < window[1].0);
        }
        for &(bin, count) in &sig {
            assert!(bin < table.n_bins());
            assert!(count > 0);
        }
    }
}
