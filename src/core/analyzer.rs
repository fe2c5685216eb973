//! Stateless byte heuristics used by the scanner.

use std::borrow::Cow;
use std::io::{self, Read};

use regex::Regex;
use sha2::{Digest, Sha256};

use crate::models::signature::MagicSignature;

pub struct Analyzer;

impl Analyzer {
    /// Shannon entropy of the byte distribution, in bits per byte (0..=8).
    pub fn shannon_entropy(bytes: &[u8]) -> f64 {
        if bytes.is_empty() {
            return 0.0;
        }

        let mut counts = [0u64; 256];
        for &b in bytes {
            counts[b as usize] += 1;
        }
        entropy_from_counts(&counts, bytes.len() as u64)
    }

    pub fn sha256_hex(bytes: &[u8]) -> String {
        format!("{:x}", Sha256::digest(bytes))
    }

    /// First signature in table order whose bytes prefix `content`.
    pub fn detect_signature<'a>(
        content: &[u8],
        signatures: &'a [MagicSignature],
    ) -> Option<&'a MagicSignature> {
        signatures.iter().find(|sig| sig.matches(content))
    }

    pub fn contains_sequence(haystack: &[u8], needle: &[u8]) -> bool {
        if needle.is_empty() {
            return true;
        }
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    /// Decode at most `limit` leading bytes as text.
    pub fn text_window(bytes: &[u8], limit: usize) -> Cow<'_, str> {
        let end = bytes.len().min(limit);
        String::from_utf8_lossy(&bytes[..end])
    }

    pub fn count_matches(re: &Regex, text: &str) -> usize {
        re.find_iter(text).count()
    }
}

fn entropy_from_counts(counts: &[u64; 256], total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let len = total as f64;
    counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / len;
            -p * p.log2()
        })
        .sum()
}

const READ_CHUNK: usize = 64 * 1024;

/// Incremental view of a file's content.
///
/// Hash, byte histogram and marker search cover every byte fed in; only the
/// first `head_limit` bytes are kept for text and signature checks, so memory
/// stays bounded no matter how large the input is.
pub struct ContentDigest {
    hasher: Sha256,
    counts: [u64; 256],
    len: u64,
    head: Vec<u8>,
    head_limit: usize,
    marker: &'static [u8],
    carry: Vec<u8>,
    marker_found: bool,
}

impl ContentDigest {
    pub fn new(head_limit: usize, marker: &'static [u8]) -> Self {
        Self {
            hasher: Sha256::new(),
            counts: [0; 256],
            len: 0,
            head: Vec::new(),
            head_limit,
            marker,
            carry: Vec::new(),
            marker_found: false,
        }
    }

    pub fn update(&mut self, chunk: &[u8]) {
        self.hasher.update(chunk);
        for &b in chunk {
            self.counts[b as usize] += 1;
        }
        self.len += chunk.len() as u64;

        let room = self.head_limit.saturating_sub(self.head.len());
        self.head.extend_from_slice(&chunk[..chunk.len().min(room)]);

        self.search_marker(chunk);
    }

    /// Feed everything `reader` yields.
    pub fn read_from<R: Read>(&mut self, mut reader: R) -> io::Result<()> {
        let mut buf = vec![0u8; READ_CHUNK];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => return Ok(()),
                Ok(n) => self.update(&buf[..n]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn head(&self) -> &[u8] {
        &self.head
    }

    pub fn contains_marker(&self) -> bool {
        self.marker_found
    }

    pub fn entropy(&self) -> f64 {
        entropy_from_counts(&self.counts, self.len)
    }

    pub fn checksum(&self) -> String {
        format!("{:x}", self.hasher.clone().finalize())
    }

    // `carry` holds the last marker.len() - 1 bytes seen, so a marker split
    // across two chunks is still found.
    fn search_marker(&mut self, chunk: &[u8]) {
        if self.marker_found {
            return;
        }
        let overlap = self.marker.len().saturating_sub(1);

        let mut boundary = std::mem::take(&mut self.carry);
        boundary.extend_from_slice(&chunk[..chunk.len().min(overlap)]);
        if Analyzer::contains_sequence(&boundary, self.marker)
            || Analyzer::contains_sequence(chunk, self.marker)
        {
            self.marker_found = true;
            return;
        }

        self.carry = if chunk.len() >= overlap {
            chunk[chunk.len() - overlap..].to_vec()
        } else {
            boundary[boundary.len().saturating_sub(overlap)..].to_vec()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entropy_of_empty_and_uniform_inputs() {
        assert_eq!(Analyzer::shannon_entropy(&[]), 0.0);
        assert_eq!(Analyzer::shannon_entropy(&[7u8; 4096]), 0.0);

        let all: Vec<u8> = (0..=255u8).collect();
        assert!((Analyzer::shannon_entropy(&all) - 8.0).abs() < 1e-9);

        let two = [0u8, 1, 0, 1];
        assert!((Analyzer::shannon_entropy(&two) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn sha256_known_vector() {
        assert_eq!(
            Analyzer::sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn sequence_search() {
        assert!(Analyzer::contains_sequence(b"xxMZyy", b"MZ"));
        assert!(!Analyzer::contains_sequence(b"M", b"MZ"));
        assert!(!Analyzer::contains_sequence(b"mz", b"MZ"));
    }

    #[test]
    fn text_window_truncates() {
        assert_eq!(Analyzer::text_window(b"hello world", 5), "hello");
        assert_eq!(Analyzer::text_window(b"hi", 1024), "hi");
    }

    #[test]
    fn digest_matches_one_shot_helpers() {
        let data: Vec<u8> = (0..200_000u32).map(|i| (i * 7919 % 251) as u8).collect();

        let mut digest = ContentDigest::new(1000, b"MZ");
        for chunk in data.chunks(4093) {
            digest.update(chunk);
        }

        assert_eq!(digest.len(), data.len() as u64);
        assert_eq!(digest.checksum(), Analyzer::sha256_hex(&data));
        assert_eq!(digest.entropy(), Analyzer::shannon_entropy(&data));
        assert_eq!(digest.head(), &data[..1000]);
    }

    #[test]
    fn digest_finds_marker_split_across_chunks() {
        let mut digest = ContentDigest::new(4, b"MZ");
        digest.update(b"abcM");
        assert!(!digest.contains_marker());
        digest.update(b"Zdef");
        assert!(digest.contains_marker());

        let mut digest = ContentDigest::new(4, b"MZ");
        digest.update(b"M");
        digest.update(b"");
        digest.update(b"z");
        assert!(!digest.contains_marker());
    }

    #[test]
    fn digest_reads_from_reader() {
        let data = vec![0x41u8; READ_CHUNK * 2 + 17];
        let mut digest = ContentDigest::new(8, b"MZ");
        digest.read_from(&data[..]).unwrap();
        assert_eq!(digest.len(), data.len() as u64);
        assert_eq!(digest.head(), b"AAAAAAAA");
        assert_eq!(digest.entropy(), 0.0);
        assert!(!digest.contains_marker());
    }
}
