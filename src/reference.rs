// Reference windows and a small LRU-free sequence buffer.
//
// Grounded on `crate::calling::variants::preprocessing::ObservationProcessor`'s
// `reference::Buffer` (teacher's `src/calling/variants/preprocessing/mod.rs`),
// which wraps a `bio::io::fasta::IndexedReader` with caching; the external
// FASTA decoding stays out of core scope (spec.md §1), so here `ReferenceSource`
// is the seam (see `crate::io`) and `ReferenceWindow` is the in-memory value
// the core operates on.

use getset::Getters;

use crate::errors::{Error, Result};
use crate::region::Region;

/// A contig, a half-open interval on it, and the (uppercase ASCII `ACGTN`) bases
/// covering that interval. Positions are zero-based.
#[derive(Clone, Debug, PartialEq, Eq, Getters)]
pub struct ReferenceWindow {
    #[getset(get = "pub")]
    region: Region,
    bases: Vec<u8>,
}

impl ReferenceWindow {
    pub fn new(region: Region, bases: Vec<u8>) -> Self {
        assert_eq!(
            region.len() as usize,
            bases.len(),
            "reference window length must match region length"
        );
        ReferenceWindow { region, bases }
    }

    pub fn bases(&self) -> &[u8] {
        &self.bases
    }

    /// The reference base sub-sequence for `region`, which must lie within this window.
    pub fn subseq(&self, region: &Region) -> Result<&[u8]> {
        if !self.region.contains(region) {
            return Err(Error::InvalidArgument {
                msg: format!(
                    "region {} is not contained in reference window {}",
                    region, self.region
                ),
            });
        }
        let start = (region.start() - self.region.start()) as usize;
        let end = (region.end() - self.region.start()) as usize;
        Ok(&self.bases[start..end])
    }

    /// Base at an absolute (contig-relative) position.
    pub fn base_at(&self, pos: u64) -> Result<u8> {
        if pos < *self.region.start() || pos >= *self.region.end() {
            return Err(Error::InvalidArgument {
                msg: format!("position {} is outside of reference window {}", pos, self.region),
            });
        }
        Ok(self.bases[(pos - self.region.start()) as usize])
    }

    /// Extend the covered window by `left`/`right` bases, clipped to `bound`, filling
    /// newly exposed bases from `source`.
    pub fn with_padding(
        &self,
        left: u64,
        right: u64,
        bound: &Region,
        source: &dyn Fn(&Region) -> Result<Vec<u8>>,
    ) -> Result<ReferenceWindow> {
        let padded_region = self.region.extend(left, right).clip_to(bound);
        if padded_region == self.region {
            return Ok(self.clone());
        }
        let bases = source(&padded_region)?;
        Ok(ReferenceWindow::new(padded_region, bases))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subseq_within_window() {
        let window = ReferenceWindow::new(Region::new("1", 0, 10), b"ACGTACGTAC".to_vec());
        assert_eq!(window.subseq(&Region::new("1", 2, 5)).unwrap(), b"GTA");
    }

    #[test]
    fn subseq_outside_window_errors() {
        let window = ReferenceWindow::new(Region::new("1", 0, 10), b"ACGTACGTAC".to_vec());
        assert!(window.subseq(&Region::new("1", 8, 20)).is_err());
    }
}
