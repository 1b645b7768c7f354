// External collaborator interfaces (spec.md §6), deliberately out of core
// scope: alignment decoding, tabix-indexed candidate readers, and the
// tabular writer are all named as external collaborators reached only
// through these traits. Grounded on the teacher's split between
// `calling::variants::preprocessing` (the consumer) and `reference::Buffer`
// / `bcf::Reader` (the concrete collaborators it is built against).

use crate::call::Call;
use crate::errors::Result;
use crate::reads::Read;
use crate::reference::ReferenceWindow;
use crate::region::Region;
use crate::variant::Variant;

/// Produces reference bases for a region on demand (spec.md §6 "Reference
/// source").
pub trait ReferenceSource {
    fn fetch(&self, region: &Region) -> Result<ReferenceWindow>;
}

/// Produces reads overlapping a region, already passed through upstream
/// pre-filters (spec.md §6 "Read source": "mate presence, duplicate flag,
/// mapping-quality threshold, base-quality threshold, short-fragment trim,
/// overlapping-mate trim").
pub trait ReadSource {
    fn fetch(&self, region: &Region) -> Result<Vec<Read>>;
}

/// Optional externally supplied candidate variants, with priors (spec.md §6
/// "Candidate-variant source").
pub trait CandidateVariantSource {
    fn candidates(&self, region: &Region) -> Result<Vec<(Variant, Option<f64>)>>;
}

/// Optional externally supplied genotyping-mode alleles (spec.md §6
/// "Genotyping-allele source"): same shape as candidates, each flagged.
pub trait GenotypingAlleleSource {
    fn genotyping_alleles(&self, region: &Region) -> Result<Vec<Variant>>;
}

/// Receives emitted calls in order, plus a one-time header payload (spec.md
/// §6 "Output sink").
pub trait OutputSink {
    fn write_header(&mut self, tool_name: &str, tool_version: &str, reference_path: &str, sample_names: &[String], contigs: &[String]);
    fn write_call(&mut self, call: Call) -> Result<()>;
}

/// In-memory implementations of the external-interface traits above, for
/// tests (unit tests in this crate and integration tests under `tests/`
/// alike — not gated behind `#[cfg(test)]`, since that would only compile
/// them into this crate's own unit-test binary and hide them from `tests/`,
/// which links a separately-compiled copy of the library).
pub mod test_support {
    use super::*;
    use std::collections::HashMap;

    /// An in-memory reference source backed by a single contiguous sequence
    /// per contig, for tests.
    pub struct InMemoryReferenceSource {
        contigs: HashMap<String, Vec<u8>>,
    }

    impl InMemoryReferenceSource {
        pub fn new(contigs: HashMap<String, Vec<u8>>) -> Self {
            InMemoryReferenceSource { contigs }
        }
    }

    impl ReferenceSource for InMemoryReferenceSource {
        fn fetch(&self, region: &Region) -> Result<ReferenceWindow> {
            let seq = self
                .contigs
                .get(region.contig())
                .expect("unknown contig in test reference source");
            let bases = seq[*region.start() as usize..*region.end() as usize].to_vec();
            Ok(ReferenceWindow::new(region.clone(), bases))
        }
    }

    /// An in-memory read source: every read is returned if it overlaps the
    /// requested region.
    pub struct InMemoryReadSource {
        reads: Vec<Read>,
    }

    impl InMemoryReadSource {
        pub fn new(reads: Vec<Read>) -> Self {
            InMemoryReadSource { reads }
        }
    }

    impl ReadSource for InMemoryReadSource {
        fn fetch(&self, region: &Region) -> Result<Vec<Read>> {
            Ok(self.reads.iter().filter(|r| r.aligned_region().overlaps(region)).cloned().collect())
        }
    }

    /// Collects every call written to it, for assertion in tests.
    #[derive(Default)]
    pub struct CollectingOutputSink {
        pub calls: Vec<Call>,
    }

    impl OutputSink for CollectingOutputSink {
        fn write_header(&mut self, _tool_name: &str, _tool_version: &str, _reference_path: &str, _sample_names: &[String], _contigs: &[String]) {}

        fn write_call(&mut self, call: Call) -> Result<()> {
            self.calls.push(call);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use rust_htslib::bam::record::Cigar;
    use std::collections::HashMap;

    #[test]
    fn in_memory_reference_source_slices_the_requested_region() {
        let mut contigs = HashMap::new();
        contigs.insert("1".to_string(), b"AAACCCGGG".to_vec());
        let source = InMemoryReferenceSource::new(contigs);
        let window = source.fetch(&Region::new("1", 3, 6)).unwrap();
        assert_eq!(window.bases(), b"CCC");
    }

    #[test]
    fn in_memory_read_source_filters_by_overlap() {
        let read = Read::new("rg1", "1", 0, vec![Cigar::Match(5)], b"AAAAA".to_vec(), vec![30u8; 5], 60, 0);
        let source = InMemoryReadSource::new(vec![read]);
        assert_eq!(source.fetch(&Region::new("1", 0, 5)).unwrap().len(), 1);
        assert_eq!(source.fetch(&Region::new("1", 100, 105)).unwrap().len(), 0);
    }

    #[test]
    fn collecting_sink_records_calls_in_write_order() {
        let mut sink = CollectingOutputSink::default();
        sink.write_call(Call::RefBlock {
            region: Region::new("1", 0, 10),
            annotation: crate::call::RefBlockAnnotation::from_region(&Region::new("1", 0, 10), vec![5]),
        })
        .unwrap();
        assert_eq!(sink.calls.len(), 1);
    }
}
