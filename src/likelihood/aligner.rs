// Gap-affine read-to-haplotype alignment (spec.md §4.4).
//
// The teacher's `model/evidence/reads.rs` builds its indel likelihoods from a
// hand-rolled `pairhmm::PairHMM` whose `GapParameters` trait exposes a single
// flat gap-open probability per alignment. This spec instead needs a
// *position-dependent* gap-open probability (lower inside a homopolymer run,
// §4.4 / SPEC_FULL.md §3.1), which that trait cannot express, so the forward
// recursion is written out directly here rather than forced through it. The
// numeric primitives (`LogProb`/`PHREDProb`/`Prob`, `prob_read_base`,
// `prob_read_base_miscall`) are the same ones `model/evidence/reads.rs` uses,
// ported verbatim in spirit.

use bio::stats::{LogProb, PHREDProb, Prob};

use crate::likelihood::homopolymer;

const CONFUSION: f64 = 0.3333;

/// `Pr(read_base | ref_base, base_qual)` under a simple confusion model
/// (ported from `model/evidence/reads.rs::prob_read_base`).
pub fn prob_read_base(read_base: u8, ref_base: u8, base_qual: u8) -> LogProb {
    let prob_miscall = prob_read_base_miscall(base_qual);
    if read_base.to_ascii_uppercase() == ref_base.to_ascii_uppercase() {
        prob_miscall.ln_one_minus_exp()
    } else {
        prob_miscall + LogProb::from(Prob(CONFUSION))
    }
}

pub fn prob_read_base_miscall(base_qual: u8) -> LogProb {
    LogProb::from(PHREDProb(base_qual as f64))
}

/// Gap-affine semiglobal aligner over a fixed haplotype sequence: free
/// start/end gaps on the haplotype side (a read may start/end anywhere along
/// it), no free gaps on the read side (the whole read must be emitted).
///
/// Gap-open probability at haplotype position `i` is the configured base
/// rate scaled down by `homopolymer::gap_open_scale`, so entering a
/// homopolymer run lowers the cost of opening a gap there.
pub struct GapAffineAligner<'h> {
    haplotype: &'h [u8],
    gap_open: LogProb,
    gap_extend: LogProb,
}

impl<'h> GapAffineAligner<'h> {
    pub fn new(haplotype: &'h [u8], gap_open: LogProb, gap_extend: LogProb) -> Self {
        GapAffineAligner {
            haplotype,
            gap_open,
            gap_extend,
        }
    }

    fn gap_open_at(&self, ref_pos: usize) -> LogProb {
        let scale = homopolymer::gap_open_scale(self.haplotype, ref_pos);
        // `scale` grows with homopolymer run length, which can push the
        // scaled log-probability above 0 (an invalid probability); clamp it
        // back down to `ln(1)` rather than let it run away.
        LogProb((*self.gap_open + scale.ln()).min(0.0))
    }

    /// Total alignment probability of `read_seq` (with per-base qualities
    /// `read_quals`) against the haplotype, summing over all alignment paths
    /// (the standard PairHMM forward quantity, matching the teacher's
    /// `pairhmm.prob_related` usage).
    pub fn prob_read(&self, read_seq: &[u8], read_quals: &[u8]) -> LogProb {
        let n = self.haplotype.len();
        let m = read_seq.len();
        if n == 0 || m == 0 {
            return LogProb::ln_zero();
        }

        // M/X/Y[i][j]: i indexes haplotype prefix length, j indexes read prefix length.
        // X consumes a haplotype base only (deletion from the read's perspective).
        // Y consumes a read base only (insertion from the read's perspective).
        let neg_inf = LogProb::ln_zero();
        let mut m_mat = vec![vec![neg_inf; m + 1]; n + 1];
        let mut x_mat = vec![vec![neg_inf; m + 1]; n + 1];
        let mut y_mat = vec![vec![neg_inf; m + 1]; n + 1];

        // Free start gap in the haplotype dimension: entering at any haplotype
        // offset costs nothing.
        for i in 0..=n {
            m_mat[i][0] = LogProb::ln_one();
        }

        for i in 1..=n {
            for j in 1..=m {
                let emit = prob_read_base(read_seq[j - 1], self.haplotype[i - 1], read_quals[j - 1]);
                let prev_best = LogProb::ln_sum_exp(&[m_mat[i - 1][j - 1], x_mat[i - 1][j - 1], y_mat[i - 1][j - 1]]);
                m_mat[i][j] = emit + prev_best;

                let open_here = self.gap_open_at(i - 1);
                x_mat[i][j] = LogProb::ln_sum_exp(&[m_mat[i - 1][j] + open_here, x_mat[i - 1][j] + self.gap_extend]);

                y_mat[i][j] = LogProb::ln_sum_exp(&[
                    m_mat[i][j - 1] + self.gap_open,
                    y_mat[i][j - 1] + self.gap_extend,
                ]);
            }
        }

        // Free end gap in the haplotype dimension: the read may finish before
        // the haplotype is exhausted, at any haplotype offset.
        let finals: Vec<LogProb> = (0..=n).map(|i| LogProb::ln_sum_exp(&[m_mat[i][m], x_mat[i][m], y_mat[i][m]])).collect();
        LogProb::ln_sum_exp(&finals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gap_probs() -> (LogProb, LogProb) {
        (LogProb::from(Prob(1e-4)), LogProb::from(Prob(1e-2)))
    }

    #[test]
    fn exact_match_has_high_probability() {
        let hap = b"ACGTACGTACGT";
        let (open, ext) = gap_probs();
        let aligner = GapAffineAligner::new(hap, open, ext);
        let p = aligner.prob_read(b"ACGTACGT", &[40u8; 8]);
        assert!(p.exp() > 0.5, "expected high probability, got {}", p.exp());
    }

    #[test]
    fn mismatch_lowers_probability() {
        let hap = b"ACGTACGTACGT";
        let (open, ext) = gap_probs();
        let aligner = GapAffineAligner::new(hap, open, ext);
        let matching = aligner.prob_read(b"ACGTACGT", &[40u8; 8]);
        let mismatching = aligner.prob_read(b"ACGTCCGT", &[40u8; 8]);
        assert!(mismatching < matching);
    }

    #[test]
    fn indel_in_homopolymer_is_cheaper_than_elsewhere() {
        // haplotype with a long homopolymer run in the middle.
        let hap_run = b"ACGTTTTTTTTTACGT";
        let hap_flat = b"ACGTACGTACGTACGT";
        let (open, ext) = gap_probs();
        let in_run = GapAffineAligner::new(hap_run, open, ext);
        let flat = GapAffineAligner::new(hap_flat, open, ext);
        // a read one base short of the haplotype (a 1bp deletion)
        let read = b"ACGTTTTTTTTACGT";
        let quals = vec![40u8; read.len()];
        let p_run = in_run.prob_read(read, &quals);
        let p_flat = flat.prob_read(read, &quals);
        assert!(p_run > p_flat, "expected {} > {}", p_run.exp(), p_flat.exp());
    }
}
