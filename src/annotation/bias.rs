// Allele-bias and strand-bias P-values (spec.md §4.7 "computed from these
// counts via a Beta-Binomial CDF with empirically tuned shape parameters"),
// grounded on `original_source/cpp/src/stats/biasCalculator.{hpp,cpp}`. The
// null model for both is a symmetric `BetaBinomial(n, shape, shape)`, testing
// for a 50/50 split — of supporting vs. reference-supporting reads for
// allele bias, of forward vs. reverse supporting reads for strand bias.

use crate::annotation::support::ReadSupportAccountant;
use crate::stats::beta_binomial_two_sided_p;

/// `log10` of the allele-bias P-value: a two-sided Beta-Binomial test of
/// "supporting" read count against "supporting + reference-supporting".
pub fn allele_bias_log10_p(acc: &ReadSupportAccountant, shape: f64) -> f64 {
    let supporting = (acc.forward_supporting + acc.reverse_supporting) as u64;
    let reference = (acc.forward_reference_supporting + acc.reverse_reference_supporting) as u64;
    let n = supporting + reference;
    beta_binomial_two_sided_p(supporting, n, shape, shape).log10()
}

/// `log10` of the strand-bias P-value: a two-sided Beta-Binomial test of
/// forward-supporting read count against all supporting reads.
pub fn strand_bias_log10_p(acc: &ReadSupportAccountant, shape: f64) -> f64 {
    let n = (acc.forward_supporting + acc.reverse_supporting) as u64;
    beta_binomial_two_sided_p(acc.forward_supporting as u64, n, shape, shape).log10()
}
