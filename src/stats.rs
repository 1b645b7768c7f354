// Shared Beta-Binomial machinery (spec.md §4.7 allele/strand-bias P-values,
// §4.9 reference-block coverage quality), grounded on
// `original_source/cpp/src/stats/betaBinomial.{hpp,cpp}`. `statrs` 0.11 has no
// built-in Beta-Binomial distribution, so its PMF/CDF are assembled here from
// `statrs::function::gamma::ln_gamma`, the same primitive the teacher's
// quality calculations build on.

use statrs::function::gamma::ln_gamma;

fn ln_beta(a: f64, b: f64) -> f64 {
    ln_gamma(a) + ln_gamma(b) - ln_gamma(a + b)
}

fn ln_choose(n: u64, k: u64) -> f64 {
    ln_gamma(n as f64 + 1.0) - ln_gamma(k as f64 + 1.0) - ln_gamma((n - k) as f64 + 1.0)
}

/// `log Pr(X = k)` for `X ~ BetaBinomial(n, alpha, beta)`.
pub fn beta_binomial_log_pmf(k: u64, n: u64, alpha: f64, beta: f64) -> f64 {
    ln_choose(n, k) + ln_beta(k as f64 + alpha, (n - k) as f64 + beta) - ln_beta(alpha, beta)
}

/// `Pr(X <= k)` for `X ~ BetaBinomial(n, alpha, beta)`.
pub fn beta_binomial_cdf(k: u64, n: u64, alpha: f64, beta: f64) -> f64 {
    (0..=k).map(|i| beta_binomial_log_pmf(i, n, alpha, beta).exp()).sum()
}

/// Two-sided Beta-Binomial P-value for observing `k` successes out of `n`
/// trials under `BetaBinomial(n, alpha, beta)`: twice the smaller tail,
/// clamped to `1.0`.
pub fn beta_binomial_two_sided_p(k: u64, n: u64, alpha: f64, beta: f64) -> f64 {
    if n == 0 {
        return 1.0;
    }
    let lower = beta_binomial_cdf(k, n, alpha, beta);
    let upper = if k == 0 {
        1.0
    } else {
        1.0 - beta_binomial_cdf(k - 1, n, alpha, beta)
    };
    (2.0 * lower.min(upper)).min(1.0)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn pmf_sums_to_one_over_the_support() {
        let n = 10;
        let total: f64 = (0..=n).map(|k| beta_binomial_log_pmf(k, n, 2.0, 2.0).exp()).sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn balanced_counts_have_high_p_value() {
        let p = beta_binomial_two_sided_p(5, 10, 20.0, 20.0);
        assert!(p > 0.5);
    }

    #[test]
    fn extreme_imbalance_has_low_p_value() {
        let p = beta_binomial_two_sided_p(0, 20, 1.0, 1.0);
        assert!(p < 0.01);
    }
}
