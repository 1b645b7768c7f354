// Default variant priors (spec.md §3 "Prior").
//
// Grounded on `examples/original_source/cpp/src/variant/type/variant.hpp`'s
// prior assignment, which the teacher's own `model/priors/` directory mirrors
// structurally (one module per prior model); here there is exactly one model
// so it stays a flat module rather than a sub-tree.

use crate::variant::{Variant, VariantKind};

/// Floor below which a prior is never allowed to drop (avoids a hard zero
/// propagating through downstream log-probabilities).
pub const MIN_PRIOR: f64 = 1e-10;

/// Default prior probability for `variant`, following its classification
/// (spec.md §3):
/// - SNP: `≈ 3.33e-4`
/// - MNP: `5e-5 · 0.1^(n−1) · 0.9` where `n` is the substitution count
/// - deletion: `1e-4 · 0.8^|R|`
/// - insertion: `1e-4 · 0.8^|A|`
pub fn default_prior(variant: &Variant) -> f64 {
    let raw = match variant.kind() {
        VariantKind::Snp => 3.33e-4,
        VariantKind::Mnp => {
            let n = variant.region().len() as i32;
            5e-5 * 0.1_f64.powi(n - 1) * 0.9
        }
        VariantKind::Deletion => 1e-4 * 0.8_f64.powi(variant.region().len() as i32),
        VariantKind::Insertion => 1e-4 * 0.8_f64.powi(variant.alt().len() as i32),
    };
    raw.max(MIN_PRIOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::ReferenceWindow;
    use crate::region::Region;
    use crate::variant::Variant;

    fn window() -> ReferenceWindow {
        ReferenceWindow::new(Region::new("1", 0, 20), b"AAAAAAAAAAAAAAAAAAAA".to_vec())
    }

    #[test]
    fn snp_prior() {
        let w = window();
        let v = Variant::new(&w, Region::new("1", 2, 3), b"C".to_vec(), false).unwrap();
        approx::assert_abs_diff_eq!(default_prior(&v), 3.33e-4, epsilon = 1e-12);
    }

    #[test]
    fn deletion_prior_decays_with_length() {
        let w = window();
        let short = Variant::new(&w, Region::new("1", 2, 3), Vec::new(), false).unwrap();
        let long = Variant::new(&w, Region::new("1", 2, 6), Vec::new(), false).unwrap();
        assert!(default_prior(&long) < default_prior(&short));
    }

    #[test]
    fn prior_never_below_floor() {
        let w = window();
        let long = Variant::new(&w, Region::new("1", 0, 20), Vec::new(), false).unwrap();
        assert!(default_prior(&long) >= MIN_PRIOR);
    }
}
