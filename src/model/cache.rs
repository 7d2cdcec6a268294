//! # Probability Cache
//!
//! Precomputed powers and binomial coefficients for the probability kernel.
//! The kernel's double sums touch the same handful of base quantities with
//! integer exponents over and over; computing each power once up front keeps
//! the per-pair cost down to table lookups and multiplies.
//!
//! Read-only after construction.

/// Caches powers and combinations used again and again in the kernel sums.
///
/// All twelve power tables and the binomial triangle cover exponents and
/// rows `0..=max_fragment_length`, since `max_fragment_length` is the
/// inclusive cap on `x_s + x_d`.
#[derive(Clone, Debug)]
pub struct ProbCache {
    /// Mutation rate (epsilon)
    pub epsilon: f64,
    /// Heterozygous-site rate
    pub het_rate: f64,
    /// Sequencing error rate (theta)
    pub theta: f64,

    /// Probability that two same alleles are read as same
    pub p_same_same: f64,
    /// Probability that two same alleles are read as different
    pub p_same_diff: f64,
    /// Probability that two different alleles are read as same
    pub p_diff_same: f64,
    /// Probability that two different alleles are read as different
    pub p_diff_diff: f64,

    pub pow_p_same_same: Vec<f64>,
    pub pow_p_same_diff: Vec<f64>,
    pub pow_p_diff_same: Vec<f64>,
    pub pow_p_diff_diff: Vec<f64>,

    /// Powers of 1 - epsilon - h
    pub pow_one_minus_eps_h: Vec<f64>,
    /// Powers of 1 - epsilon/2 - h
    pub pow_one_minus_half_eps_h: Vec<f64>,
    /// Powers of h + epsilon/2
    pub pow_h_half_eps: Vec<f64>,
    pub pow_h: Vec<f64>,
    pub pow_eps: Vec<f64>,
    pub pow_half: Vec<f64>,
    /// Powers of p_same_same + p_diff_same
    pub pow_pss_pds: Vec<f64>,
    /// Powers of p_same_diff + p_diff_diff
    pub pow_psd_pdd: Vec<f64>,

    /// Pascal's triangle: comb[n][k] = C(n, k), rows 0..=max_fragment_length.
    /// Stored as f64 because the kernel consumes it in f64 products and
    /// integer coefficients overflow u64 from row 63.
    pub comb: Vec<Vec<f64>>,
}

impl ProbCache {
    /// Build the cache for the given rates and fragment-length bound.
    ///
    /// # Arguments
    /// * `mutation_rate` - estimated mutation rate (epsilon)
    /// * `het_rate` - estimated probability that a locus is heterozygous
    /// * `seq_error_rate` - estimated error rate of the sequencing technology
    /// * `max_fragment_length` - upper bound on any read's span
    pub fn new(
        mutation_rate: f64,
        het_rate: f64,
        seq_error_rate: f64,
        max_fragment_length: u32,
    ) -> Self {
        let epsilon = mutation_rate;
        let h = het_rate;
        let theta = seq_error_rate;
        let theta2 = theta * theta;

        let p_same_diff = 2.0 * theta * (1.0 - theta) + 2.0 * theta2 / 3.0;
        let p_same_same = 1.0 - p_same_diff;
        let p_diff_same = 2.0 * (1.0 - theta) * theta / 3.0 + 2.0 * theta2 / 9.0;
        let p_diff_diff = 1.0 - p_diff_same;

        // exponents 0..=L inclusive
        let len = max_fragment_length as usize + 1;
        let powers = |base: f64| -> Vec<f64> {
            let mut v = Vec::with_capacity(len);
            let mut acc = 1.0;
            for _ in 0..len {
                v.push(acc);
                acc *= base;
            }
            v
        };

        let mut comb: Vec<Vec<f64>> = Vec::with_capacity(len);
        comb.push(vec![1.0]);
        for n in 1..len {
            let prev = &comb[n - 1];
            let mut row = vec![1.0; n + 1];
            for k in 1..n {
                row[k] = prev[k - 1] + prev[k];
            }
            comb.push(row);
        }

        Self {
            epsilon,
            het_rate: h,
            theta,
            p_same_same,
            p_same_diff,
            p_diff_same,
            p_diff_diff,
            pow_p_same_same: powers(p_same_same),
            pow_p_same_diff: powers(p_same_diff),
            pow_p_diff_same: powers(p_diff_same),
            pow_p_diff_diff: powers(p_diff_diff),
            pow_one_minus_eps_h: powers(1.0 - epsilon - h),
            pow_one_minus_half_eps_h: powers(1.0 - epsilon * 0.5 - h),
            pow_h_half_eps: powers(h + epsilon * 0.5),
            pow_h: powers(h),
            pow_eps: powers(epsilon),
            pow_half: powers(0.5),
            pow_pss_pds: powers(p_same_same + p_diff_same),
            pow_psd_pdd: powers(p_same_diff + p_diff_diff),
            comb,
        }
    }

    /// Highest exponent / triangle row stored
    pub fn max_exponent(&self) -> usize {
        self.comb.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_quantities() {
        let c = ProbCache::new(0.0, 0.0, 0.001, 8);
        let theta: f64 = 0.001;

        let expected_sd = 2.0 * theta * (1.0 - theta) + 2.0 * theta * theta / 3.0;
        assert!((c.p_same_diff - expected_sd).abs() < 1e-15);
        assert!((c.p_same_same + c.p_same_diff - 1.0).abs() < 1e-15);
        assert!((c.p_diff_same + c.p_diff_diff - 1.0).abs() < 1e-15);
    }

    #[test]
    fn test_powers() {
        let c = ProbCache::new(0.1, 0.05, 0.01, 6);

        assert_eq!(c.pow_half.len(), 7);
        assert_eq!(c.pow_half[0], 1.0);
        assert!((c.pow_half[5] - 0.03125).abs() < 1e-15);

        for (k, &p) in c.pow_h.iter().enumerate() {
            assert!((p - 0.05f64.powi(k as i32)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_pascal_triangle() {
        let c = ProbCache::new(0.0, 0.0, 0.001, 6);

        assert_eq!(c.comb.len(), 7);
        assert_eq!(c.comb[0], vec![1.0]);
        assert_eq!(c.comb[4], vec![1.0, 4.0, 6.0, 4.0, 1.0]);
        assert_eq!(c.comb[6][3], 20.0);
        // every row starts and ends with 1
        for row in &c.comb {
            assert_eq!(*row.first().unwrap(), 1.0);
            assert_eq!(*row.last().unwrap(), 1.0);
        }
    }
}
