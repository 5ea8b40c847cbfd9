use serde::Deserialize;
use thiserror::Error;

/// Value the rational switch is cut to zero at, as in `d_max = d0 + r0 · ε^{1/(n-m)}`.
const CUTOFF_VALUE: f64 = 1e-5;
/// Half-width around `u = 1` where the analytic limit replaces the 0/0 quotient.
const LIMIT_WINDOW: f64 = 1e-8;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SwitchingError {
    #[error("Switching parameter r0 must be positive and finite (got {0})")]
    InvalidR0(f64),
    #[error("Switching parameter d0 must be finite and non-negative (got {0})")]
    InvalidD0(f64),
    #[error("Switching exponents must satisfy 0 < n < m (got n = {n}, m = {m})")]
    InvalidExponents { n: u32, m: u32 },
}

/// Parameters of the rational switch `s(d) = (1 - u^n) / (1 - u^m)`, `u = (d - d0) / r0`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SwitchingParams {
    pub r0: f64,
    #[serde(default)]
    pub d0: f64,
    #[serde(default = "default_n")]
    pub n: u32,
    #[serde(default = "default_m")]
    pub m: u32,
}

fn default_n() -> u32 {
    8
}

fn default_m() -> u32 {
    12
}

impl Default for SwitchingParams {
    /// `r0 = 0.08` nm with the exponents and offset of Pietrucci & Laio (2009).
    fn default() -> Self {
        Self {
            r0: 0.08,
            d0: 0.0,
            n: default_n(),
            m: default_m(),
        }
    }
}

impl SwitchingParams {
    pub fn validate(&self) -> Result<(), SwitchingError> {
        if !(self.r0.is_finite() && self.r0 > 0.0) {
            return Err(SwitchingError::InvalidR0(self.r0));
        }
        if !(self.d0.is_finite() && self.d0 >= 0.0) {
            return Err(SwitchingError::InvalidD0(self.d0));
        }
        if self.n == 0 || self.n >= self.m {
            return Err(SwitchingError::InvalidExponents {
                n: self.n,
                m: self.m,
            });
        }
        Ok(())
    }
}

/// A validated rational switching function, mapping small distances to 1 and large
/// distances to 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwitchingFunction {
    params: SwitchingParams,
    d_max: f64,
}

impl SwitchingFunction {
    pub fn new(params: SwitchingParams) -> Result<Self, SwitchingError> {
        params.validate()?;
        let exponent = 1.0 / (params.n as f64 - params.m as f64);
        let d_max = params.d0 + params.r0 * CUTOFF_VALUE.powf(exponent);
        Ok(Self { params, d_max })
    }

    pub fn params(&self) -> &SwitchingParams {
        &self.params
    }

    /// Distance beyond which the switch is exactly zero.
    pub fn d_max(&self) -> f64 {
        self.d_max
    }

    /// Returns `(s(d), ds/dd)`.
    pub fn evaluate(&self, distance: f64) -> (f64, f64) {
        let SwitchingParams { r0, d0, n, m } = self.params;
        if distance <= d0 {
            return (1.0, 0.0);
        }
        if distance >= self.d_max {
            return (0.0, 0.0);
        }

        let (nf, mf) = (n as f64, m as f64);
        let u = (distance - d0) / r0;
        if (u - 1.0).abs() < LIMIT_WINDOW {
            return (nf / mf, 0.5 * nf * (nf - mf) / mf / r0);
        }

        let u_n1 = u.powi(n as i32 - 1);
        let u_m1 = u.powi(m as i32 - 1);
        let numerator = 1.0 - u_n1 * u;
        let denominator = 1.0 - u_m1 * u;
        let value = numerator / denominator;
        let dvalue_du =
            (-nf * u_n1 * denominator + mf * u_m1 * numerator) / (denominator * denominator);
        (value, dvalue_du / r0)
    }

    pub fn value(&self, distance: f64) -> f64 {
        self.evaluate(distance).0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn switch(r0: f64, d0: f64, n: u32, m: u32) -> SwitchingFunction {
        SwitchingFunction::new(SwitchingParams { r0, d0, n, m }).unwrap()
    }

    #[test]
    fn default_params_match_published_values() {
        let params = SwitchingParams::default();
        assert_eq!(params, SwitchingParams { r0: 0.08, d0: 0.0, n: 8, m: 12 });
    }

    #[test]
    fn value_is_one_at_and_below_d0() {
        let f = switch(0.1, 0.05, 6, 12);
        assert_eq!(f.evaluate(0.0), (1.0, 0.0));
        assert_eq!(f.evaluate(0.05), (1.0, 0.0));
    }

    #[test]
    fn value_at_u_equal_one_uses_analytic_limit() {
        let f = switch(0.1, 0.0, 8, 12);
        let (value, derivative) = f.evaluate(0.1);
        assert!((value - 8.0 / 12.0).abs() < TOLERANCE);
        assert!((derivative - 0.5 * 8.0 * (8.0 - 12.0) / 12.0 / 0.1).abs() < TOLERANCE);
    }

    #[test]
    fn value_is_continuous_across_the_limit_window() {
        let f = switch(0.1, 0.0, 8, 12);
        let below = f.value(0.1 * (1.0 - 1e-6));
        let above = f.value(0.1 * (1.0 + 1e-6));
        assert!((below - 8.0 / 12.0).abs() < 1e-5);
        assert!((above - 8.0 / 12.0).abs() < 1e-5);
    }

    #[test]
    fn value_is_zero_beyond_d_max() {
        let f = switch(0.08, 0.0, 8, 12);
        assert!(f.d_max() > 0.08);
        assert_eq!(f.evaluate(f.d_max() + 1e-6), (0.0, 0.0));
        assert!(f.value(f.d_max() - 1e-6) < 2e-5);
    }

    #[test]
    fn derivative_matches_central_finite_difference() {
        let f = switch(0.08, 0.01, 8, 12);
        let h = 1e-7;
        for &d in &[0.02, 0.05, 0.07, 0.095, 0.12, 0.2] {
            let (_, analytic) = f.evaluate(d);
            let numeric = (f.value(d + h) - f.value(d - h)) / (2.0 * h);
            assert!(
                (analytic - numeric).abs() < 1e-5 * analytic.abs().max(1.0),
                "d = {d}: analytic {analytic}, numeric {numeric}"
            );
        }
    }

    #[test]
    fn value_decreases_monotonically() {
        let f = switch(0.08, 0.0, 8, 12);
        let values: Vec<f64> = (0..100).map(|i| f.value(i as f64 * 0.003)).collect();
        assert!(values.windows(2).all(|w| w[1] <= w[0] + 1e-15));
    }

    #[test]
    fn params_deserialize_with_defaults_for_omitted_fields() {
        let params: SwitchingParams = toml::from_str("r0 = 0.1\nn = 6").unwrap();
        assert_eq!(params, SwitchingParams { r0: 0.1, d0: 0.0, n: 6, m: 12 });
        assert!(toml::from_str::<SwitchingParams>("r0 = 0.1\nnn = 6").is_err());
    }

    #[test]
    fn validate_rejects_bad_parameters() {
        let base = SwitchingParams::default();
        assert_eq!(
            SwitchingParams { r0: 0.0, ..base }.validate(),
            Err(SwitchingError::InvalidR0(0.0))
        );
        assert_eq!(
            SwitchingParams { d0: -1.0, ..base }.validate(),
            Err(SwitchingError::InvalidD0(-1.0))
        );
        assert_eq!(
            SwitchingParams { n: 12, m: 8, ..base }.validate(),
            Err(SwitchingError::InvalidExponents { n: 12, m: 8 })
        );
    }
}
