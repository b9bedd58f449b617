use super::*;

const SI_PREFIXES: &[(&str, f64)] = &[
    ("", 1.0),
    ("K", 1e3),
    ("M", 1e6),
    ("G", 1e9),
    ("T", 1e12),
    ("P", 1e15),
    ("E", 1e18),
];

/// Hashes per second, displayed with an SI prefix and three significant
/// figures.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct HashRate(pub f64);

impl HashRate {
    pub const ZERO: Self = Self(0.0);

    pub fn over(hashes: u64, window: Duration) -> Self {
        if window.is_zero() {
            return Self::ZERO;
        }

        Self(hashes as f64 / window.as_secs_f64())
    }
}

impl fmt::Display for HashRate {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.0 == 0.0 {
            return write!(f, "0 H/s");
        }

        let (prefix, divisor) = SI_PREFIXES
            .iter()
            .rev()
            .find(|(_, divisor)| self.0.abs() >= *divisor * 0.9999)
            .unwrap_or(&SI_PREFIXES[0]);

        let scaled = self.0 / divisor;

        if scaled >= 100.0 {
            write!(f, "{scaled:.0} {prefix}H/s")
        } else if scaled >= 10.0 {
            write!(f, "{scaled:.1} {prefix}H/s")
        } else {
            write!(f, "{scaled:.2} {prefix}H/s")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formatting() {
        let cases = [
            (0.0, "0 H/s"),
            (1.0, "1.00 H/s"),
            (999.0, "999 H/s"),
            (1e3, "1.00 KH/s"),
            (1e6, "1.00 MH/s"),
            (1e9, "1.00 GH/s"),
            (1.5e12, "1.50 TH/s"),
            (45.6e12, "45.6 TH/s"),
            (456e12, "456 TH/s"),
            (314e15, "314 PH/s"),
            (1e18, "1.00 EH/s"),
        ];

        for (value, expected) in cases {
            assert_eq!(HashRate(value).to_string(), expected, "for value {value}");
        }
    }

    #[test]
    fn over_window() {
        let rate = HashRate::over(5000, Duration::from_secs(5));
        assert_eq!(rate.0, 1000.0);
    }

    #[test]
    fn over_zero_window() {
        assert_eq!(HashRate::over(42, Duration::ZERO), HashRate::ZERO);
    }
}
