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

/// Equihash solutions per second.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct HashRate(pub f64);

impl HashRate {
    pub const ZERO: Self = Self(0.0);
}

impl Display for HashRate {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.0 == 0.0 {
            return write!(f, "0 Sol/s");
        }

        let (prefix, divisor) = SI_PREFIXES
            .iter()
            .rev()
            .find(|(_, divisor)| self.0.abs() >= *divisor)
            .unwrap_or(&SI_PREFIXES[0]);

        let scaled = self.0 / divisor;
        let s = format!("{scaled:.3}");
        let trimmed = s.trim_end_matches('0').trim_end_matches('.');

        write!(f, "{trimmed} {prefix}Sol/s")
    }
}

impl Add for HashRate {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for HashRate {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sum for HashRate {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formatting() {
        let cases = [
            (0.0, "0 Sol/s"),
            (12.5, "12.5 Sol/s"),
            (1e3, "1 KSol/s"),
            (1.567e3, "1.567 KSol/s"),
            (2.5e6, "2.5 MSol/s"),
            (3.2e9, "3.2 GSol/s"),
            (1.1e12, "1.1 TSol/s"),
        ];

        for (value, expected) in cases {
            assert_eq!(HashRate(value).to_string(), expected, "for value {value}");
        }
    }

    #[test]
    fn arithmetic() {
        assert_eq!(HashRate(1.5) + HashRate(2.5), HashRate(4.0));

        let mut rate = HashRate(1.0);
        rate += HashRate(2.0);
        assert_eq!(rate, HashRate(3.0));

        assert_eq!(
            [HashRate(1.0), HashRate(2.0), HashRate(3.0)]
                .into_iter()
                .sum::<HashRate>(),
            HashRate(6.0)
        );
    }
}
