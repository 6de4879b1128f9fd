use super::*;

/// The 256 bit threshold a solution digest must fall strictly below. Arrives
/// as a hex big-endian integer in `mining.set_target`; the digest it gates is
/// interpreted little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, DeserializeFromStr, SerializeDisplay)]
pub struct Target(U256);

impl Target {
    pub const MAX: Self = Self(U256::MAX);

    pub fn is_met_by(&self, digest: &[u8; 32]) -> bool {
        U256::from_little_endian(digest) < self.0
    }
}

impl FromStr for Target {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        anyhow::ensure!(
            bytes.len() <= 32,
            "target must be at most 32 bytes, got {}",
            bytes.len()
        );
        Ok(Self(U256::from_big_endian(&bytes)))
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:064x}", self.0)
    }
}
