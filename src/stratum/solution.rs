use super::*;

/// A length-prefixed Equihash solution as it travels on the wire: the 3 byte
/// compact-size prefix followed by exactly [`SOLUTION_LENGTH`] bytes. Solvers
/// hand back the raw solution; the prefix is attached here.
#[derive(Clone, PartialEq, Eq)]
pub struct Solution(Vec<u8>);

impl Solution {
    pub fn from_raw(raw: &[u8]) -> Result<Self, JobError> {
        if raw.len() != SOLUTION_LENGTH {
            return Err(JobError::InvalidLength {
                field: "solution",
                expected: SOLUTION_LENGTH,
                actual: raw.len(),
            });
        }

        let mut bytes = Vec::with_capacity(SOLUTION_PREFIX.len() + SOLUTION_LENGTH);
        bytes.extend_from_slice(&SOLUTION_PREFIX);
        bytes.extend_from_slice(raw);
        Ok(Self(bytes))
    }

    pub fn from_len_prefixed(bytes: Vec<u8>) -> Result<Self, JobError> {
        if bytes.len() != SOLUTION_PREFIX.len() + SOLUTION_LENGTH {
            return Err(JobError::InvalidLength {
                field: "length-prefixed solution",
                expected: SOLUTION_PREFIX.len() + SOLUTION_LENGTH,
                actual: bytes.len(),
            });
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Debug for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Solution({}…)", &self.to_hex()[..12])
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Solution {
    fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Solution {
    fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        let s = String::deserialize(de)?;
        let bytes = hex::decode(&s).map_err(|e| serde::de::Error::custom(e.to_string()))?;
        Self::from_len_prefixed(bytes).map_err(|e| serde::de::Error::custom(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_attaches_prefix() {
        let solution = Solution::from_raw(&[0xab; SOLUTION_LENGTH]).unwrap();
        assert_eq!(solution.as_bytes().len(), SOLUTION_LENGTH + 3);
        assert_eq!(&solution.as_bytes()[..3], SOLUTION_PREFIX);
        assert_eq!(solution.as_bytes()[3], 0xab);
    }

    #[test]
    fn from_raw_rejects_wrong_length() {
        let err = Solution::from_raw(&[0u8; 100]).unwrap_err();
        assert!(matches!(
            err,
            JobError::InvalidLength {
                field: "solution",
                expected: SOLUTION_LENGTH,
                actual: 100,
            }
        ));
    }

    #[test]
    fn from_len_prefixed_rejects_wrong_length() {
        assert!(Solution::from_len_prefixed(vec![0u8; SOLUTION_LENGTH]).is_err());
        assert!(Solution::from_len_prefixed(vec![0u8; SOLUTION_LENGTH + 3]).is_ok());
    }

    #[test]
    fn serde_roundtrip() {
        let solution = Solution::from_raw(&[7; SOLUTION_LENGTH]).unwrap();
        let json = serde_json::to_string(&solution).unwrap();
        let back: Solution = serde_json::from_str(&json).unwrap();
        assert_eq!(back, solution);
    }

    #[test]
    fn deserialize_rejects_truncated() {
        assert!(serde_json::from_str::<Solution>(r#""fd4005abcd""#).is_err());
    }
}
