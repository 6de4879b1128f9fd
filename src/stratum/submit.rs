use super::*;

/// `mining.submit` parameters: username, job id, hex ntime, the hex nonce
/// suffix (partition tag plus local counter), and the hex length-prefixed
/// solution.
#[derive(Debug, PartialEq, Clone)]
pub struct Submit {
    pub username: String,
    pub job_id: String,
    pub ntime: String,
    pub nonce_suffix: NoncePart,
    pub solution: Solution,
}

impl Serialize for Submit {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(5))?;
        seq.serialize_element(&self.username)?;
        seq.serialize_element(&self.job_id)?;
        seq.serialize_element(&self.ntime)?;
        seq.serialize_element(&self.nonce_suffix)?;
        seq.serialize_element(&self.solution)?;
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Submit {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (username, job_id, ntime, nonce_suffix, solution) =
            <(String, String, String, NoncePart, Solution)>::deserialize(deserializer)?;

        Ok(Submit {
            username,
            job_id,
            ntime,
            nonce_suffix,
            solution,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let submit = Submit {
            username: "miner1".into(),
            job_id: "1f".into(),
            ntime: "5b1a4e37".into(),
            nonce_suffix: "00010000000000000000000000000000".parse().unwrap(),
            solution: Solution::from_raw(&[0xcd; SOLUTION_LENGTH]).unwrap(),
        };

        let json = serde_json::to_string(&submit).unwrap();
        let back: Submit = serde_json::from_str(&json).unwrap();
        assert_eq!(back, submit);

        let value: Value = serde_json::from_str(&json).unwrap();
        let params = value.as_array().unwrap();
        assert_eq!(params.len(), 5);
        assert_eq!(params[0], "miner1");
        assert_eq!(params[1], "1f");
        assert_eq!(params[2], "5b1a4e37");
        assert!(
            params[4]
                .as_str()
                .unwrap()
                .starts_with(&hex::encode(SOLUTION_PREFIX))
        );
    }

    #[test]
    fn rejects_bad_arity() {
        assert!(serde_json::from_str::<Submit>(r#"["miner1","1f","5b1a4e37"]"#).is_err());
    }
}
