use super::*;

/// `mining.set_target` parameters: a single hex big-endian integer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetTarget(pub Target);

impl Serialize for SetTarget {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(1))?;
        seq.serialize_element(&self.0)?;
        seq.end()
    }
}

impl<'de> Deserialize<'de> for SetTarget {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (target,) = <(Target,)>::deserialize(deserializer)?;
        Ok(SetTarget(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let json = r#"["00ffff0000000000000000000000000000000000000000000000000000000000"]"#;
        let set_target: SetTarget = serde_json::from_str(json).unwrap();
        assert_eq!(
            set_target.0,
            "00ffff0000000000000000000000000000000000000000000000000000000000"
                .parse()
                .unwrap()
        );

        let ser = serde_json::to_string(&set_target).unwrap();
        assert_eq!(ser, json);
    }

    #[test]
    fn rejects_empty_params() {
        assert!(serde_json::from_str::<SetTarget>("[]").is_err());
    }
}
