use super::*;

/// `mining.notify` parameters, positional and hex-encoded. Field widths are
/// validated when the notification is turned into a [`Job`], not here.
#[derive(Debug, Clone, PartialEq)]
pub struct Notify {
    pub job_id: String,
    pub version: String,
    pub prev_hash: String,
    pub merkle_root: String,
    pub reserved: String,
    pub ntime: String,
    pub nbits: String,
    pub clean_jobs: bool,
}

impl Serialize for Notify {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(8))?;
        seq.serialize_element(&self.job_id)?;
        seq.serialize_element(&self.version)?;
        seq.serialize_element(&self.prev_hash)?;
        seq.serialize_element(&self.merkle_root)?;
        seq.serialize_element(&self.reserved)?;
        seq.serialize_element(&self.ntime)?;
        seq.serialize_element(&self.nbits)?;
        seq.serialize_element(&self.clean_jobs)?;
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Notify {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (job_id, version, prev_hash, merkle_root, reserved, ntime, nbits, clean_jobs) =
            <(String, String, String, String, String, String, String, bool)>::deserialize(
                deserializer,
            )?;

        Ok(Notify {
            job_id,
            version,
            prev_hash,
            merkle_root,
            reserved,
            ntime,
            nbits,
            clean_jobs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_roundtrip() {
        let json = format!(
            r#"["1f","04000000","{}","{}","{}","5b1a4e37","1d00ffff",true]"#,
            hex::encode([0x11; 32]),
            hex::encode([0x22; 32]),
            hex::encode([0x00; 32]),
        );

        let notify: Notify = serde_json::from_str(&json).unwrap();
        assert_eq!(notify.job_id, "1f");
        assert_eq!(notify.version, "04000000");
        assert!(notify.clean_jobs);

        let ser = serde_json::to_string(&notify).unwrap();
        let lhs: serde_json::Value = serde_json::from_str(&json).unwrap();
        let rhs: serde_json::Value = serde_json::from_str(&ser).unwrap();
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn rejects_bad_arity() {
        assert!(serde_json::from_str::<Notify>(r#"["1f","04000000"]"#).is_err());
    }
}
