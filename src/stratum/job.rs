use super::*;

#[derive(Debug, Snafu, PartialEq)]
pub enum JobError {
    #[snafu(display("{field} must be {expected} bytes, got {actual}"))]
    InvalidLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[snafu(display("{field} is not valid hex: {source}"))]
    InvalidHex {
        field: &'static str,
        source: hex::FromHexError,
    },
    #[snafu(display("job {job_id} has no target attached"))]
    MissingTarget { job_id: String },
}

/// One proof-of-work template. Immutable once the target is attached; a new
/// notification replaces the whole job, it is never patched in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    job_id: String,
    version: [u8; 4],
    prev_hash: [u8; 32],
    merkle_root: [u8; 32],
    reserved: [u8; 32],
    ntime: [u8; 4],
    nbits: [u8; 4],
    clean: bool,
    target: Option<Target>,
}

fn field<const N: usize>(name: &'static str, hex_str: &str) -> Result<[u8; N], JobError> {
    let bytes = hex::decode(hex_str).context(InvalidHexSnafu { field: name })?;
    let actual = bytes.len();
    bytes.try_into().map_err(|_| JobError::InvalidLength {
        field: name,
        expected: N,
        actual,
    })
}

impl Job {
    pub fn from_notify(notify: &Notify) -> Result<Self, JobError> {
        Ok(Self {
            job_id: notify.job_id.clone(),
            version: field("version", &notify.version)?,
            prev_hash: field("prev_hash", &notify.prev_hash)?,
            merkle_root: field("merkle_root", &notify.merkle_root)?,
            reserved: field("reserved", &notify.reserved)?,
            ntime: field("ntime", &notify.ntime)?,
            nbits: field("nbits", &notify.nbits)?,
            clean: notify.clean_jobs,
            target: None,
        })
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn clean(&self) -> bool {
        self.clean
    }

    pub fn ntime_hex(&self) -> String {
        hex::encode(self.ntime)
    }

    /// Attaches the session target. Jobs are stamped exactly once, before
    /// they are shared with workers.
    pub fn set_target(&mut self, target: Target) {
        self.target = Some(target);
    }

    pub fn target(&self) -> Option<Target> {
        self.target
    }

    pub fn build_header(&self, nonce: &[u8]) -> Result<Vec<u8>, JobError> {
        if nonce.len() != NONCE_LENGTH {
            return Err(JobError::InvalidLength {
                field: "nonce",
                expected: NONCE_LENGTH,
                actual: nonce.len(),
            });
        }

        let mut header = Vec::with_capacity(HEADER_LENGTH);
        header.extend_from_slice(&self.version);
        header.extend_from_slice(&self.prev_hash);
        header.extend_from_slice(&self.merkle_root);
        header.extend_from_slice(&self.reserved);
        header.extend_from_slice(&self.ntime);
        header.extend_from_slice(&self.nbits);
        header.extend_from_slice(nonce);

        if header.len() != HEADER_LENGTH {
            return Err(JobError::InvalidLength {
                field: "header",
                expected: HEADER_LENGTH,
                actual: header.len(),
            });
        }

        Ok(header)
    }

    /// Double SHA-256 over header and length-prefixed solution, interpreted
    /// as a little-endian integer and compared strictly against the target.
    /// Solvers are allowed to be approximate, so every candidate goes through
    /// here before submission.
    pub fn is_valid(&self, header: &[u8], solution: &Solution) -> Result<bool, JobError> {
        if header.len() != HEADER_LENGTH {
            return Err(JobError::InvalidLength {
                field: "header",
                expected: HEADER_LENGTH,
                actual: header.len(),
            });
        }

        let target = self.target.ok_or_else(|| JobError::MissingTarget {
            job_id: self.job_id.clone(),
        })?;

        let mut buf = Vec::with_capacity(header.len() + solution.as_bytes().len());
        buf.extend_from_slice(header);
        buf.extend_from_slice(solution.as_bytes());

        let digest = sha256d::Hash::hash(&buf).to_byte_array();

        Ok(target.is_met_by(&digest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notify() -> Notify {
        Notify {
            job_id: "1f".into(),
            version: "04000000".into(),
            prev_hash: hex::encode([0x11; 32]),
            merkle_root: hex::encode([0x22; 32]),
            reserved: hex::encode([0x00; 32]),
            ntime: "5b1a4e37".into(),
            nbits: "1d00ffff".into(),
            clean_jobs: true,
        }
    }

    fn job() -> Job {
        Job::from_notify(&notify()).unwrap()
    }

    #[test]
    fn from_notify_decodes_fields() {
        let job = job();
        assert_eq!(job.job_id(), "1f");
        assert!(job.clean());
        assert_eq!(job.ntime_hex(), "5b1a4e37");
        assert_eq!(job.target(), None);
    }

    #[test]
    fn from_notify_rejects_wrong_lengths() {
        let mut bad = notify();
        bad.prev_hash = "1111".into();
        assert_eq!(
            Job::from_notify(&bad).unwrap_err(),
            JobError::InvalidLength {
                field: "prev_hash",
                expected: 32,
                actual: 2,
            }
        );

        let mut bad = notify();
        bad.version = "040000".into();
        assert!(matches!(
            Job::from_notify(&bad).unwrap_err(),
            JobError::InvalidLength {
                field: "version",
                ..
            }
        ));
    }

    #[test]
    fn from_notify_rejects_bad_hex() {
        let mut bad = notify();
        bad.nbits = "zzzzzzzz".into();
        assert!(matches!(
            Job::from_notify(&bad).unwrap_err(),
            JobError::InvalidHex { field: "nbits", .. }
        ));
    }

    #[test]
    fn header_layout() {
        let job = job();
        let nonce = [0xab; NONCE_LENGTH];
        let header = job.build_header(&nonce).unwrap();

        assert_eq!(header.len(), HEADER_LENGTH);
        assert_eq!(&header[..4], hex::decode("04000000").unwrap().as_slice());
        assert_eq!(&header[4..36], [0x11; 32]);
        assert_eq!(&header[36..68], [0x22; 32]);
        assert_eq!(&header[68..100], [0x00; 32]);
        assert_eq!(&header[100..104], hex::decode("5b1a4e37").unwrap().as_slice());
        assert_eq!(&header[104..108], hex::decode("1d00ffff").unwrap().as_slice());
        assert_eq!(&header[108..], nonce);
    }

    #[test]
    fn build_header_rejects_wrong_nonce_length() {
        let job = job();
        assert_eq!(
            job.build_header(&[0u8; 31]).unwrap_err(),
            JobError::InvalidLength {
                field: "nonce",
                expected: NONCE_LENGTH,
                actual: 31,
            }
        );
    }

    #[test]
    fn is_valid_requires_target() {
        let job = job();
        let header = job.build_header(&[0u8; NONCE_LENGTH]).unwrap();
        let solution = Solution::from_raw(&[0u8; SOLUTION_LENGTH]).unwrap();

        assert_eq!(
            job.is_valid(&header, &solution).unwrap_err(),
            JobError::MissingTarget {
                job_id: "1f".into()
            }
        );
    }

    #[test]
    fn is_valid_rejects_wrong_header_length() {
        let mut job = job();
        job.set_target(Target::MAX);
        let solution = Solution::from_raw(&[0u8; SOLUTION_LENGTH]).unwrap();
        assert!(matches!(
            job.is_valid(&[0u8; 10], &solution).unwrap_err(),
            JobError::InvalidLength { field: "header", .. }
        ));
    }

    #[test]
    fn validation_is_deterministic_and_monotonic_in_target() {
        let mut job = job();
        let header = job.build_header(&[0x42; NONCE_LENGTH]).unwrap();
        let solution = Solution::from_raw(&[0x17; SOLUTION_LENGTH]).unwrap();

        // A zero target admits nothing.
        job.set_target("00".parse().unwrap());
        assert!(!job.is_valid(&header, &solution).unwrap());

        // The same inputs always produce the same verdict.
        job.set_target(Target::MAX);
        let first = job.is_valid(&header, &solution).unwrap();
        let second = job.is_valid(&header, &solution).unwrap();
        assert_eq!(first, second);
        assert!(first, "digest of a fixed input should fall below U256::MAX");
    }

    #[test]
    fn replacement_not_mutation() {
        let mut job_a = job();
        job_a.set_target(Target::MAX);

        let mut changed = notify();
        changed.job_id = "20".into();
        let mut job_b = Job::from_notify(&changed).unwrap();
        job_b.set_target("00".parse().unwrap());

        // The old job keeps its own target after a replacement arrives.
        assert_eq!(job_a.target(), Some(Target::MAX));
        assert_eq!(job_b.target(), Some("00".parse().unwrap()));
    }

    #[test]
    fn serde_roundtrip() {
        let mut job = job();
        job.set_target(Target::MAX);
        let json = serde_json::to_string(&job).unwrap();
        let back: Job = serde_json::from_str(&json).unwrap();
        assert_eq!(back, job);
    }
}
