use super::*;

/// The local counter resets long before its byte width runs out.
const NONCE2_RESET_LIMIT: u64 = 1 << 62;

/// One proof-of-work round: counter bump, nonce and header assembly, a
/// single solver invocation, and independent validation of every candidate
/// it returned.
pub(crate) struct Pow {
    tag: u8,
    nonce2: u64,
}

pub(crate) struct Round {
    pub(crate) shares: Vec<(NoncePart, Solution)>,
    pub(crate) candidate_count: u64,
    pub(crate) elapsed: Duration,
}

impl Pow {
    pub(crate) fn new(tag: u8) -> Self {
        Self { tag, nonce2: 0 }
    }

    pub(crate) fn tag(&self) -> u8 {
        self.tag
    }

    fn nonce2_width(nonce1: &NoncePart) -> Result<usize> {
        ensure!(
            nonce1.len() + 1 < NONCE_LENGTH,
            "nonce1 of {} bytes leaves no room for the local counter",
            nonce1.len()
        );
        Ok(NONCE_LENGTH - nonce1.len() - 1)
    }

    fn reset_limit(width: usize) -> u64 {
        if width >= 8 {
            NONCE2_RESET_LIMIT
        } else {
            1 << (8 * width as u32 - 2)
        }
    }

    fn next_nonce2(&mut self, width: usize) -> Vec<u8> {
        if self.nonce2 >= Self::reset_limit(width) {
            self.nonce2 = 0;
        }
        self.nonce2 += 1;

        let le = self.nonce2.to_le_bytes();
        let mut bytes = vec![0u8; width];
        let n = width.min(le.len());
        bytes[..n].copy_from_slice(&le[..n]);
        bytes
    }

    pub(crate) fn solve_round(
        &mut self,
        job: &Job,
        nonce1: &NoncePart,
        solver: &mut dyn Solver,
    ) -> Result<Round> {
        let width = Self::nonce2_width(nonce1)?;
        let nonce2 = self.next_nonce2(width);

        let mut nonce = Vec::with_capacity(NONCE_LENGTH);
        nonce.extend_from_slice(nonce1.as_bytes());
        nonce.push(self.tag);
        nonce.extend_from_slice(&nonce2);

        let header = job.build_header(&nonce)?;

        let output = solver.find_solutions(&header)?;
        let candidate_count = output.candidates.len() as u64;

        let mut shares = Vec::new();

        for candidate in &output.candidates {
            let solution = match Solution::from_raw(candidate) {
                Ok(solution) => solution,
                Err(e) => {
                    debug!("Dropping malformed candidate: {e}");
                    continue;
                }
            };

            if job.is_valid(&header, &solution)? {
                info!("Found valid solution for job {}", job.job_id());

                let mut suffix = Vec::with_capacity(1 + nonce2.len());
                suffix.push(self.tag);
                suffix.extend_from_slice(&nonce2);

                shares.push((NoncePart::from_bytes(suffix), solution));
            } else {
                debug!("Candidate misses target for job {}", job.job_id());
            }
        }

        Ok(Round {
            shares,
            candidate_count,
            elapsed: output.elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            solver::SolverOutput,
            stratum::{HEADER_LENGTH, Notify, SOLUTION_LENGTH},
        },
    };

    /// Records the headers it was asked to solve and returns a canned batch.
    struct RecordingSolver {
        headers: Vec<Vec<u8>>,
        candidates: Vec<Vec<u8>>,
    }

    impl RecordingSolver {
        fn new(candidates: Vec<Vec<u8>>) -> Self {
            Self {
                headers: Vec::new(),
                candidates,
            }
        }
    }

    impl Solver for RecordingSolver {
        fn find_solutions(&mut self, header: &[u8]) -> Result<SolverOutput> {
            self.headers.push(header.to_vec());
            Ok(SolverOutput {
                candidates: self.candidates.clone(),
                elapsed: Duration::from_millis(1),
            })
        }
    }

    fn job(target: Target) -> Job {
        let notify = Notify {
            job_id: "1f".into(),
            version: "04000000".into(),
            prev_hash: hex::encode([0x11; 32]),
            merkle_root: hex::encode([0x22; 32]),
            reserved: hex::encode([0x00; 32]),
            ntime: "5b1a4e37".into(),
            nbits: "1d00ffff".into(),
            clean_jobs: false,
        };
        let mut job = Job::from_notify(&notify).unwrap();
        job.set_target(target);
        job
    }

    fn nonce_of(header: &[u8]) -> &[u8] {
        &header[HEADER_LENGTH - NONCE_LENGTH..]
    }

    #[test]
    fn distinct_tags_never_collide() {
        let job = job(Target::MAX);
        let nonce1: NoncePart = "08000002".parse().unwrap();

        let mut first = Pow::new(0);
        let mut second = Pow::new(1);

        let mut solver_a = RecordingSolver::new(Vec::new());
        let mut solver_b = RecordingSolver::new(Vec::new());

        // Both workers walk the same counter values; the partition tag alone
        // keeps the nonces disjoint.
        for _ in 0..16 {
            first.solve_round(&job, &nonce1, &mut solver_a).unwrap();
            second.solve_round(&job, &nonce1, &mut solver_b).unwrap();
        }

        for (a, b) in solver_a.headers.iter().zip(&solver_b.headers) {
            assert_ne!(nonce_of(a), nonce_of(b));
        }
    }

    #[test]
    fn nonce_layout() {
        let job = job(Target::MAX);
        let nonce1: NoncePart = "08000002".parse().unwrap();

        let mut pow = Pow::new(7);
        let mut solver = RecordingSolver::new(Vec::new());
        pow.solve_round(&job, &nonce1, &mut solver).unwrap();

        let nonce = nonce_of(&solver.headers[0]);
        assert_eq!(nonce.len(), NONCE_LENGTH);
        assert_eq!(&nonce[..4], nonce1.as_bytes());
        assert_eq!(nonce[4], 7);
        // Counter is little-endian in the remaining bytes.
        assert_eq!(nonce[5], 1);
        assert!(nonce[6..].iter().all(|&b| b == 0));
    }

    #[test]
    fn counter_increments_per_round() {
        let job = job(Target::MAX);
        let nonce1: NoncePart = "08000002".parse().unwrap();

        let mut pow = Pow::new(0);
        let mut solver = RecordingSolver::new(Vec::new());
        for _ in 0..3 {
            pow.solve_round(&job, &nonce1, &mut solver).unwrap();
        }

        let counters: Vec<u8> = solver.headers.iter().map(|h| nonce_of(h)[5]).collect();
        assert_eq!(counters, [1, 2, 3]);
    }

    #[test]
    fn counter_resets_at_limit() {
        let mut pow = Pow::new(0);
        pow.nonce2 = NONCE2_RESET_LIMIT;
        assert_eq!(pow.next_nonce2(8), 1u64.to_le_bytes().to_vec());
        assert_eq!(pow.nonce2, 1);
    }

    #[test]
    fn narrow_counter_resets_before_overflowing_its_width() {
        // A 29 byte nonce1 leaves two bytes for the counter.
        let limit = Pow::reset_limit(2);
        assert_eq!(limit, 1 << 14);

        let mut pow = Pow::new(0);
        pow.nonce2 = limit;
        let bytes = pow.next_nonce2(2);
        assert_eq!(bytes, vec![1, 0]);
    }

    #[test]
    fn oversized_nonce1_is_rejected() {
        let job = job(Target::MAX);
        let nonce1 = NoncePart::from_bytes(vec![0u8; NONCE_LENGTH]);
        let mut pow = Pow::new(0);
        let mut solver = RecordingSolver::new(Vec::new());
        assert!(pow.solve_round(&job, &nonce1, &mut solver).is_err());
    }

    #[test]
    fn valid_candidates_become_shares() {
        let job = job(Target::MAX);
        let nonce1: NoncePart = "08000002".parse().unwrap();

        let mut pow = Pow::new(3);
        let mut solver = RecordingSolver::new(vec![vec![0xab; SOLUTION_LENGTH]]);
        let round = pow.solve_round(&job, &nonce1, &mut solver).unwrap();

        assert_eq!(round.candidate_count, 1);
        assert_eq!(round.shares.len(), 1);

        let (suffix, solution) = &round.shares[0];
        assert_eq!(suffix.len(), NONCE_LENGTH - nonce1.len());
        assert_eq!(suffix.as_bytes()[0], 3);
        assert_eq!(solution.as_bytes().len(), SOLUTION_LENGTH + 3);
    }

    #[test]
    fn candidates_missing_the_target_are_dropped_silently() {
        let job = job("00".parse().unwrap());
        let nonce1: NoncePart = "08000002".parse().unwrap();

        let mut pow = Pow::new(0);
        let mut solver = RecordingSolver::new(vec![vec![0xab; SOLUTION_LENGTH]]);
        let round = pow.solve_round(&job, &nonce1, &mut solver).unwrap();

        assert_eq!(round.candidate_count, 1);
        assert!(round.shares.is_empty());
    }

    #[test]
    fn malformed_candidates_are_dropped_silently() {
        let job = job(Target::MAX);
        let nonce1: NoncePart = "08000002".parse().unwrap();

        let mut pow = Pow::new(0);
        let mut solver = RecordingSolver::new(vec![vec![0xab; 10]]);
        let round = pow.solve_round(&job, &nonce1, &mut solver).unwrap();

        assert_eq!(round.candidate_count, 1);
        assert!(round.shares.is_empty());
    }
}
