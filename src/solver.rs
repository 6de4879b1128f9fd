use super::*;

/// One round of search: zero or more raw candidate solutions plus the wall
/// time the search took. Candidates are unvalidated; the worker checks every
/// one against the job target before anything is submitted.
#[derive(Debug, Default)]
pub struct SolverOutput {
    pub candidates: Vec<Vec<u8>>,
    pub elapsed: Duration,
}

/// Injected proof-of-work search capability. Implementations own whatever
/// device or library state they need; a failure is fatal to the worker that
/// drives the solver, not to the pool.
pub trait Solver: Send {
    fn find_solutions(&mut self, header: &[u8]) -> Result<SolverOutput>;
}

/// An OpenCL platform and device index pair, written `PLATFORM:DEVICE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceId {
    pub platform: u32,
    pub device: u32,
}

impl FromStr for DeviceId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (platform, device) = s
            .split_once(':')
            .with_context(|| format!("device spec '{s}' must be PLATFORM:DEVICE"))?;

        Ok(Self {
            platform: platform
                .parse()
                .with_context(|| format!("invalid platform id in '{s}'"))?,
            device: device
                .parse()
                .with_context(|| format!("invalid device id in '{s}'"))?,
        })
    }
}

impl Display for DeviceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.platform, self.device)
    }
}

/// Placeholder solver used when the build carries no search plugin. Performs
/// no work and finds nothing, but keeps the whole worker loop exercised; the
/// pause stands in for the milliseconds a real Equihash round takes.
pub struct IdleSolver {
    verbose: bool,
    device: Option<DeviceId>,
    pause: Duration,
}

impl IdleSolver {
    const PAUSE: Duration = Duration::from_millis(100);

    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            device: None,
            pause: Self::PAUSE,
        }
    }

    pub fn for_device(device: DeviceId, verbose: bool) -> Self {
        Self {
            verbose,
            device: Some(device),
            pause: Self::PAUSE,
        }
    }
}

impl Solver for IdleSolver {
    fn find_solutions(&mut self, header: &[u8]) -> Result<SolverOutput> {
        let start = Instant::now();

        if self.verbose {
            match self.device {
                Some(device) => debug!(
                    "Idle solver on device {device} skipping {} byte header",
                    header.len()
                ),
                None => debug!("Idle solver skipping {} byte header", header.len()),
            }
        }

        thread::sleep(self.pause);

        Ok(SolverOutput {
            candidates: Vec::new(),
            elapsed: start.elapsed(),
        })
    }
}
