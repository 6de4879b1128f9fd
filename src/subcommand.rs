use super::*;

mod mine;
mod solver_backend;

#[derive(Debug, Parser)]
pub(crate) enum Subcommand {
    #[command(about = "Mine against a list of Stratum servers")]
    Mine(mine::Mine),
    /// Child-process body of a process-backed worker; spawned by the miner
    /// itself, not meant to be invoked by hand.
    #[command(hide = true)]
    SolverBackend(solver_backend::SolverBackend),
}

impl Subcommand {
    pub(crate) fn run(self) -> Result {
        match self {
            Self::Mine(mine) => Runtime::new()?.block_on(async {
                let cancel = signal::setup_handler();
                mine.run(cancel).await
            }),
            Self::SolverBackend(backend) => backend.run(),
        }
    }
}
