use {
    anyhow::{Context, Error, bail, ensure},
    arguments::Arguments,
    clap::Parser,
    hash_rate::HashRate,
    miner::{CpuWorker, GpuWorker, MinerPool, Share, Worker},
    parking_lot::Mutex,
    serde::{Deserialize, Serialize},
    server::Server,
    solver::{DeviceId, IdleSolver, Solver},
    stats::MinerStats,
    std::{
        env,
        fmt::{self, Display, Formatter},
        io,
        iter::Sum,
        net::SocketAddr,
        ops::{Add, AddAssign},
        process,
        str::FromStr,
        sync::{
            Arc,
            atomic::{AtomicBool, Ordering},
        },
        thread,
        time::{Duration, Instant},
    },
    stratum::{Client, Event, Job, NONCE_LENGTH, NoncePart, Solution, Submitter, Target},
    subcommand::Subcommand,
    switcher::ServerSwitcher,
    sysinfo::System,
    tokio::{
        io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
        runtime::Runtime,
        sync::mpsc,
        task::JoinSet,
        time::{MissedTickBehavior, interval, sleep},
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

mod arguments;
mod hash_rate;
mod logs;
mod miner;
pub mod server;
mod session;
mod signal;
mod solver;
mod stats;
pub mod stratum;
mod subcommand;
mod switcher;

pub const USER_AGENT: &str = "equimine/0.1.0";
pub const DEFAULT_STRATUM_PORT: u16 = 3333;
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);
pub const STATS_DISPLAY_PERIOD: Duration = Duration::from_secs(2);
pub const STATS_FLUSH_PERIOD: Duration = Duration::from_secs(2);
pub const WORK_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const MAX_WORKERS: usize = 255;
pub const SHARE_CHANNEL_CAPACITY: usize = 64;

type Result<T = (), E = Error> = std::result::Result<T, E>;

async fn resolve_server(server: &Server) -> Result<SocketAddr> {
    tokio::net::lookup_host((server.host.as_str(), server.port))
        .await?
        .next()
        .with_context(|| format!("failed to resolve {}:{}", server.host, server.port))
}

pub fn main() {
    let _guard = logs::init();

    let args = Arguments::parse();

    match args.run() {
        Err(err) => {
            eprintln!("error: {err}");

            for (i, cause) in err.chain().skip(1).enumerate() {
                if i == 0 {
                    eprintln!();
                    eprintln!("because:");
                }
                eprintln!("- {cause}");
            }

            if env::var_os("RUST_BACKTRACE")
                .map(|val| val == "1")
                .unwrap_or_default()
            {
                eprintln!();
                eprintln!("{}", err.backtrace());
            }
            process::exit(1);
        }
        Ok(_) => {
            process::exit(0);
        }
    }
}
