use {
    bitcoin::hashes::{Hash, sha256d},
    derive_more::Display,
    futures::StreamExt,
    parking_lot::Mutex,
    primitive_types::U256,
    serde::{
        Deserialize, Serialize,
        de::{self, Deserializer},
        ser::{SerializeSeq, Serializer},
    },
    serde_json::Value,
    serde_with::{DeserializeFromStr, SerializeDisplay},
    snafu::{ResultExt, Snafu},
    std::{
        collections::BTreeMap,
        fmt,
        str::FromStr,
        sync::{
            Arc,
            atomic::{AtomicU64, Ordering},
        },
        time::Duration,
    },
    tokio::{
        io::{AsyncWriteExt, BufWriter},
        net::{
            TcpStream,
            tcp::{OwnedReadHalf, OwnedWriteHalf},
        },
        sync::{mpsc, oneshot},
        time::timeout,
    },
    tokio_util::codec::{FramedRead, LinesCodec},
    tracing::{debug, warn},
};

mod authorize;
mod client;
mod event;
mod job;
mod message;
mod nonce;
mod notify;
mod set_target;
mod solution;
mod submit;
mod subscribe;
mod target;

pub use {
    authorize::Authorize,
    client::{Client, ClientError, Submitter},
    event::Event,
    job::{Job, JobError},
    message::{Id, Message},
    nonce::NoncePart,
    notify::Notify,
    set_target::SetTarget,
    solution::Solution,
    submit::Submit,
    subscribe::{Subscribe, SubscribeResult},
    target::Target,
};

/// Block header length including the 32 byte nonce field.
pub const HEADER_LENGTH: usize = 140;
pub const NONCE_LENGTH: usize = 32;
pub const SOLUTION_LENGTH: usize = 1344;
/// Compact-size prefix for a 1344 byte Equihash solution.
pub const SOLUTION_PREFIX: [u8; 3] = [0xfd, 0x40, 0x05];
pub const MAX_MESSAGE_SIZE: usize = 32 * 1024;
