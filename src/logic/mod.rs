pub mod sequencer;

pub use sequencer::{
    PingSource, RandomPing, SharedStore, add_servers, ping_servers, spawn_startup,
    startup_sequence,
};
