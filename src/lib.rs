//! Availability and package tracking for the LliureX APT mirrors.
//!
//! The mirror is polled by two independent jobs: [`update::update_packages`]
//! records when each package last changed, and [`update::update_status`]
//! records whether each release is reachable. Both keep their state as JSON
//! files managed by [`store::Store`].

pub mod cli;
pub mod config;
pub mod differ;
pub mod error;
pub mod fetcher;
pub mod history;
pub mod logging;
pub mod model;
pub mod prober;
pub mod publish;
pub mod store;
pub mod update;
pub mod utils;

pub use config::Config;
pub use error::{FetchError, NetworkError, ParseError};
pub use model::{
    ChangeTimestampIndex, MirrorState, MirrorStatus, PackageRecord, ReleaseSnapshot,
    StatusReport, Vantage,
};
pub use store::{Store, StoreError, WriteOutcome};
