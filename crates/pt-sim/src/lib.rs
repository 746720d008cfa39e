//! pt-sim: step drivers for the power-path twin.
//!
//! Contains:
//! - storage_sim (lock-step driver comparing storage models, traces)
//! - profiles (synthetic charge/discharge current profiles)
//! - signals (synthetic IV input traces)
//! - emulation (input trace through harvester, converter, storage and target)
//! - sweep (independent runs on the rayon pool)
//!
//! Drivers are single-threaded and deterministic; parallelism only ever
//! happens across independent simulations.

pub mod emulation;
pub mod error;
pub mod profiles;
pub mod signals;
pub mod storage_sim;
pub mod sweep;

pub use emulation::{EmulationRecord, run_emulation};
pub use error::{SimError, SimResult};
pub use profiles::ChargeProfile;
pub use signals::{IvSample, constant_iv, sawtooth_iv};
pub use storage_sim::{StorageSimulator, StorageTrace, TraceSample};
pub use sweep::{emulate_parallel, run_parallel};
