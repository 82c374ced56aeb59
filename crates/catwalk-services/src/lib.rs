//! catwalk-services — computations, mounting and request dispatch.

pub mod builtin;
pub mod computation;
pub mod conformance;
pub mod dispatch;
pub mod loader;
pub mod mount;

pub use computation::{Computation, ComputationRegistry, Factory, TestData};
pub use conformance::{ConformanceError, ConformanceReport};
pub use dispatch::{ComputationFailed, DispatchOptions, Dispatcher, Reply, ReplyStatus, Stage};
pub use loader::{load, LoadError};
pub use mount::{Mount, MountSlot};
