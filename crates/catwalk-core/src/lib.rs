//! catwalk-core — type descriptors, validators, envelopes and IO frames.
//! All other Catwalk crates depend on this one.

pub mod config;
pub mod descriptor;
pub mod envelope;
pub mod identity;
pub mod io;
pub mod meta;
pub mod validator;

pub use descriptor::{SchemaCompilationError, TypeDescriptor, TypeKind};
pub use identity::Identity;
pub use io::{AdaptError, AdaptedInput, Frame, IoType, Table};
pub use meta::{MetaError, ModelMeta};
pub use validator::{ValidationError, Validator};
