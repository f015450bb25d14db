//! Data model shared by the engine, the reducer, and the revision loop.
//!
//! Everything here is a plain value type. A [`Build`] can only be produced by
//! converting a [`BuildDraft`], which is where structural completeness is
//! enforced; nothing downstream of that conversion ever sees a partial build.

pub mod build;
pub mod component;
pub mod constraints;

pub use build::{Build, BuildDraft, StructuralFailure};
pub use component::{
    ChassisSize, ChassisSpec, ComponentClass, ComponentSpec, CoolingSpec, CoolingType, CpuSpec,
    GpuSpec, MotherboardSpec, PeripheralSpec, PsuSpec, RamSpec, StorageKind, StorageSpec,
};
pub use constraints::{Constraints, ConstraintsError, NoiseTolerance, PeripheralFlags, Priority};
