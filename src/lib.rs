// Multidimensional projection: classical MDS and LAMP

#![doc = include_str!("../README.md")]

pub mod diagnostics;
pub mod error;
pub mod lamp;
pub mod linalg_backends;
pub mod mds;
pub mod validation;

pub use error::{ErrorKind, ProjectionError, Result};
pub use lamp::{lamp, lamp_with_config, LampConfig, LampModel};
pub use mds::{cmdscale, cmdscale_with_options, MdsOptions, MdsOutput};
pub use validation::{validate_lamp, validate_mds, validate_mds_with_tolerance};
