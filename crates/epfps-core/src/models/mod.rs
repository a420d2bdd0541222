//! Data models for EPFPS client state.
//!
//! This module contains the structures cached on the client:
//!
//! - Location hierarchies: `Country` > `State` > `City` > `Street` and
//!   `Region` > `Department` > `Arrondissement`
//! - Reference lists: `EducationLevel`, `Ethnicity`, `Relationship`
//! - `ConfigurationSnapshot`: the aggregate of all reference lists
//! - `SessionPayload`, `DetailedUserInfo`: the signed-in user

pub mod location;
pub mod reference;
pub mod snapshot;
pub mod user;

pub use location::{Arrondissement, City, Country, Department, Region, State, Street};
pub use reference::{EducationLevel, Ethnicity, NaturalKey, Relationship};
pub use snapshot::{ConfigurationSnapshot, SnapshotError};
pub use user::{DetailedUserInfo, SessionPayload, UserRole};
