//! Client-side state caches.
//!
//! - `ConfigCache`: reference lists fetched from the configuration endpoint,
//!   stored under `location-storage` and considered fresh for 24 hours
//! - `SessionCache`: the signed-in user, stored under `user-storage`
//! - `AcademicYearContext`: the "year is changing" flag that survives the
//!   reload triggered by switching academic years
//!
//! Each cache is a cheap-to-clone handle over shared state and writes its
//! whole document back to the storage medium after every mutation.

pub mod academic_year;
pub mod config;
pub mod session;

pub use academic_year::{AcademicYearContext, ChangePhase, YearChangeHandler};
pub use config::{CacheMetadata, ConfigCache};
pub use session::{SessionCache, SessionState};
