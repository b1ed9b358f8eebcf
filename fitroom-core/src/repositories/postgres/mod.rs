// src/repositories/postgres/mod.rs

pub mod avatar;
pub mod garment;
pub mod lease;
pub mod object;
pub mod outfit;
pub mod session;
pub mod tryon;

pub use avatar::PostgresAvatarRepository;
pub use garment::PostgresGarmentRepository;
pub use lease::PostgresLeaseRepository;
pub use object::PostgresObjectRepository;
pub use outfit::PostgresOutfitRepository;
pub use session::PostgresSessionRepository;
pub use tryon::PostgresTryonRepository;

use fitroom_common::models::GenerationStatus;
use sqlx::Row;
use sqlx::postgres::PgRow;
use crate::Error;

/// Status columns are plain TEXT with a CHECK constraint.
pub(crate) fn status_from_row(row: &PgRow) -> Result<GenerationStatus, Error> {
    let raw: String = row.try_get("status")?;
    raw.parse::<GenerationStatus>().map_err(Error::Parse)
}
