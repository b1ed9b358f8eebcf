// File: fitroom-common/src/traits/mod.rs
pub mod auth_traits;
pub mod repository_traits;
pub mod schema_traits;
pub mod storage_traits;
