//! SeaORM entities mirroring the domain model.

pub mod post;
pub mod profile;
pub mod user;
