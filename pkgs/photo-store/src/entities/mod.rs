//! Sea-ORM entities for photo-store

pub mod photostate;

pub use photostate::Entity as Photostate;
