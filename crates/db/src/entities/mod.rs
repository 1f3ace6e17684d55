//! `SeaORM` entities.

pub mod attachments;
