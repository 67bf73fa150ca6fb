//! The staff directory, served by a generic [`ResourceActor`](crate::actor_framework::ResourceActor)
//! over [`User`](crate::domain::User) rows.

mod entity;
mod error;

pub use error::*;
