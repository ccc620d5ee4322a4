//! Persistence and services for the Platter ordering assistant.

pub mod context;
pub mod database;
pub mod domain;
pub mod notifications;

#[cfg(test)]
mod test;

mod uuids;
