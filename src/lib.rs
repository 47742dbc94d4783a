//! Empty and remove S3 buckets after interactive confirmation.
//!
//! Objects are deleted concurrently, with a fixed limit on the number of deletes in flight.

mod client;
mod confirm;
mod drain;
mod error;
mod gateway;
mod memory;
mod purge;
mod s3_aux;

pub use client::{get_region_client, PROFILE, REGION};
pub use confirm::{Confirm, ConsoleGate, Decision};
pub use drain::{drain_container, BatchOutcome, DEFAULT_CONCURRENCY};
pub use error::{GatewayError, GatewayResult, PurgeError};
pub use gateway::{Container, Item, ItemPage, SharedGateway, StorageGateway};
pub use memory::{Faults, InMemoryGateway};
pub use purge::{ContainerOutcome, PurgeReport, Purger};
pub use s3_aux::S3Gateway;
