//! Persistence layer for pipeline items
//!
//! This module provides:
//! - [`StoreClient`] trait, the contract offered to pipeline callers
//! - [`ObjectKey`] codec for composite identifiers
//! - [`DocumentStoreClient`] implementing the contract over any [`DocumentCollection`]
//! - [`MongoCollection`] for production and [`InMemoryCollection`] for testing

mod client;
mod collection;
pub mod document;
mod key;
mod memory;
mod mongo;
mod store;

pub use client::DocumentStoreClient;
pub use collection::{DocumentCollection, STORE_COLLECTION};
pub use key::{ObjectKey, KEY_SEPARATOR};
pub use memory::{InMemoryCollection, InMemoryStoreClient};
pub use mongo::{MongoCollection, MongoStoreClient};
pub use store::{StoreClient, StoreError};
