// crates/cloud-smoke-datastore/src/basic.rs
// ============================================================================
// Module: Basic Driver
// Description: Fixed-kind access to `Animal` entities.
// Purpose: Smallest useful client over the Datastore driver.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`BasicDriver`] wraps a shared [`DatastoreDriver`] and only knows the
//! `Animal` kind. It exists as a worked example of typed entity access.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use crate::driver::DatastoreDriver;
use crate::driver::Driver;
use crate::error::DatastoreError;
use crate::key::Key;

/// Entity kind handled by [`BasicDriver`].
pub const ANIMAL_KIND: &str = "Animal";
/// Name of the entity returned by [`BasicDriver::get`].
pub const SAMPLE_ANIMAL_NAME: &str = "5634161670881280";

/// Animal entity; properties are stored as `Name`, `Legs`, `Sound`, `FoodType`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Animal {
    /// Display name.
    pub name: String,
    /// Leg count.
    pub legs: i64,
    /// Sound it makes.
    pub sound: String,
    /// Diet, for example `herbivore`.
    pub food_type: String,
}

impl fmt::Display for Animal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{Name:{} Legs:{} Sound:{} FoodType:{}}}",
            self.name, self.legs, self.sound, self.food_type
        )
    }
}

/// Typed `Animal` access over a shared driver.
#[derive(Debug, Clone)]
pub struct BasicDriver {
    /// Underlying driver.
    driver: Arc<DatastoreDriver>,
}

impl BasicDriver {
    /// Wraps a shared driver.
    #[must_use]
    pub const fn new(driver: Arc<DatastoreDriver>) -> Self {
        Self {
            driver,
        }
    }

    /// Fetches the sample animal stored under [`SAMPLE_ANIMAL_NAME`].
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError::NotFound`] when it does not exist.
    pub async fn get(&self) -> Result<Animal, DatastoreError> {
        let key = Key::name_key(ANIMAL_KIND, SAMPLE_ANIMAL_NAME, None);
        self.driver.get(&key).await?.ok_or_else(|| DatastoreError::NotFound(key.to_string()))
    }

    /// Returns every `Animal` entity.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when the query fails.
    pub async fn get_all(&self) -> Result<Vec<Animal>, DatastoreError> {
        let entities = self.driver.find(None, ANIMAL_KIND, None, "")?.collect_all().await?;
        Ok(entities.into_iter().map(|(_, animal)| animal).collect())
    }

    /// Stores `animal` under a newly allocated key and returns the encoded key.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when the commit fails.
    pub async fn put(&self, animal: &Animal) -> Result<String, DatastoreError> {
        self.driver.create(&Key::incomplete_key(ANIMAL_KIND, None), animal).await
    }

    /// Closes the underlying driver.
    pub async fn close(&self) {
        self.driver.close().await;
    }
}
