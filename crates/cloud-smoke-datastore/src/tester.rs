// crates/cloud-smoke-datastore/src/tester.rs
// ============================================================================
// Module: Datastore Tester
// Description: Entity lifecycle against Cloud Datastore.
// Purpose: Create, query, update, read back, and delete one Animal entity.
// Dependencies: async-trait, cloud-smoke-core
// ============================================================================

//! ## Overview
//! The entity is stored under an incomplete key, so every run works on a
//! fresh id. The allocated key is remembered for cleanup, which only runs
//! when the scripted delete did not.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use cloud_smoke_core::PrefixedLogger;
use cloud_smoke_core::Tester;
use cloud_smoke_core::TesterError;

use crate::basic::ANIMAL_KIND;
use crate::basic::Animal;
use crate::driver::DATASTORE_SERVICE_NAME;
use crate::driver::DatastoreDriver;
use crate::driver::Driver;
use crate::filter::FieldFilter;
use crate::key::Key;

// ============================================================================
// SECTION: Scenario
// ============================================================================

/// Entity written by the Datastore tester.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatastoreScenario {
    /// Entity stored first.
    pub animal: Animal,
    /// Value written to `Sound` by the update step.
    pub new_sound: String,
}

impl Default for DatastoreScenario {
    fn default() -> Self {
        Self {
            animal: Animal {
                name: "Smoke Test Lion".to_string(),
                legs: 4,
                sound: "roar".to_string(),
                food_type: "carnivore".to_string(),
            },
            new_sound: "purr".to_string(),
        }
    }
}

// ============================================================================
// SECTION: Tester
// ============================================================================

/// Smoke tester for Cloud Datastore.
pub struct DatastoreTester<D = DatastoreDriver> {
    /// Shared driver.
    driver: Arc<D>,
    /// Entity values.
    scenario: DatastoreScenario,
    /// `[Datastore]` logger.
    logger: PrefixedLogger,
}

impl<D: Driver> DatastoreTester<D> {
    /// Creates a tester with the default scenario.
    pub fn new(driver: Arc<D>) -> Self {
        Self {
            driver,
            scenario: DatastoreScenario::default(),
            logger: PrefixedLogger::new(DATASTORE_SERVICE_NAME),
        }
    }

    /// Replaces the scenario.
    #[must_use]
    pub fn with_scenario(mut self, scenario: DatastoreScenario) -> Self {
        self.scenario = scenario;
        self
    }

    /// Returns the shared driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Runs the scripted steps; `created` holds the key while it exists.
    async fn steps(&self, created: &mut Option<Key>) -> Result<(), TesterError> {
        let animal = &self.scenario.animal;
        let key = self.create(animal).await?;
        *created = Some(key.clone());
        self.find_all().await?;
        self.find_ids(&key, &animal.name).await?;
        let updated = Animal {
            sound: self.scenario.new_sound.clone(),
            ..animal.clone()
        };
        self.update(&key, &updated).await?;
        self.read_back(&key, &updated).await?;
        self.delete(&key).await?;
        *created = None;
        Ok(())
    }

    /// Deletes the entity if the sequence left it behind.
    async fn clean(&self, created: Option<Key>) {
        self.logger.log("Start cleaning tests...");
        if let Some(key) = created {
            match self.driver.delete(&key).await {
                Ok(()) => self.logger.log(format_args!("Entity {key} deleted")),
                Err(err) if err.is_not_found() => {
                    self.logger.log(format_args!("Entity {key} not found"));
                }
                Err(err) => self.logger.error(err),
            }
        }
        self.logger.log("Tests cleaning completed.");
    }

    /// Stores the animal under a new key.
    async fn create(&self, animal: &Animal) -> Result<Key, TesterError> {
        self.logger.log(format_args!("Creating {ANIMAL_KIND} entity {animal}"));
        let encoded = self
            .driver
            .create(&Key::incomplete_key(ANIMAL_KIND, None), animal)
            .await
            .map_err(|err| TesterError::step(format!("create {ANIMAL_KIND} entity"), err))?;
        let key = Key::decode(&encoded)
            .map_err(|err| TesterError::step("decode created key", err))?;
        self.logger.log(format_args!("Entity created with key {key}"));
        Ok(key)
    }

    /// Lists every entity of the kind.
    async fn find_all(&self) -> Result<(), TesterError> {
        self.logger.log(format_args!("Finding all {ANIMAL_KIND} entities"));
        let action = format!("find {ANIMAL_KIND} entities");
        let mut entities = self
            .driver
            .find(None, ANIMAL_KIND, None, "")
            .map_err(|err| TesterError::step(action.clone(), err))?;
        let mut count = 0_usize;
        while let Some((key, animal)) = entities
            .next_entity::<Animal>()
            .await
            .map_err(|err| TesterError::step(action.clone(), err))?
        {
            count += 1;
            self.logger.log(format_args!("  {count}. {key} {animal}"));
        }
        if count == 0 {
            self.logger.log("No entities found.");
        }
        Ok(())
    }

    /// Queries keys by name and checks the created key is among them.
    async fn find_ids(&self, key: &Key, name: &str) -> Result<(), TesterError> {
        self.logger.log(format_args!("Finding {ANIMAL_KIND} keys with Name = \"{name}\""));
        let filter = FieldFilter::equal("Name", name);
        let ids = self
            .driver
            .find_ids(None, ANIMAL_KIND, Some(&filter), "")
            .await
            .map_err(|err| TesterError::step(format!("find {ANIMAL_KIND} keys"), err))?;
        let found = ids
            .iter()
            .filter_map(|id| Key::decode(id).ok())
            .any(|candidate| candidate.path == key.path);
        if found {
            self.logger.log(format_args!("Found {} key(s) including {key}", ids.len()));
        } else {
            // Non-ancestor queries are eventually consistent on the public service.
            self.logger.warn(format_args!("Key {key} not yet visible in query results"));
        }
        Ok(())
    }

    /// Rewrites the entity.
    async fn update(&self, key: &Key, updated: &Animal) -> Result<(), TesterError> {
        self.logger.log(format_args!("Updating entity {key} to {updated}"));
        self.driver
            .update(key, updated)
            .await
            .map_err(|err| TesterError::step(format!("update entity {key}"), err))?;
        self.logger.log("Entity updated successfully");
        Ok(())
    }

    /// Reads the entity back and compares it with the update.
    async fn read_back(&self, key: &Key, expected: &Animal) -> Result<(), TesterError> {
        self.logger.log(format_args!("Getting entity {key}"));
        let animal: Option<Animal> = self
            .driver
            .get(key)
            .await
            .map_err(|err| TesterError::step(format!("get entity {key}"), err))?;
        let animal = animal
            .ok_or_else(|| TesterError::mismatch("entity", expected.to_string(), "<missing>"))?;
        self.logger.log(format_args!("Retrieved entity: {animal}"));
        if &animal != expected {
            return Err(TesterError::mismatch("entity", expected.to_string(), animal.to_string()));
        }
        Ok(())
    }

    /// Deletes the entity.
    async fn delete(&self, key: &Key) -> Result<(), TesterError> {
        self.logger.log(format_args!("Deleting entity {key}"));
        self.driver
            .delete(key)
            .await
            .map_err(|err| TesterError::step(format!("delete entity {key}"), err))?;
        self.logger.log(format_args!("Entity {key} deleted successfully"));
        Ok(())
    }
}

#[async_trait]
impl<D: Driver> Tester for DatastoreTester<D> {
    fn name(&self) -> &'static str {
        DATASTORE_SERVICE_NAME
    }

    async fn run(&self) -> Result<(), TesterError> {
        self.logger.log("Start Testing...");
        let mut created = None;
        let outcome = self.steps(&mut created).await;
        if outcome.is_ok() {
            self.logger.log("Testing Completed.");
        }
        self.clean(created).await;
        outcome
    }
}
