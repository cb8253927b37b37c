// system-tests/tests/suites/smoke.rs
// ============================================================================
// Module: Emulator Smoke Tests
// Description: Full tester runs against emulated services.
// Purpose: Prove each scripted sequence passes and cleans up for real.
// Dependencies: system-tests helpers, cloud-smoke-aws, cloud-smoke-datastore
// ============================================================================

//! Real tester runs against LocalStack and the Datastore emulator.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::sync::Arc;

use cloud_smoke_aws::build_testers;
use cloud_smoke_core::RunMode;
use cloud_smoke_core::RunReport;
use cloud_smoke_core::Runner;
use cloud_smoke_core::Service;
use cloud_smoke_core::Tester;
use cloud_smoke_datastore::Animal;
use cloud_smoke_datastore::BasicDriver;
use cloud_smoke_datastore::DatastoreDriver;
use cloud_smoke_datastore::DatastoreTester;
use cloud_smoke_datastore::Driver;
use cloud_smoke_datastore::FieldFilter;
use helpers::infra::DatastoreFixture;
use helpers::infra::LocalStackFixture;
use helpers::timeouts::suite_timeout;
use helpers::timeouts::within;
use system_tests::config::SystemTestConfig;

use crate::helpers;

/// AWS services exercised against LocalStack.
fn aws_services() -> Vec<Service> {
    Service::ALL.into_iter().filter(|service| service.is_aws()).collect()
}

/// Renders failures for the assertion message.
fn describe_failures(report: &RunReport) -> String {
    report.failures().map(|(name, err)| format!("{name}: {err}")).collect::<Vec<_>>().join("; ")
}

/// Every AWS tester passes sequentially and then concurrently against LocalStack.
///
/// Resource names are fixed, so both modes share one test and run back to back.
#[tokio::test(flavor = "multi_thread")]
async fn aws_testers_pass_in_both_modes() -> Result<(), Box<dyn std::error::Error>> {
    let config = SystemTestConfig::load()?;
    let fixture = LocalStackFixture::start(&config).await?;
    let sdk = fixture.sdk_config().await?;
    let settings = fixture.settings();

    let testers = build_testers(&sdk, &settings, &aws_services());
    assert_eq!(testers.len(), 5);
    let sequential = Runner::new(RunMode::Sequential).run(testers);
    let report = within(suite_timeout(&config), "sequential aws run", sequential).await?;
    assert!(report.is_success(), "failures: {}", describe_failures(&report));
    let names: Vec<&str> = report.outcomes().iter().map(|outcome| outcome.name).collect();
    assert_eq!(names, ["S3", "SQS", "SNS", "DynamoDB", "Secrets-Manager"]);

    let testers = build_testers(&sdk, &settings, &aws_services());
    let concurrent = Runner::new(RunMode::Concurrent).run(testers);
    let report = within(suite_timeout(&config), "concurrent aws run", concurrent).await?;
    assert!(report.is_success(), "failures: {}", describe_failures(&report));
    assert_eq!(report.passed_count(), 5);
    Ok(())
}

/// The Datastore lifecycle passes and leaves no entity behind.
#[tokio::test(flavor = "multi_thread")]
async fn datastore_tester_passes_against_emulator() -> Result<(), Box<dyn std::error::Error>> {
    let config = SystemTestConfig::load()?;
    let fixture = DatastoreFixture::start(&config).await?;
    let driver = Arc::new(DatastoreDriver::from_settings(&fixture.settings())?);
    let tester = DatastoreTester::new(Arc::clone(&driver));
    let scenario_name = "Smoke Test Lion";

    within(suite_timeout(&config), "datastore run", tester.run()).await??;

    let filter = FieldFilter::equal("Name", scenario_name);
    let leftovers = driver.find_ids(None, "Animal", Some(&filter), "").await?;
    assert!(leftovers.is_empty(), "leftover entities: {leftovers:?}");
    driver.close().await;
    Ok(())
}

/// The basic driver stores an animal and lists it back.
#[tokio::test(flavor = "multi_thread")]
async fn basic_driver_round_trips_an_animal() -> Result<(), Box<dyn std::error::Error>> {
    let config = SystemTestConfig::load()?;
    let fixture = DatastoreFixture::start(&config).await?;
    let driver = Arc::new(DatastoreDriver::from_settings(&fixture.settings())?);
    let basic = BasicDriver::new(Arc::clone(&driver));
    let animal = Animal {
        name: "System Test Owl".to_string(),
        legs: 2,
        sound: "hoot".to_string(),
        food_type: "carnivore".to_string(),
    };

    let encoded = basic.put(&animal).await?;
    let animals = basic.get_all().await?;
    assert!(animals.contains(&animal), "{animals:?}");

    let key = cloud_smoke_datastore::Key::decode(&encoded)?;
    driver.delete(&key).await?;
    basic.close().await;
    Ok(())
}
