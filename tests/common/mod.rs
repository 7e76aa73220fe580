//! The parent of the other tests.
//!
//! Mostly to import the setup stuff below.

use std::env::temp_dir;

use camino::Utf8PathBuf;
use tabinator::{
    config::{BugReportInfo, Limits},
    database::LinkStore,
};
use uuid::Uuid;

/// Makes a fresh, empty folder for a test database.
#[allow(dead_code, reason = "it's used in the other tests")]
pub async fn temp_db_folder() -> Utf8PathBuf {
    let db_temp_dir = Utf8PathBuf::try_from(temp_dir())
        .unwrap()
        .join(Uuid::new_v4().to_string())
        .join("_tabinator_db");

    tokio::fs::create_dir_all(&db_temp_dir)
        .await
        .expect("create db temp dir");

    db_temp_dir
}

/// call this at the top of any new test func! :)
///
/// Each call gets its own database, so tests can't see each other's data.
#[allow(dead_code, reason = "it's used in the other tests")]
pub async fn setup() -> LinkStore {
    setup_with_limits(Limits::default()).await
}

#[allow(dead_code, reason = "it's used in the other tests")]
pub async fn setup_with_limits(limits: Limits) -> LinkStore {
    // start logging. only the first test to get here wins, which is fine
    _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();

    LinkStore::connect(&temp_db_folder().await, limits)
        .await
        .expect("connect to test database")
}

/// Sample bug report information for usage in tests, to decrease
/// verbosity.
#[allow(dead_code, reason = "it's used in the other tests")]
pub fn new_bug_report_info_testing() -> BugReportInfo {
    BugReportInfo {
        app_name: "bug report info testing info".to_string(),
        app_version: "0.1.0".to_string(),
        target_triple: "x86_64-unknown-linux-gnu".to_string(),
        commit: "unknown".to_string(),
        repo: "https://github.com/tabinator/tabinator".to_string(),
        build_time: "unknown".to_string(),
    }
}
