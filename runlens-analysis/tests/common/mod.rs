pub use runlens_common::testing::init_test_logging;

use runlens_common::TestRunResult;

#[allow(dead_code)]
pub fn fixture(name: &str) -> &'static str {
    match name {
        "billing_run.json" => include_str!("../fixtures/billing_run.json"),
        other => panic!("unknown fixture: {other}"),
    }
}

#[allow(dead_code)]
pub fn load_fixture(name: &str) -> TestRunResult {
    TestRunResult::from_json_str(fixture(name), name).expect("fixture parses")
}
