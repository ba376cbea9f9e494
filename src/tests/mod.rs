// Test modules for medstream crate
//
// Test organization follows the template pattern where each source file
// has a corresponding test file that focuses on business logic verification.

// Test helper utilities shared across the unit test modules
pub mod helpers;

pub mod recovery;


// NOTE: End-to-end flows (text -> chunks -> framed events -> wire) live in
// the integration tests (tests/event_flow_integration_tests.rs); they
// exercise the public API only.
