//! Integration tests for GRANT statement execution
//!
//! This test suite is organized into focused modules:
//! - table_privileges: table and column privileges for users and PUBLIC
//! - grant_option: WITH GRANT OPTION and grant authority
//! - edge_cases: rejected grantees, protected objects and invalid targets

mod common;

mod grant_tests {
    pub mod edge_cases;
    pub mod grant_option;
    pub mod table_privileges;
}
