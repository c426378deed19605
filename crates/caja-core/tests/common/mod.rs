//! Common test utilities for caja-core integration tests

pub mod mock_repos;

#[allow(unused_imports)]
pub use mock_repos::MockStore;
