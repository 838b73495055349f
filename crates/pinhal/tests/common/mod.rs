//! Shared fixtures for the integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use pinhal::sim::SimPlatform;
use pinhal::Board;

/// Route `tracing` output to the test harness. Only has an effect when the
/// crate is built with `--features tracing`; filter with `RUST_LOG`.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Simulated board that has completed bring-up.
pub fn ready_board() -> (Board<SimPlatform>, SimPlatform) {
    init_logging();
    let sim = SimPlatform::new();
    let board = Board::new(sim.clone());
    embassy_futures::block_on(board.init()).unwrap();
    (board, sim)
}
