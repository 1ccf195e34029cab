//! Movie browser for cinedex.
//!
//! The query orchestration (search vs. discover, debounce, pagination)
//! is a plain state machine; the terminal UI and the async dispatcher
//! only feed it events and execute the fetches it asks for.

/// Terminal UI (ratatui + crossterm).
pub mod browser;
/// Single-slot debounce timer.
pub mod debounce;
/// Async execution of fetch commands.
pub mod dispatch;
/// Discover filter state.
pub mod filter;
/// Search/discover query state machine.
pub mod orchestrator;

pub use browser::{BrowseOptions, run_browser};
