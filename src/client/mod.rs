//! Typed client for a Pixelix device.
//!
//! Each operation validates its arguments, requires a live link, queues
//! one command and resolves with the decoded record.
//!
//! Operations are lazy like any `async fn`: argument checks, the link check
//! and queueing all happen when the returned future is first polled, not
//! when the method is called. Futures created before `connect` therefore
//! succeed if first polled after it.
//!
//! # Module Structure
//!
//! | Module | Description |
//! |--------|-------------|
//! | `core` | Client struct, link lifecycle, event subscription |
//! | `builder` | Fluent configuration builder |
//! | `options` | Connection target |
//! | `display` | Display content, brightness, fade effect |
//! | `slots` | Slots, plugins, durations, aliases |
//! | `system` | Reset, buttons, log streaming, throughput test |
//!
//! # Example
//!
//! ```ignore
//! let client = Client::new();
//! client.connect(&ConnectOptions::new("pixelix.local")).await?;
//!
//! // Slots
//! let table = client.get_slots().await?;
//! let installed = client.install("ClockPlugin").await?;
//! client.set_slot_duration(installed.slot_id, 15_000).await?;
//!
//! // Display
//! client.set_brightness(128, Some(true)).await?;
//! ```

// ============================================================================
// Submodules
// ============================================================================

mod builder;
mod core;
mod display;
mod options;
mod slots;
mod system;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::{ClientBuilder, ClosedHandler};
pub use core::{Client, ConnectionState};
pub use options::{ConnectOptions, DEFAULT_ENDPOINT, DEFAULT_PORT, DEFAULT_PROTOCOL};
