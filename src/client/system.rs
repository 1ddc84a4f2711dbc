//! Device-wide operations: restart, buttons, log streaming and the
//! network throughput test.

use tracing::debug;

use crate::error::{Error, Result};
use crate::protocol::{Command, IperfOptions, IperfStatus, LogStreaming};

use super::Client;

// ============================================================================
// Client - System
// ============================================================================

impl Client {
    /// Restarts the device.
    ///
    /// The device usually closes the link shortly after acknowledging.
    pub async fn reset(&self) -> Result<()> {
        debug!("Resetting device");
        self.execute(Command::Reset).await
    }

    /// Triggers a virtual button action.
    ///
    /// # Arguments
    ///
    /// * `action_id` - Action to run; the device's default action if `None`
    pub async fn trigger_button(&self, action_id: Option<u8>) -> Result<()> {
        debug!(?action_id, "Triggering button");
        self.execute(Command::TriggerButton { action_id }).await
    }

    /// Returns `true` if the device streams its log as `LOG` events.
    pub async fn get_log_streaming(&self) -> Result<bool> {
        debug!("Getting log streaming");
        let status: LogStreaming = self.execute(Command::GetLogStreaming).await?;
        Ok(status.enabled)
    }

    /// Enables or disables log streaming.
    ///
    /// Streamed records reach the event subscriber as
    /// [`Event::Log`](crate::protocol::Event::Log).
    pub async fn set_log_streaming(&self, enable: bool) -> Result<bool> {
        debug!(enable, "Setting log streaming");
        let status: LogStreaming = self.execute(Command::SetLogStreaming { enable }).await?;
        Ok(status.enabled)
    }

    /// Returns `true` if the throughput test server is running.
    pub async fn get_iperf(&self) -> Result<bool> {
        debug!("Getting iperf status");
        let status: IperfStatus = self.execute(Command::GetIperf).await?;
        Ok(status.running)
    }

    /// Starts the throughput test server.
    ///
    /// Unset options use the device defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if an interval or duration of 0
    /// is given, before anything is queued.
    pub async fn start_iperf(&self, options: IperfOptions) -> Result<bool> {
        if options.interval_s == Some(0) {
            return Err(Error::invalid_argument("iperf interval must be non-zero"));
        }
        if options.duration_s == Some(0) {
            return Err(Error::invalid_argument("iperf duration must be non-zero"));
        }

        debug!(?options, "Starting iperf");
        let status: IperfStatus = self.execute(Command::StartIperf(options)).await?;
        Ok(status.running)
    }

    /// Stops the throughput test server.
    pub async fn stop_iperf(&self) -> Result<bool> {
        debug!("Stopping iperf");
        let status: IperfStatus = self.execute(Command::StopIperf).await?;
        Ok(status.running)
    }
}

// ============================================================================
// Tests
// ============================================================================
