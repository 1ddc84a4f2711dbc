//! Display operations: content snapshot, brightness and fade effect.

use tracing::debug;

use crate::error::Result;
use crate::protocol::{Brightness, Command, DisplayContent, FadeEffect};

use super::Client;

// ============================================================================
// Client - Display
// ============================================================================

impl Client {
    /// Reads the framebuffer of the active slot.
    ///
    /// Pixels are row-major `0xRRGGBB` values.
    ///
    /// # Errors
    ///
    /// Returns an error if the device rejects the command or the frame does
    /// not hold `width × height` pixels.
    pub async fn get_display_content(&self) -> Result<DisplayContent> {
        debug!("Getting display content");
        self.execute(Command::GetDisplayContent).await
    }

    /// Reads the display brightness.
    pub async fn get_brightness(&self) -> Result<Brightness> {
        debug!("Getting brightness");
        self.execute(Command::GetBrightness).await
    }

    /// Sets the display brightness.
    ///
    /// # Arguments
    ///
    /// * `level` - Brightness 0–255
    /// * `auto_control` - Enables or disables ambient light control; left
    ///   unchanged when `None`
    ///
    /// Returns the brightness the device applied.
    pub async fn set_brightness(&self, level: u8, auto_control: Option<bool>) -> Result<Brightness> {
        debug!(level, ?auto_control, "Setting brightness");
        self.execute(Command::SetBrightness {
            level,
            auto_control,
        })
        .await
    }

    /// Reads the transition effect used between slots.
    pub async fn get_fade_effect(&self) -> Result<FadeEffect> {
        debug!("Getting fade effect");
        self.execute(Command::GetFadeEffect).await
    }

    /// Sets the transition effect used between slots.
    pub async fn set_fade_effect(&self, effect: FadeEffect) -> Result<FadeEffect> {
        debug!(?effect, "Setting fade effect");
        self.execute(Command::SetFadeEffect(effect)).await
    }
}

// ============================================================================
// Tests
// ============================================================================
