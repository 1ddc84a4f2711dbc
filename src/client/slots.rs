//! Slot and plugin management.

use tracing::debug;

use crate::error::{Error, Result};
use crate::protocol::{Command, Installation, PluginAlias, PluginList, SlotDuration, SlotTable};

use super::Client;

// ============================================================================
// Client - Slots
// ============================================================================

impl Client {
    /// Reads the slot table.
    pub async fn get_slots(&self) -> Result<SlotTable> {
        debug!("Getting slots");
        self.execute(Command::GetSlots).await
    }

    /// Lists the plugin types the device can install.
    pub async fn get_plugins(&self) -> Result<Vec<String>> {
        debug!("Getting plugins");
        let list: PluginList = self.execute(Command::GetPlugins).await?;
        Ok(list.names)
    }

    /// Installs a plugin into the first free slot.
    ///
    /// # Arguments
    ///
    /// * `plugin` - Plugin type name as listed by [`Client::get_plugins`]
    ///
    /// Returns the slot and UID the device assigned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an empty name, before
    /// anything is queued.
    pub async fn install(&self, plugin: &str) -> Result<Installation> {
        if plugin.is_empty() {
            return Err(Error::invalid_argument("plugin name must not be empty"));
        }

        debug!(plugin = %plugin, "Installing plugin");
        self.execute(Command::Install {
            plugin: plugin.to_string(),
        })
        .await
    }

    /// Uninstalls the plugin in a slot.
    pub async fn uninstall(&self, slot_id: u8) -> Result<()> {
        debug!(slot_id, "Uninstalling plugin");
        self.execute(Command::Uninstall { slot_id }).await
    }

    /// Moves a plugin instance to another slot.
    ///
    /// # Arguments
    ///
    /// * `uid` - Plugin instance UID
    /// * `slot_id` - Destination slot
    pub async fn move_plugin(&self, uid: u16, slot_id: u8) -> Result<()> {
        debug!(uid, slot_id, "Moving plugin");
        self.execute(Command::Move { uid, slot_id }).await
    }

    /// Reads how long a slot is shown, in milliseconds.
    pub async fn get_slot_duration(&self, slot_id: u8) -> Result<u32> {
        debug!(slot_id, "Getting slot duration");
        let duration: SlotDuration = self.execute(Command::GetSlotDuration { slot_id }).await?;
        Ok(duration.duration_ms)
    }

    /// Sets how long a slot is shown.
    ///
    /// A duration of 0 shows the slot indefinitely. Returns the duration
    /// the device applied.
    pub async fn set_slot_duration(&self, slot_id: u8, duration_ms: u32) -> Result<u32> {
        debug!(slot_id, duration_ms, "Setting slot duration");
        let duration: SlotDuration = self
            .execute(Command::SetSlotDuration {
                slot_id,
                duration_ms,
            })
            .await?;
        Ok(duration.duration_ms)
    }

    /// Reads the alias of a plugin instance.
    ///
    /// Returns an empty string if none is set.
    pub async fn get_plugin_alias(&self, uid: u16) -> Result<String> {
        debug!(uid, "Getting plugin alias");
        let alias: PluginAlias = self.execute(Command::GetAlias { uid }).await?;
        Ok(alias.alias)
    }

    /// Sets the alias of a plugin instance.
    ///
    /// An empty alias clears it. Returns the alias the device stored.
    pub async fn set_plugin_alias(&self, uid: u16, alias: &str) -> Result<String> {
        debug!(uid, alias = %alias, "Setting plugin alias");
        let stored: PluginAlias = self
            .execute(Command::SetAlias {
                uid,
                alias: alias.to_string(),
            })
            .await?;
        Ok(stored.alias)
    }
}

// ============================================================================
// Tests
// ============================================================================
