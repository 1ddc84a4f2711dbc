//! Command definitions and wire encoding.
//!
//! A command frame is `NAME` or `NAME;PARAM`, where `PARAM` is a `;`-joined
//! list of scalar arguments:
//!
//! | Argument | Encoding |
//! |----------|----------|
//! | number | decimal text |
//! | boolean | `0` / `1` |
//! | string | wrapped in `"`, no escaping |
//! | keyword | bare token (`START`, `STOP`, `DEFAULT`, `TCP`, `UDP`) |
//!
//! Strings containing `;` or `"` corrupt the frame. The device format has no
//! escape mechanism and the client does not invent one.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::codec::{self, DELIMITER, DecodeError};

// ============================================================================
// CommandName
// ============================================================================

/// Wire name of a command.
///
/// Several operations share one name (e.g. getting and setting the
/// brightness are both `BRIGHTNESS`); the reply layout depends on the name
/// only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandName {
    /// `GETDISP` - framebuffer snapshot.
    #[serde(rename = "GETDISP")]
    GetDisp,
    /// `SLOTS` - slot table.
    #[serde(rename = "SLOTS")]
    Slots,
    /// `RESET` - restart the device.
    #[serde(rename = "RESET")]
    Reset,
    /// `BRIGHTNESS` - get/set brightness.
    #[serde(rename = "BRIGHTNESS")]
    Brightness,
    /// `PLUGINS` - installable plugin types.
    #[serde(rename = "PLUGINS")]
    Plugins,
    /// `INSTALL` - install a plugin.
    #[serde(rename = "INSTALL")]
    Install,
    /// `UNINSTALL` - uninstall a plugin.
    #[serde(rename = "UNINSTALL")]
    Uninstall,
    /// `LOG` - get/set log streaming.
    #[serde(rename = "LOG")]
    Log,
    /// `MOVE` - move a plugin to another slot.
    #[serde(rename = "MOVE")]
    Move,
    /// `SLOT_DURATION` - get/set slot duration.
    #[serde(rename = "SLOT_DURATION")]
    SlotDuration,
    /// `IPERF` - throughput test.
    #[serde(rename = "IPERF")]
    Iperf,
    /// `BUTTON` - trigger a button action.
    #[serde(rename = "BUTTON")]
    Button,
    /// `EFFECT` - get/set fade effect.
    #[serde(rename = "EFFECT")]
    Effect,
    /// `ALIAS` - get/set plugin alias.
    #[serde(rename = "ALIAS")]
    Alias,
}

impl CommandName {
    /// Every command name the client knows.
    pub const ALL: [Self; 14] = [
        Self::GetDisp,
        Self::Slots,
        Self::Reset,
        Self::Brightness,
        Self::Plugins,
        Self::Install,
        Self::Uninstall,
        Self::Log,
        Self::Move,
        Self::SlotDuration,
        Self::Iperf,
        Self::Button,
        Self::Effect,
        Self::Alias,
    ];

    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GetDisp => "GETDISP",
            Self::Slots => "SLOTS",
            Self::Reset => "RESET",
            Self::Brightness => "BRIGHTNESS",
            Self::Plugins => "PLUGINS",
            Self::Install => "INSTALL",
            Self::Uninstall => "UNINSTALL",
            Self::Log => "LOG",
            Self::Move => "MOVE",
            Self::SlotDuration => "SLOT_DURATION",
            Self::Iperf => "IPERF",
            Self::Button => "BUTTON",
            Self::Effect => "EFFECT",
            Self::Alias => "ALIAS",
        }
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandName {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| DecodeError::UnknownCommand(s.to_string()))
    }
}

// ============================================================================
// Param
// ============================================================================

/// One scalar command argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    /// Unsigned number, sent as decimal text.
    Number(u64),
    /// Boolean, sent as `0`/`1`.
    Bool(bool),
    /// String, sent wrapped in double quotes.
    Text(String),
    /// Bare keyword.
    Keyword(&'static str),
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(b) => f.write_str(if *b { "1" } else { "0" }),
            Self::Text(s) => write!(f, "\"{s}\""),
            Self::Keyword(k) => f.write_str(k),
        }
    }
}

// ============================================================================
// Argument Types
// ============================================================================

/// Transition animation used when switching the active slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FadeEffect {
    /// Hard switch.
    #[default]
    None,
    /// Linear dimming.
    Linear,
    /// Slide towards negative x.
    MoveX,
    /// Slide towards negative y.
    MoveY,
}

impl FadeEffect {
    /// Returns the wire value.
    #[inline]
    #[must_use]
    pub const fn as_raw(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Linear => 1,
            Self::MoveX => 2,
            Self::MoveY => 3,
        }
    }

    /// Parses a wire value.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::None),
            1 => Some(Self::Linear),
            2 => Some(Self::MoveX),
            3 => Some(Self::MoveY),
            _ => None,
        }
    }
}

/// Transport protocol of the throughput test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IperfProtocol {
    /// TCP stream.
    Tcp,
    /// UDP datagrams.
    Udp,
}

impl IperfProtocol {
    /// Returns the wire keyword.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "TCP",
            Self::Udp => "UDP",
        }
    }
}

/// Options for starting a throughput test.
///
/// Unset values are sent as `DEFAULT` so the device applies its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IperfOptions {
    /// Transport protocol.
    pub protocol: Option<IperfProtocol>,
    /// Report interval in seconds.
    pub interval_s: Option<u32>,
    /// Test duration in seconds.
    pub duration_s: Option<u32>,
}

impl IperfOptions {
    /// Creates options that leave every choice to the device.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            protocol: None,
            interval_s: None,
            duration_s: None,
        }
    }

    /// Sets the transport protocol.
    #[inline]
    #[must_use]
    pub fn with_protocol(mut self, protocol: IperfProtocol) -> Self {
        self.protocol = Some(protocol);
        self
    }

    /// Sets the report interval.
    #[inline]
    #[must_use]
    pub fn with_interval(mut self, seconds: u32) -> Self {
        self.interval_s = Some(seconds);
        self
    }

    /// Sets the test duration.
    #[inline]
    #[must_use]
    pub fn with_duration(mut self, seconds: u32) -> Self {
        self.duration_s = Some(seconds);
        self
    }

    /// Returns `true` if nothing is set.
    #[inline]
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.protocol.is_none() && self.interval_s.is_none() && self.duration_s.is_none()
    }
}

// ============================================================================
// Command
// ============================================================================

/// A typed device command.
///
/// Each variant maps to one wire name plus an argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Read the current framebuffer.
    GetDisplayContent,
    /// Read the slot table.
    GetSlots,
    /// Restart the device.
    Reset,
    /// Read brightness.
    GetBrightness,
    /// Set brightness and optionally automatic control.
    SetBrightness {
        /// Brightness level.
        level: u8,
        /// Automatic brightness control.
        auto_control: Option<bool>,
    },
    /// List installable plugin types.
    GetPlugins,
    /// Install a plugin into the next free slot.
    Install {
        /// Plugin type name.
        plugin: String,
    },
    /// Uninstall the plugin in a slot.
    Uninstall {
        /// Slot to clear.
        slot_id: u8,
    },
    /// Read whether log events are streamed.
    GetLogStreaming,
    /// Enable or disable log event streaming.
    SetLogStreaming {
        /// New state.
        enable: bool,
    },
    /// Move a plugin instance to another slot.
    Move {
        /// Plugin instance.
        uid: u16,
        /// Destination slot.
        slot_id: u8,
    },
    /// Read a slot's duration.
    GetSlotDuration {
        /// Slot to query.
        slot_id: u8,
    },
    /// Set a slot's duration.
    SetSlotDuration {
        /// Slot to change.
        slot_id: u8,
        /// Duration in milliseconds.
        duration_ms: u32,
    },
    /// Read whether a throughput test is running.
    GetIperf,
    /// Start a throughput test.
    StartIperf(IperfOptions),
    /// Stop the throughput test.
    StopIperf,
    /// Trigger a button action.
    TriggerButton {
        /// Action to trigger, or the default action.
        action_id: Option<u8>,
    },
    /// Read the fade effect.
    GetFadeEffect,
    /// Set the fade effect.
    SetFadeEffect(FadeEffect),
    /// Read a plugin instance's alias.
    GetAlias {
        /// Plugin instance.
        uid: u16,
    },
    /// Set a plugin instance's alias.
    SetAlias {
        /// Plugin instance.
        uid: u16,
        /// New alias.
        alias: String,
    },
}

impl Command {
    /// Returns the wire name.
    #[must_use]
    pub const fn name(&self) -> CommandName {
        match self {
            Self::GetDisplayContent => CommandName::GetDisp,
            Self::GetSlots => CommandName::Slots,
            Self::Reset => CommandName::Reset,
            Self::GetBrightness | Self::SetBrightness { .. } => CommandName::Brightness,
            Self::GetPlugins => CommandName::Plugins,
            Self::Install { .. } => CommandName::Install,
            Self::Uninstall { .. } => CommandName::Uninstall,
            Self::GetLogStreaming | Self::SetLogStreaming { .. } => CommandName::Log,
            Self::Move { .. } => CommandName::Move,
            Self::GetSlotDuration { .. } | Self::SetSlotDuration { .. } => {
                CommandName::SlotDuration
            }
            Self::GetIperf | Self::StartIperf(_) | Self::StopIperf => CommandName::Iperf,
            Self::TriggerButton { .. } => CommandName::Button,
            Self::GetFadeEffect | Self::SetFadeEffect(_) => CommandName::Effect,
            Self::GetAlias { .. } | Self::SetAlias { .. } => CommandName::Alias,
        }
    }

    /// Returns the argument list.
    #[must_use]
    pub fn params(&self) -> Vec<Param> {
        match self {
            Self::GetDisplayContent
            | Self::GetSlots
            | Self::Reset
            | Self::GetBrightness
            | Self::GetPlugins
            | Self::GetLogStreaming
            | Self::GetIperf
            | Self::GetFadeEffect => Vec::new(),

            Self::SetBrightness {
                level,
                auto_control,
            } => {
                let mut params = vec![Param::Number(u64::from(*level))];
                if let Some(auto_control) = auto_control {
                    params.push(Param::Bool(*auto_control));
                }
                params
            }

            Self::Install { plugin } => vec![Param::Text(plugin.clone())],

            Self::Uninstall { slot_id } | Self::GetSlotDuration { slot_id } => {
                vec![Param::Number(u64::from(*slot_id))]
            }

            Self::SetLogStreaming { enable } => vec![Param::Bool(*enable)],

            Self::Move { uid, slot_id } => vec![
                Param::Number(u64::from(*uid)),
                Param::Number(u64::from(*slot_id)),
            ],

            Self::SetSlotDuration {
                slot_id,
                duration_ms,
            } => vec![
                Param::Number(u64::from(*slot_id)),
                Param::Number(u64::from(*duration_ms)),
            ],

            Self::StartIperf(options) => {
                let mut params = vec![Param::Keyword("START")];
                if !options.is_default() {
                    params.push(
                        options
                            .protocol
                            .map_or(Param::Keyword("DEFAULT"), |p| Param::Keyword(p.as_str())),
                    );
                    params.push(optional_number(options.interval_s));
                    params.push(optional_number(options.duration_s));
                }
                params
            }

            Self::StopIperf => vec![Param::Keyword("STOP")],

            Self::TriggerButton { action_id } => action_id
                .map(|id| vec![Param::Number(u64::from(id))])
                .unwrap_or_default(),

            Self::SetFadeEffect(effect) => vec![Param::Number(u64::from(effect.as_raw()))],

            Self::GetAlias { uid } => vec![Param::Number(u64::from(*uid))],

            // Quoted like every other text parameter; older web UIs sent it bare.
            Self::SetAlias { uid, alias } => vec![
                Param::Number(u64::from(*uid)),
                Param::Text(alias.clone()),
            ],
        }
    }

    /// Returns the encoded parameter string, or `None` without arguments.
    #[must_use]
    pub fn parameter(&self) -> Option<String> {
        let params = self.params();
        if params.is_empty() {
            return None;
        }

        Some(
            params
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(&DELIMITER.to_string()),
        )
    }

    /// Encodes the complete command frame.
    #[must_use]
    pub fn encode(&self) -> String {
        match self.parameter() {
            Some(parameter) => format!("{}{DELIMITER}{parameter}", self.name()),
            None => self.name().to_string(),
        }
    }

    /// Parses a command frame back into a typed command.
    ///
    /// This is the device-side view of [`Command::encode`].
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] for unknown names, wrong argument counts and
    /// unparsable arguments.
    pub fn parse(frame: &str) -> Result<Self, DecodeError> {
        let mut tokens = frame.split(DELIMITER);
        let name: CommandName = tokens.next().unwrap_or_default().parse()?;
        let args: Vec<&str> = tokens.collect();
        let ctx = name.as_str();

        let command = match (name, args.as_slice()) {
            (CommandName::GetDisp, []) => Self::GetDisplayContent,
            (CommandName::Slots, []) => Self::GetSlots,
            (CommandName::Reset, []) => Self::Reset,
            (CommandName::Plugins, []) => Self::GetPlugins,

            (CommandName::Brightness, []) => Self::GetBrightness,
            (CommandName::Brightness, [level]) => Self::SetBrightness {
                level: codec::number(ctx, "level", level)?,
                auto_control: None,
            },
            (CommandName::Brightness, [level, auto_control]) => Self::SetBrightness {
                level: codec::number(ctx, "level", level)?,
                auto_control: Some(codec::flag(ctx, "autoControl", auto_control)?),
            },

            (CommandName::Install, [plugin]) => Self::Install {
                plugin: codec::quoted(ctx, "plugin", plugin)?,
            },

            (CommandName::Uninstall, [slot_id]) => Self::Uninstall {
                slot_id: codec::number(ctx, "slotId", slot_id)?,
            },

            (CommandName::Log, []) => Self::GetLogStreaming,
            (CommandName::Log, [enable]) => Self::SetLogStreaming {
                enable: codec::flag(ctx, "enable", enable)?,
            },

            (CommandName::Move, [uid, slot_id]) => Self::Move {
                uid: codec::number(ctx, "uid", uid)?,
                slot_id: codec::number(ctx, "slotId", slot_id)?,
            },

            (CommandName::SlotDuration, [slot_id]) => Self::GetSlotDuration {
                slot_id: codec::number(ctx, "slotId", slot_id)?,
            },
            (CommandName::SlotDuration, [slot_id, duration_ms]) => Self::SetSlotDuration {
                slot_id: codec::number(ctx, "slotId", slot_id)?,
                duration_ms: codec::number(ctx, "duration", duration_ms)?,
            },

            (CommandName::Iperf, []) => Self::GetIperf,
            (CommandName::Iperf, ["STOP"]) => Self::StopIperf,
            (CommandName::Iperf, ["START"]) => Self::StartIperf(IperfOptions::new()),
            (CommandName::Iperf, ["START", protocol, interval, duration]) => {
                Self::StartIperf(IperfOptions {
                    protocol: match *protocol {
                        "DEFAULT" => None,
                        "TCP" => Some(IperfProtocol::Tcp),
                        "UDP" => Some(IperfProtocol::Udp),
                        other => return Err(codec::invalid(ctx, "protocol", other)),
                    },
                    interval_s: parse_optional_number(ctx, "interval", interval)?,
                    duration_s: parse_optional_number(ctx, "time", duration)?,
                })
            }

            (CommandName::Button, []) => Self::TriggerButton { action_id: None },
            (CommandName::Button, [action_id]) => Self::TriggerButton {
                action_id: Some(codec::number(ctx, "actionId", action_id)?),
            },

            (CommandName::Effect, []) => Self::GetFadeEffect,
            (CommandName::Effect, [effect]) => {
                let raw: u8 = codec::number(ctx, "fadeEffect", effect)?;
                Self::SetFadeEffect(
                    FadeEffect::from_raw(raw).ok_or_else(|| codec::invalid(ctx, "fadeEffect", effect))?,
                )
            }

            (CommandName::Alias, [uid]) => Self::GetAlias {
                uid: codec::number(ctx, "uid", uid)?,
            },
            (CommandName::Alias, [uid, alias]) => Self::SetAlias {
                uid: codec::number(ctx, "uid", uid)?,
                alias: codec::quoted(ctx, "alias", alias)?,
            },

            (_, args) => return Err(codec::arity(ctx, accepted_counts(name), args.len())),
        };

        Ok(command)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Argument counts a command name accepts, for error messages.
const fn accepted_counts(name: CommandName) -> &'static str {
    match name {
        CommandName::GetDisp | CommandName::Slots | CommandName::Reset | CommandName::Plugins => {
            "0"
        }
        CommandName::Install | CommandName::Uninstall => "1",
        CommandName::Move => "2",
        CommandName::Brightness => "0, 1 or 2",
        CommandName::Log | CommandName::Button | CommandName::Effect => "0 or 1",
        CommandName::SlotDuration | CommandName::Alias => "1 or 2",
        CommandName::Iperf => "0, 1 or 4",
    }
}

/// Encodes an optional number, `DEFAULT` when absent.
fn optional_number(value: Option<u32>) -> Param {
    value.map_or(Param::Keyword("DEFAULT"), |n| Param::Number(u64::from(n)))
}

/// Parses a number or `DEFAULT`.
fn parse_optional_number(
    ctx: &str,
    field: &'static str,
    value: &str,
) -> Result<Option<u32>, DecodeError> {
    if value == "DEFAULT" {
        Ok(None)
    } else {
        codec::number(ctx, field, value).map(Some)
    }
}

// ============================================================================
// Tests
// ============================================================================
