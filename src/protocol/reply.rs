//! Typed command replies.
//!
//! An `ACK` frame does not say which command it answers. The client knows
//! because only one command is ever in flight, so the fields are decoded by
//! the decoder registered for the pending command's name in
//! [`REPLY_DECODERS`].

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;

use crate::error::{Error, Result};

use super::codec::{self, DecodeError};
use super::command::{CommandName, FadeEffect};

// ============================================================================
// Reply Records
// ============================================================================

/// Snapshot of the display framebuffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayContent {
    /// Slot currently shown.
    pub slot_id: u8,
    /// Width in pixels.
    pub width: u16,
    /// Height in pixels.
    pub height: u16,
    /// Row-major pixel colors.
    pub pixels: Vec<u32>,
}

impl DisplayContent {
    /// Returns the color at `(x, y)`.
    #[must_use]
    pub fn pixel(&self, x: u16, y: u16) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = usize::from(y) * usize::from(self.width) + usize::from(x);
        self.pixels.get(index).copied()
    }
}

/// One entry of the slot table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotInfo {
    /// Plugin type name, empty for an empty slot.
    pub name: String,
    /// Plugin instance id, 0 for an empty slot.
    pub uid: u16,
    /// User-assigned alias.
    pub alias: String,
    /// Slot cannot be changed.
    pub is_locked: bool,
    /// Slot stays active until released.
    pub is_sticky: bool,
    /// Display duration in milliseconds.
    pub duration_ms: u32,
}

impl SlotInfo {
    /// Returns `true` if no plugin occupies the slot.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}

/// Slot table of the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotTable {
    /// Number of slots.
    pub max_slots: u8,
    /// Slots in slot-id order.
    pub slots: Vec<SlotInfo>,
}

impl SlotTable {
    /// Returns the id of the sticky slot, if any.
    #[must_use]
    pub fn sticky_slot(&self) -> Option<u8> {
        self.slots
            .iter()
            .position(|slot| slot.is_sticky)
            .and_then(|index| u8::try_from(index).ok())
    }

    /// Returns the slot holding the plugin instance `uid`.
    #[must_use]
    pub fn slot_of(&self, uid: u16) -> Option<u8> {
        self.slots
            .iter()
            .position(|slot| !slot.is_empty() && slot.uid == uid)
            .and_then(|index| u8::try_from(index).ok())
    }
}

/// Display brightness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Brightness {
    /// Brightness level.
    pub level: u8,
    /// Automatic brightness control enabled.
    pub auto_control: bool,
}

/// Installable plugin types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginList {
    /// Plugin type names.
    pub names: Vec<String>,
}

/// Result of installing a plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Installation {
    /// Slot the plugin was installed into.
    pub slot_id: u8,
    /// Id of the new plugin instance.
    pub uid: u16,
}

/// Log streaming state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LogStreaming {
    /// Log events are streamed.
    pub enabled: bool,
}

/// Slot display duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotDuration {
    /// Duration in milliseconds.
    pub duration_ms: u32,
}

/// Throughput test state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IperfStatus {
    /// A test is running.
    pub running: bool,
}

/// Plugin alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginAlias {
    /// Alias text.
    pub alias: String,
}

// ============================================================================
// Reply
// ============================================================================

/// Decoded success outcome of a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Reply {
    /// Acknowledged without fields.
    Empty,
    /// `GETDISP`.
    DisplayContent(DisplayContent),
    /// `SLOTS`.
    Slots(SlotTable),
    /// `BRIGHTNESS`.
    Brightness(Brightness),
    /// `PLUGINS`.
    Plugins(PluginList),
    /// `INSTALL`.
    Installed(Installation),
    /// `LOG`.
    LogStreaming(LogStreaming),
    /// `SLOT_DURATION`.
    SlotDuration(SlotDuration),
    /// `IPERF`.
    Iperf(IperfStatus),
    /// `EFFECT`.
    FadeEffect(FadeEffect),
    /// `ALIAS`.
    Alias(PluginAlias),
}

/// Conversion from a [`Reply`] into the record an operation returns.
pub(crate) trait FromReply: Sized {
    fn from_reply(reply: Reply) -> Result<Self>;
}

impl FromReply for () {
    fn from_reply(reply: Reply) -> Result<Self> {
        match reply {
            Reply::Empty => Ok(()),
            other => Err(unexpected(&other)),
        }
    }
}

macro_rules! impl_from_reply {
    ($($variant:ident => $record:ty),* $(,)?) => {
        $(
            impl FromReply for $record {
                fn from_reply(reply: Reply) -> Result<Self> {
                    match reply {
                        Reply::$variant(record) => Ok(record),
                        other => Err(unexpected(&other)),
                    }
                }
            }
        )*
    };
}

impl_from_reply! {
    DisplayContent => DisplayContent,
    Slots => SlotTable,
    Brightness => Brightness,
    Plugins => PluginList,
    Installed => Installation,
    LogStreaming => LogStreaming,
    SlotDuration => SlotDuration,
    Iperf => IperfStatus,
    FadeEffect => FadeEffect,
    Alias => PluginAlias,
}

fn unexpected(reply: &Reply) -> Error {
    Error::protocol_violation(format!("unexpected reply {reply:?}"))
}

// ============================================================================
// Decoder Table
// ============================================================================

/// Decodes the fields of a success frame for one command name.
pub type ReplyDecoder = fn(&[&str]) -> std::result::Result<Reply, DecodeError>;

/// Command name → success field decoder.
pub const REPLY_DECODERS: &[(CommandName, ReplyDecoder)] = &[
    (CommandName::GetDisp, decode_display as ReplyDecoder),
    (CommandName::Slots, decode_slots as ReplyDecoder),
    (CommandName::Reset, decode_empty_reset as ReplyDecoder),
    (CommandName::Brightness, decode_brightness as ReplyDecoder),
    (CommandName::Plugins, decode_plugins as ReplyDecoder),
    (CommandName::Install, decode_install as ReplyDecoder),
    (CommandName::Uninstall, decode_empty_uninstall as ReplyDecoder),
    (CommandName::Log, decode_log_streaming as ReplyDecoder),
    (CommandName::Move, decode_empty_move as ReplyDecoder),
    (CommandName::SlotDuration, decode_slot_duration as ReplyDecoder),
    (CommandName::Iperf, decode_iperf as ReplyDecoder),
    (CommandName::Button, decode_empty_button as ReplyDecoder),
    (CommandName::Effect, decode_fade_effect as ReplyDecoder),
    (CommandName::Alias, decode_alias as ReplyDecoder),
];

/// Returns the decoder registered for `name`.
#[must_use]
pub fn decoder_for(name: CommandName) -> Option<ReplyDecoder> {
    REPLY_DECODERS
        .iter()
        .find(|(registered, _)| *registered == name)
        .map(|(_, decoder)| *decoder)
}

/// Decodes the fields of an `ACK` frame answering `name`.
///
/// The device terminates field-less replies with a delimiter (`ACK;`), so a
/// single empty field counts as no fields.
///
/// # Errors
///
/// Returns [`DecodeError`] if the field count or a field does not match the
/// layout of `name`.
pub fn decode_reply(
    name: CommandName,
    fields: &[String],
) -> std::result::Result<Reply, DecodeError> {
    let decoder =
        decoder_for(name).ok_or_else(|| DecodeError::UnknownCommand(name.to_string()))?;

    let fields: Vec<&str> = fields.iter().map(String::as_str).collect();
    let fields: &[&str] = match fields.as_slice() {
        [""] => &[],
        all => all,
    };

    decoder(fields)
}

// ============================================================================
// Decoders
// ============================================================================

type Decoded = std::result::Result<Reply, DecodeError>;

/// Fields of one `SLOTS` entry.
const SLOT_FIELDS: usize = 6;

/// `slotId;width;height;px...`
fn decode_display(fields: &[&str]) -> Decoded {
    const CTX: &str = "GETDISP";

    let [slot_id, width, height, pixels @ ..] = fields else {
        return Err(codec::arity(CTX, "at least 3", fields.len()));
    };

    let slot_id = codec::number(CTX, "slotId", slot_id)?;
    let width: u16 = codec::number(CTX, "width", width)?;
    let height: u16 = codec::number(CTX, "height", height)?;

    let expected = usize::from(width) * usize::from(height);
    if pixels.len() != expected {
        return Err(codec::arity(
            CTX,
            format!("3 + {width}*{height}"),
            fields.len(),
        ));
    }

    let pixels = pixels
        .iter()
        .map(|px| codec::hex(CTX, "pixel", px))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(Reply::DisplayContent(DisplayContent {
        slot_id,
        width,
        height,
        pixels,
    }))
}

/// `maxSlots;("name";uid;"alias";locked;sticky;duration)*maxSlots`
fn decode_slots(fields: &[&str]) -> Decoded {
    const CTX: &str = "SLOTS";

    let [max_slots, entries @ ..] = fields else {
        return Err(codec::arity(CTX, "at least 1", 0));
    };

    let max_slots: u8 = codec::number(CTX, "maxSlots", max_slots)?;
    if entries.len() != usize::from(max_slots) * SLOT_FIELDS {
        return Err(codec::arity(
            CTX,
            format!("1 + {SLOT_FIELDS}*{max_slots}"),
            fields.len(),
        ));
    }

    let slots = entries
        .chunks_exact(SLOT_FIELDS)
        .map(|entry| {
            Ok(SlotInfo {
                name: codec::quoted(CTX, "name", entry[0])?,
                uid: codec::number(CTX, "uid", entry[1])?,
                alias: codec::quoted(CTX, "alias", entry[2])?,
                is_locked: codec::flag(CTX, "isLocked", entry[3])?,
                is_sticky: codec::flag(CTX, "isSticky", entry[4])?,
                duration_ms: codec::number(CTX, "duration", entry[5])?,
            })
        })
        .collect::<std::result::Result<Vec<_>, DecodeError>>()?;

    Ok(Reply::Slots(SlotTable { max_slots, slots }))
}

/// `level;autoControl`
fn decode_brightness(fields: &[&str]) -> Decoded {
    const CTX: &str = "BRIGHTNESS";
    codec::expect_arity(CTX, fields, 2)?;

    Ok(Reply::Brightness(Brightness {
        level: codec::number(CTX, "level", fields[0])?,
        auto_control: codec::flag(CTX, "autoControl", fields[1])?,
    }))
}

/// `"name"*`
fn decode_plugins(fields: &[&str]) -> Decoded {
    let names = fields
        .iter()
        .map(|name| codec::quoted("PLUGINS", "name", name))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(Reply::Plugins(PluginList { names }))
}

/// `slotId;uid`
fn decode_install(fields: &[&str]) -> Decoded {
    const CTX: &str = "INSTALL";
    codec::expect_arity(CTX, fields, 2)?;

    Ok(Reply::Installed(Installation {
        slot_id: codec::number(CTX, "slotId", fields[0])?,
        uid: codec::number(CTX, "uid", fields[1])?,
    }))
}

/// `enabled`
fn decode_log_streaming(fields: &[&str]) -> Decoded {
    const CTX: &str = "LOG";
    codec::expect_arity(CTX, fields, 1)?;

    Ok(Reply::LogStreaming(LogStreaming {
        enabled: codec::flag(CTX, "enabled", fields[0])?,
    }))
}

/// `durationMs`
fn decode_slot_duration(fields: &[&str]) -> Decoded {
    const CTX: &str = "SLOT_DURATION";
    codec::expect_arity(CTX, fields, 1)?;

    Ok(Reply::SlotDuration(SlotDuration {
        duration_ms: codec::number(CTX, "duration", fields[0])?,
    }))
}

/// `running`
fn decode_iperf(fields: &[&str]) -> Decoded {
    const CTX: &str = "IPERF";
    codec::expect_arity(CTX, fields, 1)?;

    Ok(Reply::Iperf(IperfStatus {
        running: codec::flag(CTX, "running", fields[0])?,
    }))
}

/// `fadeEffect`
fn decode_fade_effect(fields: &[&str]) -> Decoded {
    const CTX: &str = "EFFECT";
    codec::expect_arity(CTX, fields, 1)?;

    let raw: u8 = codec::number(CTX, "fadeEffect", fields[0])?;
    FadeEffect::from_raw(raw)
        .map(Reply::FadeEffect)
        .ok_or_else(|| codec::invalid(CTX, "fadeEffect", fields[0]))
}

/// `alias`, quoted or bare; absent means empty.
fn decode_alias(fields: &[&str]) -> Decoded {
    let alias = match fields {
        [] => String::new(),
        [alias] => codec::unquote_lenient(alias).to_string(),
        _ => return Err(codec::arity("ALIAS", "0 or 1", fields.len())),
    };

    Ok(Reply::Alias(PluginAlias { alias }))
}

fn decode_empty(ctx: &str, fields: &[&str]) -> Decoded {
    codec::expect_arity(ctx, fields, 0)?;
    Ok(Reply::Empty)
}

fn decode_empty_reset(fields: &[&str]) -> Decoded {
    decode_empty("RESET", fields)
}

fn decode_empty_uninstall(fields: &[&str]) -> Decoded {
    decode_empty("UNINSTALL", fields)
}

fn decode_empty_move(fields: &[&str]) -> Decoded {
    decode_empty("MOVE", fields)
}

fn decode_empty_button(fields: &[&str]) -> Decoded {
    decode_empty("BUTTON", fields)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(text: &str) -> Vec<String> {
        text.split(';').map(str::to_string).collect()
    }

    #[test]
    fn test_every_command_has_a_decoder() {
        for name in CommandName::ALL {
            assert!(decoder_for(name).is_some(), "no decoder for {name}");
        }
    }

    #[test]
    fn test_decode_brightness() {
        let reply = decode_reply(CommandName::Brightness, &fields("128;1")).expect("decode");
        assert_eq!(
            reply,
            Reply::Brightness(Brightness {
                level: 128,
                auto_control: true,
            })
        );
    }

    #[test]
    fn test_decode_install() {
        let reply = decode_reply(CommandName::Install, &fields("3;42")).expect("decode");
        assert_eq!(
            reply,
            Reply::Installed(Installation { slot_id: 3, uid: 42 })
        );
    }

    #[test]
    fn test_decode_slots() {
        let text = "2;\"ClockPlugin\";17;\"Kitchen\";0;1;10000;\"\";0;\"\";1;0;0";
        let reply = decode_reply(CommandName::Slots, &fields(text)).expect("decode");

        let Reply::Slots(table) = reply else {
            panic!("expected slots");
        };
        assert_eq!(table.max_slots, 2);
        assert_eq!(table.slots.len(), 2);
        assert_eq!(table.slots[0].name, "ClockPlugin");
        assert_eq!(table.slots[0].uid, 17);
        assert_eq!(table.slots[0].alias, "Kitchen");
        assert!(!table.slots[0].is_locked);
        assert!(table.slots[0].is_sticky);
        assert_eq!(table.slots[0].duration_ms, 10000);
        assert!(table.slots[1].is_empty());
        assert!(table.slots[1].is_locked);
        assert_eq!(table.sticky_slot(), Some(0));
        assert_eq!(table.slot_of(17), Some(0));
        assert_eq!(table.slot_of(0), None);
    }

    #[test]
    fn test_decode_slots_arity_mismatch() {
        let err = decode_reply(CommandName::Slots, &fields("2;\"A\";1;\"\";0;0;0"))
            .unwrap_err();
        assert!(matches!(err, DecodeError::Arity { .. }));
    }

    #[test]
    fn test_decode_display() {
        let reply =
            decode_reply(CommandName::GetDisp, &fields("4;2;1;ff0000;00ff00")).expect("decode");

        let Reply::DisplayContent(content) = reply else {
            panic!("expected display content");
        };
        assert_eq!(content.slot_id, 4);
        assert_eq!(content.pixels, vec![0x00ff_0000, 0x0000_ff00]);
        assert_eq!(content.pixel(1, 0), Some(0x0000_ff00));
        assert_eq!(content.pixel(2, 0), None);
    }

    #[test]
    fn test_decode_display_rejects_missing_pixels() {
        let err = decode_reply(CommandName::GetDisp, &fields("4;2;2;ff0000")).unwrap_err();
        assert!(matches!(err, DecodeError::Arity { .. }));
    }

    #[test]
    fn test_decode_plugins() {
        let reply =
            decode_reply(CommandName::Plugins, &fields("\"Clock\";\"Date\"")).expect("decode");
        assert_eq!(
            reply,
            Reply::Plugins(PluginList {
                names: vec!["Clock".into(), "Date".into()],
            })
        );

        let empty = decode_reply(CommandName::Plugins, &fields("")).expect("decode");
        assert_eq!(empty, Reply::Plugins(PluginList { names: vec![] }));
    }

    #[test]
    fn test_decode_empty_replies_accept_trailing_delimiter() {
        for name in [
            CommandName::Reset,
            CommandName::Uninstall,
            CommandName::Move,
            CommandName::Button,
        ] {
            assert_eq!(decode_reply(name, &[]), Ok(Reply::Empty));
            assert_eq!(decode_reply(name, &fields("")), Ok(Reply::Empty));
            assert!(decode_reply(name, &fields("1")).is_err());
        }
    }

    #[test]
    fn test_decode_single_field_replies() {
        assert_eq!(
            decode_reply(CommandName::Log, &fields("1")),
            Ok(Reply::LogStreaming(LogStreaming { enabled: true }))
        );
        assert_eq!(
            decode_reply(CommandName::SlotDuration, &fields("30000")),
            Ok(Reply::SlotDuration(SlotDuration { duration_ms: 30000 }))
        );
        assert_eq!(
            decode_reply(CommandName::Iperf, &fields("0")),
            Ok(Reply::Iperf(IperfStatus { running: false }))
        );
        assert_eq!(
            decode_reply(CommandName::Effect, &fields("2")),
            Ok(Reply::FadeEffect(FadeEffect::MoveX))
        );
        assert!(decode_reply(CommandName::Effect, &fields("7")).is_err());
    }

    #[test]
    fn test_decode_alias() {
        assert_eq!(
            decode_reply(CommandName::Alias, &fields("\"Kitchen\"")),
            Ok(Reply::Alias(PluginAlias {
                alias: "Kitchen".into()
            }))
        );
        assert_eq!(
            decode_reply(CommandName::Alias, &fields("")),
            Ok(Reply::Alias(PluginAlias {
                alias: String::new()
            }))
        );
    }

    #[test]
    fn test_wrong_arity_is_rejected() {
        assert!(decode_reply(CommandName::Brightness, &fields("128")).is_err());
        assert!(decode_reply(CommandName::Install, &fields("3;42;1")).is_err());
        assert!(decode_reply(CommandName::Brightness, &fields("x;1")).is_err());
    }

    #[test]
    fn test_from_reply() {
        let brightness = Brightness {
            level: 1,
            auto_control: false,
        };
        assert_eq!(
            Brightness::from_reply(Reply::Brightness(brightness)).expect("brightness"),
            brightness
        );
        assert!(<()>::from_reply(Reply::Empty).is_ok());

        let err = Brightness::from_reply(Reply::Empty).unwrap_err();
        assert!(matches!(err, Error::ProtocolViolation { .. }));
    }
}
