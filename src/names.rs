//! Human-readable names for channel messages.
//!
//! The decoder never depends on these names to find event boundaries, it only uses them to label
//! the messages it decodes.

use serde::{Deserialize, Serialize};
use std::{fs::File, io, path::Path};
use thiserror::Error;
use tracing::{info, warn};

/// The label given to channel messages that the dictionary cannot name.
pub const UNKNOWN_EVENT: &str = "Unknown event";

/// The result of a successful name lookup.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct EventName<'a> {
    pub label: &'a str,
    /// How many operand bytes the dictionary expects for this message.
    pub operand_count: u8,
}

/// Read-only lookups from numeric codes to display names.
///
/// Implementors must be shareable across threads, since tracks may be decoded in parallel.
pub trait EventNameResolver: Sync {
    /// Name a controller change message by its controller number (the first operand).
    fn controller_label(&self, controller: u8) -> Option<EventName<'_>>;

    /// Name a channel voice message by its status family byte, eg. `0x90`.
    ///
    /// The decoder always passes the status with the channel nibble cleared.
    fn channel_voice_label(&self, status_family: u8) -> Option<EventName<'_>>;
}

/// A resolver that knows no names, so every channel message is an "Unknown event".
impl EventNameResolver for () {
    fn controller_label(&self, _controller: u8) -> Option<EventName<'_>> {
        None
    }

    fn channel_voice_label(&self, _status_family: u8) -> Option<EventName<'_>> {
        None
    }
}

/// Errors while loading an event name dictionary.
#[derive(Debug, Error)]
pub enum NamesError {
    #[error("failed to read event names: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse event names: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to parse event names: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("controller number {0} is out of range")]
    ControllerOutOfRange(u8),
    #[error("status byte 0x{0:02X} is not a channel voice status")]
    StatusOutOfRange(u8),
}

/// A controller entry, as written in the dictionary file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerEntry {
    #[serde(rename = "control")]
    pub controller: u8,
    pub message: String,
}

/// A channel voice entry, as written in the dictionary file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelVoiceEntry {
    pub status_byte: u8,
    #[serde(rename = "nvalues")]
    pub operand_count: u8,
    pub message: String,
}

/// The dictionary file layout.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NamesConfig {
    pub control_change: Vec<ControllerEntry>,
    pub channel_voice_message: Vec<ChannelVoiceEntry>,
}

/// An immutable event name dictionary, with one slot per controller number and per channel
/// voice status family.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventNames {
    controllers: Vec<Option<String>>,
    voices: Vec<Option<(String, u8)>>,
}
impl EventNames {
    /// A dictionary without any names.
    pub fn empty() -> EventNames {
        EventNames {
            controllers: vec![None; 128],
            voices: vec![None; 7],
        }
    }

    /// Build a dictionary from its file layout.
    ///
    /// Channel voice entries are matched by status family, so a channel nibble in an entry is
    /// dropped. Later entries override earlier ones.
    pub fn from_config(config: NamesConfig) -> Result<EventNames, NamesError> {
        let mut names = EventNames::empty();
        for entry in config.control_change {
            let slot = names
                .controllers
                .get_mut(entry.controller as usize)
                .ok_or(NamesError::ControllerOutOfRange(entry.controller))?;
            *slot = Some(entry.message);
        }
        for entry in config.channel_voice_message {
            let idx = voice_index(entry.status_byte)
                .ok_or(NamesError::StatusOutOfRange(entry.status_byte))?;
            if entry.status_byte & 0x0F != 0 {
                warn!(
                    "event name entry 0x{:02X} has a channel nibble, using it for the whole 0x{:02X} family",
                    entry.status_byte,
                    entry.status_byte & 0xF0
                );
            }
            names.voices[idx] = Some((entry.message, entry.operand_count));
        }
        Ok(names)
    }

    /// Parse a JSON dictionary.
    pub fn from_json_str(json: &str) -> Result<EventNames, NamesError> {
        Self::from_config(serde_json::from_str(json)?)
    }

    /// Parse a JSON dictionary from any reader.
    pub fn from_reader<R: io::Read>(reader: R) -> Result<EventNames, NamesError> {
        Self::from_config(serde_json::from_reader(io::BufReader::new(reader))?)
    }

    /// Parse a YAML dictionary.
    pub fn from_yaml_str(yaml: &str) -> Result<EventNames, NamesError> {
        Self::from_config(serde_yaml::from_str(yaml)?)
    }

    /// Parse a YAML dictionary from any reader.
    pub fn from_yaml_reader<R: io::Read>(reader: R) -> Result<EventNames, NamesError> {
        Self::from_config(serde_yaml::from_reader(io::BufReader::new(reader))?)
    }

    /// Load a dictionary file.
    ///
    /// Files ending in `.yaml` or `.yml` are read as YAML, anything else as JSON.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<EventNames, NamesError> {
        fn load_impl(path: &Path) -> Result<EventNames, NamesError> {
            let file = File::open(path)?;
            let names = match path.extension().and_then(|ext| ext.to_str()) {
                Some("yaml") | Some("yml") => EventNames::from_yaml_reader(file)?,
                _ => EventNames::from_reader(file)?,
            };
            info!(
                "loaded {} controller and {} channel voice names from {}",
                names.controller_count(),
                names.voice_count(),
                path.display()
            );
            Ok(names)
        }
        load_impl(path.as_ref())
    }

    /// The standard channel voice names and the common General MIDI controller names.
    pub fn general_midi() -> EventNames {
        let mut names = EventNames::empty();
        for &(controller, label) in GM_CONTROLLERS {
            names.controllers[controller as usize] = Some(label.to_string());
        }
        for &(status, operand_count, label) in GM_VOICES {
            if let Some(idx) = voice_index(status) {
                names.voices[idx] = Some((label.to_string(), operand_count));
            }
        }
        names
    }

    /// Convert back into the file layout, in code order.
    pub fn to_config(&self) -> NamesConfig {
        NamesConfig {
            control_change: self
                .controllers
                .iter()
                .enumerate()
                .filter_map(|(controller, label)| {
                    Some(ControllerEntry {
                        controller: controller as u8,
                        message: label.clone()?,
                    })
                })
                .collect(),
            channel_voice_message: self
                .voices
                .iter()
                .enumerate()
                .filter_map(|(idx, entry)| {
                    let (message, operand_count) = entry.clone()?;
                    Some(ChannelVoiceEntry {
                        status_byte: 0x80 + ((idx as u8) << 4),
                        operand_count,
                        message,
                    })
                })
                .collect(),
        }
    }

    pub fn controller_count(&self) -> usize {
        self.controllers.iter().filter(|c| c.is_some()).count()
    }

    pub fn voice_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_some()).count()
    }
}
impl Default for EventNames {
    fn default() -> EventNames {
        EventNames::empty()
    }
}
impl EventNameResolver for EventNames {
    fn controller_label(&self, controller: u8) -> Option<EventName<'_>> {
        let label = self.controllers.get(controller as usize)?.as_deref()?;
        Some(EventName {
            label,
            operand_count: 2,
        })
    }

    fn channel_voice_label(&self, status_family: u8) -> Option<EventName<'_>> {
        if status_family & 0x0F != 0 {
            return None;
        }
        let (label, operand_count) = self.voices.get(voice_index(status_family)?)?.as_ref()?;
        Some(EventName {
            label: label.as_str(),
            operand_count: *operand_count,
        })
    }
}

/// Slot for a channel voice status, `0x80..=0xEF`.
fn voice_index(status: u8) -> Option<usize> {
    match status {
        0x80..=0xEF => Some(((status >> 4) - 0x8) as usize),
        _ => None,
    }
}

const GM_VOICES: &[(u8, u8, &str)] = &[
    (0x80, 2, "Note Off"),
    (0x90, 2, "Note On"),
    (0xA0, 2, "Polyphonic Key Pressure"),
    (0xB0, 2, "Control Change"),
    (0xC0, 1, "Program Change"),
    (0xD0, 1, "Channel Key Pressure"),
    (0xE0, 2, "Pitch Bend"),
];

const GM_CONTROLLERS: &[(u8, &str)] = &[
    (0, "Bank Select (MSB)"),
    (1, "Modulation Wheel (MSB)"),
    (2, "Breath Controller (MSB)"),
    (4, "Foot Controller (MSB)"),
    (5, "Portamento Time (MSB)"),
    (6, "Data Entry (MSB)"),
    (7, "Channel Volume (MSB)"),
    (8, "Balance (MSB)"),
    (10, "Pan (MSB)"),
    (11, "Expression Controller (MSB)"),
    (32, "Bank Select (LSB)"),
    (33, "Modulation Wheel (LSB)"),
    (38, "Data Entry (LSB)"),
    (39, "Channel Volume (LSB)"),
    (42, "Pan (LSB)"),
    (43, "Expression Controller (LSB)"),
    (64, "Damper Pedal"),
    (65, "Portamento On/Off"),
    (66, "Sostenuto"),
    (67, "Soft Pedal"),
    (71, "Resonance"),
    (72, "Release Time"),
    (73, "Attack Time"),
    (74, "Cutoff"),
    (91, "Reverb Send Level"),
    (93, "Chorus Send Level"),
    (98, "NRPN (LSB)"),
    (99, "NRPN (MSB)"),
    (100, "RPN (LSB)"),
    (101, "RPN (MSB)"),
    (120, "All Sound Off"),
    (121, "Reset All Controllers"),
    (122, "Local Control"),
    (123, "All Notes Off"),
    (124, "Omni Mode Off"),
    (125, "Omni Mode On"),
    (126, "Mono Mode On"),
    (127, "Poly Mode On"),
];
