//! JSON batch format.
//!
//! A batch is a JSON array of flat event objects. Every object carries the
//! numeric kind tag `e` and the timestamp `t`; the remaining fields depend on
//! the kind:
//!
//! | kind | fields |
//! |---|---|
//! | frame tick | - |
//! | pointer down/up/move | `clientX`, `clientY` |
//! | random seed | `s` |
//! | viewport set, session start | `w`, `h` |
//! | listener | `oid`, `w` (window flag), `en`, `tid`, `kc` |
//!
//! `w` is a number for viewport events and a boolean for listener events, so
//! decoding always switches on `e` before reading kind-specific fields.

use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::WireError;
use crate::event::{ElementId, Event, EventData, EventKind, ListenerRecord, PointerInput, Viewport};

/// Encode events as one JSON batch.
pub fn encode_batch(events: &[Event]) -> Result<String, WireError> {
    Ok(serde_json::to_string(events)?)
}

/// Decode one JSON batch, preserving event order.
///
/// Fails on the first malformed element; see [`decode_events`] to keep the
/// well-formed ones.
pub fn decode_batch(payload: &str) -> Result<Vec<Event>, WireError> {
    decode_events(payload)?.into_iter().collect()
}

/// Decode one JSON batch element by element.
///
/// Only a payload that is not a JSON array fails as a whole. Each element is
/// decoded on its own, so a malformed element leaves its neighbours intact
/// and in order.
pub fn decode_events(payload: &str) -> Result<Vec<Result<Event, WireError>>, WireError> {
    let elements: Vec<serde_json::Value> = serde_json::from_str(payload)?;
    Ok(elements.into_iter().map(decode_element).collect())
}

fn decode_element(value: serde_json::Value) -> Result<Event, WireError> {
    let raw = RawEvent::deserialize(value)?;
    Event::try_from(raw)
}

impl Serialize for Event {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("e", &self.kind().tag())?;
        match &self.data {
            EventData::FrameTick => {}
            EventData::PointerDown(p) | EventData::PointerUp(p) | EventData::PointerMove(p) => {
                map.serialize_entry("clientX", &p.client_x)?;
                map.serialize_entry("clientY", &p.client_y)?;
            }
            EventData::RandomSeed { seed } => {
                map.serialize_entry("s", seed)?;
            }
            EventData::ViewportSet(v) | EventData::SessionStart(v) => {
                map.serialize_entry("w", &v.width)?;
                map.serialize_entry("h", &v.height)?;
            }
            EventData::Listener(l) => {
                map.serialize_entry("oid", &l.object_id.as_ref().map(ElementId::as_str))?;
                map.serialize_entry("w", &l.window)?;
                map.serialize_entry("en", &l.event_name)?;
                map.serialize_entry("tid", &l.target_id.as_ref().map(ElementId::as_str))?;
                if let Some(kc) = l.key_code {
                    map.serialize_entry("kc", &kc)?;
                }
            }
        }
        map.serialize_entry("t", &self.timestamp)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for Event {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawEvent::deserialize(deserializer)?;
        Event::try_from(raw).map_err(D::Error::custom)
    }
}

/// Untyped view of one wire object; every field optional.
#[derive(Debug, Deserialize)]
struct RawEvent {
    e: u8,
    #[serde(default)]
    t: Option<f64>,
    #[serde(default)]
    w: Option<WidthOrFlag>,
    #[serde(default)]
    h: Option<u32>,
    #[serde(default, rename = "clientX")]
    client_x: Option<f64>,
    #[serde(default, rename = "clientY")]
    client_y: Option<f64>,
    #[serde(default)]
    s: Option<String>,
    #[serde(default)]
    oid: Option<String>,
    #[serde(default)]
    en: Option<String>,
    #[serde(default)]
    tid: Option<String>,
    #[serde(default)]
    kc: Option<u32>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum WidthOrFlag {
    Flag(bool),
    Size(u32),
}

fn required<T>(value: Option<T>, kind: EventKind, field: &'static str) -> Result<T, WireError> {
    value.ok_or(WireError::MissingField { kind, field })
}

impl TryFrom<RawEvent> for Event {
    type Error = WireError;

    fn try_from(raw: RawEvent) -> Result<Self, Self::Error> {
        let kind = EventKind::from_tag(raw.e).ok_or(WireError::UnknownKind(raw.e))?;
        let timestamp = required(raw.t, kind, "t")?;

        let data = match kind {
            EventKind::FrameTick => EventData::FrameTick,
            EventKind::PointerDown | EventKind::PointerUp | EventKind::PointerMove => {
                let input = PointerInput::new(
                    required(raw.client_x, kind, "clientX")?,
                    required(raw.client_y, kind, "clientY")?,
                );
                // is_pointer() kinds always map
                EventData::pointer(kind, input).ok_or(WireError::UnknownKind(raw.e))?
            }
            EventKind::RandomSeed => EventData::RandomSeed {
                seed: required(raw.s, kind, "s")?,
            },
            EventKind::ViewportSet | EventKind::SessionStart => {
                let width = match required(raw.w, kind, "w")? {
                    WidthOrFlag::Size(width) => width,
                    WidthOrFlag::Flag(_) => {
                        return Err(WireError::InvalidField { kind, field: "w" })
                    }
                };
                let viewport = Viewport::new(width, required(raw.h, kind, "h")?);
                if kind == EventKind::SessionStart {
                    EventData::SessionStart(viewport)
                } else {
                    EventData::ViewportSet(viewport)
                }
            }
            EventKind::Listener => {
                let window = match raw.w {
                    None => false,
                    Some(WidthOrFlag::Flag(flag)) => flag,
                    Some(WidthOrFlag::Size(_)) => {
                        return Err(WireError::InvalidField { kind, field: "w" })
                    }
                };
                EventData::Listener(ListenerRecord {
                    object_id: raw.oid.map(ElementId::from),
                    window,
                    event_name: required(raw.en, kind, "en")?,
                    target_id: raw.tid.map(ElementId::from),
                    key_code: raw.kc,
                })
            }
        };

        Ok(Event::new(timestamp, data))
    }
}
