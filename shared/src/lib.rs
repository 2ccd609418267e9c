use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

pub mod history_format;

pub use history_format::{HistoryFileData, HistoryFileError};

#[derive(Serialize, Deserialize, Encode, Decode, Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// One line segment as produced by a client, before the server orders it.
#[derive(Serialize, Deserialize, Encode, Decode, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    #[serde(alias = "prevPoint")]
    pub previous_point: Point,
    pub current_point: Point,
    pub color: String,
    #[serde(alias = "width")]
    pub stroke_width: f64,
}

/// A segment that has been appended to the canvas history.
#[derive(Serialize, Deserialize, Encode, Decode, Clone, Debug, PartialEq)]
pub struct DrawOperation {
    pub sequence: u64,
    #[serde(flatten)]
    pub segment: Segment,
}

/// Body of a `draw` event: a single segment or a batch of them.
#[derive(Serialize, Deserialize, Encode, Decode, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum DrawPayload {
    Batch(Vec<Segment>),
    Single(Segment),
}

impl DrawPayload {
    pub fn segments(&self) -> &[Segment] {
        match self {
            DrawPayload::Batch(segments) => segments,
            DrawPayload::Single(segment) => std::slice::from_ref(segment),
        }
    }

    pub fn len(&self) -> usize {
        self.segments().len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments().is_empty()
    }
}

#[derive(Serialize, Deserialize, Encode, Decode, Clone, Debug, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum ClientMessage {
    #[serde(rename = "draw")]
    Draw(DrawPayload),
    #[serde(rename = "clear")]
    Clear,
}

#[derive(Serialize, Deserialize, Encode, Decode, Clone, Debug, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    #[serde(rename = "snapshot")]
    Snapshot(Vec<DrawOperation>),
    #[serde(rename = "draw")]
    Draw(DrawPayload),
    #[serde(rename = "clear")]
    Clear,
    #[serde(rename = "presence")]
    Presence(usize),
}

/// Encoding used for server-to-client frames on one connection.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WireFormat {
    #[default]
    Json,
    Bincode,
}
