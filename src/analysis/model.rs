use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Number of keypoints in the body-pose topology the service reports.
pub const POSE_LANDMARK_COUNT: usize = 33;

/// A single normalised body keypoint.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default, deserialize_with = "lenient")]
    pub z: Option<f64>,
}

impl Landmark {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: None }
    }
}

/// Landmarks of one frame. Entries may be `null` and the list may be short.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandmarkSet(Vec<Option<Landmark>>);

// Entries without numeric `x`/`y` are absent; anything but an array is an empty set.
impl<'de> Deserialize<'de> for LandmarkSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let points = match Value::deserialize(deserializer)? {
            Value::Array(items) => items
                .into_iter()
                .map(|item| Landmark::deserialize(item).ok())
                .collect(),
            _ => Vec::new(),
        };
        Ok(Self(points))
    }
}

impl LandmarkSet {
    pub const fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn new(points: Vec<Option<Landmark>>) -> Self {
        Self(points)
    }

    pub fn get(&self, index: usize) -> Option<&Landmark> {
        self.0.get(index).and_then(Option::as_ref)
    }

    /// Present landmarks together with their topology index.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Landmark)> {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(index, point)| point.as_ref().map(|p| (index, p)))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Landmark>> for LandmarkSet {
    fn from(points: Vec<Landmark>) -> Self {
        Self(points.into_iter().map(Some).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum LandingType {
    FrontFoot,
    HeelFoot,
    MidFoot,
    NoContact,
    Other(String),
}

impl From<String> for LandingType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "frontfoot" => LandingType::FrontFoot,
            "heelfoot" => LandingType::HeelFoot,
            "midfoot" => LandingType::MidFoot,
            "none" => LandingType::NoContact,
            _ => LandingType::Other(value),
        }
    }
}

impl fmt::Display for LandingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LandingType::FrontFoot => write!(f, "frontfoot"),
            LandingType::HeelFoot => write!(f, "heelfoot"),
            LandingType::MidFoot => write!(f, "midfoot"),
            LandingType::NoContact => write!(f, "none"),
            LandingType::Other(value) => write!(f, "{}", value),
        }
    }
}

/// Per-frame foot strike classification and the ground line it was judged against.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LandingRecord {
    #[serde(default, deserialize_with = "lenient")]
    pub left_landing_type: Option<LandingType>,
    #[serde(default, deserialize_with = "lenient")]
    pub right_landing_type: Option<LandingType>,
    #[serde(default, deserialize_with = "lenient")]
    pub ground_assump: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub left_toe_y: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub left_heel_y: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub right_toe_y: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub right_heel_y: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HipDropRecord {
    #[serde(default, deserialize_with = "lenient")]
    pub significant: bool,
    #[serde(default, rename = "hip_Drop", deserialize_with = "lenient")]
    pub magnitude: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeanClass {
    Leaning,
    Neutral,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BodyLeanRecord {
    #[serde(default, deserialize_with = "lenient")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub angle: f64,
}

impl BodyLeanRecord {
    pub fn classify(&self) -> LeanClass {
        match self.text.as_deref() {
            Some("Forward Lean") | Some("Backward Lean") => LeanClass::Leaning,
            _ => LeanClass::Neutral,
        }
    }
}

/// Decoded response of the pose service. Every field is optional on the wire and
/// a wrongly typed value falls back to its default without affecting the others.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AnalysisResult {
    #[serde(default, deserialize_with = "lenient_items")]
    pub landmarks: Vec<LandmarkSet>,
    #[serde(default, deserialize_with = "lenient_items")]
    pub landing_analysis: Vec<LandingRecord>,
    #[serde(default, deserialize_with = "lenient_items")]
    pub hipdrop_analysis: Vec<HipDropRecord>,
    #[serde(default, deserialize_with = "lenient_items")]
    pub body_lean_analysis: Vec<BodyLeanRecord>,
    #[serde(default, deserialize_with = "lenient_items")]
    pub vertical_bounces: Vec<f64>,
    #[serde(default, deserialize_with = "non_empty_string")]
    pub most_frequent_landing_type: Option<String>,
}

static EMPTY_LANDMARKS: LandmarkSet = LandmarkSet::empty();
static DEFAULT_LANDING: LandingRecord = LandingRecord {
    left_landing_type: None,
    right_landing_type: None,
    ground_assump: None,
    left_toe_y: None,
    left_heel_y: None,
    right_toe_y: None,
    right_heel_y: None,
};
static DEFAULT_HIP_DROP: HipDropRecord = HipDropRecord {
    significant: false,
    magnitude: None,
};
static DEFAULT_BODY_LEAN: BodyLeanRecord = BodyLeanRecord {
    text: None,
    angle: 0.0,
};

/// Everything known about one frame, with defaults where the arrays run out.
#[derive(Debug, Clone, Copy)]
pub struct FrameAnnotations<'a> {
    pub index: usize,
    pub landmarks: &'a LandmarkSet,
    pub landing: &'a LandingRecord,
    pub hip_drop: &'a HipDropRecord,
    pub body_lean: &'a BodyLeanRecord,
    pub vertical_bounce: f64,
}

impl AnalysisResult {
    /// Fails only when `body` is not a JSON object.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        let fields: Map<String, Value> = serde_json::from_slice(body)?;
        Self::deserialize(Value::Object(fields))
    }

    pub fn frame(&self, index: usize) -> FrameAnnotations<'_> {
        FrameAnnotations {
            index,
            landmarks: self.landmarks.get(index).unwrap_or(&EMPTY_LANDMARKS),
            landing: self.landing_analysis.get(index).unwrap_or(&DEFAULT_LANDING),
            hip_drop: self.hipdrop_analysis.get(index).unwrap_or(&DEFAULT_HIP_DROP),
            body_lean: self
                .body_lean_analysis
                .get(index)
                .unwrap_or(&DEFAULT_BODY_LEAN),
            vertical_bounce: self.vertical_bounces.get(index).copied().unwrap_or(0.0),
        }
    }

    /// Length of the longest per-frame sequence.
    pub fn frame_count(&self) -> usize {
        [
            self.landmarks.len(),
            self.landing_analysis.len(),
            self.hipdrop_analysis.len(),
            self.body_lean_analysis.len(),
            self.vertical_bounces.len(),
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }
}

fn or_default<T>(value: Value) -> T
where
    T: DeserializeOwned + Default,
{
    T::deserialize(value).unwrap_or_default()
}

fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(or_default(Value::deserialize(deserializer)?))
}

// Anything but an array becomes empty; items that do not fit become their default.
fn lenient_items<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items.into_iter().map(or_default).collect(),
        _ => Vec::new(),
    })
}

fn non_empty_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = lenient(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}
