/*!
 * Session data models.
 *
 * A session is the accumulating record of campaign parameters and asset links
 * for one conversation.
 */

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

/// Maximum length of the product field, in characters
pub const PRODUCT_MAX_CHARS: usize = 120;
/// Maximum length of the audience field, in characters
pub const AUDIENCE_MAX_CHARS: usize = 120;
/// Maximum length of the tone field, in characters
pub const TONE_MAX_CHARS: usize = 60;

/// Shortest video the service is asked for
pub const MIN_DURATION_SECONDS: u32 = 10;
/// Longest video the service is asked for
pub const MAX_DURATION_SECONDS: u32 = 45;
/// Duration used when none (or garbage) is supplied
pub const DEFAULT_DURATION_SECONDS: u32 = 20;

/// Field delimiter of a parameter line
pub const FIELD_DELIMITER: char = '|';
/// Fields beyond this count are ignored
pub const MAX_FIELDS: usize = 5;

/// Stable key of one conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Output frame of the rendered video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AspectRatio {
    /// 9:16, phone-first stories and reels
    #[default]
    Portrait,
    /// 1:1
    Square,
    /// 16:9
    Landscape,
}

impl AspectRatio {
    /// Wire representation, e.g. `"9:16"`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Portrait => "9:16",
            Self::Square => "1:1",
            Self::Landscape => "16:9",
        }
    }

    /// Parse a user-supplied value, falling back to the default on anything unknown
    pub fn parse_or_default(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "9:16" => Ok(Self::Portrait),
            "1:1" => Ok(Self::Square),
            "16:9" => Ok(Self::Landscape),
            other => Err(format!("Unsupported aspect ratio: {}", other)),
        }
    }
}

impl Serialize for AspectRatio {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AspectRatio {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

/// Clamp a requested duration to the supported range
pub fn clamp_duration(seconds: i64) -> u32 {
    seconds.clamp(MIN_DURATION_SECONDS as i64, MAX_DURATION_SECONDS as i64) as u32
}

/// First code point (digit zero) of every run of decimal digits in the Basic
/// Multilingual Plane. Each run holds the digits 0 to 9 in order.
const DECIMAL_DIGIT_ZEROS: [u32; 37] = [
    0x0030, 0x0660, 0x06F0, 0x07C0, 0x0966, 0x09E6, 0x0A66, 0x0AE6, 0x0B66, 0x0BE6, 0x0C66,
    0x0CE6, 0x0D66, 0x0DE6, 0x0E50, 0x0ED0, 0x0F20, 0x1040, 0x1090, 0x17E0, 0x1810, 0x1946,
    0x19D0, 0x1A80, 0x1A90, 0x1B50, 0x1BB0, 0x1C40, 0x1C50, 0xA620, 0xA8D0, 0xA900, 0xA9D0,
    0xA9F0, 0xAA50, 0xABF0, 0xFF10,
];

/// Value of a decimal digit in any script, e.g. `'7'`, `'٧'` or `'７'`
pub fn decimal_digit_value(c: char) -> Option<u32> {
    let code = c as u32;
    DECIMAL_DIGIT_ZEROS
        .iter()
        .find(|&&zero| (zero..zero + 10).contains(&code))
        .map(|zero| code - zero)
}

/// Interpret the duration field of a parameter line.
///
/// A field made only of decimal digits (of any script) is a number; anything
/// else, including signs, decimals and superscripts, yields the default.
/// Values too large to represent are clamped like any other large value.
pub fn parse_duration(field: &str) -> u32 {
    let digits: Option<Vec<u32>> = field.chars().map(decimal_digit_value).collect();
    let digits = match digits {
        Some(digits) if !digits.is_empty() => digits,
        _ => return DEFAULT_DURATION_SECONDS,
    };

    let seconds = digits.iter().try_fold(0i64, |acc, &digit| {
        acc.checked_mul(10)?.checked_add(i64::from(digit))
    });
    match seconds {
        Some(seconds) => clamp_duration(seconds),
        None => MAX_DURATION_SECONDS,
    }
}

fn cap(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Validated campaign parameters parsed from one parameter line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignParams {
    pub product: String,
    pub audience: String,
    pub tone: String,
    pub duration_seconds: u32,
    pub aspect_ratio: AspectRatio,
}

impl CampaignParams {
    /// Parse `product|audience|tone[|seconds[|aspect]]`.
    ///
    /// Every field is trimmed and the text fields are length-capped. Only the
    /// first five fields are considered.
    pub fn parse(line: &str) -> Result<Self, ValidationError> {
        let fields: Vec<&str> = line
            .split(FIELD_DELIMITER)
            .map(str::trim)
            .take(MAX_FIELDS)
            .collect();

        if fields.len() < 3 {
            return Err(ValidationError::TooFewFields(fields.len()));
        }

        let product = cap(fields[0], PRODUCT_MAX_CHARS);
        let audience = cap(fields[1], AUDIENCE_MAX_CHARS);
        let tone = cap(fields[2], TONE_MAX_CHARS);

        if product.is_empty() {
            return Err(ValidationError::EmptyField("product"));
        }
        if audience.is_empty() {
            return Err(ValidationError::EmptyField("audience"));
        }
        if tone.is_empty() {
            return Err(ValidationError::EmptyField("tone"));
        }

        let duration_seconds = fields
            .get(3)
            .map(|field| parse_duration(field))
            .unwrap_or(DEFAULT_DURATION_SECONDS);
        let aspect_ratio = fields
            .get(4)
            .map(|field| AspectRatio::parse_or_default(field))
            .unwrap_or_default();

        Ok(Self {
            product,
            audience,
            tone,
            duration_seconds,
            aspect_ratio,
        })
    }
}

/// Where a conversation is in the collection flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Started, waiting for the parameter line
    AwaitingParameters,
    /// Parameters accepted, collecting asset links until the run trigger
    CollectingAssets,
    /// Job submitted, waiting for the result
    Running,
}

/// Per-conversation record of campaign parameters and asset links
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub product: Option<String>,
    pub audience: Option<String>,
    pub tone: Option<String>,
    pub duration_seconds: u32,
    pub aspect_ratio: AspectRatio,
    pub assets: Vec<String>,
    running: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            product: None,
            audience: None,
            tone: None,
            duration_seconds: DEFAULT_DURATION_SECONDS,
            aspect_ratio: AspectRatio::default(),
            assets: Vec::new(),
            running: false,
        }
    }
}

impl Session {
    /// Fresh session waiting for its parameter line
    pub fn new() -> Self {
        Self::default()
    }

    /// Session pre-filled from a parsed parameter line
    pub fn from_params(params: CampaignParams) -> Self {
        let mut session = Self::new();
        session.apply_params(params);
        session
    }

    /// Replace the parameters and clear previously collected assets
    pub fn apply_params(&mut self, params: CampaignParams) {
        self.product = Some(params.product);
        self.audience = Some(params.audience);
        self.tone = Some(params.tone);
        self.duration_seconds = params.duration_seconds;
        self.aspect_ratio = params.aspect_ratio;
        self.assets.clear();
    }

    /// Whether any parameter has been supplied yet
    pub fn has_parameters(&self) -> bool {
        self.product.is_some() || self.audience.is_some() || self.tone.is_some()
    }

    /// Eligible to run: product, audience and tone all non-empty
    pub fn is_complete(&self) -> bool {
        [&self.product, &self.audience, &self.tone]
            .iter()
            .all(|field| field.as_deref().is_some_and(|value| !value.is_empty()))
    }

    /// Parameters of a complete session, `None` otherwise
    pub fn campaign(&self) -> Option<CampaignParams> {
        if !self.is_complete() {
            return None;
        }

        Some(CampaignParams {
            product: self.product.clone()?,
            audience: self.audience.clone()?,
            tone: self.tone.clone()?,
            duration_seconds: self.duration_seconds,
            aspect_ratio: self.aspect_ratio,
        })
    }

    pub fn add_asset(&mut self, url: impl Into<String>) {
        self.assets.push(url.into());
    }

    pub fn mark_running(&mut self) {
        self.running = true;
    }

    pub fn state(&self) -> SessionState {
        if self.running {
            SessionState::Running
        } else if self.has_parameters() {
            SessionState::CollectingAssets
        } else {
            SessionState::AwaitingParameters
        }
    }
}
