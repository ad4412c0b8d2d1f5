use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{KeyframeError, Result};

/// Linear interpolation between two samples, `t` in `[0, 1]`
pub trait Lerp: Sized {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        a + (b - a) * t
    }
}

/// Geometry value of an animated rectangle parameter
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Parse the engine's space-separated `"x y w h"` form. Extra trailing
    /// fields (such as opacity) are ignored.
    pub fn parse(input: &str) -> Result<Self> {
        Self::parse_in_frame(input, None)
    }

    /// Like [`Rect::parse`], resolving `%width` / `%height` placeholders
    /// against the given frame size
    pub fn parse_in_frame(input: &str, frame: Option<(u32, u32)>) -> Result<Self> {
        let malformed = |reason: &str| KeyframeError::Malformed {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let fields: Vec<&str> = input.split_whitespace().collect();
        if fields.len() < 4 {
            return Err(malformed("rectangle needs four fields").into());
        }

        let mut values = [0.0; 4];
        for (slot, field) in values.iter_mut().zip(&fields) {
            *slot = match (*field, frame) {
                ("%width", Some((w, _))) => f64::from(w),
                ("%height", Some((_, h))) => f64::from(h),
                _ => field
                    .parse::<f64>()
                    .map_err(|_| malformed("rectangle field is not a number"))?,
            };
        }

        Ok(Self::new(values[0], values[1], values[2], values[3]))
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.x, self.y, self.w, self.h)
    }
}

impl Lerp for Rect {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Self {
            x: f64::lerp(&a.x, &b.x, t),
            y: f64::lerp(&a.y, &b.y, t),
            w: f64::lerp(&a.w, &b.w, t),
            h: f64::lerp(&a.h, &b.h, t),
        }
    }
}

/// Shape of the values a parameter accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Scalar,
    Rect,
}

impl ValueKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::Rect => "rect",
        }
    }

    /// Parse one keyframe value of this kind
    pub fn parse_value(&self, input: &str) -> Result<ParamValue> {
        match self {
            Self::Scalar => input
                .trim()
                .parse::<f64>()
                .map(ParamValue::Scalar)
                .map_err(|_| {
                    KeyframeError::Malformed {
                        input: input.to_string(),
                        reason: "not a number".to_string(),
                    }
                    .into()
                }),
            Self::Rect => Rect::parse(input).map(ParamValue::Rect),
        }
    }
}

/// A keyframe sample value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Scalar(f64),
    Rect(Rect),
}

impl ParamValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Scalar(_) => ValueKind::Scalar,
            Self::Rect(_) => ValueKind::Rect,
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar(v) => Some(*v),
            Self::Rect(_) => None,
        }
    }

    pub fn as_rect(&self) -> Option<Rect> {
        match self {
            Self::Rect(r) => Some(*r),
            Self::Scalar(_) => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(v) => write!(f, "{}", v),
            Self::Rect(r) => write!(f, "{}", r),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Scalar(value)
    }
}

impl From<Rect> for ParamValue {
    fn from(value: Rect) -> Self {
        ParamValue::Rect(value)
    }
}

impl Lerp for ParamValue {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        match (a, b) {
            (Self::Scalar(a), Self::Scalar(b)) => Self::Scalar(f64::lerp(a, b, t)),
            (Self::Rect(a), Self::Rect(b)) => Self::Rect(Rect::lerp(a, b, t)),
            // Series are kind-checked on insert; hold the left sample otherwise
            _ => *a,
        }
    }
}
