#![forbid(unsafe_code)]

//! Placement vocabulary: sides, alignments, the 12 named placements, and the
//! CSS positioning strategy.
//!
//! Names follow the CSS-facing kebab-case form (`bottom`, `top-start`, ...)
//! both for [`Display`](std::fmt::Display)/[`FromStr`] and for serde.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Side of the reference element the floating element sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

/// Layout axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
}

impl Side {
    /// The side facing this one.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Top => Self::Bottom,
            Self::Right => Self::Left,
            Self::Bottom => Self::Top,
            Self::Left => Self::Right,
        }
    }

    /// Main axis: the axis along which the floating element is displaced
    /// away from the reference.
    #[must_use]
    pub const fn axis(self) -> Axis {
        match self {
            Self::Top | Self::Bottom => Axis::Y,
            Self::Left | Self::Right => Axis::X,
        }
    }

    /// CSS property name for this side.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Right => "right",
            Self::Bottom => "bottom",
            Self::Left => "left",
        }
    }
}

/// Alignment along the cross axis. A placement without alignment is centered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alignment {
    Start,
    End,
}

/// Desired side and alignment of the floating element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Placement {
    Top,
    TopStart,
    TopEnd,
    Right,
    RightStart,
    RightEnd,
    #[default]
    Bottom,
    BottomStart,
    BottomEnd,
    Left,
    LeftStart,
    LeftEnd,
}

impl Placement {
    /// All placements in declaration order.
    pub const ALL: [Self; 12] = [
        Self::Top,
        Self::TopStart,
        Self::TopEnd,
        Self::Right,
        Self::RightStart,
        Self::RightEnd,
        Self::Bottom,
        Self::BottomStart,
        Self::BottomEnd,
        Self::Left,
        Self::LeftStart,
        Self::LeftEnd,
    ];

    /// Compose a placement from its parts.
    #[must_use]
    pub const fn from_parts(side: Side, alignment: Option<Alignment>) -> Self {
        match (side, alignment) {
            (Side::Top, None) => Self::Top,
            (Side::Top, Some(Alignment::Start)) => Self::TopStart,
            (Side::Top, Some(Alignment::End)) => Self::TopEnd,
            (Side::Right, None) => Self::Right,
            (Side::Right, Some(Alignment::Start)) => Self::RightStart,
            (Side::Right, Some(Alignment::End)) => Self::RightEnd,
            (Side::Bottom, None) => Self::Bottom,
            (Side::Bottom, Some(Alignment::Start)) => Self::BottomStart,
            (Side::Bottom, Some(Alignment::End)) => Self::BottomEnd,
            (Side::Left, None) => Self::Left,
            (Side::Left, Some(Alignment::Start)) => Self::LeftStart,
            (Side::Left, Some(Alignment::End)) => Self::LeftEnd,
        }
    }

    #[must_use]
    pub const fn side(self) -> Side {
        match self {
            Self::Top | Self::TopStart | Self::TopEnd => Side::Top,
            Self::Right | Self::RightStart | Self::RightEnd => Side::Right,
            Self::Bottom | Self::BottomStart | Self::BottomEnd => Side::Bottom,
            Self::Left | Self::LeftStart | Self::LeftEnd => Side::Left,
        }
    }

    #[must_use]
    pub const fn alignment(self) -> Option<Alignment> {
        match self {
            Self::Top | Self::Right | Self::Bottom | Self::Left => None,
            Self::TopStart | Self::RightStart | Self::BottomStart | Self::LeftStart => {
                Some(Alignment::Start)
            }
            Self::TopEnd | Self::RightEnd | Self::BottomEnd | Self::LeftEnd => {
                Some(Alignment::End)
            }
        }
    }

    /// Same alignment on the opposite side.
    #[must_use]
    pub const fn flipped(self) -> Self {
        Self::from_parts(self.side().opposite(), self.alignment())
    }

    /// CSS `transform-origin` that keeps enter/exit animations anchored to
    /// the edge facing the reference element.
    #[must_use]
    pub const fn transform_origin(self) -> &'static str {
        match self {
            Self::Top => "bottom center",
            Self::TopStart => "bottom left",
            Self::TopEnd => "bottom right",
            Self::Right => "left center",
            Self::RightStart => "left top",
            Self::RightEnd => "left bottom",
            Self::Bottom => "top center",
            Self::BottomStart => "top left",
            Self::BottomEnd => "top right",
            Self::Left => "right center",
            Self::LeftStart => "right top",
            Self::LeftEnd => "right bottom",
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::TopStart => "top-start",
            Self::TopEnd => "top-end",
            Self::Right => "right",
            Self::RightStart => "right-start",
            Self::RightEnd => "right-end",
            Self::Bottom => "bottom",
            Self::BottomStart => "bottom-start",
            Self::BottomEnd => "bottom-end",
            Self::Left => "left",
            Self::LeftStart => "left-start",
            Self::LeftEnd => "left-end",
        }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown placement name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown placement: {input:?}")]
pub struct ParsePlacementError {
    pub input: String,
}

impl FromStr for Placement {
    type Err = ParsePlacementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParsePlacementError {
                input: s.to_string(),
            })
    }
}

/// CSS positioning mode of the floating element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[default]
    Absolute,
    Fixed,
}

impl Strategy {
    /// Value for the CSS `position` property.
    #[must_use]
    pub const fn as_css(self) -> &'static str {
        match self {
            Self::Absolute => "absolute",
            Self::Fixed => "fixed",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_css())
    }
}
