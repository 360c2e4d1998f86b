#![forbid(unsafe_code)]

//! Inline style maps and the static style builders for floating elements
//! and their arrows.
//!
//! Builders are pure: they map their inputs field-for-field onto CSS
//! properties. Custom properties (`--arrow-size`, ...) are plain entries.

use std::collections::BTreeMap;

use crate::placement::Strategy;

/// Ordered property → value map of inline style declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleMap {
    props: BTreeMap<String, String>,
}

impl StyleMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from static property pairs.
    #[must_use]
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        let mut map = Self::new();
        for (name, value) in pairs {
            map.set(*name, *value);
        }
        map
    }

    /// Set a property, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.props.insert(name.into(), value.into());
        self
    }

    /// Builder form of [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.props.get(name).map(String::as_str)
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.props.remove(name)
    }

    /// Overlay `other` on top of this map.
    pub fn extend(&mut self, other: &Self) {
        for (name, value) in &other.props {
            self.props.insert(name.clone(), value.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.props.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    /// Serialize as a `style` attribute value (`a: b; c: d`).
    #[must_use]
    pub fn to_css(&self) -> String {
        self.iter()
            .map(|(name, value)| format!("{name}: {value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Format a length in CSS pixels.
#[must_use]
pub fn px(value: f64) -> String {
    format!("{value}px")
}

/// Style of the rotated square drawn inside the arrow container.
pub const INNER_ARROW_STYLE: &[(&str, &str)] = &[
    ("background", "var(--arrow-background)"),
    ("height", "100%"),
    ("left", "0px"),
    ("position", "absolute"),
    ("top", "0px"),
    ("transform", "rotate(45deg)"),
    ("width", "100%"),
    ("z-index", "inherit"),
];

/// Style of a floating element before its first measurement: parked above
/// the viewport so layout can size it without a visible flash.
pub const UNMEASURED_FLOATING_STYLE: &[(&str, &str)] = &[
    ("left", "0px"),
    ("min-width", "max-content"),
    ("position", "absolute"),
    ("top", "0px"),
    ("transform", "translate3d(0, -100vh, 0)"),
];

/// Inputs of [`build_arrow_style`].
#[derive(Debug, Clone, PartialEq)]
pub struct ArrowStyle {
    /// Edge length of the arrow square, in px.
    pub size: f64,
    pub background: String,
    pub shadow_color: String,
}

impl Default for ArrowStyle {
    fn default() -> Self {
        Self {
            size: 8.0,
            background: "inherit".to_string(),
            shadow_color: "transparent".to_string(),
        }
    }
}

/// Style of the arrow container.
#[must_use]
pub fn build_arrow_style(arrow: &ArrowStyle) -> StyleMap {
    let half = arrow.size / 2.0;
    StyleMap::new()
        .with("position", "absolute")
        .with("width", "var(--arrow-size)")
        .with("height", "var(--arrow-size)")
        .with("--arrow-size", px(arrow.size))
        .with("--arrow-size-half", px(half))
        .with("--arrow-offset", px(-half))
        .with("--arrow-background", arrow.background.as_str())
        .with("--arrow-shadow-color", arrow.shadow_color.as_str())
}

/// Style of the floating element itself.
///
/// Until `measured` is set the element is parked off-screen; afterwards the
/// positioner's `left`/`top` assignments take effect untransformed. Both
/// forms use `strategy` for `position`.
#[must_use]
pub fn build_floating_style(measured: bool, strategy: Strategy) -> StyleMap {
    let mut style = if measured {
        StyleMap::new()
            .with("min-width", "max-content")
            .with("top", "0px")
            .with("left", "0px")
            .with("transform", "none")
    } else {
        StyleMap::from_pairs(UNMEASURED_FLOATING_STYLE)
    };
    style.set("position", strategy.as_css());
    style
}
