#![forbid(unsafe_code)]

//! The ordered middleware sequence handed to the geometry solver.
//!
//! The sequence is a plain ordered collection assembled by conditional
//! appends. Solver-side steps (flip, offset, shift, arrow) are opaque
//! requests; the remaining steps (transform origin, arrow position, same
//! width) are applied by the session to the resolved position, in sequence
//! order.
//!
//! # Order
//!
//! | # | Step | Included when |
//! |---|------|---------------|
//! | 1 | transform origin | always |
//! | 2 | flip | `flip` |
//! | 3 | offset | non-zero `gutter`, else `offset` set |
//! | 4 | shift | always |
//! | 5 | arrow, arrow position | arrow element configured |
//! | 6 | same width | `same_width` |

use std::fmt;
use std::rc::Rc;

use perch_core::Element;

use crate::options::{Boundary, DEFAULT_ARROW_PADDING, FLIP_PADDING, Offset, PositioningOptions};

/// One positioning step.
#[derive(Clone)]
pub enum Middleware {
    /// Record the CSS transform origin matching the resolved placement.
    TransformOrigin,
    /// Move to the opposite side when the preferred side overflows.
    Flip { boundary: Boundary, padding: f64 },
    /// Displace along/perpendicular to the placement axis.
    Offset(Offset),
    /// Slide along the cross axis to stay inside the boundary.
    Shift {
        boundary: Boundary,
        padding: Option<f64>,
    },
    /// Compute the arrow's offset within the floating element.
    Arrow {
        element: Rc<dyn Element>,
        padding: f64,
    },
    /// Write the computed arrow offset onto the arrow element.
    ArrowPosition,
    /// Match the floating element's width to the reference element.
    SameWidth,
}

/// Discriminant of [`Middleware`], for ordering checks and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MiddlewareKind {
    TransformOrigin,
    Flip,
    Offset,
    Shift,
    Arrow,
    ArrowPosition,
    SameWidth,
}

impl MiddlewareKind {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::TransformOrigin => "transformOrigin",
            Self::Flip => "flip",
            Self::Offset => "offset",
            Self::Shift => "shift",
            Self::Arrow => "arrow",
            Self::ArrowPosition => "arrowPosition",
            Self::SameWidth => "sameWidth",
        }
    }
}

impl Middleware {
    #[must_use]
    pub const fn kind(&self) -> MiddlewareKind {
        match self {
            Self::TransformOrigin => MiddlewareKind::TransformOrigin,
            Self::Flip { .. } => MiddlewareKind::Flip,
            Self::Offset(_) => MiddlewareKind::Offset,
            Self::Shift { .. } => MiddlewareKind::Shift,
            Self::Arrow { .. } => MiddlewareKind::Arrow,
            Self::ArrowPosition => MiddlewareKind::ArrowPosition,
            Self::SameWidth => MiddlewareKind::SameWidth,
        }
    }
}

impl fmt::Debug for Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TransformOrigin => f.write_str("TransformOrigin"),
            Self::Flip { boundary, padding } => f
                .debug_struct("Flip")
                .field("boundary", boundary)
                .field("padding", padding)
                .finish(),
            Self::Offset(offset) => f.debug_tuple("Offset").field(offset).finish(),
            Self::Shift { boundary, padding } => f
                .debug_struct("Shift")
                .field("boundary", boundary)
                .field("padding", padding)
                .finish(),
            Self::Arrow { padding, .. } => f
                .debug_struct("Arrow")
                .field("padding", padding)
                .finish_non_exhaustive(),
            Self::ArrowPosition => f.write_str("ArrowPosition"),
            Self::SameWidth => f.write_str("SameWidth"),
        }
    }
}

impl PartialEq for Middleware {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::Flip {
                    boundary: b1,
                    padding: p1,
                },
                Self::Flip {
                    boundary: b2,
                    padding: p2,
                },
            ) => b1 == b2 && p1 == p2,
            (Self::Offset(a), Self::Offset(b)) => a == b,
            (
                Self::Shift {
                    boundary: b1,
                    padding: p1,
                },
                Self::Shift {
                    boundary: b2,
                    padding: p2,
                },
            ) => b1 == b2 && p1 == p2,
            (
                Self::Arrow {
                    element: e1,
                    padding: p1,
                },
                Self::Arrow {
                    element: e2,
                    padding: p2,
                },
            ) => Rc::ptr_eq(e1, e2) && p1 == p2,
            (a, b) => a.kind() == b.kind() && a.is_unit(),
        }
    }
}

impl Middleware {
    const fn is_unit(&self) -> bool {
        matches!(
            self,
            Self::TransformOrigin | Self::ArrowPosition | Self::SameWidth
        )
    }
}

/// Assemble the middleware sequence for `options`.
#[must_use]
pub fn build_middleware(options: &PositioningOptions) -> Vec<Middleware> {
    let mut middleware = vec![Middleware::TransformOrigin];

    if options.flip {
        middleware.push(Middleware::Flip {
            boundary: options.boundary.clone(),
            padding: FLIP_PADDING,
        });
    }

    if let Some(offset) = options.effective_offset() {
        middleware.push(Middleware::Offset(offset));
    }

    middleware.push(Middleware::Shift {
        boundary: options.boundary.clone(),
        padding: options.shift_padding,
    });

    if let Some(arrow) = &options.arrow {
        middleware.push(Middleware::Arrow {
            element: Rc::clone(&arrow.element),
            padding: arrow.padding.unwrap_or(DEFAULT_ARROW_PADDING),
        });
        middleware.push(Middleware::ArrowPosition);
    }

    if options.same_width {
        middleware.push(Middleware::SameWidth);
    }

    middleware
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ArrowOptions;
    use perch_core::Rect;
    use pretty_assertions::assert_eq;

    struct Inert;

    impl Element for Inert {
        fn bounding_rect(&self) -> Rect {
            Rect::default()
        }

        fn set_style_property(&self, _name: &str, _value: &str) {}

        fn style_property(&self, _name: &str) -> Option<String> {
            None
        }
    }

    fn kinds(options: &PositioningOptions) -> Vec<MiddlewareKind> {
        build_middleware(options).iter().map(Middleware::kind).collect()
    }

    #[test]
    fn default_sequence() {
        assert_eq!(
            kinds(&PositioningOptions::default()),
            vec![
                MiddlewareKind::TransformOrigin,
                MiddlewareKind::Flip,
                MiddlewareKind::Offset,
                MiddlewareKind::Shift,
            ]
        );
    }

    #[test]
    fn flip_gets_boundary_and_fixed_padding() {
        let sequence = build_middleware(&PositioningOptions::default());
        assert_eq!(
            sequence[1],
            Middleware::Flip {
                boundary: Boundary::ClippingAncestors,
                padding: 8.0
            }
        );
    }

    #[test]
    fn gutter_becomes_main_axis_offset() {
        let sequence = build_middleware(&PositioningOptions::new().gutter(Some(12.0)));
        let offset = sequence
            .iter()
            .find_map(|m| match m {
                Middleware::Offset(offset) => Some(*offset),
                _ => None,
            })
            .expect("offset middleware");
        assert_eq!(offset.main_axis, Some(12.0));
        assert_eq!(offset.cross_axis, None);
    }

    #[test]
    fn explicit_offset_passes_verbatim() {
        let sequence = build_middleware(
            &PositioningOptions::new()
                .gutter(None)
                .offset(Some(Offset::new(4.0, 2.0))),
        );
        assert!(sequence.contains(&Middleware::Offset(Offset::new(4.0, 2.0))));
    }

    #[test]
    fn no_gutter_no_offset_omits_offset() {
        let options = PositioningOptions::new().gutter(None);
        assert!(!kinds(&options).contains(&MiddlewareKind::Offset));
    }

    #[test]
    fn disabled_flip_is_omitted_even_with_explicit_boundary() {
        let boundary: Rc<dyn Element> = Rc::new(Inert);
        let options = PositioningOptions::new()
            .flip(false)
            .boundary(Boundary::Elements(vec![boundary]));
        let sequence = build_middleware(&options);
        assert!(!sequence.iter().any(|m| m.kind() == MiddlewareKind::Flip));
        assert!(matches!(
            &sequence[2],
            Middleware::Shift { boundary: Boundary::Elements(els), .. } if els.len() == 1
        ));
    }

    #[test]
    fn arrow_pair_and_same_width_trail() {
        let arrow: Rc<dyn Element> = Rc::new(Inert);
        let options = PositioningOptions::new()
            .arrow(ArrowOptions::new(Rc::clone(&arrow)))
            .same_width(true);
        let sequence = build_middleware(&options);
        assert_eq!(
            sequence.iter().map(Middleware::kind).collect::<Vec<_>>(),
            vec![
                MiddlewareKind::TransformOrigin,
                MiddlewareKind::Flip,
                MiddlewareKind::Offset,
                MiddlewareKind::Shift,
                MiddlewareKind::Arrow,
                MiddlewareKind::ArrowPosition,
                MiddlewareKind::SameWidth,
            ]
        );
        assert_eq!(
            sequence[4],
            Middleware::Arrow {
                element: arrow,
                padding: 8.0
            }
        );
    }

    #[test]
    fn arrow_padding_override() {
        let arrow: Rc<dyn Element> = Rc::new(Inert);
        let options = PositioningOptions::new().arrow(ArrowOptions::new(arrow).padding(3.0));
        let padding = build_middleware(&options).iter().find_map(|m| match m {
            Middleware::Arrow { padding, .. } => Some(*padding),
            _ => None,
        });
        assert_eq!(padding, Some(3.0));
    }

    #[test]
    fn shift_padding_is_forwarded() {
        let sequence = build_middleware(&PositioningOptions::new().shift_padding(5.0));
        assert!(sequence.contains(&Middleware::Shift {
            boundary: Boundary::ClippingAncestors,
            padding: Some(5.0)
        }));
    }

    #[test]
    fn unit_variants_compare_by_kind() {
        assert_eq!(Middleware::SameWidth, Middleware::SameWidth);
        assert_ne!(Middleware::SameWidth, Middleware::ArrowPosition);
        assert_ne!(
            Middleware::Offset(Offset::main(1.0)),
            Middleware::Offset(Offset::main(2.0))
        );
    }

    #[test]
    fn kind_names() {
        assert_eq!(MiddlewareKind::SameWidth.name(), "sameWidth");
        assert_eq!(
            format!("{:?}", Middleware::Offset(Offset::main(1.0))),
            "Offset(Offset { main_axis: Some(1.0), cross_axis: None })"
        );
    }
}
