//! Responsive grid placement.
//!
//! A [`Layout`] positions a section or field on a 12-column grid. Each group
//! (`colStart`, `colSpan`, `rowStart`, `rowSpan` and the optional `cols`)
//! carries one value per [`Breakpoint`]; `sm` is mandatory, the other
//! breakpoints are optional. Every populated value must lie in `1..=12`.
//!
//! # Example
//!
//! ```
//! use product_schema_core::{Breakpoints, Layout, LayoutPatch, LayoutProps};
//!
//! let mut layout = Layout::create(LayoutProps {
//!     cols: None,
//!     col_start: Breakpoints::sm(1),
//!     col_span: Breakpoints::sm(6).with_md(4),
//!     row_start: Breakpoints::sm(1),
//!     row_span: Breakpoints::sm(1),
//! })
//! .unwrap();
//!
//! layout
//!     .modify(LayoutPatch {
//!         col_span: Some(Breakpoints::sm(12)),
//!         ..Default::default()
//!     })
//!     .unwrap();
//! assert_eq!(layout.col_span().sm, Some(12));
//! assert_eq!(layout.col_start().sm, Some(1));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Smallest permitted grid value.
pub const GRID_MIN: i32 = 1;
/// Largest permitted grid value.
pub const GRID_MAX: i32 = 12;

/// Responsive breakpoint names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Breakpoint {
    Xs,
    Sm,
    Md,
    Lg,
    Xl,
}

impl Breakpoint {
    /// All breakpoints from smallest to largest.
    pub const ALL: [Breakpoint; 5] = [
        Breakpoint::Xs,
        Breakpoint::Sm,
        Breakpoint::Md,
        Breakpoint::Lg,
        Breakpoint::Xl,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Breakpoint::Xs => "xs",
            Breakpoint::Sm => "sm",
            Breakpoint::Md => "md",
            Breakpoint::Lg => "lg",
            Breakpoint::Xl => "xl",
        }
    }
}

impl fmt::Display for Breakpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Names the layout group a validation failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutGroup {
    Cols,
    ColStart,
    ColSpan,
    RowStart,
    RowSpan,
}

impl LayoutGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutGroup::Cols => "cols",
            LayoutGroup::ColStart => "colStart",
            LayoutGroup::ColSpan => "colSpan",
            LayoutGroup::RowStart => "rowStart",
            LayoutGroup::RowSpan => "rowSpan",
        }
    }
}

impl fmt::Display for LayoutGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One grid value per breakpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakpoints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xs: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sm: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub md: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lg: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xl: Option<i32>,
}

impl Breakpoints {
    /// Creates a group with only the mandatory `sm` value.
    pub fn sm(value: i32) -> Self {
        Self {
            sm: Some(value),
            ..Default::default()
        }
    }

    pub fn with_xs(mut self, value: i32) -> Self {
        self.xs = Some(value);
        self
    }

    pub fn with_md(mut self, value: i32) -> Self {
        self.md = Some(value);
        self
    }

    pub fn with_lg(mut self, value: i32) -> Self {
        self.lg = Some(value);
        self
    }

    pub fn with_xl(mut self, value: i32) -> Self {
        self.xl = Some(value);
        self
    }

    /// Returns the value at `breakpoint`, if populated.
    pub fn get(&self, breakpoint: Breakpoint) -> Option<i32> {
        match breakpoint {
            Breakpoint::Xs => self.xs,
            Breakpoint::Sm => self.sm,
            Breakpoint::Md => self.md,
            Breakpoint::Lg => self.lg,
            Breakpoint::Xl => self.xl,
        }
    }

    /// Iterates over populated breakpoints in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (Breakpoint, i32)> + '_ {
        Breakpoint::ALL
            .into_iter()
            .filter_map(|bp| self.get(bp).map(|value| (bp, value)))
    }

    fn validate(&self, group: LayoutGroup) -> Result<(), ValidationError> {
        if self.sm.is_none() {
            return Err(ValidationError::MissingSmallBreakpoint { group });
        }
        for (breakpoint, value) in self.iter() {
            if !(GRID_MIN..=GRID_MAX).contains(&value) {
                return Err(ValidationError::InvalidBreakpointValue {
                    group,
                    breakpoint,
                    value,
                });
            }
        }
        Ok(())
    }
}

/// Unvalidated input for [`Layout::create`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cols: Option<Breakpoints>,
    pub col_start: Breakpoints,
    pub col_span: Breakpoints,
    pub row_start: Breakpoints,
    pub row_span: Breakpoints,
}

/// Partial layout for [`Layout::modify`]. Omitted groups stay untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutPatch {
    #[serde(default)]
    pub cols: Option<Breakpoints>,
    #[serde(default)]
    pub col_start: Option<Breakpoints>,
    #[serde(default)]
    pub col_span: Option<Breakpoints>,
    #[serde(default)]
    pub row_start: Option<Breakpoints>,
    #[serde(default)]
    pub row_span: Option<Breakpoints>,
}

impl LayoutPatch {
    fn validate(&self) -> Result<(), ValidationError> {
        let groups = [
            (LayoutGroup::Cols, &self.cols),
            (LayoutGroup::ColStart, &self.col_start),
            (LayoutGroup::ColSpan, &self.col_span),
            (LayoutGroup::RowStart, &self.row_start),
            (LayoutGroup::RowSpan, &self.row_span),
        ];
        for (group, values) in groups {
            if let Some(values) = values {
                values.validate(group)?;
            }
        }
        Ok(())
    }
}

/// Validated grid placement.
///
/// Deserializing a `Layout` runs the same validation as [`Layout::create`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LayoutProps", into = "LayoutProps")]
pub struct Layout {
    cols: Option<Breakpoints>,
    col_start: Breakpoints,
    col_span: Breakpoints,
    row_start: Breakpoints,
    row_span: Breakpoints,
}

impl Layout {
    /// Validates `props` and builds a layout from them.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming the first offending group.
    pub fn create(props: LayoutProps) -> Result<Self, ValidationError> {
        Self::validate(&props)?;
        Ok(Self {
            cols: props.cols,
            col_start: props.col_start,
            col_span: props.col_span,
            row_start: props.row_start,
            row_span: props.row_span,
        })
    }

    /// Checks every group of `props` without building a layout.
    pub fn validate(props: &LayoutProps) -> Result<(), ValidationError> {
        if let Some(cols) = &props.cols {
            cols.validate(LayoutGroup::Cols)?;
        }
        props.col_start.validate(LayoutGroup::ColStart)?;
        props.col_span.validate(LayoutGroup::ColSpan)?;
        props.row_start.validate(LayoutGroup::RowStart)?;
        props.row_span.validate(LayoutGroup::RowSpan)?;
        Ok(())
    }

    /// A single-row placement spanning the full grid width.
    pub fn full_width() -> Self {
        Self {
            cols: None,
            col_start: Breakpoints::sm(1),
            col_span: Breakpoints::sm(GRID_MAX),
            row_start: Breakpoints::sm(1),
            row_span: Breakpoints::sm(1),
        }
    }

    /// Overlays the groups present in `patch`.
    ///
    /// The whole patch is validated first; on error nothing is changed.
    pub fn modify(&mut self, patch: LayoutPatch) -> Result<(), ValidationError> {
        patch.validate()?;
        if let Some(cols) = patch.cols {
            self.cols = Some(cols);
        }
        if let Some(col_start) = patch.col_start {
            self.col_start = col_start;
        }
        if let Some(col_span) = patch.col_span {
            self.col_span = col_span;
        }
        if let Some(row_start) = patch.row_start {
            self.row_start = row_start;
        }
        if let Some(row_span) = patch.row_span {
            self.row_span = row_span;
        }
        Ok(())
    }

    pub fn cols(&self) -> Option<&Breakpoints> {
        self.cols.as_ref()
    }

    pub fn col_start(&self) -> &Breakpoints {
        &self.col_start
    }

    pub fn col_span(&self) -> &Breakpoints {
        &self.col_span
    }

    pub fn row_start(&self) -> &Breakpoints {
        &self.row_start
    }

    pub fn row_span(&self) -> &Breakpoints {
        &self.row_span
    }
}

impl TryFrom<LayoutProps> for Layout {
    type Error = ValidationError;

    fn try_from(props: LayoutProps) -> Result<Self, Self::Error> {
        Layout::create(props)
    }
}

impl From<Layout> for LayoutProps {
    fn from(layout: Layout) -> Self {
        Self {
            cols: layout.cols,
            col_start: layout.col_start,
            col_span: layout.col_span,
            row_start: layout.row_start,
            row_span: layout.row_span,
        }
    }
}
