//! The runtime-supplied alphabet of markers that tells the scanner how to
//! read one particular file format.

use std::fmt;

use serde::{Deserialize, Serialize};

pub use crate::entity::CommentStyle;

/// Which of the four section-marker slots are populated determines how
/// section boundaries are recognized. Computed once by
/// [`SectionStyle::resolve`], never reassigned afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectionMatchMechanism {
    /// No section markers configured at all.
    None,
    /// A single marker opens a section, e.g. `==Foobar`.
    FlatSingleAnchor,
    /// Two markers surround a section title; sections do not nest, e.g. `[Foobar]`.
    FlatDoubleAnchor,
    /// Two markers surround a nestable section, e.g. `Foo{bar}`.
    NestedDoubleAnchor,
    /// Four markers surround a nestable section, e.g. `<Foo>bar</Foo>`.
    NestedQuadAnchor,
}

/// Describes how sections are opened and closed. Leave every field at its
/// default if the format has no sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionStyle {
    pub opening_prefix: String,
    pub opening_suffix: String,
    pub closing_prefix: String,
    pub closing_suffix: String,
    pub open_section_with_a_statement: bool,
    pub close_section_with_a_statement: bool,

    /// Derived; see [`SectionStyle::resolve`].
    #[serde(skip_deserializing, default)]
    pub section_match_mechanism: SectionMatchMechanism,
    /// Derived; true when `opening_suffix == closing_suffix` (including the
    /// trivial case where both are empty and no sections are configured at
    /// all -- harmless there since the mechanism is `None` and the flag is
    /// never consulted).
    #[serde(skip_deserializing, default)]
    pub ambiguous_section_suffix: bool,
}

impl Default for SectionMatchMechanism {
    fn default() -> Self {
        SectionMatchMechanism::None
    }
}

impl SectionStyle {
    /// Compute `section_match_mechanism` and `ambiguous_section_suffix` from
    /// the four marker fields. Idempotent; call again after mutating markers.
    pub fn resolve(&mut self) {
        self.section_match_mechanism = if !self.opening_prefix.is_empty()
            && !self.opening_suffix.is_empty()
            && !self.closing_prefix.is_empty()
            && !self.closing_suffix.is_empty()
        {
            SectionMatchMechanism::NestedQuadAnchor
        } else if !self.opening_suffix.is_empty() && !self.closing_suffix.is_empty() {
            SectionMatchMechanism::NestedDoubleAnchor
        } else if !self.opening_prefix.is_empty() && !self.opening_suffix.is_empty() {
            SectionMatchMechanism::FlatDoubleAnchor
        } else if !self.opening_prefix.is_empty() {
            SectionMatchMechanism::FlatSingleAnchor
        } else {
            SectionMatchMechanism::None
        };
        self.ambiguous_section_suffix = self.opening_suffix == self.closing_suffix;
    }
}

/// The complete style description consumed by [`crate::scanner::run`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LexerConfig {
    /// Markers that extend the current statement without ending it, e.g. `\`.
    pub statement_continuation_markers: Vec<String>,
    /// Markers that end the current statement, e.g. `\n`, `;`. List
    /// multi-character markers before the prefixes they contain.
    pub statement_ending_markers: Vec<String>,
    pub comment_styles: Vec<CommentStyle>,
    /// Marker strings recognized as quotes when surrounding a token.
    pub text_quote_style: Vec<String>,
    /// Markers that immediately end the current token, e.g. `=`, `:`.
    pub token_break_markers: Vec<String>,
    pub section_style: SectionStyle,
}

impl LexerConfig {
    /// Resolve the section-match mechanism, then check that every marker
    /// list is internally consistent. Call once before [`crate::scanner::run`];
    /// `run` itself assumes a config that has already passed validation.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        self.section_style.resolve();

        for (role, markers) in [
            (
                "statement_continuation_markers",
                &self.statement_continuation_markers,
            ),
            ("statement_ending_markers", &self.statement_ending_markers),
            ("text_quote_style", &self.text_quote_style),
            ("token_break_markers", &self.token_break_markers),
        ] {
            if markers.iter().any(String::is_empty) {
                return Err(ConfigError::EmptyMarker { role });
            }
        }

        for style in &self.comment_styles {
            if style.opening.is_empty() {
                return Err(ConfigError::EmptyCommentOpening);
            }
        }

        // `resolve` derives the mechanism from these four fields by strict
        // priority, so it is always internally consistent with them -- what's
        // worth flagging is a closing marker that the chosen mechanism will
        // never look at, since the scanner would silently never recognize it.
        use SectionMatchMechanism::*;
        let s = &self.section_style;
        let dead_closing_marker = matches!(
            s.section_match_mechanism,
            None | FlatSingleAnchor | FlatDoubleAnchor
        ) && (!s.closing_prefix.is_empty() || !s.closing_suffix.is_empty());
        if dead_closing_marker {
            return Err(ConfigError::InconsistentSectionStyle {
                detail: format!(
                    "closing_prefix={:?}/closing_suffix={:?} set but mechanism {:?} never matches a section close",
                    s.closing_prefix, s.closing_suffix, s.section_match_mechanism
                ),
            });
        }

        Ok(())
    }
}

/// A malformed [`LexerConfig`] rejected before scanning begins. The scanner
/// itself never fails; see the crate's error-handling notes.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    EmptyMarker { role: &'static str },
    EmptyCommentOpening,
    InconsistentSectionStyle { detail: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyMarker { role } => {
                write!(f, "{role} contains an empty marker string")
            }
            ConfigError::EmptyCommentOpening => {
                write!(f, "a comment style has an empty opening marker")
            }
            ConfigError::InconsistentSectionStyle { detail } => {
                write!(f, "inconsistent section style: {detail}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
