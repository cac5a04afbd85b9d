//! Lossless entities making up a statement: text runs, comments, and
//! continuation markers. Each knows how to render its own verbatim bytes so
//! that concatenating a tree's pieces in order reproduces the input exactly.

use serde::{Deserialize, Serialize};

/// A run of non-marker characters, optionally wrapped in a quote marker.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Text {
    /// The quote marker surrounding `body`, or empty if unquoted.
    pub quote_style: String,
    pub body: String,
    /// Spaces/tabs captured after this run, before the next piece.
    pub trailing_spaces: String,
}

impl Text {
    pub fn verbatim_text(&self) -> String {
        format!(
            "{}{}{}{}",
            self.quote_style, self.body, self.quote_style, self.trailing_spaces
        )
    }
}

/// The two markers that open and close a comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentStyle {
    pub opening: String,
    pub closing: String,
}

/// A comment run. `closed` is false when input ended before the closing
/// marker was seen; the closing marker is then omitted on render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    pub style: CommentStyle,
    pub closed: bool,
    pub content: String,
}

impl Comment {
    pub fn new(style: CommentStyle) -> Self {
        Self {
            style,
            closed: false,
            content: String::new(),
        }
    }

    pub fn verbatim_text(&self) -> String {
        if self.closed {
            format!("{}{}{}", self.style.opening, self.content, self.style.closing)
        } else {
            format!("{}{}", self.style.opening, self.content)
        }
    }
}

/// A recognized statement-continuation marker, preserved as its own piece so
/// rendering reproduces it verbatim (e.g. a trailing `\` before a newline).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementContinue {
    pub marker: String,
}

impl StatementContinue {
    pub fn verbatim_text(&self) -> String {
        self.marker.clone()
    }
}

/// One element of a statement's piece list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Piece {
    Text(Text),
    Comment(Comment),
    Continue(StatementContinue),
}

impl Piece {
    pub fn verbatim_text(&self) -> String {
        match self {
            Piece::Text(t) => t.verbatim_text(),
            Piece::Comment(c) => c.verbatim_text(),
            Piece::Continue(c) => c.verbatim_text(),
        }
    }

}

/// The smallest line-like syntactic unit: leading indentation, an ordered
/// list of pieces, and the marker that ended it (empty at end of input).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Statement {
    pub indent: String,
    pub pieces: Vec<Piece>,
    pub ending: String,
}

impl Statement {
    pub fn verbatim_text(&self) -> String {
        let mut out = self.indent.clone();
        for piece in &self.pieces {
            out.push_str(&piece.verbatim_text());
        }
        out.push_str(&self.ending);
        out
    }
}

/// A named container bounded by up to four markers. See the section state
/// machine for how the marker slots get filled in.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Section {
    pub first_statement: Option<Statement>,
    pub opening_prefix: String,
    pub opening_suffix: String,
    pub closing_prefix: String,
    pub closing_suffix: String,
    pub final_statement: Option<Statement>,

    pub statement_counter_at_opening: u32,
    pub missing_opening_statement: bool,
    pub statement_counter_at_closing: u32,
    pub missing_closing_statement: bool,
}

/// What a document node holds: nothing (the root, or an empty placeholder
/// left over from tree-building), a statement, or a section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Entity {
    Statement(Statement),
    Section(Section),
}

impl Entity {
    pub fn as_statement(&self) -> Option<&Statement> {
        match self {
            Entity::Statement(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_statement_mut(&mut self) -> Option<&mut Statement> {
        match self {
            Entity::Statement(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_section(&self) -> Option<&Section> {
        match self {
            Entity::Section(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_section_mut(&mut self) -> Option<&mut Section> {
        match self {
            Entity::Section(s) => Some(s),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_verbatim_unquoted() {
        let t = Text {
            quote_style: String::new(),
            body: "hello".into(),
            trailing_spaces: "  ".into(),
        };
        assert_eq!(t.verbatim_text(), "hello  ");
    }

    #[test]
    fn text_verbatim_quoted() {
        let t = Text {
            quote_style: "\"".into(),
            body: "hello world".into(),
            trailing_spaces: "".into(),
        };
        assert_eq!(t.verbatim_text(), "\"hello world\"");
    }

    #[test]
    fn comment_verbatim_closed_vs_open() {
        let style = CommentStyle {
            opening: "#".into(),
            closing: "\n".into(),
        };
        let mut c = Comment::new(style);
        c.content = "note".into();
        assert_eq!(c.verbatim_text(), "#note");
        c.closed = true;
        assert_eq!(c.verbatim_text(), "#note\n");
    }

    #[test]
    fn statement_verbatim_round_trip() {
        let stmt = Statement {
            indent: "  ".into(),
            pieces: vec![
                Piece::Text(Text {
                    quote_style: String::new(),
                    body: "k".into(),
                    trailing_spaces: String::new(),
                }),
                Piece::Text(Text {
                    quote_style: String::new(),
                    body: "=".into(),
                    trailing_spaces: String::new(),
                }),
                Piece::Text(Text {
                    quote_style: String::new(),
                    body: "v".into(),
                    trailing_spaces: String::new(),
                }),
            ],
            ending: "\n".into(),
        };
        assert_eq!(stmt.verbatim_text(), "  k=v\n");
    }
}
