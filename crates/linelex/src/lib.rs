//! A configurable, lossless lexer for line-oriented configuration file
//! formats -- systemd units, httpd/named/dhcpd stanzas, sysctl/postfix/cron
//! flat files, and anything else built from statements, comments, and
//! optionally nested sections.
//!
//! [`LexerConfig`] describes one format's alphabet of markers; [`scanner::run`]
//! turns an input string plus a config into a [`tree::Tree`] whose nodes'
//! [`tree::Tree::verbatim_text`], concatenated in order, reproduce the input
//! exactly. [`presets`] ships configs for common real-world formats.

pub mod config;
pub mod cursor;
pub mod debug;
pub mod entity;
pub mod presets;
mod scanner;
pub mod tree;

pub use config::{ConfigError, LexerConfig, SectionMatchMechanism, SectionStyle};
pub use debug::{DebugSink, NoopDebugSink, StdoutDebugSink};
pub use entity::{Comment, CommentStyle, Entity, Piece, Section, Statement, StatementContinue, Text};
pub use linelex_common::Span;
pub use scanner::run;
pub use tree::{Node, NodeId, Tree};
