//! The scanner: one left-to-right pass over the input that builds a [`Tree`]
//! by matching, at every position, against a strict priority order of marker
//! classes. Whatever matches nothing falls through as a single character of
//! plain text.
//!
//! Ported from the reference `Lexer`/`Run` implementation this crate's
//! configuration schema was distilled from, carrying over its event names
//! (`endStatement`, `setSectionOpeningSuffix`, ...) as method names here.
//! The one structural departure: that implementation keeps the
//! in-progress statement as a pointer that is simultaneously a document
//! node's payload, so mutating the pointer mutates the tree. This crate has
//! no pointers into itself, so [`Lexer`] instead remembers the `NodeId` the
//! in-progress statement lives at and reaches back into the arena for every
//! mutation.

use crate::config::{LexerConfig, SectionMatchMechanism};
use crate::cursor::Cursor;
use crate::debug::DebugSink;
use crate::entity::{Comment, CommentStyle, Entity, Piece, Section, Statement, StatementContinue, Text};
use crate::tree::{NodeId, Tree};

/// Scan `input` under `config`, calling `debug.println` at each state
/// transition. Deterministic in `(input, config)`; never panics or returns
/// an error on malformed input -- see the crate's error-handling notes.
/// `config` is assumed to have already passed [`LexerConfig::validate`].
pub fn run(input: &str, config: &LexerConfig, debug: &mut dyn DebugSink) -> Tree {
    Lexer::new(input, config, debug).run()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum SectionState {
    BeforeBegin,
    HasBeginPrefix,
    HasBeginSuffix,
    HasEndPrefix,
    EndNow,
}

struct Lexer<'src, 'dbg> {
    input: &'src str,
    config: &'src LexerConfig,
    debug: &'dbg mut dyn DebugSink,
    cursor: Cursor<'src>,
    previous_marker_position: u32,

    tree: Tree,
    this_node: NodeId,
    statement_counter: u32,
    ignore_new_statement_once: bool,

    context_text: Option<Text>,
    context_comment: Option<Comment>,
    context_statement_node: Option<NodeId>,
}

impl<'src, 'dbg> Lexer<'src, 'dbg> {
    fn new(input: &'src str, config: &'src LexerConfig, debug: &'dbg mut dyn DebugSink) -> Self {
        let tree = Tree::new();
        let this_node = tree.root();
        Self {
            input,
            config,
            debug,
            cursor: Cursor::new(input),
            previous_marker_position: 0,
            tree,
            this_node,
            statement_counter: 0,
            ignore_new_statement_once: false,
            context_text: None,
            context_comment: None,
            context_statement_node: None,
        }
    }

    // ---- main loop -----------------------------------------------------

    fn run(mut self) -> Tree {
        while !self.cursor.is_eof() {
            let here = self.cursor.pos();
            let advance = self.step();
            debug_assert!(advance > 0, "every step must make progress");
            self.cursor.set_pos(here + advance.max(1));
        }
        self.end_statement("");

        // Unwind any sections still open at end of input -- each missing
        // its closing markers, which is fine: Section fields simply stay
        // at their defaults for whatever was never seen.
        for _ in 0..100 {
            match self.tree.node(self.this_node).parent {
                Some(p) if p != self.tree.root() => self.end_section(),
                _ => break,
            }
        }

        self.tree
    }

    /// Try every match class in priority order at the cursor; dispatch to
    /// the matching handler and report how many bytes it consumed.
    fn step(&mut self) -> u32 {
        if let Some(adv) = self.try_comment_opening() {
            return adv;
        }
        if let Some(adv) = self.try_comment_closing() {
            return adv;
        }
        if let Some((m, adv)) = self.match_any(&self.config.text_quote_style) {
            self.set_quote(&m);
            self.previous_marker_position = self.cursor.pos() + adv;
            return adv;
        }
        if let Some((spaces, adv)) = self.match_spaces() {
            self.save_spaces(&spaces);
            self.previous_marker_position = self.cursor.pos() + adv;
            return adv;
        }
        if let Some((m, adv)) = self.match_any(&self.config.token_break_markers) {
            self.break_text(&m);
            self.previous_marker_position = self.cursor.pos() + adv;
            return adv;
        }
        if let Some((m, adv)) = self.match_any(&self.config.statement_continuation_markers) {
            self.continue_statement(&m);
            self.previous_marker_position = self.cursor.pos() + adv;
            return adv;
        }
        if let Some((m, adv)) = self.match_any(&self.config.statement_ending_markers) {
            self.end_statement(&m);
            self.previous_marker_position = self.cursor.pos() + adv;
            return adv;
        }
        if let Some((m, adv)) = self.match_one(&self.config.section_style.closing_suffix) {
            self.set_section_closing_suffix(&m);
            self.previous_marker_position = self.cursor.pos() + adv;
            return adv;
        }
        if let Some((m, adv)) = self.match_one(&self.config.section_style.closing_prefix) {
            self.set_section_closing_prefix(&m);
            self.previous_marker_position = self.cursor.pos() + adv;
            return adv;
        }
        if let Some((m, adv)) = self.match_one(&self.config.section_style.opening_suffix) {
            self.set_section_opening_suffix(&m);
            self.previous_marker_position = self.cursor.pos() + adv;
            return adv;
        }
        if let Some((m, adv)) = self.match_one(&self.config.section_style.opening_prefix) {
            self.set_section_opening_prefix(&m);
            self.previous_marker_position = self.cursor.pos() + adv;
            return adv;
        }

        // Fallthrough: one character of plain text, left for the next flush.
        self.cursor
            .peek()
            .map(|c| c.len_utf8() as u32)
            .unwrap_or(1)
    }

    // ---- marker matching -------------------------------------------------

    fn match_any(&self, markers: &[String]) -> Option<(String, u32)> {
        let rest = self.cursor.rest();
        markers
            .iter()
            .find(|m| !m.is_empty() && rest.starts_with(m.as_str()))
            .map(|m| (m.clone(), m.len() as u32))
    }

    fn match_one(&self, marker: &str) -> Option<(String, u32)> {
        if marker.is_empty() || !self.cursor.rest().starts_with(marker) {
            return None;
        }
        Some((marker.to_string(), marker.len() as u32))
    }

    fn match_spaces(&self) -> Option<(String, u32)> {
        let rest = self.cursor.rest();
        let len = rest.bytes().take_while(|&b| b == b' ' || b == b'\t').count();
        if len == 0 {
            None
        } else {
            Some((rest[..len].to_string(), len as u32))
        }
    }

    fn try_comment_opening(&mut self) -> Option<u32> {
        if self.context_comment.is_some() {
            return None;
        }
        let rest = self.cursor.rest();
        let style = self
            .config
            .comment_styles
            .iter()
            .find(|s| !s.opening.is_empty() && rest.starts_with(s.opening.as_str()))?
            .clone();
        let adv = style.opening.len() as u32;
        self.debug.println(&format!("comment opens with {:?}", style.opening));
        self.save_missed_characters();
        self.end_text();
        self.create_comment_if_nil(style);
        self.previous_marker_position = self.cursor.pos() + adv;
        Some(adv)
    }

    fn try_comment_closing(&mut self) -> Option<u32> {
        let closing = self.context_comment.as_ref()?.style.closing.clone();
        if closing.is_empty() || !self.cursor.rest().starts_with(closing.as_str()) {
            return None;
        }
        let adv = closing.len() as u32;
        self.debug.println(&format!("comment closes with {:?}", closing));
        self.end_comment(&closing, true);
        self.previous_marker_position = self.cursor.pos() + adv;
        Some(adv)
    }

    // ---- context accumulators -------------------------------------------

    fn context_statement_mut(&mut self) -> &mut Statement {
        let id = self
            .context_statement_node
            .expect("caller has already ensured a statement is in context");
        self.tree
            .node_mut(id)
            .entity
            .as_mut()
            .expect("context_statement_node always points at a populated node")
            .as_statement_mut()
            .expect("context_statement_node always holds a Statement")
    }

    fn create_text_if_nil(&mut self) {
        if self.context_text.is_none() {
            self.context_text = Some(Text::default());
        }
    }

    fn create_comment_if_nil(&mut self, style: CommentStyle) {
        if self.context_comment.is_none() {
            self.context_comment = Some(Comment::new(style));
        }
    }

    fn create_statement_if_nil(&mut self) {
        if self.context_statement_node.is_none() {
            let node = self
                .tree
                .set_entity_and_sibling(self.this_node, Entity::Statement(Statement::default()));
            self.this_node = node;
            self.context_statement_node = Some(node);
        }
    }

    /// Append the bytes skipped since the last flush into whatever is
    /// currently open (a comment if one is, else the current text run).
    /// Returns whether anything was actually appended.
    fn save_missed_characters(&mut self) -> bool {
        let here = self.cursor.pos();
        if here <= self.previous_marker_position {
            return false;
        }
        let missed = &self.input[self.previous_marker_position as usize..here as usize];
        if let Some(comment) = self.context_comment.as_mut() {
            comment.content.push_str(missed);
        } else {
            self.create_text_if_nil();
            self.context_text.as_mut().unwrap().body.push_str(missed);
        }
        self.previous_marker_position = here;
        true
    }

    fn save_spaces(&mut self, spaces: &str) {
        self.save_missed_characters();

        if self.ignore_new_statement_once {
            self.end_text();
            self.create_text_if_nil();
            self.context_text.as_mut().unwrap().trailing_spaces.push_str(spaces);
            self.end_text();
            return;
        }
        if let Some(comment) = self.context_comment.as_mut() {
            comment.content.push_str(spaces);
            return;
        }
        if let Some(text) = self.context_text.as_mut() {
            text.trailing_spaces.push_str(spaces);
            self.end_text();
            return;
        }
        if let Some(stmt_id) = self.context_statement_node {
            let has_pieces = !self
                .tree
                .node(stmt_id)
                .entity
                .as_ref()
                .unwrap()
                .as_statement()
                .unwrap()
                .pieces
                .is_empty();
            if !has_pieces {
                self.context_statement_mut().indent.push_str(spaces);
                return;
            }
            enum Last {
                Text,
                Continue,
                Comment,
            }
            let last = match self.context_statement_mut().pieces.last().unwrap() {
                Piece::Text(_) => Last::Text,
                Piece::Continue(_) => Last::Continue,
                Piece::Comment(_) => Last::Comment,
            };
            match last {
                Last::Text => {
                    if let Piece::Text(t) = self.context_statement_mut().pieces.last_mut().unwrap() {
                        t.trailing_spaces.push_str(spaces);
                    }
                }
                Last::Continue => {
                    self.create_text_if_nil();
                    self.context_text.as_mut().unwrap().trailing_spaces.push_str(spaces);
                    self.end_text();
                }
                Last::Comment => {
                    let (closed, closing) = match self.context_statement_mut().pieces.last().unwrap() {
                        Piece::Comment(c) => (c.closed, c.style.closing.clone()),
                        _ => unreachable!(),
                    };
                    let ends_statement =
                        closed && self.config.statement_ending_markers.iter().any(|m| m == &closing);
                    if ends_statement {
                        self.end_statement("");
                        self.create_statement_if_nil();
                        self.context_statement_mut().indent.push_str(spaces);
                    } else if let Piece::Comment(c) = self.context_statement_mut().pieces.last_mut().unwrap() {
                        c.content.push_str(spaces);
                    }
                }
            }
            return;
        }
        self.create_statement_if_nil();
        self.context_statement_mut().indent.push_str(spaces);
    }

    fn set_quote(&mut self, quote: &str) {
        if self.context_comment.is_some() {
            self.save_missed_characters();
            self.context_comment.as_mut().unwrap().content.push_str(quote);
            return;
        }
        let need_finalize = self.context_text.is_none() || self.context_text.as_ref().unwrap().quote_style.is_empty();
        if need_finalize && self.save_missed_characters() {
            self.end_text();
        }
        self.create_text_if_nil();
        let current_style = self.context_text.as_ref().unwrap().quote_style.clone();
        if current_style.is_empty() {
            self.context_text.as_mut().unwrap().quote_style = quote.to_string();
        } else if current_style == quote {
            self.end_text();
        } else {
            self.save_missed_characters();
            self.context_text.as_mut().unwrap().body.push_str(quote);
        }
    }

    /// Append to a currently-quoted Text or currently-open Comment without
    /// letting the matched marker be reinterpreted as anything else.
    fn save_quote_or_comment_characters(&mut self, s: &str) -> bool {
        if self.context_comment.is_some() {
            self.save_missed_characters();
            self.context_comment.as_mut().unwrap().content.push_str(s);
            return true;
        }
        if matches!(&self.context_text, Some(t) if !t.quote_style.is_empty()) {
            self.save_missed_characters();
            self.context_text.as_mut().unwrap().body.push_str(s);
            return true;
        }
        false
    }

    fn break_text(&mut self, marker: &str) {
        if self.save_quote_or_comment_characters(marker) {
            return;
        }
        self.save_missed_characters();
        self.end_text();
        self.create_text_if_nil();
        self.context_text.as_mut().unwrap().body = marker.to_string();
        self.end_text();
    }

    fn continue_statement(&mut self, marker: &str) {
        if self.save_quote_or_comment_characters(marker) {
            return;
        }
        self.save_missed_characters();
        self.end_comment("", false);
        self.end_text();
        self.create_statement_if_nil();
        self.context_statement_mut().pieces.push(Piece::Continue(StatementContinue {
            marker: marker.to_string(),
        }));
        self.ignore_new_statement_once = true;
    }

    fn end_text(&mut self) {
        if self.context_text.is_none() {
            return;
        }
        self.save_missed_characters();
        self.create_statement_if_nil();
        let text = self.context_text.take().unwrap();
        self.context_statement_mut().pieces.push(Piece::Text(text));
    }

    fn end_comment(&mut self, marker: &str, closed: bool) {
        if self.context_comment.is_none() {
            return;
        }
        self.context_comment.as_mut().unwrap().closed = closed;
        self.save_missed_characters();
        self.create_statement_if_nil();
        let comment = self.context_comment.take().unwrap();
        self.context_statement_mut().pieces.push(Piece::Comment(comment));

        if !marker.is_empty() && self.config.statement_ending_markers.iter().any(|m| m == marker) {
            if let Piece::Comment(c) = self.context_statement_mut().pieces.last_mut().unwrap() {
                c.closed = false;
            }
            self.end_statement(marker);
        }
    }

    fn end_statement(&mut self, ending: &str) {
        let comment_absorbs_ending = match self.context_comment.as_ref() {
            Some(comment) => !comment.closed && comment.style.closing.as_str() != ending && !ending.is_empty(),
            None => false,
        };
        if comment_absorbs_ending {
            self.save_missed_characters();
            self.context_comment.as_mut().unwrap().content.push_str(ending);
            return;
        }
        if matches!(&self.context_text, Some(t) if !t.quote_style.is_empty()) {
            self.save_missed_characters();
            self.context_text.as_mut().unwrap().body.push_str(ending);
            return;
        }

        self.save_missed_characters();
        self.end_comment("", false);
        self.end_text();

        if self.ignore_new_statement_once {
            self.ignore_new_statement_once = false;
            return;
        }

        if self.context_statement_node.is_none() {
            if !ending.is_empty() {
                self.this_node = self.tree.set_entity_and_sibling(
                    self.this_node,
                    Entity::Statement(Statement {
                        ending: ending.to_string(),
                        ..Default::default()
                    }),
                );
            }
            return;
        }

        self.context_statement_mut().ending = ending.to_string();
        self.context_statement_node = None;
        self.statement_counter += 1;
    }

    // ---- sections ---------------------------------------------------------

    fn current_section_mut(&mut self) -> &mut Section {
        let parent = self.tree.node(self.this_node).parent.expect("inside a section");
        self.tree
            .node_mut(parent)
            .entity
            .as_mut()
            .unwrap()
            .as_section_mut()
            .expect("this_node's parent holds the in-progress section")
    }

    fn section_state(&self) -> (SectionState, Option<NodeId>) {
        let Some(parent) = self.tree.node(self.this_node).parent else {
            return (SectionState::BeforeBegin, None);
        };
        let Some(Entity::Section(section)) = self.tree.node(parent).entity.as_ref() else {
            return (SectionState::BeforeBegin, None);
        };

        let state = match self.config.section_style.section_match_mechanism {
            SectionMatchMechanism::FlatSingleAnchor => {
                if section.opening_prefix.is_empty() {
                    SectionState::BeforeBegin
                } else {
                    SectionState::EndNow
                }
            }
            SectionMatchMechanism::FlatDoubleAnchor => {
                if section.opening_prefix.is_empty() {
                    SectionState::BeforeBegin
                } else if section.opening_suffix.is_empty() {
                    SectionState::HasBeginPrefix
                } else {
                    SectionState::EndNow
                }
            }
            SectionMatchMechanism::NestedDoubleAnchor => {
                if section.opening_suffix.is_empty() {
                    SectionState::BeforeBegin
                } else if section.closing_suffix.is_empty() {
                    SectionState::HasEndPrefix
                } else {
                    SectionState::EndNow
                }
            }
            SectionMatchMechanism::NestedQuadAnchor => {
                if section.opening_prefix.is_empty() {
                    SectionState::BeforeBegin
                } else if section.opening_suffix.is_empty() {
                    SectionState::HasBeginPrefix
                } else if section.closing_prefix.is_empty() {
                    SectionState::HasBeginSuffix
                } else if section.closing_suffix.is_empty() {
                    SectionState::HasEndPrefix
                } else {
                    SectionState::EndNow
                }
            }
            SectionMatchMechanism::None => SectionState::BeforeBegin,
        };
        (state, Some(parent))
    }

    fn create_section(&mut self) {
        self.end_statement("");
        let new_section = Section {
            statement_counter_at_opening: self.statement_counter,
            ..Default::default()
        };
        if self.this_node == self.tree.root() {
            self.this_node = self.tree.create_leaf(self.this_node);
            self.tree.node_mut(self.this_node).entity = Some(Entity::Section(new_section));
        } else {
            self.this_node = self.tree.set_entity_and_sibling(self.this_node, Entity::Section(new_section));
        }
        self.this_node = self.tree.create_leaf(self.this_node);
    }

    fn remove_previous_sibling_statement(&mut self) -> Option<Statement> {
        let sibling = self.tree.sibling_before(self.this_node)?;
        if !matches!(self.tree.node(sibling).entity, Some(Entity::Statement(_))) {
            return None;
        }
        self.tree.detach(sibling);
        match self.tree.node_mut(sibling).entity.take() {
            Some(Entity::Statement(s)) => Some(s),
            _ => None,
        }
    }

    fn end_section(&mut self) {
        let (_, section_id) = self.section_state();
        let Some(section_id) = section_id else { return };

        self.end_statement("");
        self.this_node = section_id;
        let mut min_child_count = 0;

        if self.config.section_style.open_section_with_a_statement {
            if self.config.section_style.opening_prefix.is_empty() {
                let stmt = self.remove_previous_sibling_statement();
                self.current_section_mut().first_statement = stmt;
            } else {
                let already_missing = self.current_section_mut().missing_opening_statement;
                if !already_missing {
                    if let Some(first) = self.tree.first_child(section_id) {
                        if matches!(self.tree.node(first).entity, Some(Entity::Statement(_))) {
                            self.tree.detach(first);
                            if let Some(Entity::Statement(s)) = self.tree.node_mut(first).entity.take() {
                                self.current_section_mut().first_statement = Some(s);
                            }
                            min_child_count += 1;
                        }
                    }
                }
            }
        }

        if self.config.section_style.close_section_with_a_statement {
            let already_missing = self.current_section_mut().missing_closing_statement;
            let both_closing_markers_set = !self.config.section_style.closing_prefix.is_empty()
                && !self.config.section_style.closing_suffix.is_empty();
            if !already_missing
                && both_closing_markers_set
                && self.tree.child_count(section_id) > min_child_count
            {
                if let Some(last) = self.tree.last_child(section_id) {
                    if matches!(self.tree.node(last).entity, Some(Entity::Statement(_))) {
                        self.tree.detach(last);
                        if let Some(Entity::Statement(s)) = self.tree.node_mut(last).entity.take() {
                            self.current_section_mut().final_statement = Some(s);
                        }
                    }
                }
            }
        }

        self.debug.println("section closes");
        self.this_node = self.tree.create_sibling(section_id);
    }

    fn set_section_opening_prefix(&mut self, prefix: &str) {
        if self.save_quote_or_comment_characters(prefix) {
            return;
        }
        self.end_statement("");
        let (state, section_id) = self.section_state();
        if state == SectionState::BeforeBegin {
            self.create_section();
            self.current_section_mut().opening_prefix = prefix.to_string();
        } else if self.config.section_style.section_match_mechanism == SectionMatchMechanism::FlatDoubleAnchor {
            self.end_section();
            self.create_section();
            self.current_section_mut().opening_prefix = prefix.to_string();
        } else if state == SectionState::EndNow {
            if let Some(id) = section_id {
                self.tree.node_mut(id).entity.as_mut().unwrap().as_section_mut().unwrap().opening_prefix =
                    prefix.to_string();
            }
            self.end_section();
        } else {
            self.create_section();
            self.current_section_mut().opening_prefix = prefix.to_string();
        }
    }

    fn set_section_opening_suffix(&mut self, suffix: &str) {
        if self.save_quote_or_comment_characters(suffix) {
            return;
        }
        self.end_statement("");
        let (state, section_id) = self.section_state();
        if state == SectionState::EndNow {
            let id = section_id.unwrap();
            {
                let sec = self.tree.node_mut(id).entity.as_mut().unwrap().as_section_mut().unwrap();
                sec.opening_suffix = suffix.to_string();
                if sec.statement_counter_at_opening == self.statement_counter {
                    sec.missing_opening_statement = true;
                }
            }
            self.end_section();
        } else if self.config.section_style.section_match_mechanism == SectionMatchMechanism::NestedDoubleAnchor {
            self.create_section();
            self.current_section_mut().opening_suffix = suffix.to_string();
        } else if state < SectionState::HasBeginPrefix || state > SectionState::HasBeginSuffix {
            self.save_missed_characters();
        } else {
            let id = section_id.unwrap();
            let sec = self.tree.node_mut(id).entity.as_mut().unwrap().as_section_mut().unwrap();
            sec.opening_suffix = suffix.to_string();
            if sec.statement_counter_at_opening == self.statement_counter {
                sec.missing_opening_statement = true;
            }
        }
    }

    fn set_section_closing_prefix(&mut self, prefix: &str) {
        if self.save_quote_or_comment_characters(prefix) {
            return;
        }
        self.end_statement("");
        let (state, section_id) = self.section_state();
        if state == SectionState::EndNow {
            let id = section_id.unwrap();
            {
                let sec = self.tree.node_mut(id).entity.as_mut().unwrap().as_section_mut().unwrap();
                sec.closing_prefix = prefix.to_string();
                sec.statement_counter_at_closing = self.statement_counter;
            }
            self.end_section();
        } else if state < SectionState::HasBeginSuffix || state > SectionState::HasEndPrefix {
            self.save_missed_characters();
        } else {
            let id = section_id.unwrap();
            let sec = self.tree.node_mut(id).entity.as_mut().unwrap().as_section_mut().unwrap();
            sec.closing_prefix = prefix.to_string();
            sec.statement_counter_at_closing = self.statement_counter;
        }
    }

    fn set_section_closing_suffix(&mut self, suffix: &str) {
        if self.save_quote_or_comment_characters(suffix) {
            return;
        }
        self.end_statement("");
        let (state, section_id) = self.section_state();
        if state >= SectionState::HasEndPrefix {
            let id = section_id.unwrap();
            {
                let sec = self.tree.node_mut(id).entity.as_mut().unwrap().as_section_mut().unwrap();
                sec.closing_suffix = suffix.to_string();
                if sec.statement_counter_at_closing == self.statement_counter {
                    sec.missing_closing_statement = true;
                }
            }
            self.end_section();
        } else if state < SectionState::HasEndPrefix && self.config.section_style.ambiguous_section_suffix {
            // The closing-suffix marker is textually identical to the
            // opening-suffix one and we haven't reached an end-prefix yet:
            // this has to be an opening suffix instead.
            self.set_section_opening_suffix(suffix);
        } else if let Some(id) = section_id {
            let sec = self.tree.node_mut(id).entity.as_mut().unwrap().as_section_mut().unwrap();
            sec.closing_suffix = suffix.to_string();
            if sec.statement_counter_at_closing == self.statement_counter {
                sec.missing_closing_statement = true;
            }
        } else {
            // No section is open at all and the suffix isn't ambiguous with
            // an opening marker: there is nothing sensible to attach this
            // marker to, so treat it as ordinary missed text instead of
            // indexing a section that doesn't exist.
            self.save_missed_characters();
        }
    }
}
