//! The ASLAN state engine: drives a [`Lexer`](aslan_lexer::Lexer) token
//! stream into a [`Value`] tree, applying the override lattice, duplicate-key
//! policies, and `g`/`s`/`c`/`e` framing rules described in SPEC_FULL.md.

mod event;
mod frame;
mod options;
mod policy;

pub use event::{
    ContentEvent, EndDataEvent, EndEvent, Event, EventKind, InstructionEvent, ListenerId,
    PathSegment,
};
pub use frame::{Frame, MapFrame, PartsState, SequenceFrame};
pub use options::ParserOptions;
pub use policy::Policy;

use aslan_common::{ConfigError, Value};
use aslan_lexer::{DelimKind, Delimiter, Lexer, Token, TokenKind};
use event::EventBus;

/// What the engine does with freshly-tokenized content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineMode {
    /// Ordinary parsing: delimiters dispatch, text appends.
    Normal,
    /// Inside `[aslanc]`: text and non-structural delimiters (`i`, `c`)
    /// are discarded; a structural delimiter ends the comment and then
    /// runs normally.
    Comment,
    /// Pre-`g` (under `strictStart`) or post-`s` (under `strictEnd`):
    /// everything is discarded except a `g` token, which ends discarding.
    Discarding,
}

fn ends_comment(kind: DelimKind) -> bool {
    !matches!(kind, DelimKind::Instruction | DelimKind::Comment)
}

/// Streaming ASLAN parser. Feed it chunks of input; it incrementally
/// builds a [`Value`] tree and fires events as it goes.
pub struct Parser {
    options: ParserOptions,
    lexer: Lexer,
    stack: Vec<Frame>,
    mode: EngineMode,
    any_go_seen: bool,
    seen_first_data: bool,
    documents: Vec<Value>,
    bus: EventBus,
}

impl Parser {
    pub fn new(options: ParserOptions) -> Result<Self, ConfigError> {
        options.validate()?;
        let mode = if options.strict_start {
            EngineMode::Discarding
        } else {
            EngineMode::Normal
        };
        let root = Self::fresh_root_frame(&options);
        Ok(Self {
            options,
            lexer: Lexer::new(),
            stack: vec![root],
            mode,
            any_go_seen: false,
            seen_first_data: false,
            documents: Vec::new(),
            bus: EventBus::new(),
        })
    }

    pub fn with_defaults() -> Self {
        Self::new(ParserOptions::default()).expect("default options are always valid")
    }

    pub fn add_event_listener(
        &mut self,
        kind: EventKind,
        callback: impl FnMut(&Event) + 'static,
    ) -> ListenerId {
        self.bus.add_event_listener(kind, callback)
    }

    pub fn remove_event_listener(&mut self, id: ListenerId) {
        self.bus.remove_event_listener(id);
    }

    /// One-shot convenience: feed the whole input and finish.
    pub fn parse(&mut self, input: &str) -> Value {
        self.feed(input);
        self.finish()
    }

    /// Append a chunk of input, processing whatever it resolves to.
    pub fn feed(&mut self, chunk: &str) {
        self.lexer.feed(chunk);
        self.drain_tokens(false);
    }

    /// Signal end of input and return the final value (or, under
    /// `multiAslanOutput`, a `Sequence` of every finalized document).
    pub fn finish(&mut self) -> Value {
        self.drain_tokens(true);
        self.finalize()
    }

    fn drain_tokens(&mut self, eof: bool) {
        while let Some(tok) = self.lexer.next_token(eof) {
            self.process_token(tok);
        }
    }

    fn fresh_root_frame(options: &ParserOptions) -> Frame {
        let mut mf = MapFrame::new();
        mf.target
            .insert(options.default_field_name.clone(), Value::Text(String::new()));
        mf.current_key = Some(options.default_field_name.clone());
        Frame::Map(mf)
    }

    // --- token dispatch -----------------------------------------------

    fn process_token(&mut self, tok: Token) {
        match tok.kind {
            TokenKind::Text(text) => {
                if self.mode == EngineMode::Normal {
                    self.append_text(&text);
                }
            }
            TokenKind::Delim(delim) => self.process_delim(delim),
        }
    }

    fn process_delim(&mut self, delim: Delimiter) {
        match self.mode {
            EngineMode::Discarding => {
                if delim.kind == DelimKind::Go {
                    self.apply_go();
                }
            }
            EngineMode::Comment => {
                if ends_comment(delim.kind) {
                    self.mode = EngineMode::Normal;
                    self.dispatch_structural(delim);
                }
            }
            EngineMode::Normal => {
                if delim.kind == DelimKind::Comment {
                    self.mode = EngineMode::Comment;
                } else {
                    self.dispatch_structural(delim);
                }
            }
        }
    }

    fn dispatch_structural(&mut self, delim: Delimiter) {
        match delim.kind {
            DelimKind::Data => self.apply_data(delim.label, delim.arg),
            DelimKind::Object => self.apply_object(),
            DelimKind::Array => self.apply_array(),
            DelimKind::Part => self.apply_part(),
            DelimKind::Instruction => self.apply_instruction(delim.label, delim.arg),
            DelimKind::Escape => self.apply_escape(delim.label),
            DelimKind::Go => self.apply_go(),
            DelimKind::Stop => self.apply_stop(),
            DelimKind::Void => self.apply_void(),
            DelimKind::Comment => unreachable!("comment delimiters never reach dispatch_structural"),
        }
    }

    // --- data / text ----------------------------------------------------

    fn apply_data(&mut self, label: Option<String>, arg: Option<String>) {
        self.flush_parts_and_end_data();

        match self.stack.last_mut().unwrap() {
            Frame::Map(mf) => {
                let key = label.unwrap_or_default();
                if let std::collections::hash_map::Entry::Vacant(e) =
                    mf.policies.entry(key.clone())
                {
                    e.insert(Policy::from_arg(arg.as_deref()));
                    mf.target.entry(key.clone()).or_insert(Value::Null);
                } else {
                    let policy = mf.policies[&key];
                    if !mf.finalized.contains(&key) {
                        match policy {
                            Policy::First => {
                                mf.finalized.insert(key.clone());
                            }
                            Policy::Last => {
                                mf.target.insert(key.clone(), Value::Text(String::new()));
                            }
                            Policy::Append => {}
                        }
                    }
                }
                mf.current_key = Some(key);
                mf.just_selected = true;
                mf.parts = None;
            }
            Frame::Sequence(sf) => {
                let explicit_index = label
                    .as_deref()
                    .filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
                    .and_then(|s| s.parse::<usize>().ok());
                let idx = match explicit_index {
                    Some(idx) => {
                        while sf.target.len() <= idx {
                            sf.target.push(Value::Null);
                        }
                        idx
                    }
                    None => {
                        let idx = sf.target.len();
                        sf.target.push(Value::Null);
                        idx
                    }
                };
                sf.current_index = Some(idx);
                sf.just_selected = true;
                sf.parts = None;
            }
        }

        if !self.seen_first_data {
            self.seen_first_data = true;
            let name = self.options.default_field_name.clone();
            if let Frame::Map(root) = &mut self.stack[0] {
                root.target.insert(name, Value::Null);
            }
        }
    }

    fn append_text(&mut self, text: &str) {
        if text.is_empty() || self.current_is_finalized() {
            return;
        }
        let collapse = self.options.collapse_object_start_whitespace;
        let sep = self.options.append_separator.clone();
        let mut written: Option<(Value, bool)> = None;
        match self.stack.last_mut().unwrap() {
            Frame::Map(mf) => {
                if let Some(parts) = &mut mf.parts {
                    parts.buffer.push_str(text);
                    mf.just_selected = false;
                    return;
                }
                let Some(key) = mf.current_key.clone() else {
                    return;
                };
                let cur = mf.target.entry(key.clone()).or_insert(Value::Null);
                if cur.is_map() || cur.is_sequence() {
                    mf.just_selected = false;
                    return;
                }
                let existing = cur.as_text().unwrap_or("").to_string();
                if collapse && existing.is_empty() && text.trim().is_empty() {
                    mf.just_selected = false;
                    return;
                }
                let is_append = !existing.is_empty();
                let mut next = existing;
                if mf.just_selected && !sep.is_empty() && !next.is_empty() {
                    next.push_str(&sep);
                }
                next.push_str(text);
                *cur = Value::Text(next.clone());
                mf.just_selected = false;
                written = Some((Value::Text(next), is_append));
            }
            Frame::Sequence(sf) => {
                if let Some(parts) = &mut sf.parts {
                    parts.buffer.push_str(text);
                    sf.just_selected = false;
                    return;
                }
                let Some(idx) = sf.current_index else {
                    return;
                };
                if idx >= sf.target.len() {
                    return;
                }
                let cur = &mut sf.target[idx];
                if cur.is_map() || cur.is_sequence() {
                    sf.just_selected = false;
                    return;
                }
                let existing = cur.as_text().unwrap_or("").to_string();
                if collapse && existing.is_empty() && text.trim().is_empty() {
                    sf.just_selected = false;
                    return;
                }
                let is_append = !existing.is_empty();
                let mut next = existing;
                if sf.just_selected && !sep.is_empty() && !next.is_empty() {
                    next.push_str(&sep);
                }
                next.push_str(text);
                *cur = Value::Text(next.clone());
                sf.just_selected = false;
                written = Some((Value::Text(next), is_append));
            }
        }
        if let Some((value, is_append)) = written {
            self.emit_content(value, is_append);
        }
    }

    fn emit_content(&mut self, value: Value, is_append: bool) {
        if let Some(path) = self.current_path() {
            self.bus.emit(Event::Content(ContentEvent {
                path,
                value,
                is_append,
            }));
        }
    }

    // --- object / array toggles -----------------------------------------

    fn apply_object(&mut self) {
        let keyless = match self.stack.last().unwrap() {
            Frame::Map(mf) => mf.current_key.is_none(),
            Frame::Sequence(sf) => sf.current_index.is_none(),
        };
        if keyless {
            if self.stack.len() > 1 {
                self.pop_and_write_back();
            }
            return;
        }

        if matches!(self.stack.last(), Some(Frame::Sequence(_))) {
            if let Some(Frame::Sequence(sf)) = self.stack.last_mut() {
                sf.just_selected = false;
            }
            if self.current_is_empty() {
                self.try_open_map_frame();
            }
            return;
        }

        let just_selected = matches!(self.stack.last(), Some(Frame::Map(mf)) if mf.just_selected);
        if let Some(Frame::Map(mf)) = self.stack.last_mut() {
            mf.just_selected = false;
        }
        if just_selected {
            self.try_open_map_frame();
            return;
        }

        let cur = match self.stack.last() {
            Some(Frame::Map(mf)) => mf.current_value().cloned().unwrap_or(Value::Null),
            _ => unreachable!(),
        };
        if cur.is_sequence() {
            return;
        }
        if cur.is_map() {
            if self.stack.len() > 1 {
                self.pop_and_write_back();
            }
            return;
        }
        if cur.is_empty_slot(self.options.collapse_object_start_whitespace) {
            self.try_open_map_frame();
        } else if self.stack.len() > 1 {
            self.pop_and_write_back();
        }
    }

    fn apply_array(&mut self) {
        if matches!(self.stack.last(), Some(Frame::Sequence(_))) {
            if let Some(Frame::Sequence(sf)) = self.stack.last_mut() {
                sf.just_selected = false;
            }
            if self.current_is_empty() {
                self.stack.push(Frame::Sequence(SequenceFrame::new()));
            } else {
                self.pop_and_write_back();
            }
            return;
        }
        let has_key = matches!(self.stack.last(), Some(Frame::Map(mf)) if mf.current_key.is_some());
        if !has_key {
            return;
        }
        if let Some(Frame::Map(mf)) = self.stack.last_mut() {
            mf.just_selected = false;
        }
        self.stack.push(Frame::Sequence(SequenceFrame::new()));
    }

    fn try_open_map_frame(&mut self) -> bool {
        if let Some(max) = self.options.max_object_depth {
            if self.map_depth() + 1 > max {
                return false;
            }
        }
        self.stack.push(Frame::Map(MapFrame::new()));
        true
    }

    // --- part / void / instruction ---------------------------------------

    fn apply_part(&mut self) {
        let mut written: Option<Value> = None;
        match self.stack.last_mut().unwrap() {
            Frame::Map(mf) => {
                let Some(key) = mf.current_key.clone() else {
                    return;
                };
                if mf.finalized.contains(&key) {
                    return;
                }
                let value = mf.target.entry(key).or_insert(Value::Null);
                Self::do_part_on_value(value, &mut mf.parts);
                mf.just_selected = false;
                written = Some(value.clone());
            }
            Frame::Sequence(sf) => {
                let Some(idx) = sf.current_index else {
                    return;
                };
                if sf.finalized.contains(&idx) || idx >= sf.target.len() {
                    return;
                }
                let value = &mut sf.target[idx];
                Self::do_part_on_value(value, &mut sf.parts);
                sf.just_selected = false;
                written = Some(value.clone());
            }
        }
        if let Some(value) = written {
            self.emit_content(value, false);
        }
    }

    fn do_part_on_value(current: &mut Value, parts: &mut Option<PartsState>) {
        match parts {
            None => {
                let existing = current.as_text().unwrap_or("").to_string();
                let mut elements = Vec::new();
                if !existing.is_empty() {
                    elements.push(Value::Text(existing));
                }
                *current = Value::Sequence(elements);
                *parts = Some(PartsState::default());
            }
            Some(state) => {
                if !state.buffer.is_empty() {
                    if let Value::Sequence(seq) = current {
                        seq.push(Value::Text(std::mem::take(&mut state.buffer)));
                    }
                }
                state.buffer.clear();
            }
        }
    }

    fn apply_void(&mut self) {
        match self.stack.last_mut().unwrap() {
            Frame::Map(mf) => {
                let Some(key) = mf.current_key.clone() else {
                    return;
                };
                mf.target.insert(key.clone(), Value::Null);
                mf.finalized.insert(key);
                mf.parts = None;
                mf.just_selected = false;
            }
            Frame::Sequence(sf) => {
                let Some(idx) = sf.current_index else {
                    return;
                };
                if idx < sf.target.len() {
                    sf.target[idx] = Value::Null;
                }
                sf.finalized.insert(idx);
                sf.parts = None;
                sf.just_selected = false;
            }
        }
        self.emit_content(Value::Null, false);
    }

    fn apply_instruction(&mut self, label: Option<String>, arg: Option<String>) {
        self.bus.emit(Event::Instruction(InstructionEvent {
            label: label.unwrap_or_default(),
            arg,
        }));
    }

    // --- escape / go / stop ----------------------------------------------

    fn apply_escape(&mut self, label: Option<String>) {
        if self.lexer.is_escaping() {
            self.lexer.set_escape(None);
        } else {
            self.lexer.set_escape(label);
        }
    }

    fn apply_go(&mut self) {
        if !self.any_go_seen {
            self.any_go_seen = true;
            self.mode = EngineMode::Normal;
            return;
        }
        if self.options.multi_aslan_output {
            self.finalize_current_document_and_start_fresh();
            self.mode = EngineMode::Normal;
        }
    }

    fn apply_stop(&mut self) {
        if self.options.strict_end {
            self.mode = EngineMode::Discarding;
        }
    }

    // --- frame bookkeeping -------------------------------------------------

    fn map_depth(&self) -> u32 {
        self.stack.iter().filter(|f| f.is_map()).count().saturating_sub(1) as u32
    }

    fn current_is_empty(&self) -> bool {
        let collapse = self.options.collapse_object_start_whitespace;
        match self.stack.last().unwrap() {
            Frame::Map(mf) => mf.current_value().map_or(true, |v| v.is_empty_slot(collapse)),
            Frame::Sequence(sf) => sf.current_value().map_or(true, |v| v.is_empty_slot(collapse)),
        }
    }

    fn current_is_finalized(&self) -> bool {
        match self.stack.last().unwrap() {
            Frame::Map(mf) => mf.current_key.as_ref().is_some_and(|k| mf.finalized.contains(k)),
            Frame::Sequence(sf) => sf.current_index.is_some_and(|i| sf.finalized.contains(&i)),
        }
    }

    fn current_path(&self) -> Option<Vec<PathSegment>> {
        let mut path = Vec::new();
        for frame in &self.stack {
            match frame {
                Frame::Map(mf) => match &mf.current_key {
                    Some(k) => path.push(PathSegment::Key(k.clone())),
                    None => return None,
                },
                Frame::Sequence(sf) => match sf.current_index {
                    Some(i) => path.push(PathSegment::Index(i)),
                    None => return None,
                },
            }
        }
        Some(path)
    }

    fn write_current_slot(&mut self, value: Value) {
        match self.stack.last_mut().unwrap() {
            Frame::Map(mf) => {
                if let Some(k) = mf.current_key.clone() {
                    mf.target.insert(k, value);
                }
            }
            Frame::Sequence(sf) => {
                if let Some(i) = sf.current_index {
                    if i < sf.target.len() {
                        sf.target[i] = value;
                    }
                }
            }
        }
    }

    fn flush_current_parts_buffer(&mut self) {
        match self.stack.last_mut().unwrap() {
            Frame::Map(mf) => {
                if let Some(parts) = mf.parts.take() {
                    if !parts.buffer.is_empty() {
                        if let Some(key) = mf.current_key.clone() {
                            if let Some(Value::Sequence(seq)) = mf.target.get_mut(&key) {
                                seq.push(Value::Text(parts.buffer));
                            }
                        }
                    }
                }
            }
            Frame::Sequence(sf) => {
                if let Some(parts) = sf.parts.take() {
                    if !parts.buffer.is_empty() {
                        if let Some(idx) = sf.current_index {
                            if let Some(Value::Sequence(seq)) = sf.target.get_mut(idx) {
                                seq.push(Value::Text(parts.buffer));
                            }
                        }
                    }
                }
            }
        }
    }

    fn flush_parts_and_end_data(&mut self) {
        let path = self.current_path();
        self.flush_current_parts_buffer();
        if let Some(path) = path {
            self.bus.emit(Event::EndData(EndDataEvent { path }));
        }
    }

    /// Pops the top frame, writing its collected value back into its
    /// parent's current slot, and fires an `End` event for it. Never
    /// called on the root frame.
    fn pop_and_write_back(&mut self) {
        let parent_len = self.stack.len().saturating_sub(1);
        let mut path = Vec::new();
        for frame in self.stack.iter().take(parent_len) {
            match frame {
                Frame::Map(mf) => {
                    if let Some(k) = &mf.current_key {
                        path.push(PathSegment::Key(k.clone()));
                    }
                }
                Frame::Sequence(sf) => {
                    if let Some(i) = sf.current_index {
                        path.push(PathSegment::Index(i));
                    }
                }
            }
        }
        let popped = self.stack.pop().expect("cannot pop root frame");
        let value = match popped {
            Frame::Map(mf) => Value::Map(mf.target),
            Frame::Sequence(sf) => Value::Sequence(sf.target),
        };
        self.write_current_slot(value);
        self.bus.emit(Event::End(EndEvent { path }));
    }

    fn finalize_current_document_and_start_fresh(&mut self) {
        self.flush_parts_and_end_data();
        while self.stack.len() > 1 {
            self.pop_and_write_back();
        }
        let root = self.stack.pop().expect("root frame always present");
        let value = match root {
            Frame::Map(mf) => Value::Map(mf.target),
            _ => unreachable!("root is always a MapFrame"),
        };
        self.bus.emit(Event::End(EndEvent { path: Vec::new() }));
        self.documents.push(value);
        self.stack.push(Self::fresh_root_frame(&self.options));
        self.seen_first_data = false;
    }

    fn finalize(&mut self) -> Value {
        self.flush_parts_and_end_data();
        while self.stack.len() > 1 {
            self.pop_and_write_back();
        }
        let root = self.stack.pop().expect("root frame always present");
        let value = match root {
            Frame::Map(mf) => Value::Map(mf.target),
            _ => unreachable!("root is always a MapFrame"),
        };
        self.bus.emit(Event::End(EndEvent { path: Vec::new() }));
        self.stack.push(Self::fresh_root_frame(&self.options));
        if self.options.multi_aslan_output {
            self.documents.push(value);
            Value::Sequence(std::mem::take(&mut self.documents))
        } else {
            value
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aslan_common::Map;

    fn map(pairs: &[(&str, Value)]) -> Value {
        let mut m = Map::new();
        for (k, v) in pairs {
            m.insert((*k).to_string(), v.clone());
        }
        Value::Map(m)
    }

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    #[test]
    fn parses_plain_text_into_default_field() {
        let mut p = Parser::with_defaults();
        let result = p.parse("hello world");
        assert_eq!(result, map(&[("_default", text("hello world"))]));
    }

    #[test]
    fn parses_empty_string() {
        let mut p = Parser::with_defaults();
        let result = p.parse("");
        assert_eq!(result, map(&[("_default", text(""))]));
    }

    #[test]
    fn first_data_delimiter_nulls_default_field() {
        let mut p = Parser::with_defaults();
        let result = p.parse("[asland_test]test");
        assert_eq!(result, map(&[("_default", Value::Null), ("test", text("test"))]));
    }

    #[test]
    fn simple_key_value_pairs() {
        let mut p = Parser::with_defaults();
        let result = p.parse("[asland_hi]Hello [asland_lo]World!");
        assert_eq!(
            result,
            map(&[
                ("_default", Value::Null),
                ("hi", text("Hello ")),
                ("lo", text("World!")),
            ])
        );
    }

    #[test]
    fn duplicate_key_default_policy_appends() {
        let mut p = Parser::with_defaults();
        let result = p.parse("[asland_hi]foo[asland_hi]bar");
        assert_eq!(result, map(&[("_default", Value::Null), ("hi", text("foobar"))]));
    }

    #[test]
    fn duplicate_key_first_policy_keeps_first_occurrence() {
        let mut p = Parser::with_defaults();
        let result = p.parse("[asland_hi:f]foo[asland_hi]bar");
        assert_eq!(result, map(&[("_default", Value::Null), ("hi", text("foo"))]));
    }

    #[test]
    fn duplicate_key_last_policy_keeps_last_occurrence() {
        let mut p = Parser::with_defaults();
        let result = p.parse("[asland_hi:l]foo[asland_hi]bar");
        assert_eq!(result, map(&[("_default", Value::Null), ("hi", text("bar"))]));
    }

    #[test]
    fn object_opens_on_empty_key_and_closes_on_populated_map() {
        let mut p = Parser::with_defaults();
        let result = p.parse("[asland_foo][aslano][asland_bar]Baz![aslano]");
        assert_eq!(
            result,
            map(&[
                ("_default", Value::Null),
                ("foo", map(&[("bar", text("Baz!"))])),
            ])
        );
    }

    #[test]
    fn reselecting_a_key_forces_a_fresh_object_discarding_the_old_one() {
        let mut p = Parser::with_defaults();
        // the inner `[aslano]` closes an empty, never-selected frame immediately
        // (see apply_object's keyless branch), leaving `hi: {}`; re-selecting
        // `hi` then opening again must discard that stale empty map rather
        // than treat it as a close candidate, per the `just_selected` lattice.
        let result =
            p.parse("[asland_hi][aslano][aslano][asland_hi][aslano][asland_x]new[aslano]");
        assert_eq!(
            result,
            map(&[("_default", Value::Null), ("hi", map(&[("x", text("new"))]))])
        );
    }

    #[test]
    fn object_closes_on_nonempty_scalar_so_a_sibling_key_does_not_nest() {
        // ported from original_source's
        // `test_parses_more_complex_string_with_object`: after `foo.bar` is
        // written, the closing `[aslano]` must pop `foo` back to root so
        // that `x` is root's sibling, not `foo`'s child.
        let mut p = Parser::with_defaults();
        let result = p.parse(
            "[asland_hi]Hello [asland_lo]World![asland_foo][aslano][asland_bar]Baz![aslano][asland_x][aslano][asland_y]you are reading spec[asland_z]and it continues here",
        );
        assert_eq!(
            result,
            map(&[
                ("_default", Value::Null),
                ("hi", text("Hello ")),
                ("lo", text("World!")),
                ("foo", map(&[("bar", text("Baz!"))])),
                (
                    "x",
                    map(&[
                        ("y", text("you are reading spec")),
                        ("z", text("and it continues here")),
                    ]),
                ),
            ])
        );
    }

    #[test]
    fn array_basic_and_mixed_indices() {
        let mut p = Parser::with_defaults();
        let result = p.parse("[asland_list][aslana][asland]A[asland_1]B[asland]C");
        assert_eq!(
            result,
            map(&[
                ("_default", Value::Null),
                ("list", Value::Sequence(vec![text("A"), text("B"), text("C")])),
            ])
        );
    }

    #[test]
    fn implicit_array_writes_append_at_tail_never_backfilling_explicit_holes() {
        let mut p = Parser::with_defaults();
        let result =
            p.parse("[asland_mixed_array][aslana][asland_2]A[asland_0]B[asland]C[asland]D");
        assert_eq!(
            result,
            map(&[
                ("_default", Value::Null),
                (
                    "mixed_array",
                    Value::Sequence(vec![text("B"), Value::Null, text("A"), text("C"), text("D")]),
                ),
            ])
        );
    }

    #[test]
    fn array_a_opens_a_nested_array_on_an_empty_element_and_closes_on_a_filled_one() {
        // ported from original_source's
        // `test_parses_simple_string_with_nested_arrays`: `[aslana]` on a
        // freshly-selected, still-empty element pushes a nested array
        // instead of closing the outer one.
        let mut p = Parser::with_defaults();
        let result = p.parse(
            "[asland_mixed_array][aslana][asland_2]A[asland_0]B[asland]C[asland]D[asland]E[asland][aslana][asland]hi[asland]lo[aslana][asland]G",
        );
        assert_eq!(
            result,
            map(&[
                ("_default", Value::Null),
                (
                    "mixed_array",
                    Value::Sequence(vec![
                        text("B"),
                        Value::Null,
                        text("A"),
                        text("C"),
                        text("D"),
                        text("E"),
                        Value::Sequence(vec![text("hi"), text("lo")]),
                        text("G"),
                    ]),
                ),
            ])
        );
    }

    #[test]
    fn array_then_object_same_key_overrides_array() {
        let mut p = Parser::with_defaults();
        let result = p.parse("[asland_hi][aslana][asland]foo[aslana][asland_hi][aslano][asland_x]bar[aslano]");
        assert_eq!(
            result,
            map(&[("_default", Value::Null), ("hi", map(&[("x", text("bar"))]))])
        );
    }

    #[test]
    fn void_nulls_and_locks_field_against_future_writes() {
        let mut p = Parser::with_defaults();
        let result = p.parse("[asland_hi]something[aslanv][asland_hi]ignored");
        assert_eq!(result, map(&[("_default", Value::Null), ("hi", Value::Null)]));
    }

    #[test]
    fn part_splits_into_sequence_with_leading_text_as_first_element() {
        let mut p = Parser::with_defaults();
        let result = p.parse("[asland_hi]pre[aslanp]mid[aslanp]post");
        assert_eq!(
            result,
            map(&[
                ("_default", Value::Null),
                ("hi", Value::Sequence(vec![text("pre"), text("mid"), text("post")])),
            ])
        );
    }

    #[test]
    fn comment_discards_until_structural_delimiter() {
        let mut p = Parser::with_defaults();
        let result = p.parse("[aslanc]this is ignored[asland_hi]kept");
        assert_eq!(result, map(&[("_default", Value::Null), ("hi", text("kept"))]));
    }

    #[test]
    fn escape_preserves_literal_delimiters() {
        let mut p = Parser::with_defaults();
        let result = p.parse("[asland_hi][aslane_x][asland_lo][aslane_x]");
        assert_eq!(result, map(&[("_default", Value::Null), ("hi", text("[asland_lo]"))]));
    }

    #[test]
    fn strict_start_discards_everything_before_first_go() {
        let mut p = Parser::new(ParserOptions {
            strict_start: true,
            ..ParserOptions::default()
        })
        .unwrap();
        let result = p.parse("[asland_hi]Hello [aslang][asland_lo]World!");
        assert_eq!(result, map(&[("_default", Value::Null), ("lo", text("World!"))]));
    }

    #[test]
    fn strict_start_with_no_go_ever_yields_empty_default() {
        let mut p = Parser::new(ParserOptions {
            strict_start: true,
            ..ParserOptions::default()
        })
        .unwrap();
        let result = p.parse("[asland_hi]Hello [asland_lo]World!");
        assert_eq!(result, map(&[("_default", text(""))]));
    }

    #[test]
    fn strict_end_discards_after_stop() {
        let mut p = Parser::new(ParserOptions {
            strict_end: true,
            ..ParserOptions::default()
        })
        .unwrap();
        let result = p.parse("[asland_hi]Hello [aslans][asland_lo]World!");
        assert_eq!(result, map(&[("_default", Value::Null), ("hi", text("Hello "))]));
    }

    #[test]
    fn multi_aslan_output_splits_documents_on_go() {
        let mut p = Parser::new(ParserOptions {
            strict_start: true,
            strict_end: true,
            multi_aslan_output: true,
            ..ParserOptions::default()
        })
        .unwrap();
        let result = p.parse("[aslang]This is a test[aslans]this should be ignored[aslang]but not this");
        assert_eq!(
            result,
            Value::Sequence(vec![
                map(&[("_default", text("This is a test"))]),
                map(&[("_default", text("but not this"))]),
            ])
        );
    }

    #[test]
    fn max_object_depth_forces_close_at_root_when_already_at_cap() {
        let mut p = Parser::new(ParserOptions {
            max_object_depth: Some(1),
            ..ParserOptions::default()
        })
        .unwrap();
        // root counts as depth 0; opening `foo` reaches depth 1 (the cap),
        // so a second nested `[aslano]` under `foo` must not open further.
        let result = p.parse("[asland_foo][aslano][asland_bar][aslano][asland_baz]x");
        assert_eq!(
            result,
            map(&[
                ("_default", Value::Null),
                ("foo", map(&[("bar", Value::Null), ("baz", text("x"))])),
            ])
        );
    }

    #[test]
    fn instruction_fires_event_without_touching_value_tree() {
        let mut p = Parser::with_defaults();
        let events = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let events_clone = events.clone();
        p.add_event_listener(EventKind::Instruction, move |ev| {
            if let Event::Instruction(i) = ev {
                events_clone.borrow_mut().push(i.label.clone());
            }
        });
        let result = p.parse("[aslani_bold]hello");
        assert_eq!(result, map(&[("_default", text("hello"))]));
        assert_eq!(*events.borrow(), vec!["bold".to_string()]);
    }

    #[test]
    fn content_event_fires_on_each_append_with_growing_value() {
        let mut p = Parser::with_defaults();
        let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let seen_clone = seen.clone();
        p.add_event_listener(EventKind::Content, move |ev| {
            if let Event::Content(c) = ev {
                seen_clone.borrow_mut().push((c.value.clone(), c.is_append));
            }
        });
        let result = p.parse("[asland_hi]foo[asland_hi]bar");
        assert_eq!(result, map(&[("_default", Value::Null), ("hi", text("foobar"))]));
        assert_eq!(
            *seen.borrow(),
            vec![
                (text("foo"), false),
                (text("foobar"), true),
            ]
        );
    }

    #[test]
    fn content_event_fires_for_void_assignment() {
        let mut p = Parser::with_defaults();
        let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let seen_clone = seen.clone();
        p.add_event_listener(EventKind::Content, move |ev| {
            if let Event::Content(c) = ev {
                seen_clone.borrow_mut().push(c.value.clone());
            }
        });
        let result = p.parse("[asland_hi]something[aslanv]");
        assert_eq!(result, map(&[("_default", Value::Null), ("hi", Value::Null)]));
        assert_eq!(*seen.borrow(), vec![text("something"), Value::Null]);
    }

    #[test]
    fn value_tree_serializes_to_the_expected_json_shape() {
        let mut p = Parser::with_defaults();
        let result = p.parse("[asland_fruits][aslana][asland]Apple[asland]Banana[asland_count]2");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "_default": null,
                "fruits": ["Apple", "Banana"],
                "count": "2",
            })
        );
    }

    #[test]
    fn end_data_and_end_events_fire_on_key_transition_and_frame_pop() {
        let mut p = Parser::with_defaults();
        let end_data_count = std::rc::Rc::new(std::cell::RefCell::new(0));
        let end_count = std::rc::Rc::new(std::cell::RefCell::new(0));
        let ed = end_data_count.clone();
        let e = end_count.clone();
        p.add_event_listener(EventKind::EndData, move |_| *ed.borrow_mut() += 1);
        p.add_event_listener(EventKind::End, move |_| *e.borrow_mut() += 1);
        p.parse("[asland_foo][aslano][asland_bar]x[aslano][asland_baz]y");
        // `d foo`, `d bar`, `d baz` each flush a prior writing window.
        assert!(*end_data_count.borrow() >= 3);
        // the nested map frame pops once, and the root frame fires its own
        // `End` at end-of-stream.
        assert_eq!(*end_count.borrow(), 2);
    }
}
