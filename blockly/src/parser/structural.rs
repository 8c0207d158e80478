use std::ops::Range;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::block::Block;
use crate::block::socket::{Field, Statement, Value};
use crate::parser::attributes::Attributes;
use crate::parser::error::ParseError;
use crate::parser::mutation::decode_mutation;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Decode block XML into the list of top-level blocks.
pub fn parse_blocks(source: &str, file_id: usize) -> Result<Vec<Block>, Vec<ParseError>> {
    let events = tokenize(source, file_id).map_err(|error| vec![error])?;

    let mut state = ParseState::new(file_id);
    let mut cursor = Cursor {
        events: &events,
        pos: 0,
    };
    let blocks = state.parse_root(&mut cursor);
    state.finalize(blocks)
}

/// Read the whole source into spanned events. Malformed XML is fatal.
fn tokenize(source: &str, file_id: usize) -> Result<Vec<Spanned<'_>>, ParseError> {
    let mut reader = Reader::from_str(source);
    let mut events = Vec::new();

    loop {
        let start = reader.buffer_position();
        match reader.read_event() {
            Ok(Event::Eof) => break,
            Ok(
                event @ (Event::Start(_)
                | Event::Empty(_)
                | Event::End(_)
                | Event::Text(_)
                | Event::CData(_)),
            ) => {
                events.push((event, start..reader.buffer_position()));
            }
            // Declarations, comments, processing instructions, doctypes.
            Ok(_) => {}
            Err(error) => {
                let end = reader.buffer_position().max(start);
                return Err(ParseError::error(
                    format!("malformed XML: {}", error),
                    start..end,
                    file_id,
                ));
            }
        }
    }

    Ok(events)
}

// ---------------------------------------------------------------------------
// Event cursor
// ---------------------------------------------------------------------------

type Spanned<'a> = (Event<'a>, Range<usize>);

struct Cursor<'e, 'a> {
    events: &'e [Spanned<'a>],
    pos: usize,
}

/// An opened element: its start tag and where that tag sits in the source.
struct Element<'e, 'a> {
    start: &'e BytesStart<'a>,
    /// Self-closing (`<x/>`): there are no children and no end tag.
    empty: bool,
    span: Range<usize>,
}

impl Element<'_, '_> {
    fn is(&self, name: &str) -> bool {
        self.start.local_name().as_ref() == name.as_bytes()
    }

    fn name(&self) -> String {
        String::from_utf8_lossy(self.start.name().as_ref()).into_owned()
    }
}

enum Step<'e, 'a> {
    Open(Element<'e, 'a>),
    Text(&'e Event<'a>, Range<usize>),
    /// End tag of the enclosing element; carries the end offset.
    Close(usize),
    Eof,
}

impl<'e, 'a> Cursor<'e, 'a> {
    fn step(&mut self) -> Step<'e, 'a> {
        let Some((event, span)) = self.events.get(self.pos) else {
            return Step::Eof;
        };
        self.pos += 1;
        match event {
            Event::Start(start) => Step::Open(Element {
                start,
                empty: false,
                span: span.clone(),
            }),
            Event::Empty(start) => Step::Open(Element {
                start,
                empty: true,
                span: span.clone(),
            }),
            Event::End(_) => Step::Close(span.end),
            _ => Step::Text(event, span.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse state
// ---------------------------------------------------------------------------

/// How many `value`/`statement` sockets may enclose a block. Next-chains
/// do not count: a stack of any length is read without nesting.
pub const MAX_NESTING: usize = 128;

/// A chain block whose element is still open.
struct Link<'e, 'a> {
    block: Block,
    element: Element<'e, 'a>,
    seen_next: bool,
    /// Inside the block's `<next>` element.
    open_next: Option<OpenNext<'e, 'a>>,
    /// The end tag (or end of input) has been read.
    closed: bool,
}

struct OpenNext<'e, 'a> {
    element: Element<'e, 'a>,
    blocks: usize,
}

struct ParseState {
    file_id: usize,
    errors: Vec<ParseError>,
}

impl ParseState {
    fn new(file_id: usize) -> Self {
        ParseState {
            file_id,
            errors: Vec::new(),
        }
    }

    fn finalize(self, blocks: Vec<Block>) -> Result<Vec<Block>, Vec<ParseError>> {
        if self.errors.is_empty() {
            Ok(blocks)
        } else {
            Err(self.errors)
        }
    }

    fn error(&mut self, message: impl Into<String>, span: Range<usize>) {
        self.errors.push(ParseError::error(message, span, self.file_id));
    }

    /// An error about the element named `element` at `span`.
    fn error_in(&mut self, message: impl Into<String>, span: Range<usize>, element: &str) {
        self.errors
            .push(ParseError::error(message, span, self.file_id).with_element(element));
    }

    fn unexpected_eof(&mut self, element: &Element<'_, '_>) {
        let message = format!("unexpected end of document inside <{}>", element.name());
        self.errors.push(
            ParseError::error(message, element.span.clone(), self.file_id)
                .with_element(element.name())
                .with_note("the element opened here is never closed"),
        );
    }

    fn parse_root(&mut self, cursor: &mut Cursor<'_, '_>) -> Vec<Block> {
        let root = loop {
            match cursor.step() {
                Step::Open(element) => break element,
                Step::Text(..) | Step::Close(_) => {}
                Step::Eof => {
                    self.error("document has no root element", 0..0);
                    return Vec::new();
                }
            }
        };

        if !root.is("xml") {
            let message = format!("expected root element <xml>, found <{}>", root.name());
            self.errors.push(
                ParseError::error(message, root.span.clone(), self.file_id)
                    .with_element(root.name())
                    .with_note("block programs are wrapped in a single <xml> element"),
            );
            return Vec::new();
        }

        let mut blocks = Vec::new();
        if root.empty {
            return blocks;
        }
        loop {
            match cursor.step() {
                Step::Open(element) if element.is("block") => {
                    blocks.push(self.parse_block(cursor, element, 0));
                }
                Step::Open(element) => {
                    self.skip(cursor, &element);
                }
                Step::Text(..) => {}
                Step::Close(_) => break,
                Step::Eof => {
                    self.unexpected_eof(&root);
                    break;
                }
            }
        }
        blocks
    }

    /// Parse a `<block>` and the whole Next-chain hanging below it.
    ///
    /// Chained blocks are nested in the XML but form a flat list, so the
    /// chain is read with a loop: each block is read up to the first block
    /// of its `<next>`, which becomes the next link. Once the tail closes,
    /// the pending links are finished and joined bottom-up.
    fn parse_block<'e, 'a>(
        &mut self,
        cursor: &mut Cursor<'e, 'a>,
        element: Element<'e, 'a>,
        depth: usize,
    ) -> Block {
        let mut pending = Vec::new();
        let mut link = self.open_link(element);
        while let Some(successor) = self.read_link(cursor, &mut link, depth) {
            pending.push(link);
            link = self.open_link(successor);
        }

        let mut tail = link.block;
        while let Some(mut parent) = pending.pop() {
            parent.block.next = Some(Box::new(tail));
            // The parent already has its successor, so this runs to its end tag.
            let _ = self.read_link(cursor, &mut parent, depth);
            tail = parent.block;
        }
        tail
    }

    fn open_link<'e, 'a>(&mut self, element: Element<'e, 'a>) -> Link<'e, 'a> {
        let attrs = self.attributes(&element);
        let mut block = Block::new(attrs.text("type"));
        block.x = attrs.text("x");
        block.y = attrs.text("y");
        block.span = element.span.clone();
        Link {
            block,
            element,
            seen_next: false,
            open_next: None,
            closed: false,
        }
    }

    /// Read the children of a chain link. Stops at the first block of the
    /// link's `<next>`, returning it, or at the link's end tag.
    fn read_link<'e, 'a>(
        &mut self,
        cursor: &mut Cursor<'e, 'a>,
        link: &mut Link<'e, 'a>,
        depth: usize,
    ) -> Option<Element<'e, 'a>> {
        if link.closed || link.element.empty {
            link.closed = true;
            return None;
        }

        loop {
            if let Some(next) = &mut link.open_next {
                match cursor.step() {
                    Step::Open(child) if child.is("block") => {
                        next.blocks += 1;
                        if next.blocks == 1 {
                            return Some(child);
                        }
                        // Surplus blocks are an error; they are read only to
                        // move past them.
                        if depth < MAX_NESTING {
                            self.parse_block(cursor, child, depth + 1);
                        } else {
                            self.skip(cursor, &child);
                        }
                    }
                    Step::Open(child) => {
                        self.skip(cursor, &child);
                    }
                    Step::Text(..) => {}
                    Step::Close(end) => {
                        if next.blocks > 1 {
                            let message = format!(
                                "<next> holds {} blocks, expected at most one",
                                next.blocks
                            );
                            let span = next.element.span.start..end;
                            self.error_in(message, span, "next");
                        }
                        link.open_next = None;
                    }
                    Step::Eof => {
                        self.unexpected_eof(&next.element);
                        link.open_next = None;
                    }
                }
                continue;
            }

            match cursor.step() {
                Step::Open(child) => {
                    let start = child.start;
                    match start.local_name().as_ref() {
                        b"value" => {
                            let (name, blocks, _) = self.parse_socket(cursor, &child, depth + 1);
                            link.block.values.push(Value::new(name, blocks));
                        }
                        b"statement" => {
                            let (name, blocks, _) = self.parse_socket(cursor, &child, depth + 1);
                            link.block.statements.push(Statement::new(name, blocks));
                        }
                        b"field" => {
                            let name = self.attributes(&child).text("name");
                            let text = self.parse_text(cursor, &child);
                            link.block.fields.push(Field::new(name, text));
                        }
                        b"next" if link.seen_next => {
                            let (_, _, end) = self.parse_socket(cursor, &child, depth + 1);
                            let span = child.span.start..end;
                            self.error_in("block has more than one <next> element", span, "next");
                        }
                        b"next" => {
                            link.seen_next = true;
                            if !child.empty {
                                link.open_next = Some(OpenNext {
                                    element: child,
                                    blocks: 0,
                                });
                            }
                        }
                        b"mutation" => {
                            let attrs = self.attributes(&child);
                            let (mutation, problems) = decode_mutation(&attrs);
                            for problem in problems {
                                self.error_in(problem, child.span.clone(), "mutation");
                            }
                            if link.block.mutation.is_some() {
                                self.error_in(
                                    "block has more than one <mutation> element",
                                    child.span.clone(),
                                    "mutation",
                                );
                            } else {
                                link.block.mutation = Some(mutation);
                            }
                            // Some mutations carry child elements (e.g. procedure args).
                            self.skip(cursor, &child);
                        }
                        _ => {
                            self.skip(cursor, &child);
                        }
                    }
                }
                Step::Text(..) => {}
                Step::Close(end) => {
                    link.block.span.end = end;
                    link.closed = true;
                    return None;
                }
                Step::Eof => {
                    self.unexpected_eof(&link.element);
                    link.closed = true;
                    return None;
                }
            }
        }
    }

    /// Parse a `value`, `statement` or `next` element: its name and the
    /// blocks it holds. Returns the end offset of the element.
    ///
    /// `depth` counts the sockets enclosing the element, itself included.
    /// Past [`MAX_NESTING`] the element is reported and skipped.
    fn parse_socket<'e, 'a>(
        &mut self,
        cursor: &mut Cursor<'e, 'a>,
        element: &Element<'e, 'a>,
        depth: usize,
    ) -> (String, Vec<Block>, usize) {
        let name = self.attributes(element).text("name");
        let mut blocks = Vec::new();
        if element.empty {
            return (name, blocks, element.span.end);
        }
        if depth > MAX_NESTING {
            let message = format!("blocks nested more than {} levels deep", MAX_NESTING);
            self.errors.push(
                ParseError::error(message, element.span.clone(), self.file_id)
                    .with_element(element.name())
                    .with_note("everything inside this element was skipped"),
            );
            let end = self.skip(cursor, element);
            return (name, blocks, end);
        }
        loop {
            match cursor.step() {
                Step::Open(child) if child.is("block") => {
                    blocks.push(self.parse_block(cursor, child, depth));
                }
                // <shadow> and anything else is not part of the program.
                Step::Open(child) => {
                    self.skip(cursor, &child);
                }
                Step::Text(..) => {}
                Step::Close(end) => return (name, blocks, end),
                Step::Eof => {
                    self.unexpected_eof(element);
                    return (name, blocks, element.span.end);
                }
            }
        }
    }

    /// Collect the direct character data of an element, verbatim.
    fn parse_text(&mut self, cursor: &mut Cursor<'_, '_>, element: &Element<'_, '_>) -> String {
        let mut text = String::new();
        if element.empty {
            return text;
        }
        loop {
            match cursor.step() {
                Step::Text(Event::Text(raw), span) => match raw.unescape() {
                    Ok(unescaped) => text.push_str(&unescaped),
                    Err(error) => self.error(format!("invalid text: {}", error), span),
                },
                Step::Text(Event::CData(raw), span) => match std::str::from_utf8(raw) {
                    Ok(data) => text.push_str(data),
                    Err(error) => self.error(format!("invalid CDATA: {}", error), span),
                },
                Step::Text(..) => {}
                Step::Open(child) => {
                    self.skip(cursor, &child);
                }
                Step::Close(_) => return text,
                Step::Eof => {
                    self.unexpected_eof(element);
                    return text;
                }
            }
        }
    }

    /// Skip an element and everything inside it. Returns its end offset.
    fn skip(&mut self, cursor: &mut Cursor<'_, '_>, element: &Element<'_, '_>) -> usize {
        if element.empty {
            return element.span.end;
        }
        let mut depth = 0usize;
        loop {
            match cursor.step() {
                Step::Open(child) if !child.empty => depth += 1,
                Step::Open(_) | Step::Text(..) => {}
                Step::Close(end) if depth == 0 => return end,
                Step::Close(_) => depth -= 1,
                Step::Eof => {
                    self.unexpected_eof(element);
                    return element.span.end;
                }
            }
        }
    }

    fn attributes(&mut self, element: &Element<'_, '_>) -> Attributes {
        let mut attrs = Attributes::default();
        for attr in element.start.attributes() {
            let attr = match attr {
                Ok(attr) => attr,
                Err(error) => {
                    let message = format!("malformed attribute: {}", error);
                    self.error_in(message, element.span.clone(), &element.name());
                    break;
                }
            };
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            match attr.unescape_value() {
                Ok(value) => attrs.push(key, value.into_owned()),
                Err(error) => self.error_in(
                    format!("invalid value for attribute '{}': {}", key, error),
                    element.span.clone(),
                    &element.name(),
                ),
            }
        }
        attrs
    }
}
