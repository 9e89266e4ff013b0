//! Page payload parsing.
//!
//! The API answers with `<root><srchList><scn_list>...</scn_list></srchList></root>`.
//! Only direct children are considered at each level and only the first
//! `srchList` counts.

use std::collections::BTreeMap;
use std::fmt::Display;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::ParseError;

pub const RESULT_LIST: &str = "srchList";
pub const ROW: &str = "scn_list";

/// Leaf fields of one `scn_list` element, keyed by element name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    fields: BTreeMap<String, String>,
}

impl RawRow {
    pub fn from_fields<K, V, I>(fields: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    // The first occurrence of a repeated field wins.
    fn insert(&mut self, name: String, text: String) {
        self.fields.entry(name).or_insert(text);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListState {
    NotSeen,
    Inside,
    Closed,
}

fn invalid(err: impl Display) -> ParseError {
    ParseError::InvalidXml {
        reason: err.to_string(),
    }
}

fn element_name(raw: &[u8]) -> Result<String, ParseError> {
    std::str::from_utf8(raw).map(str::to_string).map_err(invalid)
}

/// Returns the rows of the result list in document order. An empty vector
/// means the list was present but had no rows.
pub fn parse_page(payload: &[u8]) -> Result<Vec<RawRow>, ParseError> {
    let payload = payload.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(payload);
    let mut reader = Reader::from_reader(payload);
    reader.config_mut().trim_text(true);

    let mut depth = 0usize;
    let mut saw_root = false;
    let mut list = ListState::NotSeen;
    let mut rows = Vec::new();
    let mut row: Option<RawRow> = None;
    let mut field: Option<(String, String)> = None;

    loop {
        match reader.read_event().map_err(invalid)? {
            Event::Start(e) => {
                if depth == 0 {
                    if saw_root {
                        return Err(invalid("multiple root elements"));
                    }
                    saw_root = true;
                }
                depth += 1;
                let name = element_name(e.local_name().as_ref())?;
                match depth {
                    2 if list == ListState::NotSeen && name == RESULT_LIST => {
                        list = ListState::Inside;
                    }
                    3 if list == ListState::Inside && name == ROW => {
                        row = Some(RawRow::default());
                    }
                    4 if row.is_some() => field = Some((name, String::new())),
                    _ => {}
                }
            }
            Event::Empty(e) => {
                if depth == 0 {
                    if saw_root {
                        return Err(invalid("multiple root elements"));
                    }
                    saw_root = true;
                }
                let name = element_name(e.local_name().as_ref())?;
                match depth + 1 {
                    2 if list == ListState::NotSeen && name == RESULT_LIST => {
                        list = ListState::Closed;
                    }
                    3 if list == ListState::Inside && name == ROW => {
                        rows.push(RawRow::default());
                    }
                    4 => {
                        if let Some(row) = row.as_mut() {
                            row.insert(name, String::new());
                        }
                    }
                    _ => {}
                }
            }
            Event::Text(t) => {
                if depth == 0 {
                    return Err(invalid("text outside the root element"));
                }
                if depth == 4 {
                    if let Some((_, text)) = field.as_mut() {
                        text.push_str(&t.unescape().map_err(invalid)?);
                    }
                }
            }
            Event::CData(c) => {
                if depth == 4 {
                    if let Some((_, text)) = field.as_mut() {
                        text.push_str(&String::from_utf8_lossy(&c));
                    }
                }
            }
            Event::End(_) => {
                match depth {
                    4 => {
                        if let (Some(row), Some((name, text))) = (row.as_mut(), field.take()) {
                            row.insert(name, text.trim().to_string());
                        }
                    }
                    3 => {
                        if let Some(done) = row.take() {
                            rows.push(done);
                        }
                    }
                    2 if list == ListState::Inside => list = ListState::Closed,
                    _ => {}
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if depth != 0 {
        return Err(invalid("document ended inside an open element"));
    }
    if !saw_root {
        return Err(invalid("no root element"));
    }
    if list == ListState::NotSeen {
        return Err(ParseError::MissingResultList);
    }
    Ok(rows)
}
