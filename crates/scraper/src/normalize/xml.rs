//! XML to JSON tree conversion.
//!
//! Elements become object keys, repeated siblings become arrays, leaf text
//! becomes a string and empty elements become `null`. Attributes are ignored.

use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::{Map, Value};

use crate::errors::{Result, ScrapeError};

/// An element still open while reading.
struct OpenElement {
    name: String,
    children: Map<String, Value>,
    text: String,
}

impl OpenElement {
    fn new(name: String) -> Self {
        Self {
            name,
            children: Map::new(),
            text: String::new(),
        }
    }

    fn into_value(self) -> (String, Value) {
        let value = if !self.children.is_empty() {
            Value::Object(self.children)
        } else if self.text.is_empty() {
            Value::Null
        } else {
            Value::String(self.text)
        };
        (self.name, value)
    }
}

/// Parse an XML document into `{ rootName: value }`.
pub fn xml_to_value(xml: &str) -> Result<Value> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut stack: Vec<OpenElement> = Vec::new();
    let mut root: Option<(String, Value)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                stack.push(OpenElement::new(name));
            }
            Ok(Event::Empty(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                attach(&mut stack, &mut root, name, Value::Null);
            }
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| ScrapeError::Parse(format!("invalid XML text: {}", e)))?;
                if let Some(open) = stack.last_mut() {
                    open.text.push_str(&text);
                }
            }
            Ok(Event::CData(c)) => {
                if let Some(open) = stack.last_mut() {
                    open.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Ok(Event::End(_)) => {
                let open = stack
                    .pop()
                    .ok_or_else(|| ScrapeError::Parse("unbalanced XML end tag".to_string()))?;
                let (name, value) = open.into_value();
                attach(&mut stack, &mut root, name, value);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(ScrapeError::Parse(format!(
                    "invalid XML at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
        }
    }

    if !stack.is_empty() {
        return Err(ScrapeError::Parse("unterminated XML element".to_string()));
    }

    let (name, value) = root.ok_or_else(|| ScrapeError::Parse("empty XML document".to_string()))?;
    let mut document = Map::new();
    document.insert(name, value);
    Ok(Value::Object(document))
}

fn attach(stack: &mut [OpenElement], root: &mut Option<(String, Value)>, name: String, value: Value) {
    match stack.last_mut() {
        Some(parent) => insert_child(&mut parent.children, name, value),
        None => *root = Some((name, value)),
    }
}

/// Insert a child, turning repeated names into an array.
fn insert_child(children: &mut Map<String, Value>, name: String, value: Value) {
    match children.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            children.insert(name, value);
        }
    }
}
