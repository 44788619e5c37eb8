//! JSON to XML rendering for target documents.
//!
//! Follows the usual dict-to-XML conventions:
//!
//! - keys starting with `@` become attributes of the enclosing element
//! - `#text` becomes the element's text
//! - arrays repeat the element once per item
//! - `null` renders as an empty element
//! - scalars render as text

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde_json::{Map, Value};
use std::path::Path;

use crate::artifact::write_text;
use crate::error::TargetResult;

/// Render `value` as an XML document with root element `root`.
pub fn json_to_xml(root: &str, value: &Value) -> TargetResult<String> {
    let mut output = Vec::new();
    let mut writer = Writer::new_with_indent(&mut output, b'\t', 1);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    write_element(&mut writer, root, value)?;

    let mut xml = String::from_utf8(output)?;
    xml.push('\n');
    Ok(xml)
}

/// Render and write `value` to `path`.
pub fn write_xml(path: &Path, root: &str, value: &Value) -> TargetResult<()> {
    let xml = json_to_xml(root, value)?;
    write_text(path, &xml)?;
    Ok(())
}

fn write_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    value: &Value,
) -> TargetResult<()> {
    match value {
        Value::Array(items) => {
            for item in items {
                write_element(writer, name, item)?;
            }
        }
        Value::Object(map) => write_object(writer, name, map)?,
        Value::Null => {
            writer.write_event(Event::Empty(BytesStart::new(name)))?;
        }
        scalar => {
            writer.write_event(Event::Start(BytesStart::new(name)))?;
            writer.write_event(Event::Text(BytesText::new(&scalar_text(scalar))))?;
            writer.write_event(Event::End(BytesEnd::new(name)))?;
        }
    }
    Ok(())
}

fn write_object<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    map: &Map<String, Value>,
) -> TargetResult<()> {
    let mut start = BytesStart::new(name);
    for (key, value) in map {
        if let Some(attr) = key.strip_prefix('@') {
            if !value.is_null() {
                start.push_attribute((attr, scalar_text(value).as_str()));
            }
        }
    }

    let text = map.get("#text").filter(|v| !v.is_null()).map(scalar_text);
    let children: Vec<_> = map
        .iter()
        .filter(|(k, _)| !k.starts_with('@') && k.as_str() != "#text")
        .collect();

    if text.is_none() && children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start.borrow()))?;
    if let Some(text) = text {
        writer.write_event(Event::Text(BytesText::new(&text)))?;
    }
    for (key, child) in children {
        write_element(writer, key, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
