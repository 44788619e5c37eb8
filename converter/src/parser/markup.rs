//! Target datasource markup parsing.
//!
//! Reads `<datasource name=".." caption="..">` and
//! `<column name=".." datatype=".." role=".." type="..">` elements at any
//! depth. The document must be well-formed: one root element, matching end
//! tags, unique attributes.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;

use crate::models::{DataColumn, ResolvedDatasource};

/// Parse a datasource definition.
///
/// The last `<datasource>` element wins. Columns lacking a non-empty `name`,
/// `role` or `type` are left out.
pub fn parse_datasource_markup(markup: &str) -> Result<ResolvedDatasource, String> {
    let mut reader = Reader::from_str(markup);
    reader.trim_text(true);

    let mut resolved = ResolvedDatasource::default();
    let mut depth = 0usize;
    let mut saw_root = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                open_element(depth, &mut saw_root)?;
                depth += 1;
                visit(&e, &mut resolved)?;
            }
            Ok(Event::Empty(e)) => {
                open_element(depth, &mut saw_root)?;
                visit(&e, &mut resolved)?;
            }
            Ok(Event::End(e)) => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    format!(
                        "unexpected closing tag </{}>",
                        String::from_utf8_lossy(e.name().as_ref())
                    )
                })?;
            }
            Ok(Event::Text(_)) | Ok(Event::CData(_)) if depth == 0 => {
                return Err("text outside of the root element".to_string());
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(format!("{} at position {}", e, reader.buffer_position()));
            }
            _ => {}
        }
    }

    if !saw_root {
        return Err("no root element".to_string());
    }
    if depth != 0 {
        return Err(format!("{depth} unclosed element(s) at end of input"));
    }
    Ok(resolved)
}

fn open_element(depth: usize, saw_root: &mut bool) -> Result<(), String> {
    if depth == 0 {
        if *saw_root {
            return Err("multiple root elements".to_string());
        }
        *saw_root = true;
    }
    Ok(())
}

fn visit(element: &BytesStart, resolved: &mut ResolvedDatasource) -> Result<(), String> {
    match element.name().as_ref() {
        b"datasource" => {
            let mut attrs = attributes(element)?;
            resolved.declared = true;
            resolved.name = attrs.remove("name");
            resolved.caption = attrs.remove("caption");
        }
        b"column" => {
            let mut attrs = attributes(element)?;
            let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());
            if let (Some(name), Some(role), Some(kind)) = (
                non_empty(attrs.remove("name")),
                non_empty(attrs.remove("role")),
                non_empty(attrs.remove("type")),
            ) {
                resolved.columns.insert(
                    name.clone(),
                    DataColumn {
                        datatype: attrs.remove("datatype"),
                        name,
                        role,
                        kind,
                    },
                );
            }
        }
        _ => {}
    }
    Ok(())
}

fn attributes(element: &BytesStart) -> Result<HashMap<String, String>, String> {
    let mut attrs = HashMap::new();
    for attr in element.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|e| e.to_string())?.into_owned();
        attrs.insert(key, value);
    }
    Ok(attrs)
}
