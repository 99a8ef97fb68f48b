// src/ingest/unwrap.rs
//! Payload unwrappers: raw transport body in, plain `serde_json::Value` tree out.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

/// Anti-hijacking literal some sources put in front of their JSON.
pub const GUARD_PREFIX: &str = "])}while(1);</x>";

/// Reserved key holding an element's attributes in the XML tree.
pub const XML_ATTRS_KEY: &str = "$";
/// Reserved key holding an element's text when it also has attributes or children.
pub const XML_TEXT_KEY: &str = "_";

#[derive(Debug, thiserror::Error)]
pub enum UnwrapError {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid xml: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("invalid xml attribute: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),
    #[error("xml document is unbalanced")]
    Unbalanced,
    #[error("xml document has no root element")]
    NoRoot,
}

/// Plain JSON body, parsed as-is.
pub fn json(body: &str) -> Result<Value, UnwrapError> {
    Ok(serde_json::from_str(body)?)
}

/// JSON that may carry [`GUARD_PREFIX`]. Only that exact leading literal is
/// removed; a body without it parses like plain JSON.
pub fn guarded_json(body: &str) -> Result<Value, UnwrapError> {
    let trimmed = body.trim_start();
    json(trimmed.strip_prefix(GUARD_PREFIX).unwrap_or(trimmed))
}

/// XML document as a tree, one key per element name.
///
/// The root becomes `{ name: element }`. Inside an element every child name
/// maps to an array of child representations (in document order). An element
/// with neither attributes nor children collapses to its text; otherwise its
/// attributes sit under `"$"` and its text under `"_"`.
pub fn xml_tree(body: &str) -> Result<Value, UnwrapError> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<(String, Value)> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => stack.push(XmlNode::open(&e)?),
            Event::Empty(e) => {
                let node = XmlNode::open(&e)?;
                attach(&mut stack, &mut root, node);
            }
            Event::Text(t) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&decode_entities(&t));
                }
            }
            Event::CData(c) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::End(_) => {
                let node = stack.pop().ok_or(UnwrapError::Unbalanced)?;
                attach(&mut stack, &mut root, node);
            }
            Event::Eof => break,
            // declarations, comments, processing instructions, doctype
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(UnwrapError::Unbalanced);
    }
    let (name, value) = root.ok_or(UnwrapError::NoRoot)?;
    let mut doc = Map::new();
    doc.insert(name, value);
    Ok(Value::Object(doc))
}

struct XmlNode {
    name: String,
    attrs: Map<String, Value>,
    children: Map<String, Value>,
    text: String,
}

impl XmlNode {
    fn open(e: &BytesStart<'_>) -> Result<Self, UnwrapError> {
        let mut attrs = Map::new();
        for attr in e.attributes() {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = decode_entities(&attr.value);
            attrs.insert(key, Value::String(value));
        }
        Ok(Self {
            name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
            attrs,
            children: Map::new(),
            text: String::new(),
        })
    }

    fn into_value(self) -> Value {
        if self.attrs.is_empty() && self.children.is_empty() {
            return Value::String(self.text);
        }
        let mut out = Map::new();
        if !self.attrs.is_empty() {
            out.insert(XML_ATTRS_KEY.to_string(), Value::Object(self.attrs));
        }
        if !self.text.is_empty() {
            out.insert(XML_TEXT_KEY.to_string(), Value::String(self.text));
        }
        out.extend(self.children);
        Value::Object(out)
    }
}

fn attach(stack: &mut [XmlNode], root: &mut Option<(String, Value)>, node: XmlNode) {
    let name = node.name.clone();
    let value = node.into_value();
    match stack.last_mut() {
        Some(parent) => {
            let slot = parent
                .children
                .entry(name)
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(items) = slot {
                items.push(value);
            }
        }
        None => *root = Some((name, value)),
    }
}

/// Upstream XML leaks HTML entities (`&eacute;`, `&nbsp;`) that a strict XML
/// unescape rejects. Decode the full HTML set; unknown names stay literal.
fn decode_entities(raw: &[u8]) -> String {
    let raw = String::from_utf8_lossy(raw);
    html_escape::decode_html_entities(&raw).replace('\u{a0}', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn guard_prefix_is_stripped() {
        let plain = r#"{"success":true,"payload":{"references":{}}}"#;
        let guarded = format!("{GUARD_PREFIX}{plain}");
        assert_eq!(guarded_json(&guarded).unwrap(), guarded_json(plain).unwrap());
        assert_eq!(guarded_json(plain).unwrap(), json(plain).unwrap());
    }

    #[test]
    fn guard_is_only_removed_as_a_prefix() {
        let body = format!(r#"{{"note":"{GUARD_PREFIX}"}}"#);
        let v = guarded_json(&body).unwrap();
        assert_eq!(v["note"], GUARD_PREFIX);
    }

    #[test]
    fn truncated_guarded_body_is_an_error() {
        assert!(guarded_json("])}while(1);</x>{\"a\":").is_err());
    }

    #[test]
    fn xml_elements_become_arrays_with_text_and_attrs() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<GoodreadsResponse>
  <reviews start="1" end="2">
    <review><book><title>Dune</title><image_url nophoto="false">http://img/1.jpg</image_url></book></review>
    <review><book><title><![CDATA[Solaris & more]]></title><authors/></book></review>
  </reviews>
</GoodreadsResponse>"#;
        let v = xml_tree(xml).unwrap();
        let reviews = &v["GoodreadsResponse"]["reviews"][0];
        assert_eq!(reviews["$"], json!({ "start": "1", "end": "2" }));
        assert_eq!(reviews["review"].as_array().unwrap().len(), 2);
        assert_eq!(reviews["review"][0]["book"][0]["title"][0], "Dune");
        assert_eq!(
            reviews["review"][0]["book"][0]["image_url"][0],
            json!({ "$": { "nophoto": "false" }, "_": "http://img/1.jpg" })
        );
        assert_eq!(reviews["review"][1]["book"][0]["title"][0], "Solaris & more");
        assert_eq!(reviews["review"][1]["book"][0]["authors"][0], "");
    }

    #[test]
    fn html_entities_do_not_break_parsing() {
        let v = xml_tree("<a><b>x&nbsp;&amp;&nbsp;y</b></a>").unwrap();
        assert_eq!(v["a"]["b"][0], "x & y");
    }

    #[test]
    fn any_html_entity_decodes_and_unknown_ones_stay_literal() {
        let v = xml_tree(
            r#"<r><review><book><title>Caf&eacute; &copy; M&auml;rz</title><description>a &bogus; b</description></book></review></r>"#,
        )
        .unwrap();
        let book = &v["r"]["review"][0]["book"][0];
        assert_eq!(book["title"][0], "Café © März");
        assert_eq!(book["description"][0], "a &bogus; b");
    }

    #[test]
    fn attribute_values_decode_entities_too() {
        let v = xml_tree(r#"<r><a title="&lt;caf&eacute;&gt;">x</a></r>"#).unwrap();
        assert_eq!(v["r"]["a"][0]["$"]["title"], "<café>");
    }

    #[test]
    fn malformed_xml_is_an_error() {
        assert!(xml_tree("<a><b></a>").is_err());
        assert!(xml_tree("<a><b>").is_err());
        assert!(xml_tree("").is_err());
    }
}
