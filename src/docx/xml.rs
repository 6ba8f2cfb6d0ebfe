use anyhow::Context;
use quick_xml::events::{BytesDecl, BytesStart, Event};
use quick_xml::Reader;

#[derive(Clone, Debug, PartialEq)]
pub enum XmlEvent {
    Decl {
        version: String,
        encoding: Option<String>,
        standalone: Option<String>,
    },
    Start {
        name: String,
        attrs: Vec<(String, String)>,
    },
    End {
        name: String,
    },
    Empty {
        name: String,
        attrs: Vec<(String, String)>,
    },
    Text {
        text: String,
    },
    CData {
        text: String,
    },
    Comment {
        text: String,
    },
    PI {
        content: String,
    },
    DocType {
        text: String,
    },
}

impl XmlEvent {
    pub fn start(name: &str, attrs: Vec<(String, String)>) -> Self {
        XmlEvent::Start {
            name: name.to_string(),
            attrs,
        }
    }

    pub fn end(name: &str) -> Self {
        XmlEvent::End {
            name: name.to_string(),
        }
    }

    pub fn empty(name: &str, attrs: Vec<(String, String)>) -> Self {
        XmlEvent::Empty {
            name: name.to_string(),
            attrs,
        }
    }

    pub fn is_start_of(&self, element: &str) -> bool {
        matches!(self, XmlEvent::Start { name, .. } if name == element)
    }

    pub fn is_empty_of(&self, element: &str) -> bool {
        matches!(self, XmlEvent::Empty { name, .. } if name == element)
    }

    pub fn is_whitespace_text(&self) -> bool {
        matches!(self, XmlEvent::Text { text } if text.chars().all(char::is_whitespace))
    }

    pub fn attrs(&self) -> Option<&[(String, String)]> {
        match self {
            XmlEvent::Start { attrs, .. } | XmlEvent::Empty { attrs, .. } => Some(attrs.as_slice()),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct XmlPart {
    pub name: String,
    pub events: Vec<XmlEvent>,
}

pub fn parse_xml_part(name: &str, xml_bytes: &[u8]) -> anyhow::Result<XmlPart> {
    let mut reader = Reader::from_reader(xml_bytes);
    reader.config_mut().trim_text(false);

    let mut events: Vec<XmlEvent> = Vec::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let ev = reader
            .read_event_into(&mut buf)
            .with_context(|| format!("read xml event in {name}"))?;
        match ev {
            Event::Eof => break,
            Event::Decl(d) => {
                let version = bytes_to_string(d.version().context("decl version")?);
                let encoding = d
                    .encoding()
                    .map(|r| r.map(bytes_to_string))
                    .transpose()
                    .unwrap_or(None);
                let standalone = d
                    .standalone()
                    .map(|r| r.map(bytes_to_string))
                    .transpose()
                    .unwrap_or(None);
                events.push(XmlEvent::Decl {
                    version,
                    encoding,
                    standalone,
                });
            }
            Event::Start(s) => {
                events.push(XmlEvent::Start {
                    name: bytes_to_string(s.name().as_ref()),
                    attrs: collect_attrs(&s)?,
                });
            }
            Event::End(e) => {
                events.push(XmlEvent::End {
                    name: bytes_to_string(e.name().as_ref()),
                });
            }
            Event::Empty(s) => {
                events.push(XmlEvent::Empty {
                    name: bytes_to_string(s.name().as_ref()),
                    attrs: collect_attrs(&s)?,
                });
            }
            Event::Text(t) => {
                let txt = t.unescape().context("unescape text")?.into_owned();
                events.push(XmlEvent::Text { text: txt });
            }
            Event::CData(t) => {
                events.push(XmlEvent::CData {
                    text: bytes_to_string(t.into_inner()),
                });
            }
            Event::Comment(t) => {
                events.push(XmlEvent::Comment {
                    text: bytes_to_string(t.into_inner()),
                });
            }
            Event::PI(t) => {
                let target = bytes_to_string(t.target());
                let content = bytes_to_string(t.content());
                events.push(XmlEvent::PI {
                    content: format!("{target}{content}"),
                });
            }
            Event::DocType(t) => {
                events.push(XmlEvent::DocType {
                    text: bytes_to_string(t.into_inner()),
                });
            }
        }
    }

    Ok(XmlPart {
        name: name.to_string(),
        events,
    })
}

fn collect_attrs(s: &BytesStart<'_>) -> anyhow::Result<Vec<(String, String)>> {
    let mut attrs: Vec<(String, String)> = Vec::new();
    for a in s.attributes() {
        let a = a.context("attr")?;
        // Values stay in their raw escaped form so character references survive a round trip.
        attrs.push((bytes_to_string(a.key.as_ref()), bytes_to_string(a.value.as_ref())));
    }
    Ok(attrs)
}

fn bytes_to_string(bytes: impl AsRef<[u8]>) -> String {
    String::from_utf8_lossy(bytes.as_ref()).into_owned()
}

pub fn write_xml_part(part: &XmlPart) -> anyhow::Result<Vec<u8>> {
    write_events(&part.events).with_context(|| format!("serialize xml: {}", part.name))
}

pub fn write_events(events: &[XmlEvent]) -> anyhow::Result<Vec<u8>> {
    let mut out: Vec<u8> = Vec::new();

    fn escape_text_into(out: &mut Vec<u8>, text: &str) {
        for ch in text.chars() {
            match ch {
                '&' => out.extend_from_slice(b"&amp;"),
                '<' => out.extend_from_slice(b"&lt;"),
                '>' => out.extend_from_slice(b"&gt;"),
                _ => {
                    let mut buf = [0u8; 4];
                    out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                }
            }
        }
    }

    fn write_start_like(out: &mut Vec<u8>, name: &str, attrs: &[(String, String)], empty: bool) {
        out.push(b'<');
        out.extend_from_slice(name.as_bytes());
        // Raw attribute bytes; never escape a second time.
        for (k, v) in attrs {
            out.push(b' ');
            out.extend_from_slice(k.as_bytes());
            out.extend_from_slice(b"=\"");
            out.extend_from_slice(v.as_bytes());
            out.push(b'"');
        }
        if empty {
            out.extend_from_slice(b"/>");
        } else {
            out.push(b'>');
        }
    }

    for ev in events {
        match ev {
            XmlEvent::Decl {
                version,
                encoding,
                standalone,
            } => {
                let d =
                    BytesDecl::new(version.as_str(), encoding.as_deref(), standalone.as_deref());
                let mut writer = quick_xml::Writer::new(Vec::new());
                writer.write_event(Event::Decl(d)).context("write decl")?;
                out.extend_from_slice(&writer.into_inner());
            }
            XmlEvent::Start { name, attrs } => write_start_like(&mut out, name, attrs, false),
            XmlEvent::End { name } => {
                out.extend_from_slice(b"</");
                out.extend_from_slice(name.as_bytes());
                out.push(b'>');
            }
            XmlEvent::Empty { name, attrs } => write_start_like(&mut out, name, attrs, true),
            XmlEvent::Text { text } => escape_text_into(&mut out, text),
            XmlEvent::CData { text } => {
                out.extend_from_slice(b"<![CDATA[");
                out.extend_from_slice(text.as_bytes());
                out.extend_from_slice(b"]]>");
            }
            XmlEvent::Comment { text } => {
                out.extend_from_slice(b"<!--");
                out.extend_from_slice(text.as_bytes());
                out.extend_from_slice(b"-->");
            }
            XmlEvent::PI { content } => {
                out.extend_from_slice(b"<?");
                out.extend_from_slice(content.as_bytes());
                out.extend_from_slice(b"?>");
            }
            XmlEvent::DocType { text } => {
                out.extend_from_slice(b"<!DOCTYPE");
                out.extend_from_slice(text.as_bytes());
                out.push(b'>');
            }
        }
    }

    Ok(out)
}

pub fn find_attr<'a>(attrs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Sets `key` in place, appending it when absent.
pub fn set_attr(attrs: &mut Vec<(String, String)>, key: &str, value: &str) {
    for (k, v) in attrs.iter_mut() {
        if k == key {
            *v = value.to_string();
            return;
        }
    }
    attrs.push((key.to_string(), value.to_string()));
}

/// Returns the events of the element starting at `start` and the index right after it.
pub fn collect_subtree(events: &[XmlEvent], start: usize) -> (Vec<XmlEvent>, usize) {
    if let Some(ev @ XmlEvent::Empty { .. }) = events.get(start) {
        return (vec![ev.clone()], start + 1);
    }
    let mut out: Vec<XmlEvent> = Vec::new();
    let mut depth = 0i32;

    let mut i = start;
    while i < events.len() {
        let ev = events[i].clone();
        match &ev {
            XmlEvent::Start { .. } => depth += 1,
            XmlEvent::End { .. } => depth -= 1,
            _ => {}
        }
        out.push(ev);
        i += 1;
        if depth == 0 {
            break;
        }
    }
    (out, i)
}

#[cfg(test)]
mod tests {
    use super::{collect_subtree, parse_xml_part, set_attr, write_xml_part, XmlEvent};

    #[test]
    fn write_preserves_attr_entity_refs() {
        let xml = br#"<?xml version="1.0" encoding="UTF-8"?><root xmlns:o="urn:test" o:gfxdata="A&#xD;&#xA;B"/>"#;
        let part = parse_xml_part("test.xml", xml).expect("parse xml");
        let out = write_xml_part(&part).expect("write xml");
        let s = String::from_utf8(out).expect("utf8");

        assert!(s.contains(r#"o:gfxdata="A&#xD;&#xA;B""#));
        assert!(!s.contains(r#"o:gfxdata="A&amp;#xD;"#));
    }

    #[test]
    fn text_is_escaped_on_write() {
        let xml = br#"<w:t>a &amp; b &lt; c</w:t>"#;
        let part = parse_xml_part("t.xml", xml).expect("parse xml");
        assert_eq!(
            part.events[1],
            XmlEvent::Text {
                text: "a & b < c".to_string()
            }
        );
        let out = String::from_utf8(write_xml_part(&part).expect("write")).expect("utf8");
        assert_eq!(out, "<w:t>a &amp; b &lt; c</w:t>");
    }

    #[test]
    fn subtree_stops_at_matching_end() {
        let xml = br#"<a><b><c/></b><d/></a>"#;
        let part = parse_xml_part("t.xml", xml).expect("parse xml");
        let (sub, next) = collect_subtree(&part.events, 1);
        assert_eq!(sub.len(), 3);
        assert!(part.events[next].is_empty_of("d"));
        let (single, next) = collect_subtree(&part.events, 2);
        assert_eq!(single.len(), 1);
        assert_eq!(next, 3);
    }

    #[test]
    fn set_attr_replaces_or_appends() {
        let mut attrs = vec![("w:val".to_string(), "1".to_string())];
        set_attr(&mut attrs, "w:val", "2");
        set_attr(&mut attrs, "w:other", "x");
        assert_eq!(attrs[0].1, "2");
        assert_eq!(attrs.len(), 2);
    }
}
