//! Markup tokenizer using logos
//!
//! Two token sets share one source: [`Content`] between tags and [`Attr`]
//! inside an opening tag. The lexer morphs between them, so quotes in text
//! never swallow a following tag.

use logos::{Lexer, Logos};

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

#[derive(Logos, Debug, Clone, PartialEq)]
enum Content {
    #[regex(r"<[a-zA-Z][a-zA-Z0-9-]*", |lex| lex.slice()[1..].to_ascii_lowercase())]
    TagStart(String),

    #[regex(r"</[a-zA-Z][a-zA-Z0-9-]*[ \t\r\n]*>", |lex| {
        lex.slice()[2..lex.slice().len() - 1].trim_end().to_ascii_lowercase()
    })]
    TagClose(String),

    // Comments, doctype and CDATA
    #[regex(r"<![^>]*>")]
    Declaration,

    #[regex(r"[^<]+")]
    Text,

    #[token("<")]
    Stray,
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
enum Attr {
    #[regex(r#"[^ \t\r\n"'<>/=]+"#)]
    Name,

    #[token("=")]
    Equals,

    #[regex(r#""[^"]*""#)]
    #[regex(r"'[^']*'")]
    Quoted,

    #[token(">")]
    End,

    #[token("/>")]
    SelfClose,

    #[token("/")]
    Slash,
}

/// An attribute of an opening tag
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    /// Lower-cased attribute name
    pub name: String,
    /// Value with entities still encoded; `None` for bare attributes
    pub raw_value: Option<String>,
    /// Span of the value text, quotes excluded
    pub value_span: Option<Span>,
}

impl Attribute {
    /// Value with character references decoded
    pub fn value(&self) -> Option<String> {
        self.raw_value.as_deref().map(decode_entities)
    }
}

/// A tag-level markup event
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Open {
        name: String,
        attributes: Vec<Attribute>,
        self_closing: bool,
        span: Span,
    },
    Close {
        name: String,
        span: Span,
    },
}

/// Lex markup into tag events; text and declarations are dropped
pub fn lex(input: &str) -> Vec<Event> {
    let mut events = Vec::new();
    let mut content = Content::lexer(input);
    while let Some(token) = content.next() {
        let span = content.span();
        match token {
            Ok(Content::TagStart(name)) => {
                let mut attrs = content.morph::<Attr>();
                let (attributes, self_closing, end) = read_attributes(&mut attrs, input);
                events.push(Event::Open {
                    name,
                    attributes,
                    self_closing,
                    span: span.start..end,
                });
                content = attrs.morph();
            }
            Ok(Content::TagClose(name)) => events.push(Event::Close { name, span }),
            Ok(Content::Declaration | Content::Text | Content::Stray) | Err(_) => {}
        }
    }
    events
}

/// Consume attributes up to the end of the tag. Returns the attributes,
/// whether the tag closed itself and the end offset of the tag.
///
/// An unquoted value runs over adjacent name, `/` and `=` tokens, so
/// `src=a/b.png` is one value.
fn read_attributes<'s>(lex: &mut Lexer<'s, Attr>, input: &'s str) -> (Vec<Attribute>, bool, usize) {
    let mut attributes: Vec<Attribute> = Vec::new();
    let mut pending_value = false;
    let mut unquoted: Option<Span> = None;
    while let Some(token) = lex.next() {
        let span = lex.span();
        if let Some(value) = unquoted.take() {
            if value.end == span.start && matches!(token, Ok(Attr::Name | Attr::Slash | Attr::Equals)) {
                unquoted = Some(value.start..span.end);
                continue;
            }
            set_value(&mut attributes, &input[value.clone()], value);
        }
        match token {
            Ok(Attr::End) => return (attributes, false, span.end),
            Ok(Attr::SelfClose) => return (attributes, true, span.end),
            Ok(Attr::Equals) => pending_value = !attributes.is_empty(),
            Ok(Attr::Name | Attr::Slash) if pending_value => {
                unquoted = Some(span);
                pending_value = false;
            }
            Ok(Attr::Quoted) if pending_value => {
                set_value(&mut attributes, &lex.slice()[1..span.len() - 1], span.start + 1..span.end - 1);
                pending_value = false;
            }
            Ok(Attr::Name) => attributes.push(Attribute {
                name: lex.slice().to_ascii_lowercase(),
                raw_value: None,
                value_span: None,
            }),
            Ok(Attr::Quoted | Attr::Slash) | Err(_) => pending_value = false,
        }
    }
    if let Some(value) = unquoted {
        set_value(&mut attributes, &input[value.clone()], value);
    }
    (attributes, false, input.len())
}

fn set_value(attributes: &mut [Attribute], raw: &str, span: Span) {
    if let Some(last) = attributes.last_mut() {
        last.raw_value = Some(raw.to_string());
        last.value_span = Some(span);
    }
}

/// Decode HTML character references; unknown references are kept verbatim
pub fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest
            .find(';')
            .filter(|&end| end <= 10)
            .and_then(|end| decode_reference(&rest[1..end]).map(|c| (c, end)));
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse().ok()?
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(events: &[Event]) -> Vec<String> {
        events
            .iter()
            .map(|e| match e {
                Event::Open { name, .. } => name.clone(),
                Event::Close { name, .. } => format!("/{}", name),
            })
            .collect()
    }

    #[test]
    fn test_open_and_close_tags() {
        let events = lex("<DIV><p>text</p></div >");
        assert_eq!(names(&events), vec!["div", "p", "/p", "/div"]);
    }

    #[test]
    fn test_attributes() {
        let events = lex(r#"<div id=map1 class="gmap big" data-x='1' hidden>"#);
        let Event::Open { attributes, .. } = &events[0] else {
            panic!("expected open tag");
        };
        let pairs: Vec<_> = attributes
            .iter()
            .map(|a| (a.name.as_str(), a.value()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("id", Some("map1".to_string())),
                ("class", Some("gmap big".to_string())),
                ("data-x", Some("1".to_string())),
                ("hidden", None),
            ]
        );
    }

    #[test]
    fn test_unquoted_value_with_slashes() {
        let input = "<img src=media/pin.png?a=b alt=/x data-y=1/>";
        let events = lex(input);
        let Event::Open { attributes, self_closing, .. } = &events[0] else {
            panic!("expected open tag");
        };
        let pairs: Vec<_> = attributes
            .iter()
            .map(|a| (a.name.as_str(), a.value()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("src", Some("media/pin.png?a=b".to_string())),
                ("alt", Some("/x".to_string())),
                ("data-y", Some("1".to_string())),
            ]
        );
        assert!(*self_closing);
        let span = attributes[0].value_span.clone().unwrap();
        assert_eq!(&input[span], "media/pin.png?a=b");
    }

    #[test]
    fn test_value_span_excludes_quotes() {
        let src = r#"<div class="abc">"#;
        let events = lex(src);
        let Event::Open { attributes, span, .. } = &events[0] else {
            panic!("expected open tag");
        };
        let value_span = attributes[0].value_span.clone().unwrap();
        assert_eq!(&src[value_span], "abc");
        assert_eq!(span.clone(), 0..src.len());
    }

    #[test]
    fn test_self_closing() {
        let events = lex(r#"<img src="a.png" /><br/>"#);
        assert!(matches!(&events[0], Event::Open { self_closing: true, .. }));
        assert!(matches!(&events[1], Event::Open { name, self_closing: true, .. } if name == "br"));
    }

    #[test]
    fn test_quotes_in_text_do_not_hide_tags() {
        let events = lex(r#"<p>don't</p><div class='x'></div>"#);
        assert_eq!(names(&events), vec!["p", "/p", "div", "/div"]);
    }

    #[test]
    fn test_comments_skipped() {
        let events = lex("<!-- <div> --><!DOCTYPE html><span></span>");
        assert_eq!(names(&events), vec!["span", "/span"]);
    }

    #[test]
    fn test_stray_angle_bracket() {
        let events = lex("a < b <i>x</i>");
        assert_eq!(names(&events), vec!["i", "/i"]);
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(
            decode_entities("{&quot;cls&quot;: &#34;Map&#x22;} &amp;&lt;&gt;&#39;"),
            r#"{"cls": "Map"} &<>'"#
        );
        assert_eq!(decode_entities("a & b &bogus; &"), "a & b &bogus; &");
    }
}
