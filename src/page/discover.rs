//! Finding map containers in page markup

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use super::lexer::{self, Attribute, Event, Span};
use crate::config::HostConfig;
use crate::error::char_span;

/// Elements that never have content or a closing tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

#[derive(Error, Debug)]
pub enum MarkupError {
    #[error("map container {id}: invalid configuration: {message}")]
    InvalidConfig {
        id: String,
        span: Span,
        message: String,
    },
}

impl MarkupError {
    pub fn span(&self) -> &Span {
        match self {
            MarkupError::InvalidConfig { span, .. } => span,
        }
    }

    /// Format the error with page context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        self.format_with(source, filename, true)
    }

    /// As [`MarkupError::format`], optionally without ANSI colors
    pub fn format_with(&self, source: &str, filename: &str, color: bool) -> String {
        let mut buf = Vec::new();
        let MarkupError::InvalidConfig { span, message, .. } = self;
        let span = char_span(source, span);
        let written = Report::build(ReportKind::Error, filename, span.start)
            .with_config(Config::default().with_color(color))
            .with_message(self.to_string())
            .with_label(
                Label::new((filename, span))
                    .with_message(message)
                    .with_color(Color::Red),
            )
            .finish()
            .write((filename, Source::from(source)), &mut buf);
        match (written, String::from_utf8(buf)) {
            (Ok(()), Ok(report)) => report,
            _ => self.to_string(),
        }
    }
}

/// Index of an element in a [`Document`]
pub type ElementId = usize;

/// A parsed element
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub span: Span,
    pub parent: Option<ElementId>,
    pub children: Vec<ElementId>,
}

impl Element {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Whitespace-separated classes
    pub fn classes(&self) -> Vec<String> {
        self.attribute("class")
            .and_then(Attribute::value)
            .map(|v| v.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().iter().any(|c| c == class)
    }

    /// Hidden by itself, ignoring ancestors
    fn hides_itself(&self) -> bool {
        if self.attribute("hidden").is_some() {
            return true;
        }
        self.attribute("style")
            .and_then(Attribute::value)
            .map(|style| {
                let compact: String = style
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .collect::<String>()
                    .to_ascii_lowercase();
                compact.split(';').any(|decl| decl == "display:none")
            })
            .unwrap_or(false)
    }
}

/// Element tree of a page, in document order
#[derive(Debug, Clone, Default)]
pub struct Document {
    elements: Vec<Element>,
}

impl Document {
    /// Build the tree from markup. Unclosed elements end with the page and
    /// stray closing tags are ignored.
    pub fn parse(markup: &str) -> Self {
        let mut elements: Vec<Element> = Vec::new();
        let mut open: Vec<ElementId> = Vec::new();
        for event in lexer::lex(markup) {
            match event {
                Event::Open {
                    name,
                    attributes,
                    self_closing,
                    span,
                } => {
                    let id = elements.len();
                    let parent = open.last().copied();
                    if let Some(parent) = parent {
                        elements[parent].children.push(id);
                    }
                    let is_void = self_closing || VOID_ELEMENTS.contains(&name.as_str());
                    elements.push(Element {
                        name,
                        attributes,
                        span,
                        parent,
                        children: Vec::new(),
                    });
                    if !is_void {
                        open.push(id);
                    }
                }
                Event::Close { name, .. } => {
                    if let Some(depth) = open.iter().rposition(|&id| elements[id].name == name) {
                        open.truncate(depth);
                    }
                }
            }
        }
        Self { elements }
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn elements(&self) -> impl Iterator<Item = (ElementId, &Element)> {
        self.elements.iter().enumerate()
    }

    /// Neither the element nor any ancestor is hidden
    pub fn is_visible(&self, id: ElementId) -> bool {
        let mut current = self.elements.get(id);
        while let Some(element) = current {
            if element.hides_itself() {
                return false;
            }
            current = element.parent.and_then(|p| self.elements.get(p));
        }
        true
    }

    /// First child element named `name`
    pub fn child(&self, id: ElementId, name: &str) -> Option<ElementId> {
        self.elements
            .get(id)?
            .children
            .iter()
            .copied()
            .find(|&c| self.elements[c].name == name)
    }
}

/// A map container found in the page
#[derive(Debug, Clone, PartialEq)]
pub struct MapSite {
    /// `id` of the container, or its position among containers
    pub id: String,
    pub element: ElementId,
    /// The inner `div` the live map is drawn in
    pub canvas: ElementId,
    /// Decoded configuration JSON
    pub config_text: String,
    /// Where the configuration sits in the page
    pub config_span: Span,
    /// Whether a static placeholder image is present
    pub has_image: bool,
}

impl MapSite {
    pub fn parse_config(&self) -> Result<Value, MarkupError> {
        serde_json::from_str(&self.config_text).map_err(|e| MarkupError::InvalidConfig {
            id: self.id.clone(),
            span: self.config_span.clone(),
            message: e.to_string(),
        })
    }
}

/// Every visible container of `config.container_class`, in document order
pub fn discover(markup: &str, config: &HostConfig) -> Vec<MapSite> {
    let document = Document::parse(markup);
    discover_in(&document, config)
}

pub fn discover_in(document: &Document, config: &HostConfig) -> Vec<MapSite> {
    let mut sites = Vec::new();
    for (id, element) in document.elements() {
        if element.name != "div" || !element.has_class(&config.container_class) {
            continue;
        }
        if !document.is_visible(id) {
            continue;
        }
        let name = element
            .attribute("id")
            .and_then(Attribute::value)
            .unwrap_or_else(|| format!("#{}", sites.len()));
        let Some(canvas) = document.child(id, "div") else {
            warn!(container = %name, "map container has no canvas div");
            continue;
        };
        let Some((config_text, config_span)) = document.get(canvas).and_then(embedded_config) else {
            warn!(container = %name, "map canvas carries no configuration");
            continue;
        };
        info!(container = %name, "found map container");
        sites.push(MapSite {
            id: name,
            element: id,
            canvas,
            config_text,
            config_span,
            has_image: document.child(id, "img").is_some(),
        });
    }
    sites
}

/// The `{...}` run of the class attribute, decoded, with its page span
fn embedded_config(canvas: &Element) -> Option<(String, Span)> {
    let class = canvas.attribute("class")?;
    let raw = class.raw_value.as_deref()?;
    let value_span = class.value_span.clone()?;
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    let text = lexer::decode_entities(&raw[start..=end]);
    Some((text, value_span.start + start..value_span.start + end + 1))
}
