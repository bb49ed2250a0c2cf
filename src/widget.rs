//! Container markup for embedding a map in a page
//!
//! The markup is what [`crate::page::discover`] looks for: an outer container
//! element, an inner canvas carrying the configuration JSON in its class
//! attribute, and a static map image shown until the live map has loaded.

use serde_json::Value;

use crate::builder::{static_map_url, MapBuilder, ToConfig};
use crate::config::HostConfig;

/// Escape text for use in HTML content or a quoted attribute
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders map container markup
#[derive(Debug, Clone, PartialEq)]
pub struct Widget {
    name: String,
    width: u32,
    height: u32,
    attrs: Vec<(String, String)>,
    container_class: String,
    sentinel: String,
    static_url: String,
}

impl Widget {
    /// A 500x400 widget whose container has id `name`
    pub fn new(name: impl Into<String>) -> Self {
        let config = HostConfig::default();
        Self {
            name: name.into(),
            width: config.viewport.width,
            height: config.viewport.height,
            attrs: Vec::new(),
            container_class: config.container_class,
            sentinel: config.placeholder_sentinel,
            static_url: config.static_url,
        }
    }

    /// Container class, placeholder sentinel, size and static image URL
    /// from `config`
    pub fn with_config(mut self, config: &HostConfig) -> Self {
        self.width = config.viewport.width;
        self.height = config.viewport.height;
        self.container_class = config.container_class.clone();
        self.sentinel = config.placeholder_sentinel.clone();
        self.static_url = config.static_url.clone();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Extra container attribute. `id` and `class` replace the defaults and
    /// `style` is appended to the sizing style.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Markup for `map`
    pub fn render(&self, map: &MapBuilder) -> String {
        self.render_value(&map.to_config_with_sentinel(&self.sentinel), map)
    }

    /// Markup embedding `config` as is, with the static image of `preview`
    pub fn render_value(&self, config: &Value, preview: &MapBuilder) -> String {
        let (w, h) = (self.width, self.height);
        let id = self.attr("id").unwrap_or(self.name.as_str());
        let class = self.attr("class").unwrap_or(self.container_class.as_str());
        let style = format!(
            "position:relative;width:{}px;height:{}px;{}",
            w,
            h,
            self.attr("style").unwrap_or("")
        );

        let mut container = format!(
            r#"<div id="{}" class="{}" style="{}""#,
            escape_html(id),
            escape_html(class),
            escape_html(&style)
        );
        for (name, value) in &self.attrs {
            if matches!(name.as_str(), "id" | "class" | "style") {
                continue;
            }
            container.push_str(&format!(r#" {}="{}""#, name, escape_html(value)));
        }
        container.push('>');

        let canvas = format!(
            r#"<div class="{}" style="position:absolute;width:{}px;height:{}px"></div>"#,
            escape_html(&config.to_string()),
            w,
            h
        );

        let mut src = static_map_url(preview, &self.static_url);
        if preview.size.is_none() {
            src.push_str(&format!("&size={}x{}", w, h));
        }
        let image = format!(
            r#"<img style="position:absolute;z-index:1" width="{}" height="{}" alt="Google Map" src="{}" />"#,
            w,
            h,
            escape_html(&src)
        );

        format!("{}{}{}</div>", container, canvas, image)
    }
}

/// Markup for `map` in a container with id `name`; a default map when `None`
pub fn render_widget(
    name: &str,
    map: Option<&MapBuilder>,
    width: u32,
    height: u32,
    attrs: &[(&str, &str)],
) -> String {
    let widget = attrs.iter().fold(
        Widget::new(name).with_size(width, height),
        |widget, (k, v)| widget.with_attr(*k, *v),
    );
    match map {
        Some(map) => widget.render(map),
        None => widget.render(&MapBuilder::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{LatLngSpec, MapConstant, MarkerBuilder};
    use crate::page::discover;
    use pretty_assertions::assert_eq;

    fn sample_map() -> MapBuilder {
        MapBuilder::new()
            .with_center(LatLngSpec::new(38.0, -97.0))
            .with_zoom(3)
            .with_map_type_id(MapConstant::ROADMAP)
            .with_marker(MarkerBuilder::new().with_position(LatLngSpec::new(38.0, -97.0)))
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_render_default_map() {
        insta::assert_snapshot!(
            render_widget("location", None, 300, 200, &[]),
            @r#"<div id="location" class="gmap" style="position:relative;width:300px;height:200px;"><div class="{&quot;cls&quot;:&quot;Map&quot;,&quot;arg&quot;:[&quot;div&quot;]}" style="position:absolute;width:300px;height:200px"></div><img style="position:absolute;z-index:1" width="300" height="200" alt="Google Map" src="http://maps.google.com/maps/api/staticmap?sensor=false&amp;size=300x200" /></div>"#
        );
    }

    #[test]
    fn test_attrs() {
        let html = render_widget(
            "m",
            None,
            10,
            10,
            &[("class", "gmap wide"), ("style", "border:0;"), ("data-kind", "a\"b")],
        );
        assert!(html.starts_with(
            r#"<div id="m" class="gmap wide" style="position:relative;width:10px;height:10px;border:0;" data-kind="a&quot;b">"#
        ));
    }

    #[test]
    fn test_round_trips_through_discovery() {
        let map = sample_map();
        let html = Widget::new("here").render(&map);
        let sites = discover(&html, &HostConfig::default());
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].id, "here");
        assert!(sites[0].has_image);
        assert_eq!(sites[0].parse_config().unwrap(), map.to_config());
    }

    #[test]
    fn test_render_value_keeps_config_verbatim() {
        let config = serde_json::json!({"cls": "Map", "arg": ["div"], "custom": 1});
        let preview = MapBuilder::new().with_zoom(2);
        let html = Widget::new("v").render_value(&config, &preview);
        let sites = discover(&html, &HostConfig::default());
        assert_eq!(sites[0].parse_config().unwrap(), config);
        assert!(html.contains("staticmap?zoom=2&amp;sensor=false&amp;size=500x400"));
    }

    #[test]
    fn test_with_config() {
        let config = HostConfig::default().with_container_class("box");
        let html = Widget::new("x").with_config(&config).render(&MapBuilder::new());
        assert!(html.contains(r#"class="box""#));
        assert!(html.contains("width:500px;height:400px"));
        assert_eq!(discover(&html, &config).len(), 1);
    }

    #[test]
    fn test_with_config_uses_sentinel() {
        let mut config = HostConfig::default();
        config.placeholder_sentinel = "canvas".to_string();
        let map = MapBuilder::new().with_zoom(3);
        let html = Widget::new("x").with_config(&config).render(&map);
        let sites = discover(&html, &config);
        assert_eq!(
            sites[0].parse_config().unwrap(),
            serde_json::json!({"cls": "Map", "arg": ["canvas", {"zoom": 3}]})
        );
    }
}
