//! Page integration: discovering map containers and hosting live maps

mod discover;
mod host;
pub mod lexer;

pub use discover::{discover, discover_in, Document, Element, ElementId, MapSite, MarkupError};
pub use host::{HostError, LoadState, MapContainer, MARKERS_KEY, NEW_MAP};

use crate::config::HostConfig;
use crate::directive::Namespace;

/// Create a map in every visible container of `markup`
///
/// Element ids of the [`Document`] parsed from `markup` serve as placeholder
/// handles. The first container that fails aborts the whole page.
pub fn init_page<'n>(
    markup: &str,
    namespace: &'n Namespace<ElementId>,
    config: &HostConfig,
) -> Result<Vec<MapContainer<'n, ElementId>>, HostError> {
    let document = Document::parse(markup);
    let mut containers = Vec::new();
    for site in discover_in(&document, config) {
        let value = site.parse_config()?;
        let mut container =
            MapContainer::new(site.id.clone(), site.element, site.canvas, namespace).with_config(config);
        container.new_map(&value)?;
        containers.push(container);
    }
    Ok(containers)
}
