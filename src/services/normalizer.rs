// src/services/normalizer.rs

//! Content normalizer.
//!
//! Turns a rendered page into the canonical text that gets fingerprinted:
//!
//! 1. pick the region to watch (item selector, default container,
//!    generic fallbacks, then `<body>`),
//! 2. drop `script`/`style`/`noscript` subtrees,
//! 3. drop the nearest block container around every volatile text node,
//! 4. join the remaining text nodes with single spaces and collapse
//!    whitespace.
//!
//! Everything happens on the `ego_tree` arena behind [`Html`]: the page is
//! parsed once, the region is addressed by its [`NodeId`], and node ids are
//! collected in document order first and detached in a second pass, so
//! the output only depends on the input bytes.

use ego_tree::{NodeId, NodeRef};
use scraper::{ElementRef, Html, Node, Selector};

use crate::error::{AppError, Result};
use crate::models::{ExtractionConfig, MonitoredItem};
use crate::services::filter::PatternFilter;
use crate::utils::collapse_whitespace;

/// Subtrees whose content never reaches the fingerprint.
const STRIPPED_TAGS: &[&str] = &["script", "style", "noscript"];

/// Structural containers that may wrap a volatile block.
const BLOCK_TAGS: &[&str] = &["div", "section", "table", "tbody", "ul", "ol", "article"];

/// How many ancestors of a volatile text node are inspected.
const MAX_ANCESTOR_DEPTH: usize = 6;

/// Reduces raw markup to fingerprint-ready text.
#[derive(Debug, Clone)]
pub struct ContentNormalizer {
    filter: PatternFilter,
    default_container: Selector,
    fallbacks: Vec<Selector>,
    body: Selector,
}

impl ContentNormalizer {
    /// Build a normalizer from extraction settings.
    pub fn new(config: &ExtractionConfig) -> Result<Self> {
        let filter = PatternFilter::new(&config.volatile_patterns)?;
        Self::with_filter(config, filter)
    }

    /// Build a normalizer with an already compiled filter.
    pub fn with_filter(config: &ExtractionConfig, filter: PatternFilter) -> Result<Self> {
        let default_container = parse_selector(&config.default_container_selector())?;
        let fallbacks = config
            .fallback_selectors
            .iter()
            .map(|s| parse_selector(s))
            .collect::<Result<Vec<_>>>()?;

        log::debug!(
            "Normalizer ready: {} volatile pattern(s), {} fallback selector(s)",
            filter.len(),
            fallbacks.len()
        );

        Ok(Self {
            filter,
            default_container,
            fallbacks,
            body: parse_selector("body")?,
        })
    }

    /// Extract the watched region of `document` and reduce it to canonical text.
    pub fn normalize(&self, document: &str, item: &MonitoredItem) -> Result<String> {
        if document.trim().is_empty() {
            return Err(AppError::unextractable(&item.url));
        }

        let mut html = Html::parse_document(document);
        let region = self.extract(&html, item);
        Ok(clean_region(&self.filter, &mut html, region))
    }

    /// Pick the node to watch. The first step that yields a region wins.
    ///
    /// A `<body>` without any text (a head-only page) gives way to the whole
    /// document.
    pub fn extract(&self, html: &Html, item: &MonitoredItem) -> NodeId {
        if let Some(raw) = item.selector.as_deref() {
            match parse_selector(raw) {
                Ok(selector) => {
                    if let Some(id) = first_match(html, &selector) {
                        log::debug!("Item {} matched its own selector '{}'", item.id, raw);
                        return id;
                    }
                    log::debug!("Item {} selector '{}' matched nothing", item.id, raw);
                }
                Err(e) => log::debug!("Item {} selector skipped: {}", item.id, e),
            }
        }

        if let Some(id) = first_match(html, &self.default_container) {
            return id;
        }

        for selector in &self.fallbacks {
            if let Some(id) = first_match(html, selector) {
                log::debug!("Item {} fell back to a generic region", item.id);
                return id;
            }
        }

        match html.select(&self.body).next().filter(|body| has_text(*body)) {
            Some(body) => {
                log::debug!("Item {} using the page body", item.id);
                body.id()
            }
            None => {
                log::debug!("Item {} using the whole document", item.id);
                html.tree.root().id()
            }
        }
    }

    /// Run the cleaning pipeline over a standalone markup fragment.
    pub fn clean(&self, markup: &str) -> String {
        let mut html = Html::parse_fragment(markup);
        let root = html.root_element().id();
        clean_region(&self.filter, &mut html, root)
    }
}

/// Strip noise and volatile blocks under `region`, then collect its text.
fn clean_region(filter: &PatternFilter, html: &mut Html, region: NodeId) -> String {
    let noise = noise_nodes(html, region);
    if noise.contains(&region) {
        return String::new();
    }
    detach_all(html, &noise);

    let volatile = volatile_blocks(filter, html, region);
    if !volatile.is_empty() {
        log::debug!("Dropping {} volatile block(s)", volatile.len());
    }
    if volatile.contains(&region) {
        return String::new();
    }
    detach_all(html, &volatile);

    collapse_whitespace(&visible_text(html, region))
}

/// Removal targets for every text node under `region` the filter flags.
fn volatile_blocks(filter: &PatternFilter, html: &Html, region: NodeId) -> Vec<NodeId> {
    let Some(root) = html.tree.get(region) else {
        return Vec::new();
    };

    let mut targets = Vec::new();
    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        if !filter.is_match(text) {
            continue;
        }
        let target = removal_target(node, region);
        if !targets.contains(&target) {
            targets.push(target);
        }
    }
    targets
}

/// Nearest block container within reach, else the immediate parent, else
/// the text node itself when the parent is the region or not an element.
///
/// The walk never climbs above `region`.
fn removal_target(text: NodeRef<'_, Node>, region: NodeId) -> NodeId {
    let Some(parent) = text.parent() else {
        return text.id();
    };

    let mut current = Some(parent);
    for _ in 0..MAX_ANCESTOR_DEPTH {
        let Some(node) = current else { break };
        match node.value().as_element() {
            Some(el) if BLOCK_TAGS.contains(&el.name()) => return node.id(),
            Some(_) if node.id() != region => current = node.parent(),
            _ => break,
        }
    }

    if parent.id() == region || parent.value().as_element().is_none() {
        text.id()
    } else {
        parent.id()
    }
}

fn noise_nodes(html: &Html, region: NodeId) -> Vec<NodeId> {
    let Some(root) = html.tree.get(region) else {
        return Vec::new();
    };
    root.descendants()
        .filter(|node| {
            node.value()
                .as_element()
                .is_some_and(|el| STRIPPED_TAGS.contains(&el.name()))
        })
        .map(|node| node.id())
        .collect()
}

fn detach_all(html: &mut Html, ids: &[NodeId]) {
    for id in ids {
        if let Some(mut node) = html.tree.get_mut(*id) {
            node.detach();
        }
    }
}

/// Every text node left under `region`, trimmed, joined with a single space.
fn visible_text(html: &Html, region: NodeId) -> String {
    let Some(root) = html.tree.get(region) else {
        return String::new();
    };
    root.descendants()
        .filter_map(|node| node.value().as_text())
        .map(|text| text.trim())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn has_text(element: ElementRef<'_>) -> bool {
    element.text().any(|t| !t.trim().is_empty())
}

fn first_match(html: &Html, selector: &Selector) -> Option<NodeId> {
    html.select(selector).next().map(|el| el.id())
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> ContentNormalizer {
        ContentNormalizer::new(&ExtractionConfig::default()).unwrap()
    }

    fn item(selector: Option<&str>) -> MonitoredItem {
        MonitoredItem {
            id: 1,
            label: "Portal".into(),
            url: "https://example.com/portal".into(),
            selector: selector.map(str::to_string),
        }
    }

    fn stats_page(authorized: &str, records: &str) -> String {
        format!(
            r#"<html><body>
                <div id="menu">Menu</div>
                <div id="conteudoDinamico">
                    <h2>Avisos</h2>
                    <p>Total Records: {records}</p>
                    <div class="stats">
                        <p><span>NF-e Autorizadas: {authorized}</span></p>
                    </div>
                    <p>Nota Técnica 2024.001 publicada</p>
                </div>
            </body></html>"#
        )
    }

    #[test]
    fn test_volatile_block_changes_are_ignored() {
        let n = normalizer();
        let before = n.normalize(&stats_page("99", "12345"), &item(None)).unwrap();
        let after = n.normalize(&stats_page("100", "12345"), &item(None)).unwrap();

        assert_eq!(before, after);
        assert_eq!(
            before,
            "Avisos Total Records: 12345 Nota Técnica 2024.001 publicada"
        );
    }

    #[test]
    fn test_stable_changes_are_detected() {
        let n = normalizer();
        let before = n.normalize(&stats_page("99", "12345"), &item(None)).unwrap();
        let after = n.normalize(&stats_page("99", "12346"), &item(None)).unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn test_strips_script_style_noscript() {
        let n = normalizer();
        let text = n.clean(
            r#"<div>
                <script>var t = Date.now();</script>
                <style>.x { color: red }</style>
                <noscript>Enable JavaScript</noscript>
                <p>Visible</p>
            </div>"#,
        );
        assert_eq!(text, "Visible");
    }

    #[test]
    fn test_joins_text_nodes_and_collapses_whitespace() {
        let n = normalizer();
        let text = n.clean("<div><p>Hello</p>\n\t<p>  big \n  world </p><b>Hel</b>lo</div>");
        assert_eq!(text, "Hello big world Hel lo");
    }

    #[test]
    fn test_comments_do_not_count() {
        let n = normalizer();
        assert_eq!(n.clean("<div><!-- build 1234 -->Text</div>"), "Text");
    }

    #[test]
    fn test_block_within_six_levels_is_removed() {
        let n = normalizer();
        let text = n.clean(
            "<p>Keep</p><div><span><span><span><span><span>\
             NF-e Autorizadas 7</span></span></span></span></span><i>sibling</i></div>",
        );
        assert_eq!(text, "Keep");
    }

    #[test]
    fn test_block_beyond_six_levels_falls_back_to_parent() {
        let n = normalizer();
        let text = n.clean(
            "<p>Keep</p><div><span><span><span><span><span><span>\
             NF-e Autorizadas 7</span></span></span></span></span></span><i>sibling</i></div>",
        );
        assert_eq!(text, "Keep sibling");
    }

    #[test]
    fn test_no_block_ancestor_removes_parent_only() {
        let n = normalizer();
        let text = n.clean("<p>Keep</p><span><b>Número de Emissores</b> 3051</span>");
        assert_eq!(text, "Keep 3051");
    }

    #[test]
    fn test_top_level_match_removes_only_text() {
        let n = normalizer();
        assert_eq!(n.clean("NF-e Autorizadas 7<p>Keep</p>"), "Keep");
    }

    #[test]
    fn test_shared_layout_container_is_removed_whole() {
        // Stable text sharing the nearest block with a volatile one goes too.
        let n = normalizer();
        let text = n.clean(
            "<section><p>Intro</p></section>\
             <div><span>NF-e Autorizadas 5</span><p>Footer</p></div>",
        );
        assert_eq!(text, "Intro");
    }

    #[test]
    fn test_item_selector_takes_precedence() {
        let n = normalizer();
        let page = r#"<body><div id="conteudoDinamico">Default</div><div class="news">Mine</div></body>"#;
        assert_eq!(n.normalize(page, &item(Some(".news"))).unwrap(), "Mine");
    }

    #[test]
    fn test_extract_returns_selected_node() {
        let n = normalizer();
        let html = Html::parse_document(r#"<body><p class="x">One</p><p class="x">Two</p></body>"#);
        let id = n.extract(&html, &item(Some("p.x")));
        let node = ElementRef::wrap(html.tree.get(id).unwrap()).unwrap();
        assert_eq!(node.text().collect::<String>(), "One");
    }

    #[test]
    fn test_table_row_selector_keeps_cell_boundaries() {
        let n = normalizer();
        let row = |cells: &str| format!(r#"<body><table><tr class="r">{cells}</tr></table></body>"#);

        let a = n
            .normalize(&row("<td>1</td><td>23</td>"), &item(Some("tr.r")))
            .unwrap();
        let b = n
            .normalize(&row("<td>12</td><td>3</td>"), &item(Some("tr.r")))
            .unwrap();

        assert_eq!(a, "1 23");
        assert_eq!(b, "12 3");
        assert_ne!(a, b);
    }

    #[test]
    fn test_table_cell_selector() {
        let n = normalizer();
        let page = r#"<body><table><tr><td class="v"><b>7</b><i>0</i></td><td>x</td></tr></table></body>"#;
        assert_eq!(n.normalize(page, &item(Some("td.v"))).unwrap(), "7 0");
    }

    #[test]
    fn test_volatile_row_inside_selected_table_region() {
        let n = normalizer();
        let page = r#"<body><table class="t">
            <tr><td>Stable</td></tr>
            <tr><td><span>NF-e Autorizadas</span> 7</td></tr>
        </table></body>"#;
        // The row lives in an implied tbody, which is the nearest block.
        assert_eq!(n.normalize(page, &item(Some("table.t"))).unwrap(), "");
    }

    #[test]
    fn test_volatile_region_root_empties_output() {
        let n = normalizer();
        let page = r#"<body><div id="conteudoDinamico">NF-e Autorizadas 5</div></body>"#;
        assert_eq!(n.normalize(page, &item(None)).unwrap(), "");
    }

    #[test]
    fn test_unmatched_or_invalid_selector_falls_through() {
        let n = normalizer();
        let page = r#"<body><div id="conteudoDinamico">Default</div></body>"#;
        assert_eq!(n.normalize(page, &item(Some(".missing"))).unwrap(), "Default");
        assert_eq!(n.normalize(page, &item(Some("[[bad"))).unwrap(), "Default");
    }

    #[test]
    fn test_generic_fallbacks_in_order() {
        let n = normalizer();
        let page = r#"<body><nav>Nav</nav><div class="content">Classy</div><main>Main</main></body>"#;
        // `main` comes before `.content` in the fallback list.
        assert_eq!(n.normalize(page, &item(None)).unwrap(), "Main");

        let page = r#"<body><nav>Nav</nav><div class="conteudo">Texto</div></body>"#;
        assert_eq!(n.normalize(page, &item(None)).unwrap(), "Texto");
    }

    #[test]
    fn test_last_resort_uses_body() {
        let n = normalizer();
        let page = "<html><head><title>Title</title></head><body><p>Only body</p></body></html>";
        assert_eq!(n.normalize(page, &item(None)).unwrap(), "Only body");
    }

    #[test]
    fn test_head_only_page_uses_whole_document() {
        let n = normalizer();
        let page = "<html><head><title>Only title</title><script>x()</script></head></html>";
        assert_eq!(n.normalize(page, &item(None)).unwrap(), "Only title");
    }

    #[test]
    fn test_blank_document_is_unextractable() {
        let n = normalizer();
        let err = n.normalize("  \n ", &item(None)).unwrap_err();
        assert!(matches!(err, AppError::Unextractable { ref url } if url == "https://example.com/portal"));
    }

    #[test]
    fn test_normalization_is_deterministic() {
        let n = normalizer();
        let page = stats_page("1", "2");
        let first = n.normalize(&page, &item(None)).unwrap();
        for _ in 0..5 {
            assert_eq!(n.normalize(&page, &item(None)).unwrap(), first);
        }
    }

    #[test]
    fn test_invalid_fallback_selector_is_config_error() {
        let config = ExtractionConfig {
            fallback_selectors: vec!["[[".into()],
            ..ExtractionConfig::default()
        };
        assert!(matches!(
            ContentNormalizer::new(&config).unwrap_err(),
            AppError::Selector { .. }
        ));
    }
}
