//! Extractor for the catalog site's route and area pages
//!
//! Route pages carry the first ascent in a two-cell table row:
//! `<td>FA:&nbsp;</td><td>John Doe 1985</td>`. Area pages carry
//! `<td>Location:&nbsp;</td><td>40.1, -105.5 View Map (Incorrect?)</td>` and a
//! "go up" icon wrapped in a link to the parent area.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use super::{AreaDetails, ExtractorConfig, HtmlExtractor, ParsingError, ParsingResult};
use crate::domain::{AreaLink, Coordinate};
use crate::infrastructure::page_fetcher::Document;

pub struct SiteExtractor {
    config: ExtractorConfig,
    root_url: Url,
    cell_selector: Selector,
    parent_icon_selector: Selector,
}

impl SiteExtractor {
    /// Extractor for the live site markup
    pub fn new() -> ParsingResult<Self> {
        Self::with_config(ExtractorConfig::default())
    }

    pub fn with_config(config: ExtractorConfig) -> ParsingResult<Self> {
        let root_url = Url::parse(&config.root_url).map_err(|e| ParsingError::UrlResolutionFailed {
            url: config.root_url.clone(),
            reason: e.to_string(),
        })?;

        let cell_selector = compile_selector("td")?;
        let parent_icon_selector =
            compile_selector(&format!("img[src=\"{}\"]", config.parent_icon_src))?;

        Ok(Self {
            config,
            root_url,
            cell_selector,
            parent_icon_selector,
        })
    }

    pub const fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Text of the element following the `td` whose text is exactly `label`.
    ///
    /// Only ASCII layout whitespace around the cell text is ignored; the
    /// non-breaking space that belongs to the label must be present.
    fn labelled_value(&self, html: &Html, label: &str) -> Option<String> {
        let cell = html.select(&self.cell_selector).find(|cell| {
            cell.text()
                .collect::<String>()
                .trim_matches(|c: char| c.is_ascii_whitespace())
                == label
        })?;

        let value = cell.next_siblings().find_map(ElementRef::wrap)?;
        Some(value.text().collect::<String>().trim().to_string())
    }

    fn first_ascent_in(&self, html: &Html, document: &Document) -> String {
        self.labelled_value(html, &self.config.first_ascent_label)
            .unwrap_or_else(|| {
                debug!("No first ascent on {}", document.url());
                String::new()
            })
    }

    fn gps_in(&self, html: &Html, document: &Document) -> Coordinate {
        let Some(text) = self.labelled_value(html, &self.config.location_label) else {
            return Coordinate::empty();
        };

        let coordinate = parse_coordinate(&text, &self.config.map_link_marker);
        if coordinate.is_empty() {
            debug!("Unrecognised location text on {}: {:?}", document.url(), text);
        }
        coordinate
    }

    fn parent_link_in(&self, html: &Html, document: &Document) -> Option<AreaLink> {
        let icon = html.select(&self.parent_icon_selector).next()?;

        let href = icon
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|element| element.value().name() == "a")
            .and_then(|anchor| anchor.value().attr("href"))?;

        match self.root_url.join(href) {
            Ok(url) => Some(AreaLink::new(url)),
            Err(e) => {
                debug!("Unresolvable parent link {:?} on {}: {}", href, document.url(), e);
                None
            }
        }
    }
}

fn compile_selector(selector: &str) -> ParsingResult<Selector> {
    Selector::parse(selector).map_err(|e| ParsingError::invalid_selector(selector, &e.to_string()))
}

/// Split `"<lat>, <long> View Map ..."` into its two components.
///
/// Anything other than exactly two non-empty components is treated as "no
/// coordinate" so the hierarchy walk keeps climbing.
pub fn parse_coordinate(text: &str, map_link_marker: &str) -> Coordinate {
    let head = text.split(map_link_marker).next().unwrap_or_default().trim();
    let mut parts = head.split(',').map(str::trim);

    match (parts.next(), parts.next(), parts.next()) {
        (Some(lat), Some(long), None) if !lat.is_empty() && !long.is_empty() => {
            Coordinate::new(lat, long)
        }
        _ => Coordinate::empty(),
    }
}

impl HtmlExtractor for SiteExtractor {
    fn extract_first_ascent(&self, document: &Document) -> String {
        self.first_ascent_in(&document.parse(), document)
    }

    fn extract_area_gps(&self, document: &Document) -> Coordinate {
        self.gps_in(&document.parse(), document)
    }

    fn extract_parent_area_link(&self, document: &Document) -> Option<AreaLink> {
        self.parent_link_in(&document.parse(), document)
    }

    fn extract_area(&self, document: &Document) -> AreaDetails {
        let html = document.parse();
        AreaDetails {
            gps: self.gps_in(&html, document),
            parent: self.parent_link_in(&html, document),
        }
    }
}
