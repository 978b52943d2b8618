use crate::apis::base::{absolute_url, element_text, selector};
use crate::app::ports::{HttpClientPort, MenuSource};
use crate::config::ServingOverrides;
use crate::constants::BEERMENUS_BASE_URL;
use crate::error::{Result, ScraperError};
use crate::types::{MenuItem, ServingEntry, ServingKind, Venue};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

static VENUE_HIT: Lazy<Selector> = Lazy::new(|| selector(r#"h3.mb-0 a[href^="/places/"]"#));
static MENU_ITEM: Lazy<Selector> = Lazy::new(|| selector("li.menu-item"));
static BEER_LINK: Lazy<Selector> = Lazy::new(|| selector(r#"a[href^="/beers/"]"#));
static CAPTION: Lazy<Selector> = Lazy::new(|| selector("p.caption"));
static SERVING: Lazy<Selector> = Lazy::new(|| selector(".serving"));
static SERVING_VOLUME: Lazy<Selector> = Lazy::new(|| selector(".serving-volume"));
static SERVING_CONTAINER: Lazy<Selector> = Lazy::new(|| selector(".serving-container"));
static SERVING_PRICE: Lazy<Selector> = Lazy::new(|| selector(".serving-price"));

/// Menu collector backed by beermenus.com.
pub struct BeerMenusCrawler {
    http: Arc<dyn HttpClientPort>,
    overrides: ServingOverrides,
}

impl BeerMenusCrawler {
    pub fn new(http: Arc<dyn HttpClientPort>, overrides: ServingOverrides) -> Self {
        Self { http, overrides }
    }
}

#[async_trait::async_trait]
impl MenuSource for BeerMenusCrawler {
    #[instrument(skip(self))]
    async fn find_venue(&self, query: &str) -> Result<Venue> {
        let url = format!("{}/search", BEERMENUS_BASE_URL);
        let page = self.http.get(&url, &[("q", query)]).await?;
        parse_venue_search(&page.body).ok_or_else(|| ScraperError::VenueNotFound(query.to_string()))
    }

    #[instrument(skip(self), fields(venue = %venue.name))]
    async fn list_menu(&self, venue: &Venue) -> Result<Vec<MenuItem>> {
        let page = self.http.get(&venue.url, &[]).await?;
        if !page.is_success() {
            return Err(ScraperError::Api {
                message: format!("menu page answered with status {}", page.status),
            });
        }
        let overrides = self.overrides.for_venue(&venue.name);
        let items = parse_menu(&page.body, &overrides);
        info!("Found {} beers on the menu", items.len());
        if items.is_empty() {
            warn!("No beers found - the page structure may have changed");
        }
        Ok(items)
    }
}

/// Top venue hit of a search page.
pub fn parse_venue_search(html: &str) -> Option<Venue> {
    let document = Html::parse_document(html);
    let link = document.select(&VENUE_HIT).next()?;
    let href = link.value().attr("href")?;
    Some(Venue {
        name: element_text(&link),
        url: absolute_url(BEERMENUS_BASE_URL, href),
    })
}

/// Beer list of a venue page, in menu order. Beers listed more than once
/// (e.g. on tap and in bottles) are merged into one item. Missing sub-fields
/// are left blank.
pub fn parse_menu(html: &str, overrides: &HashMap<String, ServingKind>) -> Vec<MenuItem> {
    let document = Html::parse_document(html);
    let mut items: Vec<MenuItem> = Vec::new();

    for element in document.select(&MENU_ITEM) {
        let Some(name) = element
            .select(&BEER_LINK)
            .next()
            .map(|a| element_text(&a))
            .filter(|n| !n.is_empty())
        else {
            continue;
        };

        let (style, abv, origin) = element
            .select(&CAPTION)
            .next()
            .map(|c| split_caption(&element_text(&c)))
            .unwrap_or_default();
        let servings: Vec<ServingEntry> = element.select(&SERVING).map(|s| parse_serving(&s)).collect();

        match items.iter_mut().find(|i| i.name == name) {
            Some(existing) => existing.servings.extend(servings),
            None => items.push(MenuItem {
                name,
                style,
                abv,
                origin,
                servings,
                kind: ServingKind::Unknown,
            }),
        }
    }

    for item in &mut items {
        item.kind = classify_servings(&item.servings, overrides);
    }
    items
}

fn parse_serving(element: &ElementRef) -> ServingEntry {
    let text_of = |sel: &Selector| {
        element
            .select(sel)
            .next()
            .map(|e| element_text(&e))
            .unwrap_or_default()
    };
    ServingEntry {
        volume: text_of(&SERVING_VOLUME),
        container: text_of(&SERVING_CONTAINER),
        price: text_of(&SERVING_PRICE),
    }
}

/// Splits "Style · 6.5% ABV · City, ST" into (style, abv, origin). The ABV
/// part is recognized by its percent sign; the rest is positional.
pub fn split_caption(caption: &str) -> (String, String, String) {
    let mut style = String::new();
    let mut abv = String::new();
    let mut origin = String::new();
    for part in caption.split('·').map(str::trim).filter(|p| !p.is_empty()) {
        if abv.is_empty() && part.contains('%') {
            abv = part.trim_end_matches("ABV").trim().to_string();
        } else if style.is_empty() && abv.is_empty() {
            style = part.to_string();
        } else if origin.is_empty() {
            origin = part.to_string();
        }
    }
    (style, abv, origin)
}

/// Tap if any serving is draft/cask/crowler/growler, packaged if any is a
/// bottle or can, unknown otherwise. Venue overrides replace the
/// classification of the container labels they name.
pub fn classify_servings(
    servings: &[ServingEntry],
    overrides: &HashMap<String, ServingKind>,
) -> ServingKind {
    let kinds: Vec<ServingKind> = servings
        .iter()
        .map(|s| {
            overrides
                .get(&s.container.trim().to_lowercase())
                .copied()
                .unwrap_or_else(|| ServingKind::from_container(&s.container))
        })
        .collect();
    if kinds.contains(&ServingKind::Tap) {
        ServingKind::Tap
    } else if kinds.contains(&ServingKind::Packaged) {
        ServingKind::Packaged
    } else {
        ServingKind::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MENU: &str = r#"
        <ul id="on_tap">
          <li class="pure-list-item menu-item">
            <h3 class="mb-0"><a href="/beers/1-heady-topper">Heady Topper</a></h3>
            <p class="caption text-gray mb-0">Imperial IPA · 8.0% ABV · Waterbury, VT</p>
            <div class="serving"><span class="serving-volume">16oz</span>
              <span class="serving-container">Draft</span><span class="serving-price">$8</span></div>
          </li>
          <li class="pure-list-item menu-item">
            <h3 class="mb-0"><a href="/beers/2-mystery">Mystery Ale</a></h3>
          </li>
        </ul>
        <ul id="bottles">
          <li class="pure-list-item menu-item">
            <h3 class="mb-0"><a href="/beers/3-saison">Saison Dupont</a></h3>
            <p class="caption">Saison · 6.5% ABV · Belgium</p>
            <div class="serving"><span class="serving-volume">750ml</span>
              <span class="serving-container">Bottle</span><span class="serving-price">$18</span></div>
          </li>
          <li class="pure-list-item menu-item">
            <h3 class="mb-0"><a href="/beers/1-heady-topper">Heady Topper</a></h3>
            <div class="serving"><span class="serving-volume">16oz</span>
              <span class="serving-container">Can</span><span class="serving-price">$6</span></div>
          </li>
        </ul>"#;

    #[test]
    fn parses_menu_items_in_order() {
        let items = parse_menu(MENU, &HashMap::new());
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Heady Topper", "Mystery Ale", "Saison Dupont"]);

        let heady = &items[0];
        assert_eq!(heady.style, "Imperial IPA");
        assert_eq!(heady.abv, "8.0%");
        assert_eq!(heady.origin, "Waterbury, VT");
        assert_eq!(heady.servings.len(), 2);
        assert_eq!(
            heady.servings[0],
            ServingEntry {
                volume: "16oz".into(),
                container: "Draft".into(),
                price: "$8".into()
            }
        );
        assert_eq!(heady.kind, ServingKind::Tap);
        assert_eq!(items[2].kind, ServingKind::Packaged);
    }

    #[test]
    fn missing_fields_are_blank() {
        let items = parse_menu(MENU, &HashMap::new());
        let mystery = &items[1];
        assert_eq!(mystery.style, "");
        assert_eq!(mystery.abv, "");
        assert!(mystery.servings.is_empty());
        assert_eq!(mystery.kind, ServingKind::Unknown);
    }

    #[test]
    fn venue_override_reclassifies_labels() {
        let overrides = HashMap::from([("bottle".to_string(), ServingKind::Tap)]);
        let items = parse_menu(MENU, &overrides);
        assert_eq!(items[2].kind, ServingKind::Tap);
    }

    #[test]
    fn caption_without_style() {
        assert_eq!(
            split_caption("5.2% ABV · Portland, OR"),
            (String::new(), "5.2%".to_string(), "Portland, OR".to_string())
        );
    }

    #[test]
    fn finds_top_venue() {
        let html = r#"
            <h3 class="mb-0 text-normal"><a href="/beers/9-x">Not a place</a></h3>
            <h3 class="mb-0 text-normal"><a href="/places/4733-the-beer-bar">The Beer Bar</a></h3>"#;
        assert_eq!(
            parse_venue_search(html),
            Some(Venue {
                name: "The Beer Bar".into(),
                url: "https://www.beermenus.com/places/4733-the-beer-bar".into(),
            })
        );
        assert_eq!(parse_venue_search("<p>No results</p>"), None);
    }
}
