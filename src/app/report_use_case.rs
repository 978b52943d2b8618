use crate::app::beer_list::{read_beer_file, venue_label};
use crate::app::lookup_use_case::LookupResolver;
use crate::app::ports::MenuSource;
use crate::error::{Result, ScraperError};
use crate::pipeline::merge::merge;
use crate::pipeline::ranking::{filter_by_style, rank};
use crate::presenter::Presenter;
use crate::types::{Layout, MenuItem, ServingFilter, SortMode, SourceName};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Where the beer list comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportInput {
    /// Free-text venue query, resolved through the menu source
    Venue(String),
    /// Newline-delimited beer names
    BeerFile(PathBuf),
}

#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub layout: Layout,
    pub sort: SortMode,
    pub styles: Vec<String>,
    pub serving: ServingFilter,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            layout: Layout::Simple,
            sort: SortMode::Average,
            styles: Vec::new(),
            serving: ServingFilter::Both,
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    Rendered(Vec<String>),
    VenueNotFound(String),
    /// Nothing left after serving or style filtering
    NothingToShow,
}

/// Venue or beer list -> lookups -> merge, filter, rank -> report lines.
pub struct ReportUseCase {
    menu: Arc<dyn MenuSource>,
    resolver: LookupResolver,
    precedence: Vec<SourceName>,
    columns: Vec<SourceName>,
}

impl ReportUseCase {
    pub fn new(
        menu: Arc<dyn MenuSource>,
        resolver: LookupResolver,
        precedence: Vec<SourceName>,
        columns: Vec<SourceName>,
    ) -> Self {
        Self {
            menu,
            resolver,
            precedence,
            columns,
        }
    }

    async fn collect_menu(
        &self,
        query: &str,
        serving: ServingFilter,
    ) -> Result<(String, Vec<MenuItem>)> {
        let venue = self.menu.find_venue(query).await?;
        info!(venue = %venue.name, url = %venue.url, "Resolved venue");
        let items = self.menu.list_menu(&venue).await?;
        let total = items.len();
        let items: Vec<MenuItem> = items
            .into_iter()
            .filter(|item| serving.accepts(item.kind))
            .collect();
        if items.len() < total {
            info!("Kept {} of {} beers after serving filter", items.len(), total);
        }
        Ok((venue.name, items))
    }

    #[instrument(skip(self, options))]
    pub async fn run(&self, input: &ReportInput, options: &ReportOptions) -> Result<ReportOutcome> {
        let (venue_name, menu_items) = match input {
            ReportInput::Venue(query) => match self.collect_menu(query, options.serving).await {
                Ok(found) => found,
                Err(ScraperError::VenueNotFound(q)) => return Ok(ReportOutcome::VenueNotFound(q)),
                Err(e) => return Err(e),
            },
            ReportInput::BeerFile(path) => {
                if options.serving != ServingFilter::Both {
                    warn!("Serving filters need a venue menu; ignoring for beer files");
                }
                let names = read_beer_file(path)?;
                let items: Vec<MenuItem> = names
                    .into_iter()
                    .map(|name| MenuItem {
                        name,
                        ..Default::default()
                    })
                    .collect();
                (venue_label(path), items)
            }
        };

        let beer_names: Vec<String> = menu_items.iter().map(|i| i.name.clone()).collect();
        if beer_names.is_empty() {
            return Ok(ReportOutcome::NothingToShow);
        }
        // File entries carry no menu metadata
        let menu: HashMap<String, MenuItem> = match input {
            ReportInput::Venue(_) => menu_items
                .into_iter()
                .map(|item| (item.name.clone(), item))
                .collect(),
            ReportInput::BeerFile(_) => HashMap::new(),
        };

        let catalog = self.resolver.resolve_all(&beer_names).await;
        let merged = merge(&beer_names, &catalog, &menu, &self.precedence);
        let mut beers = filter_by_style(merged, &options.styles);
        if beers.is_empty() {
            return Ok(ReportOutcome::NothingToShow);
        }
        rank(&mut beers, options.sort);

        let presenter = Presenter::new(options.layout, self.columns.clone(), &beers);
        let mut lines = vec![
            String::new(),
            Presenter::heading(&venue_name),
            String::new(),
        ];
        lines.extend(presenter.render_all(&beers));
        Ok(ReportOutcome::Rendered(lines))
    }
}
