use crate::pipeline::merge::MergedBeer;
use crate::types::{Field, Layout, SourceName};
use tracing::warn;

const SEP: &str = "|";
const SPACER: &str = "  ";
const PATTERN: &str = "~*~";
const MIN_CELL_WIDTH: usize = 6;

/// Formats merged beers into aligned report lines. Column widths are fixed
/// per batch from the longest name and style in it.
#[derive(Debug, Clone)]
pub struct Presenter {
    layout: Layout,
    columns: Vec<SourceName>,
    cell_width: usize,
    name_width: usize,
    style_width: usize,
}

fn width(text: &str) -> usize {
    text.chars().count()
}

fn center(text: &str, width: usize) -> String {
    format!("{:^width$}", text, width = width)
}

/// "16oz Draft $8, 750ml Bottle $18" from the menu's serving entries.
fn servings_line(beer: &MergedBeer) -> String {
    beer.servings
        .iter()
        .map(|s| {
            [s.volume.as_str(), s.container.as_str(), s.price.as_str()]
                .iter()
                .filter(|part| !part.is_empty())
                .copied()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|offer| !offer.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

impl Presenter {
    pub fn new(layout: Layout, columns: Vec<SourceName>, batch: &[MergedBeer]) -> Self {
        let cell_width = columns
            .iter()
            .map(|c| width(c.as_str()) + 2)
            .max()
            .unwrap_or(0)
            .max(MIN_CELL_WIDTH);
        let name_width = batch.iter().map(|b| width(&b.name)).max().unwrap_or(0);
        let style_width = batch
            .iter()
            .map(|b| width(b.field(Field::Style)))
            .max()
            .unwrap_or(0);
        Self {
            layout,
            columns,
            cell_width,
            name_width,
            style_width,
        }
    }

    pub fn heading(venue: &str) -> String {
        format!("what's on @ {} ??", venue.to_uppercase())
    }

    fn rating_cell(&self, beer: &MergedBeer, source: SourceName) -> String {
        if beer.blocked.contains(&source) {
            return "blocked".to_string();
        }
        beer.rating_of(source)
            .map(|r| format!("{:.2}", r))
            .unwrap_or_default()
    }

    /// Lines for one beer, or a skipping notice when no source knew it.
    pub fn render(&self, beer: &MergedBeer) -> Vec<String> {
        if !beer.has_data {
            warn!("no data for {}, skipping", beer.name);
            return vec![format!("skipping {}...", beer.name)];
        }
        match self.layout {
            Layout::Simple => vec![self.render_simple(beer)],
            Layout::Fancy => self.render_fancy(beer),
        }
    }

    fn render_simple(&self, beer: &MergedBeer) -> String {
        let cells: Vec<String> = self
            .columns
            .iter()
            .map(|s| center(&self.rating_cell(beer, *s), self.cell_width))
            .collect();
        let line = format!(
            "[{}]{sp}{:<nw$}{sp}{:<sw$}{sp}{}",
            cells.join(SEP),
            beer.name,
            beer.field(Field::Style).to_lowercase(),
            beer.field(Field::Abv),
            sp = SPACER,
            nw = self.name_width,
            sw = self.style_width,
        );
        line.trim_end().to_string()
    }

    fn render_fancy(&self, beer: &MergedBeer) -> Vec<String> {
        let header = format!(
            "{p} {} {p} ({}, {})",
            beer.name,
            beer.field(Field::Style),
            beer.field(Field::Abv),
            p = PATTERN
        );

        let site_parts: Vec<String> = self
            .columns
            .iter()
            .map(|s| format!("{sp}({}){sp}", s, sp = SPACER))
            .collect();
        let rating_parts: Vec<String> = self
            .columns
            .iter()
            .zip(&site_parts)
            .map(|(s, part)| center(&self.rating_cell(beer, *s), width(part)))
            .collect();

        let mut lines = vec![
            String::new(),
            header,
            String::new(),
            rating_parts.join(SEP),
            site_parts.join(SEP),
        ];
        let servings = servings_line(beer);
        if !servings.is_empty() {
            lines.push(String::new());
            lines.push(format!("{}{}", SPACER, servings));
        }
        let description = beer.field(Field::Description);
        if !description.is_empty() {
            lines.push(String::new());
            lines.push(format!("{}{}", SPACER, description));
        }
        lines.push(String::new());
        lines
    }

    /// Column key printed under the compact layout.
    pub fn legend(&self) -> Option<String> {
        match self.layout {
            Layout::Fancy => None,
            Layout::Simple => {
                let names: Vec<String> = self
                    .columns
                    .iter()
                    .map(|s| center(s.as_str(), self.cell_width))
                    .collect();
                Some(format!("[{}]{sp}=={sp}key", names.join(SEP), sp = SPACER))
            }
        }
    }

    /// Every beer in order, followed by the legend.
    pub fn render_all(&self, beers: &[MergedBeer]) -> Vec<String> {
        let mut lines: Vec<String> = beers.iter().flat_map(|b| self.render(b)).collect();
        if let Some(legend) = self.legend() {
            lines.push(String::new());
            lines.push(legend);
        }
        lines
    }
}
