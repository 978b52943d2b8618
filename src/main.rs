use anyhow::Context;
use clap::{ArgGroup, Parser};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, error};

use brewscan::apis::beermenus::BeerMenusCrawler;
use brewscan::apis::factory::create_sources;
use brewscan::apis::web_search::WebSearchFinder;
use brewscan::app::lookup_use_case::LookupResolver;
use brewscan::app::ports::{HttpClientPort, MenuSource, PageFinder};
use brewscan::app::report_use_case::{ReportInput, ReportOptions, ReportOutcome, ReportUseCase};
use brewscan::config::Config;
use brewscan::infra::http_client::ReqwestHttp;
use brewscan::logging;
use brewscan::types::{Layout, ServingFilter, SortMode};

#[derive(Parser, Debug)]
#[command(name = "brewscan")]
#[command(about = "What's on tap, and is it any good?")]
#[command(version)]
#[command(group(ArgGroup::new("input").required(true).args(["bar", "file"])))]
struct Cli {
    /// Bar to look up on the menu site
    bar: Vec<String>,

    /// path/to/beerfile, one beer per line
    #[arg(short = 'f', long = "file")]
    file: Option<PathBuf>,

    /// ~*~print fancy~*~
    #[arg(long)]
    fancy: bool,

    /// Sort by average rating (`avg`) or by one site's rating
    #[arg(long, default_value = "avg")]
    sort_by: SortMode,

    /// Keep menu / file order
    #[arg(long)]
    no_sort: bool,

    /// Only show beers whose style shares a word with these terms
    #[arg(long, num_args = 1..)]
    style: Vec<String>,

    /// Only beers on draft (incl. cask, crowler, growler)
    #[arg(long, conflicts_with = "bottles")]
    taps: bool,

    /// Only bottles and cans
    #[arg(long)]
    bottles: bool,

    /// Beers looked up concurrently
    #[arg(long)]
    workers: Option<usize>,

    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip the general web search and go straight to site searches
    #[arg(long)]
    no_web_search: bool,

    /// Verbose logging (e.g. for debugging)
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn input(&self) -> ReportInput {
        match &self.file {
            Some(path) => ReportInput::BeerFile(path.clone()),
            None => ReportInput::Venue(self.bar.join(" ")),
        }
    }

    fn options(&self) -> ReportOptions {
        ReportOptions {
            layout: if self.fancy { Layout::Fancy } else { Layout::Simple },
            sort: if self.no_sort { SortMode::Unsorted } else { self.sort_by },
            styles: self.style.clone(),
            serving: match (self.taps, self.bottles) {
                (true, _) => ServingFilter::TapsOnly,
                (_, true) => ServingFilter::PackagedOnly,
                _ => ServingFilter::Both,
            },
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(workers) = cli.workers {
        config.workers = workers.max(1);
    }
    if cli.no_web_search {
        config.web_search = false;
    }
    logging::init_logging(cli.verbose, config.log_dir.as_deref()).context("setting up logging")?;
    debug!(?config, "configuration loaded");

    let http: Arc<dyn HttpClientPort> = Arc::new(
        ReqwestHttp::new(&config.user_agent, config.timeout_secs).context("building HTTP client")?,
    );
    let sources = create_sources(&config.sources, http.clone());
    let finder = config.web_search.then(|| {
        Arc::new(WebSearchFinder::new(http.clone(), config.sources.clone())) as Arc<dyn PageFinder>
    });
    let resolver = LookupResolver::new(sources, finder, config.workers);
    let menu: Arc<dyn MenuSource> = Arc::new(BeerMenusCrawler::new(
        http.clone(),
        config.serving_overrides.clone(),
    ));
    let use_case = ReportUseCase::new(
        menu,
        resolver,
        config.precedence.clone(),
        config.sources.clone(),
    );

    match use_case.run(&cli.input(), &cli.options()).await? {
        ReportOutcome::Rendered(lines) => {
            for line in lines {
                println!("{}", line);
            }
        }
        ReportOutcome::VenueNotFound(query) => {
            println!("\ncouldn't find that bar ({})...\n", query);
        }
        ReportOutcome::NothingToShow => {
            println!("\nnothing on the menu matches... time for water?\n");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("run failed: {:#}", e);
            eprintln!("\nsomething went wrong: {:#}\n", e);
            ExitCode::FAILURE
        }
    }
}
