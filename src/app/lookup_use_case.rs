use crate::app::ports::{PageFinder, ReviewSource};
use crate::types::{BeerRecord, Catalog, LookupOutcome};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

/// Builds the catalog for a batch of beers: one worker per beer, bounded by
/// `workers`, each asking every review source in turn.
pub struct LookupResolver {
    sources: Arc<[Arc<dyn ReviewSource>]>,
    finder: Option<Arc<dyn PageFinder>>,
    workers: usize,
}

impl LookupResolver {
    pub fn new(
        sources: Vec<Arc<dyn ReviewSource>>,
        finder: Option<Arc<dyn PageFinder>>,
        workers: usize,
    ) -> Self {
        Self {
            sources: sources.into(),
            finder,
            workers: workers.max(1),
        }
    }

    /// Looks up every beer. The returned catalog has an entry for every beer
    /// and, within it, an outcome for every configured source.
    #[instrument(skip(self, beers), fields(total = beers.len()))]
    pub async fn resolve_all(&self, beers: &[String]) -> Catalog {
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();

        let mut queued = std::collections::HashSet::new();
        for beer in beers.iter().filter(|b| queued.insert(b.as_str())) {
            let beer = beer.clone();
            let sources = self.sources.clone();
            let finder = self.finder.clone();
            let semaphore = semaphore.clone();
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let record = lookup_beer(&sources, finder.as_deref(), &beer).await;
                (beer, record)
            });
        }

        let total = queued.len();
        let mut done = 0;
        let mut catalog = Catalog::with_capacity(total);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((beer, record)) => {
                    done += 1;
                    info!("looked up {}/{} beers", done, total);
                    catalog.insert(beer, record);
                }
                Err(e) => warn!("lookup worker failed: {}", e),
            }
        }

        // A worker that died leaves its beer with nothing found anywhere
        for beer in beers {
            catalog
                .entry(beer.clone())
                .or_insert_with(|| empty_record(&self.sources));
        }
        catalog
    }
}

fn empty_record(sources: &[Arc<dyn ReviewSource>]) -> BeerRecord {
    sources
        .iter()
        .map(|s| (s.source_name(), LookupOutcome::NotFound))
        .collect()
}

async fn lookup_beer(
    sources: &[Arc<dyn ReviewSource>],
    finder: Option<&dyn PageFinder>,
    beer: &str,
) -> BeerRecord {
    debug!("looking up {} drinkability...", beer.to_uppercase());
    let pages: HashMap<_, _> = match finder {
        Some(finder) => finder.find_pages(beer).await,
        None => HashMap::new(),
    };

    let mut record = BeerRecord::new();
    for source in sources {
        let name = source.source_name();
        let known_page = pages.get(&name).map(String::as_str);
        let outcome = source.lookup(beer, known_page).await;
        debug!(source = %name, found = outcome.record().is_some(), "lookup finished");
        record.insert(name, outcome);
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Field, SourceName, SourceRecord};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every (beer, known_page) it is asked about.
    struct MockSource {
        name: SourceName,
        rating: Option<&'static str>,
        calls: Mutex<Vec<(String, Option<String>)>>,
    }

    impl MockSource {
        fn new(name: SourceName, rating: Option<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                name,
                rating,
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ReviewSource for MockSource {
        fn source_name(&self) -> SourceName {
            self.name
        }

        async fn lookup(&self, beer: &str, known_page: Option<&str>) -> LookupOutcome {
            self.calls
                .lock()
                .unwrap()
                .push((beer.to_string(), known_page.map(str::to_string)));
            match self.rating {
                Some(r) => LookupOutcome::Found(SourceRecord::new().with(Field::Rating, r)),
                None => LookupOutcome::NotFound,
            }
        }
    }

    fn as_source(source: &Arc<MockSource>) -> Arc<dyn ReviewSource> {
        source.clone()
    }

    struct MockFinder(HashMap<SourceName, String>);

    #[async_trait]
    impl PageFinder for MockFinder {
        async fn find_pages(&self, _beer: &str) -> HashMap<SourceName, String> {
            self.0.clone()
        }
    }

    #[tokio::test]
    async fn every_beer_gets_every_source() {
        let untappd = MockSource::new(SourceName::Untappd, Some("4.1"));
        let ratebeer = MockSource::new(SourceName::RateBeer, None);
        let resolver = LookupResolver::new(vec![as_source(&untappd), as_source(&ratebeer)], None, 2);

        let beers = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let catalog = resolver.resolve_all(&beers).await;

        assert_eq!(catalog.len(), 3);
        for beer in &beers {
            let record = &catalog[beer];
            assert_eq!(record.len(), 2);
            assert_eq!(record[&SourceName::RateBeer], LookupOutcome::NotFound);
            assert!(record[&SourceName::Untappd].record().is_some());
        }
        assert_eq!(untappd.calls.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn accelerator_pages_are_passed_to_matching_sources() {
        let untappd = MockSource::new(SourceName::Untappd, Some("4.0"));
        let beeradvocate = MockSource::new(SourceName::BeerAdvocate, Some("3.9"));
        let finder = MockFinder(HashMap::from([(
            SourceName::Untappd,
            "https://untappd.com/b/x/1".to_string(),
        )]));
        let resolver = LookupResolver::new(
            vec![as_source(&untappd), as_source(&beeradvocate)],
            Some(Arc::new(finder) as Arc<dyn PageFinder>),
            1,
        );

        resolver.resolve_all(&["X".to_string()]).await;

        assert_eq!(
            untappd.calls.lock().unwrap()[0].1.as_deref(),
            Some("https://untappd.com/b/x/1")
        );
        // No accelerator hit: the source searches on its own
        assert_eq!(beeradvocate.calls.lock().unwrap()[0].1, None);
    }

    #[tokio::test]
    async fn empty_accelerator_falls_back_to_site_search() {
        let untappd = MockSource::new(SourceName::Untappd, None);
        let resolver = LookupResolver::new(
            vec![as_source(&untappd)],
            Some(Arc::new(MockFinder(HashMap::new())) as Arc<dyn PageFinder>),
            4,
        );
        let catalog = resolver.resolve_all(&["Test Beer".to_string()]).await;
        assert_eq!(catalog["Test Beer"][&SourceName::Untappd], LookupOutcome::NotFound);
        assert_eq!(untappd.calls.lock().unwrap()[0].1, None);
    }

    #[tokio::test]
    async fn duplicate_names_are_looked_up_once() {
        let untappd = MockSource::new(SourceName::Untappd, Some("3.0"));
        let resolver = LookupResolver::new(vec![as_source(&untappd)], None, 4);
        let beers = vec!["Dup".to_string(), "Dup".to_string()];
        let catalog = resolver.resolve_all(&beers).await;
        assert_eq!(catalog.len(), 1);
        assert_eq!(untappd.calls.lock().unwrap().len(), 1);
    }

    /// Falls over on one beer, answers for the rest.
    struct PanicsOn(&'static str);

    #[async_trait]
    impl ReviewSource for PanicsOn {
        fn source_name(&self) -> SourceName {
            SourceName::RateBeer
        }

        async fn lookup(&self, beer: &str, _known_page: Option<&str>) -> LookupOutcome {
            if beer == self.0 {
                panic!("parser exploded on {}", beer);
            }
            LookupOutcome::Found(SourceRecord::new().with(Field::Rating, "3.5"))
        }
    }

    #[tokio::test]
    async fn failed_worker_leaves_an_empty_record() {
        let untappd = MockSource::new(SourceName::Untappd, Some("4.0"));
        let resolver = LookupResolver::new(
            vec![as_source(&untappd), Arc::new(PanicsOn("Bad")) as Arc<dyn ReviewSource>],
            None,
            2,
        );
        let beers = vec!["Good".to_string(), "Bad".to_string(), "Also Good".to_string()];

        let catalog = resolver.resolve_all(&beers).await;

        assert_eq!(catalog.len(), 3);
        let bad = &catalog["Bad"];
        assert_eq!(bad.len(), 2);
        assert!(bad.values().all(|o| *o == LookupOutcome::NotFound));
        assert!(catalog["Good"][&SourceName::RateBeer].record().is_some());
        assert!(catalog["Also Good"][&SourceName::Untappd].record().is_some());
    }
}
