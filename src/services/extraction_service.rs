use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, info_span, warn, Instrument, Span};
use url::Url;
use uuid::Uuid;

use crate::config::ScraperConfig;
use crate::errors::{FetchError, PipelineError};
use crate::models::{ProductStub, ResultRecord, SearchQuery, SellerInfo};
use crate::parsers::{CompiledRules, SearchResultParser, SellerDetailParser};
use crate::repositories::PageFetcher;
use crate::utils::build_search_url;

type DetailOutcome = Result<SellerInfo, FetchError>;

#[derive(Debug, Clone)]
struct PipelineSettings {
    base_url: String,
    search_path: String,
    request_timeout: Duration,
    max_concurrent: usize,
    enrichment_deadline: Option<Duration>,
}

pub struct ExtractionService {
    fetcher: Arc<dyn PageFetcher>,
    search_parser: SearchResultParser,
    seller_parser: SellerDetailParser,
    settings: PipelineSettings,
}

impl ExtractionService {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        rules: Arc<CompiledRules>,
        config: &ScraperConfig,
    ) -> Result<Self, url::ParseError> {
        let base_url = Url::parse(&config.base_url)?;
        let deadline = config.enrichment_deadline();

        Ok(Self {
            fetcher,
            search_parser: SearchResultParser::new(rules.clone(), base_url),
            seller_parser: SellerDetailParser::new(rules),
            settings: PipelineSettings {
                base_url: config.base_url.clone(),
                search_path: config.search_path.clone(),
                request_timeout: config.request_timeout(),
                max_concurrent: config.max_concurrent_requests.max(1),
                enrichment_deadline: (!deadline.is_zero()).then_some(deadline),
            },
        })
    }

    pub fn search_url(&self, keyword: &str) -> String {
        build_search_url(&self.settings.base_url, &self.settings.search_path, keyword)
    }

    pub fn pipeline_span(&self, query: &SearchQuery) -> Span {
        info_span!(
            "search",
            request_id = %Uuid::new_v4(),
            keyword = %query.keyword(),
            limit = query.limit()
        )
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<ResultRecord>, PipelineError> {
        async move {
            let stubs = self.find_stubs(query).await?;
            let records = self.enrich(stubs).await;
            let enriched = records
                .iter()
                .filter(|r| r.seller_name.is_some() || r.seller_location.is_some())
                .count();
            info!(results = records.len(), enriched, "search completed");
            Ok(records)
        }
        .instrument(self.pipeline_span(query))
        .await
    }

    pub async fn find_stubs(&self, query: &SearchQuery) -> Result<Vec<ProductStub>, PipelineError> {
        let url = self.search_url(query.keyword());
        debug!(url = %url, "fetching search page");

        let html = self
            .fetcher
            .fetch(&url, self.settings.request_timeout)
            .await
            .map_err(|e| {
                error!(url = %url, error = %e, "search page unavailable");
                PipelineError::SearchUnavailable(e)
            })?;

        let mut stubs = self.search_parser.parse(&html);
        let parsed = stubs.len();
        stubs.truncate(query.limit());

        if parsed == 0 {
            info!(url = %url, "no listings found on search page");
        } else {
            debug!(parsed, kept = stubs.len(), "parsed search page");
        }
        Ok(stubs)
    }

    // Completions land in the slot of their rank; unsettled slots degrade to null sellers.
    pub async fn enrich(&self, stubs: Vec<ProductStub>) -> Vec<ResultRecord> {
        let mut slots: Vec<Option<DetailOutcome>> = vec![None; stubs.len()];

        {
            let mut settled = stream::iter(stubs.iter().enumerate())
                .map(|(position, stub)| async move { (position, self.enrich_one(position, stub).await) })
                .buffer_unordered(self.settings.max_concurrent);

            let gather = async {
                while let Some((position, outcome)) = settled.next().await {
                    slots[position] = Some(outcome);
                }
            };

            match self.settings.enrichment_deadline {
                Some(deadline) => {
                    if timeout(deadline, gather).await.is_err() {
                        warn!(deadline_secs = deadline.as_secs(), "enrichment deadline elapsed");
                    }
                }
                None => gather.await,
            }
        }

        let unsettled = slots.iter().filter(|slot| slot.is_none()).count();
        if unsettled > 0 {
            warn!(unsettled, "returning unsettled listings without seller details");
        }

        stubs
            .into_iter()
            .zip(slots)
            .map(|(stub, slot)| settle(stub, slot))
            .collect()
    }

    // Sends records in rank order; returns how many were delivered.
    pub async fn stream_enriched(&self, stubs: Vec<ProductStub>, tx: mpsc::Sender<ResultRecord>) -> usize {
        let deadline = self.settings.enrichment_deadline;
        let expiry = async move {
            match deadline {
                Some(deadline) => sleep(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(expiry);
        let mut sent = 0;

        {
            let mut ordered = stream::iter(stubs.clone().into_iter().enumerate())
                .map(move |(position, stub)| async move { self.enrich_one(position, &stub).await })
                .buffered(self.settings.max_concurrent);

            loop {
                let next = tokio::select! {
                    next = ordered.next() => next,
                    _ = tx.closed() => {
                        debug!(sent, "stream receiver dropped; abandoning enrichment");
                        return sent;
                    }
                    _ = &mut expiry => {
                        warn!(remaining = stubs.len() - sent, "enrichment deadline elapsed");
                        break;
                    }
                };
                let Some(outcome) = next else { break };

                if tx.send(settle(stubs[sent].clone(), Some(outcome))).await.is_err() {
                    debug!(sent, "stream receiver dropped; abandoning enrichment");
                    return sent;
                }
                sent += 1;
            }
        }

        for stub in stubs.into_iter().skip(sent) {
            if tx.send(ResultRecord::unenriched(stub)).await.is_err() {
                break;
            }
            sent += 1;
        }
        sent
    }

    async fn enrich_one(&self, position: usize, stub: &ProductStub) -> DetailOutcome {
        match self
            .fetcher
            .fetch(&stub.url, self.settings.request_timeout)
            .await
        {
            Ok(html) => {
                let seller = self.seller_parser.parse(&html);
                if seller.is_empty() {
                    debug!(position, url = %stub.url, "no seller block on product page");
                }
                Ok(seller)
            }
            Err(e) => {
                warn!(position, url = %stub.url, error = %e, "product page unavailable");
                Err(e)
            }
        }
    }
}

fn settle(stub: ProductStub, outcome: Option<DetailOutcome>) -> ResultRecord {
    match outcome {
        Some(Ok(seller)) => ResultRecord::merge(stub, seller),
        Some(Err(_)) | None => ResultRecord::unenriched(stub),
    }
}
