//! Bounded fan-out of the pipeline over a batch of articles.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{Instrument, error, info, info_span};
use uuid::Uuid;

use awsdigest_shared::{ArticleOutcome, FeedArticle};

use crate::pipeline::ArticleProcessor;

/// Summary of one batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub run_id: String,
    /// Same order as the input articles.
    pub outcomes: Vec<ArticleOutcome>,
    pub published: usize,
    pub failed: usize,
    #[serde(skip)]
    pub elapsed: Duration,
}

/// Progress callback for batch runs.
pub trait BatchProgress: Send + Sync {
    /// Called once per article as it finishes, in completion order.
    fn article_done(&self, outcome: &ArticleOutcome, completed: usize, total: usize);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl BatchProgress for SilentProgress {
    fn article_done(&self, _outcome: &ArticleOutcome, _completed: usize, _total: usize) {}
}

/// Process `articles` with at most `concurrency` in flight.
///
/// A panicking article is reported as failed; the rest of the batch runs on.
pub async fn run_batch(
    processor: Arc<dyn ArticleProcessor>,
    articles: Vec<FeedArticle>,
    concurrency: usize,
    progress: Arc<dyn BatchProgress>,
) -> BatchReport {
    let run_id = Uuid::now_v7().to_string();
    let span = info_span!("batch", %run_id);
    let start = Instant::now();
    let total = articles.len();

    async move {
        info!(total, concurrency, "starting batch");

        let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
        let completed = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::with_capacity(total);

        for article in articles {
            let title = article.title.clone();
            let processor = processor.clone();
            let semaphore = semaphore.clone();
            let completed = completed.clone();
            let progress = progress.clone();

            let handle = tokio::spawn(
                async move {
                    let outcome = match semaphore.acquire_owned().await {
                        Ok(_permit) => processor.process(article).await,
                        Err(e) => ArticleOutcome::failed(&article.title, e.to_string()),
                    };
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    progress.article_done(&outcome, done, total);
                    outcome
                }
                .in_current_span(),
            );
            handles.push((title, handle));
        }

        let mut outcomes = Vec::with_capacity(total);
        for (title, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(%title, error = %e, "article task aborted");
                    let outcome = ArticleOutcome::failed(&title, format!("task failed: {e}"));
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    progress.article_done(&outcome, done, total);
                    outcome
                }
            };
            outcomes.push(outcome);
        }

        let published = outcomes.iter().filter(|o| o.published_to_kb).count();
        let failed = outcomes.len() - published;
        let elapsed = start.elapsed();
        info!(published, failed, elapsed_ms = elapsed.as_millis() as u64, "batch complete");

        BatchReport {
            run_id,
            outcomes,
            published,
            failed,
            elapsed,
        }
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Tracks peak concurrency; panics on titles starting with "panic".
    #[derive(Default)]
    struct ProbeProcessor {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl ArticleProcessor for ProbeProcessor {
        async fn process(&self, article: FeedArticle) -> ArticleOutcome {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if article.title.starts_with("panic") {
                panic!("boom");
            }
            ArticleOutcome::published(&article.title, None, Some(format!("id-{}", article.title)))
        }
    }

    #[derive(Default)]
    struct RecordingProgress {
        seen: Mutex<Vec<(String, usize, usize)>>,
    }

    impl BatchProgress for RecordingProgress {
        fn article_done(&self, outcome: &ArticleOutcome, completed: usize, total: usize) {
            self.seen
                .lock()
                .unwrap()
                .push((outcome.title.clone(), completed, total));
        }
    }

    fn articles(titles: &[&str]) -> Vec<FeedArticle> {
        titles
            .iter()
            .map(|t| FeedArticle {
                title: t.to_string(),
                link: format!("https://aws.amazon.com/{t}"),
                published: None,
            })
            .collect()
    }

    #[tokio::test]
    async fn respects_concurrency_limit_and_input_order() {
        let processor = Arc::new(ProbeProcessor::default());
        let titles: Vec<String> = (0..12).map(|i| format!("a{i}")).collect();
        let refs: Vec<&str> = titles.iter().map(String::as_str).collect();

        let report = run_batch(
            processor.clone(),
            articles(&refs),
            5,
            Arc::new(SilentProgress),
        )
        .await;

        assert_eq!(report.outcomes.len(), 12);
        assert_eq!(report.published, 12);
        assert!(processor.peak.load(Ordering::SeqCst) <= 5);
        let got: Vec<&str> = report.outcomes.iter().map(|o| o.title.as_str()).collect();
        assert_eq!(got, refs);
        assert!(Uuid::parse_str(&report.run_id).is_ok());
    }

    #[tokio::test]
    async fn panic_is_isolated_to_its_article() {
        let progress = Arc::new(RecordingProgress::default());
        let report = run_batch(
            Arc::new(ProbeProcessor::default()),
            articles(&["ok-1", "panic-2", "ok-3"]),
            2,
            progress.clone(),
        )
        .await;

        assert_eq!(report.published, 2);
        assert_eq!(report.failed, 1);
        let failed = &report.outcomes[1];
        assert_eq!(failed.title, "panic-2");
        assert!(!failed.published_to_kb);
        assert!(failed.error.as_deref().unwrap().contains("task failed"));
        assert!(report.outcomes[2].succeeded());

        let seen = progress.seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert!(seen.iter().all(|(_, _, total)| *total == 3));
    }

    #[tokio::test]
    async fn empty_batch() {
        let report = run_batch(
            Arc::new(ProbeProcessor::default()),
            Vec::new(),
            5,
            Arc::new(SilentProgress),
        )
        .await;
        assert!(report.outcomes.is_empty());
        assert_eq!(report.failed, 0);
    }
}
