//! Per-article enrichment: fetch → (classify ∥ translate → summarize) → publish.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, instrument};

use awsdigest_catalog::{LibsqlCatalogStore, ServiceCatalog};
use awsdigest_fetcher::{ArticleFetcher, FetchedContent};
use awsdigest_llm::{LanguageModel, OpenAiClient, RetryPolicy, RetryingModel};
use awsdigest_publisher::{NotionClient, Publisher};
use awsdigest_shared::{
    AppConfig, ArticleContent, ArticleOutcome, FeedArticle, KnowledgeBaseRecord, Result,
    SecretSource,
};

use crate::classify::Classifier;
use crate::summarize::Summarizer;
use crate::translate::Translator;

/// Anything that turns one feed article into an outcome.
///
/// Implementations must not fail: faults become a failed [`ArticleOutcome`].
#[async_trait]
pub trait ArticleProcessor: Send + Sync {
    async fn process(&self, article: FeedArticle) -> ArticleOutcome;
}

/// The article enrichment pipeline with its injected collaborators.
pub struct Pipeline {
    catalog: ServiceCatalog,
    fetcher: ArticleFetcher,
    classifier: Classifier,
    translator: Translator,
    summarizer: Summarizer,
    publisher: Publisher,
}

impl Pipeline {
    /// `model` is used as given; wrap it in a
    /// [`RetryingModel`] to get transient-failure retries.
    pub fn new(
        catalog: ServiceCatalog,
        fetcher: ArticleFetcher,
        model: Arc<dyn LanguageModel>,
        publisher: Publisher,
        config: &AppConfig,
    ) -> Self {
        Self {
            catalog,
            fetcher,
            classifier: Classifier::new(model.clone()),
            translator: Translator::new(model.clone(), &config.language),
            summarizer: Summarizer::new(model, &config.language),
            publisher,
        }
    }

    /// Wire the production clients: libSQL catalog, OpenAI model with
    /// retries, Notion knowledge base.
    pub async fn from_config(config: &AppConfig, secrets: &dyn SecretSource) -> Result<Self> {
        let store = LibsqlCatalogStore::open(&config.catalog.resolved_db_path()?).await?;
        let catalog = ServiceCatalog::new(Arc::new(store), config.catalog.page_size);

        let fetcher = ArticleFetcher::new(&config.fetch)?;

        let client = OpenAiClient::from_secrets(&config.openai, secrets)?;
        let model = RetryingModel::new(Arc::new(client), RetryPolicy::from(&config.retry));

        let notion = NotionClient::from_secrets(&config.notion, secrets)?;
        let publisher = Publisher::new(Arc::new(notion), config.notion.labels.clone());

        Ok(Self::new(catalog, fetcher, Arc::new(model), publisher, config))
    }

    async fn try_process(&self, article: &FeedArticle) -> Result<ArticleOutcome> {
        let catalog = self.catalog.list().await?;
        let fetched = self.fetcher.fetch(&article.link).await;

        let excerpt = if fetched.available { fetched.body.as_str() } else { "" };
        let (tag, (translated_body, summary)) = tokio::join!(
            self.classifier.classify(&article.title, excerpt, &catalog),
            self.translate_and_summarize(&fetched),
        );

        let content = ArticleContent {
            original_body: fetched.body,
            translated_body,
            summary,
            reference_links: fetched.reference_links,
        };
        let record = KnowledgeBaseRecord::new(article, tag.clone(), content);
        let publication = self.publisher.publish(&record).await;

        let mut outcome = ArticleOutcome::published(
            &article.title,
            tag.as_ref(),
            publication.as_ref().map(|p| p.page_id.clone()),
        );
        outcome.error = publication.and_then(|p| p.incomplete);
        Ok(outcome)
    }

    /// Placeholder content is carried through untranslated with no summary.
    async fn translate_and_summarize(&self, fetched: &FetchedContent) -> (String, String) {
        if !fetched.available {
            return (fetched.body.clone(), String::new());
        }
        let translated = self.translator.translate(&fetched.body).await;
        let summary = self.summarizer.summarize(&translated).await;
        (translated, summary)
    }
}

#[async_trait]
impl ArticleProcessor for Pipeline {
    #[instrument(skip_all, fields(title = %article.title, url = %article.link))]
    async fn process(&self, article: FeedArticle) -> ArticleOutcome {
        match self.try_process(&article).await {
            Ok(outcome) => {
                info!(
                    tags = ?outcome.tags,
                    published = outcome.published_to_kb,
                    document_id = outcome.document_id.as_deref().unwrap_or(""),
                    "article processed"
                );
                outcome
            }
            Err(e) => {
                error!(error = %e, "article processing failed");
                ArticleOutcome::failed(&article.title, e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FnModel, MemoryCatalog, MemoryKb, user_text};
    use awsdigest_fetcher::CONTENT_UNAVAILABLE;
    use awsdigest_llm::ChatMessage;
    use awsdigest_shared::{FetchConfig, NotionLabels};
    use wiremock::matchers::path;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ARTICLE_HTML: &str = r#"<html><body><div id="aws-page-content">
        <p>Amazon EC2 now offers new instance types.</p>
        <p>See <a href="https://docs.aws.amazon.com/ec2/">the docs</a>.</p>
    </div></body></html>"#;

    const CATALOG: &[(&str, &str)] = &[
        ("Amazon Elastic Compute Cloud", "Amazon EC2"),
        ("Amazon EC2", "Amazon EC2"),
        ("AWS Lambda", "AWS Lambda"),
    ];

    /// Routes each request by its prompt so concurrent calls need no ordering.
    fn routed_model(
        tag_answer: &'static str,
    ) -> impl Fn(&[ChatMessage]) -> Result<String> + Send + Sync + 'static {
        move |messages: &[ChatMessage]| {
            let prompt = user_text(messages);
            if prompt.contains("Candidates:") {
                Ok(tag_answer.to_string())
            } else if prompt.contains("bullet points") {
                Ok("1. 新インスタンス\n2. 全リージョン\n3. 料金".to_string())
            } else {
                Ok("Here is the translation:\nAmazon EC2 で新しいインスタンスが利用可能に。".to_string())
            }
        }
    }

    async fn article_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(path("/whats-new/ec2"))
            .respond_with(ResponseTemplate::new(200).set_body_string(ARTICLE_HTML))
            .mount(&server)
            .await;
        server
    }

    fn pipeline(
        catalog: Arc<MemoryCatalog>,
        model: Arc<dyn LanguageModel>,
        kb: Arc<MemoryKb>,
    ) -> Pipeline {
        let fetcher = ArticleFetcher::new(&FetchConfig {
            timeout_secs: 5,
            ..FetchConfig::default()
        })
        .unwrap();
        Pipeline::new(
            ServiceCatalog::new(catalog, 2),
            fetcher,
            model,
            Publisher::new(kb, NotionLabels::default()),
            &AppConfig::default(),
        )
    }

    fn article(server: &MockServer) -> FeedArticle {
        FeedArticle {
            title: "Amazon EC2 introduces new instance types".into(),
            link: format!("{}/whats-new/ec2", server.uri()),
            published: Some("2024-06-10T17:00:00+00:00".into()),
        }
    }

    #[tokio::test]
    async fn ec2_article_is_tagged_and_published() {
        let server = article_server().await;
        let kb = Arc::new(MemoryKb::default());
        let pipeline = pipeline(
            MemoryCatalog::new(CATALOG),
            FnModel::new(routed_model("Amazon EC2")),
            kb.clone(),
        );

        let outcome = pipeline.process(article(&server)).await;

        assert_eq!(outcome.tags, vec!["Amazon EC2".to_string()]);
        assert!(outcome.published_to_kb);
        assert_eq!(outcome.document_id.as_deref(), Some("page-1"));
        assert!(outcome.error.is_none());

        let created = kb.created.lock().unwrap();
        assert_eq!(created[0]["タグ"]["multi_select"][0]["name"], "Amazon EC2");
    }

    #[tokio::test]
    async fn untagged_article_still_published() {
        let server = article_server().await;
        let kb = Arc::new(MemoryKb::default());
        let pipeline = pipeline(
            MemoryCatalog::new(CATALOG),
            FnModel::new(routed_model("Not Found")),
            kb.clone(),
        );

        let outcome = pipeline.process(article(&server)).await;

        assert!(outcome.tags.is_empty());
        assert!(outcome.published_to_kb);
        assert!(kb.created.lock().unwrap()[0].get("タグ").is_none());
    }

    #[tokio::test]
    async fn reprocessing_is_idempotent() {
        let server = article_server().await;
        let kb = Arc::new(MemoryKb::default());
        let pipeline = pipeline(
            MemoryCatalog::new(CATALOG),
            FnModel::new(routed_model("Amazon EC2")),
            kb.clone(),
        );

        let first = pipeline.process(article(&server)).await;
        let second = pipeline.process(article(&server)).await;

        assert_eq!(first.document_id, second.document_id);
        assert_eq!(kb.created.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn catalog_failure_is_reported_not_raised() {
        let server = article_server().await;
        let kb = Arc::new(MemoryKb::default());
        let pipeline = pipeline(
            MemoryCatalog::unavailable(),
            FnModel::new(routed_model("Amazon EC2")),
            kb.clone(),
        );

        let outcome = pipeline.process(article(&server)).await;

        assert!(!outcome.published_to_kb);
        assert!(outcome.tags.is_empty());
        assert!(outcome.error.as_deref().unwrap().contains("storage error"));
        assert!(kb.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn incomplete_page_is_reported_on_outcome() {
        let links: String = (0..120)
            .map(|i| format!(r#"<a href="https://docs.aws.amazon.com/ec2/{i}">{i}</a> "#))
            .collect();
        let html = format!(
            r#"<html><body><div id="aws-page-content"><p>Amazon EC2 update.</p><p>{links}</p></div></body></html>"#
        );
        let server = MockServer::start().await;
        Mock::given(path("/whats-new/ec2"))
            .respond_with(ResponseTemplate::new(200).set_body_string(html))
            .mount(&server)
            .await;

        let kb = Arc::new(MemoryKb {
            fail_appends: true,
            ..MemoryKb::default()
        });
        let pipeline = pipeline(
            MemoryCatalog::new(CATALOG),
            FnModel::new(routed_model("Amazon EC2")),
            kb.clone(),
        );

        let outcome = pipeline.process(article(&server)).await;

        assert!(outcome.published_to_kb);
        assert_eq!(outcome.document_id.as_deref(), Some("page-1"));
        assert!(!outcome.succeeded());
        assert!(outcome.error.as_deref().unwrap().contains("not appended"));
    }

    #[tokio::test]
    async fn unavailable_content_skips_translation() {
        let server = MockServer::start().await;
        Mock::given(path("/whats-new/ec2"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let kb = Arc::new(MemoryKb::default());
        let model = FnModel::new(routed_model("Amazon EC2"));
        let pipeline = pipeline(MemoryCatalog::new(CATALOG), model.clone(), kb.clone());

        let outcome = pipeline.process(article(&server)).await;

        assert!(outcome.published_to_kb);
        assert_eq!(outcome.tags, vec!["Amazon EC2".to_string()]);

        let calls = model.calls();
        assert_eq!(calls.len(), 1, "only the classifier should call the model");
        assert!(user_text(&calls[0]).contains("Candidates:"));
        assert!(!user_text(&calls[0]).contains(CONTENT_UNAVAILABLE));
    }
}
