//! Translation stage
//!
//! Besides validation, caching, and the timeout, this stage owns context
//! enrichment: an optional context id pulls snippet text and a domain-term
//! mapping from the context provider before the translator runs. A failed
//! context fetch degrades to an uncontextualized call.

use std::sync::Arc;
use std::time::Duration;

use speech_bridge_cache::{translation_key, ResultCache};
use speech_bridge_core::text::is_blank;
use speech_bridge_core::types::{TranslationOutcome, TranslationRequest};
use speech_bridge_core::{ContextProvider, Error, Result, Stage, Translator};
use uuid::Uuid;

use super::{call_collaborator, StageResult};

pub struct TranslationStage {
    translator: Arc<dyn Translator>,
    context: Option<Arc<dyn ContextProvider>>,
    cache: Arc<ResultCache>,
    timeout: Duration,
    snippet_limit: usize,
}

impl TranslationStage {
    pub fn new(
        translator: Arc<dyn Translator>,
        context: Option<Arc<dyn ContextProvider>>,
        cache: Arc<ResultCache>,
        timeout: Duration,
        snippet_limit: usize,
    ) -> Self {
        Self {
            translator,
            context,
            cache,
            timeout,
            snippet_limit,
        }
    }

    pub async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
        context_id: Option<Uuid>,
        use_cache: bool,
    ) -> Result<StageResult<TranslationOutcome>> {
        if is_blank(text) {
            return Err(Error::validation("text must not be empty"));
        }
        if source_lang.trim().is_empty() || target_lang.trim().is_empty() {
            return Err(Error::validation("language pair must not be empty"));
        }

        let context_key = context_id.map(|id| id.to_string());
        let key = translation_key(source_lang, target_lang, context_key.as_deref(), text);

        if use_cache {
            if let Some(hit) = self.cache.get_translation(&key) {
                tracing::debug!(source_lang, target_lang, "translation cache hit");
                return Ok(StageResult::cached(self.outcome(
                    text,
                    hit,
                    source_lang,
                    target_lang,
                )));
            }
        }

        let mut request = TranslationRequest::new(text, source_lang, target_lang);
        if let Some(id) = context_id {
            self.enrich(&mut request, id).await;
        }

        let translation = call_collaborator(
            Stage::Translation,
            self.timeout,
            self.translator.translate(&request),
        )
        .await?;

        if use_cache {
            self.cache.put_translation(&key, translation.clone());
        }
        Ok(StageResult::fresh(self.outcome(
            text,
            translation,
            source_lang,
            target_lang,
        )))
    }

    /// Translate items one at a time, preserving input order.
    /// Each item succeeds or fails independently.
    pub async fn translate_batch(
        &self,
        items: &[String],
        source_lang: &str,
        target_lang: &str,
        context_id: Option<Uuid>,
        use_cache: bool,
    ) -> Vec<Result<StageResult<TranslationOutcome>>> {
        let mut results = Vec::with_capacity(items.len());
        for item in items {
            results.push(
                self.translate(item, source_lang, target_lang, context_id, use_cache)
                    .await,
            );
        }
        results
    }

    /// Language detection passthrough to the translator
    pub async fn detect_language(&self, text: &str) -> Result<(String, f32)> {
        if is_blank(text) {
            return Err(Error::validation("text must not be empty"));
        }
        call_collaborator(
            Stage::Translation,
            self.timeout,
            self.translator.detect_language(text),
        )
        .await
    }

    /// Pull context snippets and terminology into the request. Fetch
    /// failures log a warning and leave the request unenriched.
    async fn enrich(&self, request: &mut TranslationRequest, context_id: Uuid) {
        let Some(provider) = &self.context else {
            return;
        };

        match provider
            .context_for_text(&request.text, context_id, self.snippet_limit)
            .await
        {
            Ok(context) if !context.is_empty() => request.context_text = Some(context),
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(%context_id, error = %e, "context fetch failed, translating without it");
            }
        }

        match provider
            .domain_vocabulary(context_id, &request.source_lang, &request.target_lang)
            .await
        {
            Ok(terms) if !terms.is_empty() => request.domain_terms = Some(terms),
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(%context_id, error = %e, "vocabulary fetch failed, translating without it");
            }
        }
    }

    fn outcome(
        &self,
        original: &str,
        translation: String,
        source_lang: &str,
        target_lang: &str,
    ) -> TranslationOutcome {
        TranslationOutcome {
            original: original.to_string(),
            translation,
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct UppercaseTranslator {
        calls: AtomicUsize,
        saw_context: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl Translator for UppercaseTranslator {
        async fn translate(&self, request: &TranslationRequest) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if request.context_text.is_some() || request.domain_terms.is_some() {
                self.saw_context.fetch_add(1, Ordering::SeqCst);
            }
            Ok(request.text.to_uppercase())
        }
    }

    struct FailingProvider;

    #[async_trait::async_trait]
    impl ContextProvider for FailingProvider {
        async fn context_for_text(&self, _: &str, id: Uuid, _: usize) -> Result<String> {
            Err(Error::UnknownContext(id))
        }

        async fn domain_vocabulary(
            &self,
            id: Uuid,
            _: &str,
            _: &str,
        ) -> Result<HashMap<String, String>> {
            Err(Error::UnknownContext(id))
        }
    }

    struct FixedProvider;

    #[async_trait::async_trait]
    impl ContextProvider for FixedProvider {
        async fn context_for_text(&self, _: &str, _: Uuid, _: usize) -> Result<String> {
            Ok("loan terminology".to_string())
        }

        async fn domain_vocabulary(
            &self,
            _: Uuid,
            _: &str,
            _: &str,
        ) -> Result<HashMap<String, String>> {
            Ok(HashMap::from([("vay".to_string(), "loan".to_string())]))
        }
    }

    fn translator() -> Arc<UppercaseTranslator> {
        Arc::new(UppercaseTranslator {
            calls: AtomicUsize::new(0),
            saw_context: AtomicUsize::new(0),
        })
    }

    fn stage(
        t: Arc<UppercaseTranslator>,
        provider: Option<Arc<dyn ContextProvider>>,
    ) -> TranslationStage {
        TranslationStage::new(
            t,
            provider,
            Arc::new(ResultCache::new(8, 8, 8)),
            Duration::from_secs(5),
            3,
        )
    }

    #[tokio::test]
    async fn test_cache_transparency() {
        let t = translator();
        let stage = stage(t.clone(), None);

        let first = stage.translate("xin chào", "vi", "en", None, true).await.unwrap();
        let second = stage.translate("xin chào", "vi", "en", None, true).await.unwrap();

        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(first.value, second.value);
        assert_eq!(t.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_blank_text_rejected() {
        let t = translator();
        let stage = stage(t.clone(), None);
        let err = stage.translate("   ", "vi", "en", None, true).await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(t.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_context_enrichment_reaches_translator() {
        let t = translator();
        let stage = stage(t.clone(), Some(Arc::new(FixedProvider)));

        stage
            .translate("vay tiền", "vi", "en", Some(Uuid::new_v4()), false)
            .await
            .unwrap();
        assert_eq!(t.saw_context.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_context_failure_degrades_gracefully() {
        let t = translator();
        let stage = stage(t.clone(), Some(Arc::new(FailingProvider)));

        let out = stage
            .translate("xin chào", "vi", "en", Some(Uuid::new_v4()), false)
            .await
            .unwrap();
        assert_eq!(out.value.translation, "XIN CHÀO");
        assert_eq!(t.saw_context.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_context_scopes_cache_keys() {
        let t = translator();
        let stage = stage(t.clone(), Some(Arc::new(FixedProvider)));
        let ctx = Uuid::new_v4();

        stage.translate("hello", "en", "vi", None, true).await.unwrap();
        let scoped = stage.translate("hello", "en", "vi", Some(ctx), true).await.unwrap();

        // a context-scoped request never reuses the plain entry
        assert!(!scoped.cached);
        assert_eq!(t.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_batch_preserves_order_and_isolates_failures() {
        struct Picky;

        #[async_trait::async_trait]
        impl Translator for Picky {
            async fn translate(&self, request: &TranslationRequest) -> Result<String> {
                if request.text == "bad" {
                    Err(Error::Other("refused".to_string()))
                } else {
                    Ok(format!("{}!", request.text))
                }
            }
        }

        let stage = TranslationStage::new(
            Arc::new(Picky),
            None,
            Arc::new(ResultCache::new(8, 8, 8)),
            Duration::from_secs(5),
            3,
        );

        let items = vec!["one".to_string(), "bad".to_string(), "two".to_string()];
        let results = stage.translate_batch(&items, "en", "vi", None, true).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().value.translation, "one!");
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().unwrap().value.translation, "two!");
    }
}
