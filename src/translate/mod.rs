// Modular translation architecture
//
// Providers implement the Translator trait and are picked by the factory
// from an explicit TranslateConfig:
// - Echo: returns the source lines, useful for dry runs and bilingual layouts
// - Api: posts blocks of lines to a JSON translation endpoint
//
// translate_document drives a provider over a whole document block by block.

pub mod api;
pub mod echo;

use async_trait::async_trait;
use tracing::{debug, info, warn};

pub use api::ApiTranslator;
pub use echo::EchoTranslator;

use crate::config::{ProviderKind, TranslateConfig, TranslationMode};
use crate::document::{Document, NATIVE_LANGUAGE};
use crate::error::Result;

/// Main trait for translation providers
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate a block of lines, returning one line per input line
    async fn translate_block(
        &self,
        lines: &[String],
        source_lang: &str,
        target_lang: &str,
    ) -> Result<Vec<String>>;

    /// Provider name for logs
    fn name(&self) -> &str;
}

/// Factory for creating translator instances
pub struct TranslatorFactory;

impl TranslatorFactory {
    /// Create a translator for the configured provider
    pub fn create_translator(config: &TranslateConfig) -> Result<Box<dyn Translator>> {
        match config.provider {
            ProviderKind::Echo => Ok(Box::new(EchoTranslator)),
            ProviderKind::Api => Ok(Box::new(ApiTranslator::new(config)?)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TranslateOptions {
    pub block_size: usize,
    pub mode: TranslationMode,
}

impl From<&TranslateConfig> for TranslateOptions {
    fn from(config: &TranslateConfig) -> Self {
        Self {
            block_size: config.block_size,
            mode: config.mode,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranslationSummary {
    pub blocks: usize,
    pub failed_blocks: usize,
}

/// Fill `translations[lang]` on every segment for each target language.
///
/// Each language is first registered on all segments, so a failed or short
/// provider response leaves empty text behind instead of aborting the
/// document. `on_progress` receives `(completed_blocks, total_blocks)`.
pub async fn translate_document(
    document: &mut Document,
    target_languages: &[String],
    translator: &dyn Translator,
    options: TranslateOptions,
    on_progress: &(dyn Fn(usize, usize) + Send + Sync),
) -> Result<TranslationSummary> {
    let block_size = options.block_size.max(1);
    let blocks_per_language = document.segments.len().div_ceil(block_size);
    let total_blocks = blocks_per_language * target_languages.len();
    let mut summary = TranslationSummary::default();

    for target_lang in target_languages {
        info!(
            "Translating {} segments to {} with provider {}",
            document.segments.len(),
            target_lang,
            translator.name()
        );
        document.ensure_translation_key(target_lang);

        for (block_index, block) in document.segments.chunks_mut(block_size).enumerate() {
            let source_lines: Vec<String> = block
                .iter()
                .map(|segment| segment.source_text().to_string())
                .collect();

            debug!(
                "Block {}/{} ({})",
                block_index + 1,
                blocks_per_language,
                target_lang
            );

            match translate_lines(translator, &source_lines, target_lang, options.mode).await {
                Ok(translated) => {
                    if translated.len() != block.len() {
                        warn!(
                            "Provider returned {} lines for a block of {} ({}); missing lines stay empty",
                            translated.len(),
                            block.len(),
                            target_lang
                        );
                    }
                    for (segment, text) in block.iter_mut().zip(translated) {
                        segment.set_translation(target_lang.as_str(), text.trim());
                    }
                }
                Err(e) => {
                    warn!(
                        "Block {}/{} ({}) failed, leaving it empty: {}",
                        block_index + 1,
                        blocks_per_language,
                        target_lang,
                        e
                    );
                    summary.failed_blocks += 1;
                }
            }

            summary.blocks += 1;
            on_progress(summary.blocks, total_blocks);
        }
    }

    info!(
        "Translation finished: {} blocks, {} failed",
        summary.blocks, summary.failed_blocks
    );
    Ok(summary)
}

async fn translate_lines(
    translator: &dyn Translator,
    lines: &[String],
    target_lang: &str,
    mode: TranslationMode,
) -> Result<Vec<String>> {
    let draft = translator
        .translate_block(lines, NATIVE_LANGUAGE, target_lang)
        .await?;

    match mode {
        TranslationMode::Draft => Ok(draft),
        TranslationMode::DraftPostEdit => {
            match translator.translate_block(&draft, NATIVE_LANGUAGE, target_lang).await {
                Ok(edited) => Ok(edited),
                Err(e) => {
                    warn!("Post-edit pass failed, keeping the draft: {}", e);
                    Ok(draft)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Meta, Segment};
    use crate::error::JimakuError;
    use std::sync::Mutex;

    fn document(count: u32) -> Document {
        let segments = (1..=count)
            .map(|i| Segment::new(i, i as f64, i as f64 + 0.5, format!("行{}", i)).unwrap())
            .collect();
        Document::new(Meta::new("sample"), segments)
    }

    fn options(block_size: usize) -> TranslateOptions {
        TranslateOptions {
            block_size,
            mode: TranslationMode::Draft,
        }
    }

    #[test]
    fn test_translate_document_in_blocks() {
        let mut translator = MockTranslator::new();
        translator.expect_name().return_const("mock".to_string());
        translator
            .expect_translate_block()
            .times(3)
            .returning(|lines, source, target| {
                assert_eq!(source, "ja");
                Ok(lines.iter().map(|l| format!("{}:{}", target, l)).collect())
            });

        let progress = Mutex::new(Vec::new());
        let mut doc = document(5);
        let summary = tokio_test::block_on(translate_document(
            &mut doc,
            &["en".to_string()],
            &translator,
            options(2),
            &|done, total| progress.lock().unwrap().push((done, total)),
        ))
        .unwrap();

        assert_eq!(summary, TranslationSummary { blocks: 3, failed_blocks: 0 });
        assert_eq!(doc.segments[0].translation("en"), Some("en:行1"));
        assert_eq!(doc.segments[4].translation("en"), Some("en:行5"));
        assert_eq!(*progress.lock().unwrap(), vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[test]
    fn test_failed_block_leaves_empty_text() {
        let mut translator = MockTranslator::new();
        translator.expect_name().return_const("mock".to_string());
        translator
            .expect_translate_block()
            .returning(|lines, _, _| {
                if lines.iter().any(|l| l == "行3") {
                    Err(JimakuError::Translation("provider down".to_string()))
                } else {
                    Ok(lines.to_vec())
                }
            });

        let mut doc = document(4);
        let summary = tokio_test::block_on(translate_document(
            &mut doc,
            &["en".to_string()],
            &translator,
            options(2),
            &|_, _| {},
        ))
        .unwrap();

        assert_eq!(summary.failed_blocks, 1);
        assert_eq!(doc.segments[1].translation("en"), Some("行2"));
        assert_eq!(doc.segments[2].translation("en"), Some(""));
        assert_eq!(doc.segments[3].translation("en"), Some(""));
    }

    #[test]
    fn test_short_response_fills_what_it_can() {
        let mut translator = MockTranslator::new();
        translator.expect_name().return_const("mock".to_string());
        translator
            .expect_translate_block()
            .returning(|_, _, _| Ok(vec!["only one".to_string()]));

        let mut doc = document(3);
        tokio_test::block_on(translate_document(
            &mut doc,
            &["fr".to_string()],
            &translator,
            options(3),
            &|_, _| {},
        ))
        .unwrap();

        assert_eq!(doc.segments[0].translation("fr"), Some("only one"));
        assert_eq!(doc.segments[1].translation("fr"), Some(""));
        assert_eq!(doc.segments[2].translation("fr"), Some(""));
    }

    #[test]
    fn test_postedit_runs_provider_twice() {
        let mut translator = MockTranslator::new();
        translator.expect_name().return_const("mock".to_string());
        translator
            .expect_translate_block()
            .times(2)
            .returning(|lines, _, _| Ok(lines.iter().map(|l| format!("{}+", l)).collect()));

        let mut doc = document(1);
        tokio_test::block_on(translate_document(
            &mut doc,
            &["en".to_string()],
            &translator,
            TranslateOptions {
                block_size: 20,
                mode: TranslationMode::DraftPostEdit,
            },
            &|_, _| {},
        ))
        .unwrap();

        assert_eq!(doc.segments[0].translation("en"), Some("行1++"));
    }

    #[test]
    fn test_factory_picks_provider() {
        let config = TranslateConfig::default();
        let translator = TranslatorFactory::create_translator(&config).unwrap();
        assert_eq!(translator.name(), "echo");

        let config = TranslateConfig {
            provider: ProviderKind::Api,
            ..TranslateConfig::default()
        };
        assert!(TranslatorFactory::create_translator(&config).is_err());
    }

    #[test]
    fn test_echo_document_translation() {
        let mut doc = document(2);
        tokio_test::block_on(translate_document(
            &mut doc,
            &["ja".to_string(), "en".to_string()],
            &EchoTranslator,
            options(20),
            &|_, _| {},
        ))
        .unwrap();
        assert_eq!(doc.segments[1].translation("ja"), Some("行2"));
        assert_eq!(doc.segments[1].translation("en"), Some("行2"));
    }
}
