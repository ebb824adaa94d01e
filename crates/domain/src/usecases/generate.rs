//! Generation use case - produces the text for one post

use std::sync::Arc;
use std::time::Duration;

use rand::seq::IndexedRandom;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::{
    model::{Category, DEFAULT_CATEGORIES, FALLBACK_POSTS, GeneratedPost, PostOrigin, PostText},
    ports::{Clock, GenerateError, TextGenerator},
    usecases::{
        extract::extract,
        format::{DEFAULT_MAX_LENGTH, PostFormatter, fit_with_ellipsis},
    },
};

/// Configuration for content generation
#[derive(Debug, Clone)]
pub struct GenerateConfig {
    /// Topics to pick from, one per generation
    pub categories: Vec<Category>,
    /// Maximum post length in characters
    pub max_length: usize,
    /// Upper bound on a single generator call
    pub generation_timeout: Duration,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            categories: DEFAULT_CATEGORIES.iter().map(|c| Category::new(*c)).collect(),
            max_length: DEFAULT_MAX_LENGTH,
            generation_timeout: Duration::from_secs(60),
        }
    }
}

/// Use case for producing post text, falling back to canned posts on failure
pub struct ContentGenerator<G: ?Sized, Cl: ?Sized> {
    generator: Arc<G>,
    clock: Arc<Cl>,
    formatter: PostFormatter,
    config: GenerateConfig,
}

impl<G, Cl> ContentGenerator<G, Cl>
where
    G: TextGenerator + ?Sized,
    Cl: Clock + ?Sized,
{
    pub fn new(generator: Arc<G>, clock: Arc<Cl>, mut config: GenerateConfig) -> Self {
        if config.categories.is_empty() {
            tracing::debug!("No categories configured, using built-in list");
            config.categories = GenerateConfig::default().categories;
        }

        Self {
            generator,
            clock,
            formatter: PostFormatter::new(config.max_length),
            config,
        }
    }

    /// Generate one post. Never fails: any error yields a fallback post.
    pub async fn generate(&self) -> GeneratedPost {
        let category = self.pick_category();
        let prompt = build_prompt(&category, self.clock.now());

        tracing::info!(
            category = %category,
            provider = self.generator.provider(),
            "Requesting information"
        );

        let reply = match tokio::time::timeout(
            self.config.generation_timeout,
            self.generator.generate(&prompt),
        )
        .await
        {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => return self.fallback(&category, e),
            Err(_) => return self.fallback(&category, GenerateError::Timeout),
        };

        let extraction = extract(&reply, &category);
        let kind = extraction.kind();
        let text = self.formatter.format(extraction.record());

        tracing::info!(
            category = %category,
            extraction = %kind,
            chars = text.char_len(),
            text = %text,
            "Generated information"
        );

        GeneratedPost {
            text,
            origin: PostOrigin::Generated {
                category,
                extraction: kind,
            },
        }
    }

    fn pick_category(&self) -> Category {
        self.config
            .categories
            .choose(&mut rand::rng())
            .cloned()
            .unwrap_or_else(|| Category::new(DEFAULT_CATEGORIES[0]))
    }

    fn fallback(&self, category: &Category, error: GenerateError) -> GeneratedPost {
        tracing::warn!(
            category = %category,
            error = %error,
            "Generation failed, using fallback post"
        );

        let post = FALLBACK_POSTS
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or(FALLBACK_POSTS[0]);

        GeneratedPost {
            text: PostText::new(fit_with_ellipsis(post, self.config.max_length)),
            origin: PostOrigin::Fallback {
                reason: error.to_string(),
            },
        }
    }
}

/// Build the generation prompt. The timestamp only varies the request.
pub fn build_prompt(category: &Category, now: OffsetDateTime) -> String {
    let timestamp = now
        .format(&Rfc3339)
        .unwrap_or_else(|_| now.unix_timestamp().to_string());

    format!(
        r#"Generate an interesting or beautiful piece of information related to {category}. Current time: {timestamp}. Format the reply in JSON: {{"information": "your information here", "hashtags": ["tag1", "tag2", "tag3"]}} Do not include the # symbol in the hashtags."#
    )
}
