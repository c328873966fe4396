//! Client-side translation engine.
//!
//! Resolves dotted message keys across locale fallback chains, selects
//! CLDR plural forms, interpolates `{{var}}` templates compiled once
//! per unique string, and caches fully rendered results in an adaptive
//! hot/cold LRU tier. Message trees are plain in-memory data; loading
//! them (files, network, bundlers) is the caller's concern apart from
//! the small JSON loader in [`loader`].

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

pub mod cache;
pub mod cache_key;
pub mod error;
pub mod loader;
pub mod message;
pub mod params;
pub mod path;
pub mod plural;
pub mod resolver;
pub mod template;

pub use cache::{AdaptiveCache, CacheStats, LruCache};
pub use cache_key::{CacheKey, CacheKeyGenerator};
pub use error::{EngineError, EngineResult};
pub use message::{MessageNode, PluralForms};
pub use params::{ParamValue, Params};
pub use path::{PathCache, PathSegments};
pub use plural::{PluralCategory, PluralRuleEngine};
pub use template::{CompiledTemplate, FormatterRegistry, TemplateCompiler};

/// Verbosity level for debug logging during resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// No debug logging
    Silent = 0,
    /// Log fallback usage and degraded calls (default)
    Normal = 1,
    /// Log detailed information about resolution
    Verbose = 2,
}

/// Engine construction options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub default_locale: String,
    /// Locales tried, in order, when a key is missing in the primary
    pub fallback_locales: Vec<String>,
    pub key_separator: char,
    pub namespace_separator: char,
    /// Cold-tier capacity of the result cache
    pub cache_max_size: usize,
    /// Hot-tier capacity of the result cache
    pub hot_cache_size: usize,
    pub cache_ttl: Option<Duration>,
    /// Readable cache keys instead of hashed ones
    pub dev_mode: bool,
    /// Cold-tier hits within the sliding window before promotion
    pub promotion_threshold: u32,
    /// Idle time after which hot entries demote back to cold
    pub demotion_idle: Duration,
    pub escape_html: bool,
    pub path_cache_size: usize,
    pub template_cache_size: usize,
    pub verbosity: VerbosityLevel,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            default_locale: "en".to_string(),
            fallback_locales: Vec::new(),
            key_separator: '.',
            namespace_separator: ':',
            cache_max_size: 1000,
            hot_cache_size: 100,
            cache_ttl: None,
            dev_mode: false,
            promotion_threshold: 3,
            demotion_idle: Duration::from_secs(30),
            escape_html: true,
            path_cache_size: 500,
            template_cache_size: 500,
            verbosity: VerbosityLevel::Normal,
        }
    }
}

/// Per-call translation options.
#[derive(Debug, Clone, Default)]
pub struct TranslateOptions {
    pub locale: Option<String>,
    pub namespace: Option<String>,
    /// Plural count, also exposed to templates as `{{count}}`
    pub count: Option<f64>,
    pub params: Params,
}

impl TranslateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_locale(mut self, locale: &str) -> Self {
        self.locale = Some(locale.to_string());
        self
    }

    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    pub fn with_count(mut self, count: f64) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_param(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }
}

/// The translation engine.
///
/// Owns its message trees and every cache tier explicitly; multiple
/// engines in one process stay fully isolated. Each cache sits behind
/// its own lock, so `&self` methods are safe to call from several
/// threads.
pub struct Engine {
    config: EngineConfig,
    messages: RwLock<HashMap<String, MessageNode>>,
    path_cache: Mutex<PathCache>,
    templates: Mutex<TemplateCompiler>,
    results: Mutex<AdaptiveCache<CacheKey, String>>,
    plurals: Mutex<PluralRuleEngine>,
    formatters: RwLock<FormatterRegistry>,
    key_generator: CacheKeyGenerator,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Engine {
            messages: RwLock::new(HashMap::new()),
            path_cache: Mutex::new(PathCache::new(config.key_separator, config.path_cache_size)),
            templates: Mutex::new(TemplateCompiler::new(config.template_cache_size)),
            results: Mutex::new(AdaptiveCache::new(
                config.hot_cache_size,
                config.cache_max_size,
                config.promotion_threshold,
                config.demotion_idle,
                config.cache_ttl,
            )),
            plurals: Mutex::new(PluralRuleEngine::new()),
            formatters: RwLock::new(FormatterRegistry::with_builtins()),
            key_generator: CacheKeyGenerator::new(config.dev_mode),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Translate a key, degrading to the raw key on any failure.
    ///
    /// Missing keys return the key itself; plural or template
    /// configuration defects log a warning and also return the key, so
    /// one bad entry never takes the application down.
    pub fn translate(&self, key: &str, options: &TranslateOptions) -> String {
        match self.try_translate(key, options) {
            Ok(result) => result,
            Err(error) => {
                if self.config.verbosity >= VerbosityLevel::Normal {
                    eprintln!("[i18n] Degrading '{}' to its key: {}", key, error);
                }
                key.to_string()
            }
        }
    }

    /// Translate a key, surfacing configuration errors to the caller.
    /// Missing keys are still not an error: they resolve to the key.
    pub fn try_translate(&self, key: &str, options: &TranslateOptions) -> EngineResult<String> {
        let locale = options
            .locale
            .as_deref()
            .unwrap_or(&self.config.default_locale)
            .to_lowercase();

        // Explicit namespace option wins over a "ns:key" embedded one
        let (namespace, bare_key) = match options.namespace.as_deref() {
            Some(ns) => (Some(ns), key),
            None => match key.split_once(self.config.namespace_separator) {
                Some((ns, rest)) => (Some(ns), rest),
                None => (None, key),
            },
        };

        let mut params = options.params.clone();
        if let Some(count) = options.count {
            let value = if count.fract() == 0.0 && count.abs() < i64::MAX as f64 {
                ParamValue::Int(count as i64)
            } else {
                ParamValue::Float(count)
            };
            params.insert("count".to_string(), value);
        }

        let cache_key = self
            .key_generator
            .generate(&locale, bare_key, namespace, &params);
        if cache_key.is_none() && self.config.verbosity >= VerbosityLevel::Normal {
            eprintln!(
                "[i18n] Params for '{}' are not cacheable, bypassing the result cache",
                key
            );
        }
        if let Some(ref cache_key) = cache_key {
            if let Some(hit) = self.results.lock().get(cache_key) {
                return Ok(hit);
            }
        }

        let segments = self.path_cache.lock().parse(bare_key);
        let chain = resolver::fallback_chain(&locale, &self.config.fallback_locales);

        let messages = self.messages.read();
        let Some(resolved) = resolver::resolve(&messages, &segments, namespace, &chain) else {
            // Documented miss policy: hand back the key and leave the
            // cache alone so a later message load is picked up
            if self.config.verbosity >= VerbosityLevel::Verbose {
                eprintln!(
                    "[i18n] No message found for '{}' in locale '{}' or its fallbacks: {}",
                    key,
                    locale,
                    chain.join(" -> ")
                );
            }
            return Ok(key.to_string());
        };
        if resolved.locale != locale && self.config.verbosity >= VerbosityLevel::Normal {
            eprintln!(
                "[i18n] Fallback: Using message '{}' from locale '{}' (requested: '{}')",
                key, resolved.locale, locale
            );
        }

        let template_str = match resolved.node {
            MessageNode::Leaf(text) => text.as_str(),
            MessageNode::Plural(forms) => match options.count {
                Some(count) => {
                    self.plurals
                        .lock()
                        .select(forms, count, &resolved.locale, bare_key)?
                }
                None => forms.category(PluralCategory::Other).ok_or_else(|| {
                    EngineError::PluralConfig {
                        key: bare_key.to_string(),
                    }
                })?,
            },
            // The resolver only returns leaves and plural forms
            MessageNode::Branch(_) => return Ok(key.to_string()),
        };

        let compiled = self.templates.lock().compile(template_str)?;
        let rendered = compiled.render(
            &params,
            &resolved.locale,
            &self.formatters.read(),
            self.config.escape_html,
        );

        if let Some(cache_key) = cache_key {
            self.results.lock().set(cache_key, rendered.clone());
        }
        Ok(rendered)
    }

    /// Replace the message tree for a locale (or one namespace of it)
    /// and invalidate the result cache.
    pub fn set_messages(&self, locale: &str, tree: MessageNode, namespace: Option<&str>) {
        let locale = locale.to_lowercase();
        {
            let mut messages = self.messages.write();
            match namespace {
                Some(ns) => {
                    let root = messages.entry(locale).or_insert_with(MessageNode::empty);
                    if let MessageNode::Branch(children) = root {
                        children.insert(ns.to_string(), tree);
                    } else {
                        let mut children = HashMap::new();
                        children.insert(ns.to_string(), tree);
                        *root = MessageNode::Branch(children);
                    }
                }
                None => {
                    messages.insert(locale, tree);
                }
            }
        }
        self.results.lock().clear();
    }

    /// Deep-merge a tree into a locale's messages (or one namespace of
    /// them) and invalidate the result cache.
    pub fn merge_messages(&self, locale: &str, tree: MessageNode, namespace: Option<&str>) {
        let locale = locale.to_lowercase();
        {
            let mut messages = self.messages.write();
            let root = messages.entry(locale).or_insert_with(MessageNode::empty);
            let incoming = match namespace {
                Some(ns) => {
                    let mut children = HashMap::new();
                    children.insert(ns.to_string(), tree);
                    MessageNode::Branch(children)
                }
                None => tree,
            };
            root.merge(incoming);
        }
        self.results.lock().clear();
    }

    /// `set_messages` from a JSON value (the common ingestion path).
    pub fn set_messages_json(
        &self,
        locale: &str,
        json: &serde_json::Value,
        namespace: Option<&str>,
    ) -> Result<(), String> {
        let tree = MessageNode::from_json(json)
            .ok_or_else(|| format!("Messages for '{}' have no usable value", locale))?;
        self.set_messages(locale, tree, namespace);
        Ok(())
    }

    /// `merge_messages` from a JSON value.
    pub fn merge_messages_json(
        &self,
        locale: &str,
        json: &serde_json::Value,
        namespace: Option<&str>,
    ) -> Result<(), String> {
        let tree = MessageNode::from_json(json)
            .ok_or_else(|| format!("Messages for '{}' have no usable value", locale))?;
        self.merge_messages(locale, tree, namespace);
        Ok(())
    }

    /// Load every `<locale>.json` pack from a directory.
    pub fn load_from_dir(&self, dir: &Path) -> Result<(), String> {
        for (locale, tree) in loader::load_all_messages_from_dir(dir)? {
            self.set_messages(&locale, tree, None);
        }
        Ok(())
    }

    /// Register a formatter dispatched from `{{var, name}}` tags.
    pub fn register_formatter(
        &self,
        name: &str,
        formatter: impl Fn(&str, &str) -> String + Send + Sync + 'static,
    ) {
        self.formatters.write().register(name, formatter);
    }

    /// Read-only result-cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        self.results.lock().stats()
    }

    /// Drop all cached results without touching message trees.
    pub fn clear_result_cache(&self) {
        self.results.lock().clear();
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn silent_config() -> EngineConfig {
        EngineConfig {
            verbosity: VerbosityLevel::Silent,
            ..EngineConfig::default()
        }
    }

    fn engine_with(locale: &str, messages: serde_json::Value) -> Engine {
        let engine = Engine::new(silent_config());
        engine.set_messages_json(locale, &messages, None).unwrap();
        engine
    }

    #[test]
    fn test_simple_interpolation() {
        let engine = engine_with("en", json!({"hello": "Hello {{name}}"}));
        let result = engine.translate("hello", &TranslateOptions::new().with_param("name", "World"));
        assert_eq!(result, "Hello World");
    }

    #[test]
    fn test_pluralization() {
        let engine = engine_with(
            "en",
            json!({"items": {"one": "{{count}} item", "other": "{{count}} items"}}),
        );
        assert_eq!(
            engine.translate("items", &TranslateOptions::new().with_count(1.0)),
            "1 item"
        );
        assert_eq!(
            engine.translate("items", &TranslateOptions::new().with_count(5.0)),
            "5 items"
        );
    }

    #[test]
    fn test_exact_count_override() {
        let engine = engine_with(
            "en",
            json!({"items": {"=0": "no items", "one": "{{count}} item", "other": "{{count}} items"}}),
        );
        assert_eq!(
            engine.translate("items", &TranslateOptions::new().with_count(0.0)),
            "no items"
        );
    }

    #[test]
    fn test_fallback_chain_resolution() {
        let config = EngineConfig {
            fallback_locales: vec!["de".to_string()],
            verbosity: VerbosityLevel::Silent,
            ..EngineConfig::default()
        };
        let engine = Engine::new(config);
        engine
            .set_messages_json("en", &json!({"greeting": "Hello"}), None)
            .unwrap();
        engine
            .set_messages_json("de", &json!({"onlyInDe": "Nur Deutsch"}), None)
            .unwrap();

        assert_eq!(
            engine.translate("onlyInDe", &TranslateOptions::new().with_locale("en")),
            "Nur Deutsch"
        );
    }

    #[test]
    fn test_missing_key_returns_key() {
        let engine = engine_with("en", json!({"hello": "Hello"}));
        assert_eq!(
            engine.translate("missing.key", &TranslateOptions::new().with_locale("en")),
            "missing.key"
        );
        // Misses are not cached, so a later load is found
        engine
            .merge_messages_json("en", &json!({"missing": {"key": "Found"}}), None)
            .unwrap();
        assert_eq!(engine.translate("missing.key", &TranslateOptions::new()), "Found");
    }

    #[test]
    fn test_idempotence_and_cache_hit() {
        let engine = engine_with("en", json!({"hello": "Hello {{name}}"}));
        let options = TranslateOptions::new().with_param("name", "World");

        let first = engine.translate("hello", &options);
        let second = engine.translate("hello", &options);
        assert_eq!(first, second);

        let stats = engine.cache_stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.size, 1);
    }

    #[test]
    fn test_invalidation_on_set_messages() {
        let engine = engine_with("en", json!({"hello": "Hello"}));
        assert_eq!(engine.translate("hello", &TranslateOptions::new()), "Hello");

        engine
            .set_messages_json("en", &json!({"hello": "Hi"}), None)
            .unwrap();
        assert_eq!(engine.translate("hello", &TranslateOptions::new()), "Hi");
    }

    #[test]
    fn test_invalidation_on_merge_messages() {
        let engine = engine_with("en", json!({"nav": {"home": "Home"}}));
        assert_eq!(engine.translate("nav.home", &TranslateOptions::new()), "Home");

        engine
            .merge_messages_json("en", &json!({"nav": {"home": "Start"}}), None)
            .unwrap();
        assert_eq!(engine.translate("nav.home", &TranslateOptions::new()), "Start");
    }

    #[test]
    fn test_namespace_option_and_embedded_namespace() {
        let engine = Engine::new(silent_config());
        engine
            .set_messages_json("en", &json!({"yes": "Common yes"}), Some("common"))
            .unwrap();

        assert_eq!(
            engine.translate("yes", &TranslateOptions::new().with_namespace("common")),
            "Common yes"
        );
        assert_eq!(engine.translate("common:yes", &TranslateOptions::new()), "Common yes");
        // Without the namespace the key misses and echoes as given
        assert_eq!(engine.translate("yes", &TranslateOptions::new()), "yes");
        assert_eq!(engine.translate("other:yes", &TranslateOptions::new()), "other:yes");
    }

    #[test]
    fn test_plural_without_count_uses_other() {
        let engine = engine_with(
            "en",
            json!({"items": {"one": "one item", "other": "some items"}}),
        );
        assert_eq!(engine.translate("items", &TranslateOptions::new()), "some items");
    }

    #[test]
    fn test_plural_missing_other_degrades() {
        let engine = engine_with("en", json!({"items": {"one": "one item"}}));
        let options = TranslateOptions::new().with_count(5.0);

        assert_eq!(
            engine.try_translate("items", &options),
            Err(EngineError::PluralConfig {
                key: "items".to_string()
            })
        );
        // The infallible surface degrades to the key
        assert_eq!(engine.translate("items", &options), "items");
    }

    #[test]
    fn test_template_syntax_error_degrades() {
        let engine = engine_with("en", json!({"broken": "Hello {{name"}));
        assert!(matches!(
            engine.try_translate("broken", &TranslateOptions::new()),
            Err(EngineError::TemplateSyntax { .. })
        ));
        assert_eq!(engine.translate("broken", &TranslateOptions::new()), "broken");
    }

    #[test]
    fn test_unhashable_params_bypass_cache() {
        let engine = engine_with("en", json!({"hi": "Hi {{user.name}}"}));
        let mut user = HashMap::new();
        user.insert("name".to_string(), ParamValue::from("Ada"));
        let options = TranslateOptions::new().with_param("user", ParamValue::Map(user));

        assert_eq!(engine.translate("hi", &options), "Hi Ada");
        assert_eq!(engine.translate("hi", &options), "Hi Ada");
        // Neither call touched the result cache
        let stats = engine.cache_stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.size, 0);
    }

    #[test]
    fn test_uncacheable_params_warn_at_default_verbosity() {
        // The bypass warning prints at the default level; the call
        // itself still renders normally
        let engine = Engine::new(EngineConfig::default());
        engine
            .set_messages_json("en", &json!({"hi": "Hi {{user.name}}"}), None)
            .unwrap();
        let mut user = HashMap::new();
        user.insert("name".to_string(), ParamValue::from("Ada"));
        let options = TranslateOptions::new().with_param("user", ParamValue::Map(user));

        assert_eq!(engine.translate("hi", &options), "Hi Ada");
        assert_eq!(engine.cache_stats().size, 0);
    }

    #[test]
    fn test_counts_do_not_collide_in_cache() {
        let engine = engine_with(
            "en",
            json!({"items": {"one": "{{count}} item", "other": "{{count}} items"}}),
        );
        assert_eq!(
            engine.translate("items", &TranslateOptions::new().with_count(1.0)),
            "1 item"
        );
        assert_eq!(
            engine.translate("items", &TranslateOptions::new().with_count(5.0)),
            "5 items"
        );
        // And again, from cache
        assert_eq!(
            engine.translate("items", &TranslateOptions::new().with_count(1.0)),
            "1 item"
        );
        assert_eq!(engine.cache_stats().hits, 1);
    }

    #[test]
    fn test_html_escaping_default_on() {
        let engine = engine_with("en", json!({"hello": "Hello {{name}}"}));
        assert_eq!(
            engine.translate("hello", &TranslateOptions::new().with_param("name", "<b>x</b>")),
            "Hello &lt;b&gt;x&lt;/b&gt;"
        );

        let config = EngineConfig {
            escape_html: false,
            verbosity: VerbosityLevel::Silent,
            ..EngineConfig::default()
        };
        let engine = Engine::new(config);
        engine
            .set_messages_json("en", &json!({"hello": "Hello {{name}}"}), None)
            .unwrap();
        assert_eq!(
            engine.translate("hello", &TranslateOptions::new().with_param("name", "<b>x</b>")),
            "Hello <b>x</b>"
        );
    }

    #[test]
    fn test_registered_formatter() {
        let engine = engine_with("en", json!({"shout": "{{word, exclaim}}"}));
        engine.register_formatter("exclaim", |value, _locale| format!("{}!", value));
        assert_eq!(
            engine.translate("shout", &TranslateOptions::new().with_param("word", "hey")),
            "hey!"
        );
    }

    #[test]
    fn test_language_only_fallback() {
        let engine = engine_with("de", json!({"greeting": "Guten Tag"}));
        assert_eq!(
            engine.translate("greeting", &TranslateOptions::new().with_locale("de-AT")),
            "Guten Tag"
        );
    }

    #[test]
    fn test_engines_are_isolated() {
        let a = engine_with("en", json!({"hello": "Hello from A"}));
        let b = engine_with("en", json!({"hello": "Hello from B"}));
        assert_eq!(a.translate("hello", &TranslateOptions::new()), "Hello from A");
        assert_eq!(b.translate("hello", &TranslateOptions::new()), "Hello from B");
        assert_eq!(a.cache_stats().size, 1);
        assert_eq!(b.cache_stats().size, 1);
    }

    #[test]
    fn test_dev_mode_end_to_end() {
        let config = EngineConfig {
            dev_mode: true,
            verbosity: VerbosityLevel::Silent,
            ..EngineConfig::default()
        };
        let engine = Engine::new(config);
        engine
            .set_messages_json("en", &json!({"hello": "Hello {{name}}"}), None)
            .unwrap();
        let options = TranslateOptions::new().with_param("name", "World");
        assert_eq!(engine.translate("hello", &options), "Hello World");
        assert_eq!(engine.translate("hello", &options), "Hello World");
        assert_eq!(engine.cache_stats().hits, 1);
    }

    #[test]
    fn test_engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Engine>();
    }

    #[test]
    fn test_concurrent_translation() {
        let engine = engine_with("en", json!({"hello": "Hello {{name}}"}));
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    let options = TranslateOptions::new().with_param("name", "World");
                    for _ in 0..50 {
                        assert_eq!(engine.translate("hello", &options), "Hello World");
                    }
                });
            }
        });
        assert_eq!(engine.cache_stats().size, 1);
    }

    #[test]
    fn test_cache_ttl_recomputes() {
        let config = EngineConfig {
            cache_ttl: Some(Duration::from_millis(5)),
            verbosity: VerbosityLevel::Silent,
            ..EngineConfig::default()
        };
        let engine = Engine::new(config);
        engine
            .set_messages_json("en", &json!({"hello": "Hello"}), None)
            .unwrap();

        assert_eq!(engine.translate("hello", &TranslateOptions::new()), "Hello");
        std::thread::sleep(Duration::from_millis(10));
        // Expired entry misses, but the answer is still correct
        assert_eq!(engine.translate("hello", &TranslateOptions::new()), "Hello");
        assert!(engine.cache_stats().misses >= 2);
    }
}
