use kiwi_i18n::{Engine, EngineConfig, TranslateOptions, VerbosityLevel};
use serde_json::json;

fn main() {
    let config = EngineConfig {
        fallback_locales: vec!["en".to_string()],
        verbosity: VerbosityLevel::Silent,
        ..EngineConfig::default()
    };
    let engine = Engine::new(config);

    engine
        .set_messages_json(
            "en",
            &json!({
                "greeting": "Hello, {{name}}!",
                "inbox": {
                    "=0": "Your inbox is empty",
                    "one": "You have {{count}} message",
                    "other": "You have {{count}} messages"
                }
            }),
            None,
        )
        .expect("valid messages");
    engine
        .set_messages_json("de", &json!({"greeting": "Hallo, {{name}}!"}), None)
        .expect("valid messages");

    println!(
        "{}",
        engine.translate("greeting", &TranslateOptions::new().with_param("name", "World"))
    );
    println!(
        "{}",
        engine.translate(
            "greeting",
            &TranslateOptions::new().with_locale("de").with_param("name", "Welt")
        )
    );
    for count in [0.0, 1.0, 5.0] {
        println!(
            "{}",
            engine.translate("inbox", &TranslateOptions::new().with_count(count))
        );
    }

    let stats = engine.cache_stats();
    println!(
        "cache: {} entries, {:.0}% hit rate",
        stats.size,
        stats.hit_rate * 100.0
    );
}
