use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::message::MessageNode;

/// Load a locale's message tree from a single JSON file
///
/// The JSON file should have the following structure:
/// ```json
/// {
///     "@metadata": { ... },  // Ignored
///     "hello": "Hello {{name}}",
///     "items": { "one": "{{count}} item", "other": "{{count}} items" },
///     "nav": { "home": "Home" }
/// }
/// ```
///
/// # Errors
/// - File not found or unreadable
/// - Invalid JSON or a non-object root
pub fn load_messages_from_file(path: &Path) -> Result<MessageNode, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read file '{}': {}", path.display(), e))?;

    let json: Value = serde_json::from_str(&content)
        .map_err(|e| format!("Failed to parse JSON from '{}': {}", path.display(), e))?;

    let obj = json.as_object().ok_or_else(|| {
        format!(
            "Invalid JSON in '{}': root must be an object",
            path.display()
        )
    })?;

    // Build the tree, skipping @metadata keys
    let mut tree = MessageNode::empty();
    for (key, value) in obj {
        if key.starts_with('@') {
            continue;
        }
        match MessageNode::from_json(value) {
            Some(node) => {
                let mut branch = HashMap::new();
                branch.insert(key.clone(), node);
                tree.merge(MessageNode::Branch(branch));
            }
            None => {
                eprintln!("Warning: Message '{}' has no usable value, skipping", key);
            }
        }
    }

    Ok(tree)
}

/// Load all locale packs from a directory of JSON files
///
/// Scans the directory for `*.json` files; the filename stem is the
/// locale code (`en.json` -> `"en"`, `zh-hans.json` -> `"zh-hans"`).
///
/// # Errors
/// - Directory not found
/// - File read/parse errors
pub fn load_all_messages_from_dir(dir: &Path) -> Result<HashMap<String, MessageNode>, String> {
    if !dir.exists() {
        return Err(format!("Directory not found: {}", dir.display()));
    }
    if !dir.is_dir() {
        return Err(format!("Path is not a directory: {}", dir.display()));
    }

    let mut all_messages = HashMap::new();

    let entries = fs::read_dir(dir)
        .map_err(|e| format!("Failed to read directory '{}': {}", dir.display(), e))?;

    for entry in entries {
        let entry = entry.map_err(|e| format!("Error reading directory entry: {}", e))?;
        let path = entry.path();

        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }

        let locale = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| format!("Invalid filename: {}", path.display()))?
            .to_lowercase();

        let tree = load_messages_from_file(&path)?;
        all_messages.insert(locale, tree);
    }

    if all_messages.is_empty() {
        eprintln!(
            "Warning: No JSON files found in directory {}",
            dir.display()
        );
    }

    Ok(all_messages)
}
