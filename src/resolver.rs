use std::collections::HashMap;

use crate::message::MessageNode;
use crate::path::PathSegments;

/// A successfully resolved message and the locale it came from.
///
/// The locale may differ from the requested one when a fallback
/// supplied the message; plural selection uses the resolved locale so
/// the grammar matches the text.
#[derive(Debug)]
pub struct ResolvedMessage<'a> {
    pub node: &'a MessageNode,
    pub locale: String,
}

/// Build the ordered, deduplicated locale chain for a lookup: the
/// primary locale, its language-only prefix (`de-at` tries `de`), then
/// each configured fallback and its prefix.
pub fn fallback_chain(primary: &str, fallbacks: &[String]) -> Vec<String> {
    let mut chain: Vec<String> = Vec::with_capacity(fallbacks.len() + 2);
    let push = |chain: &mut Vec<String>, locale: &str| {
        let locale = locale.to_lowercase();
        if !locale.is_empty() && !chain.contains(&locale) {
            chain.push(locale);
        }
    };
    push(&mut chain, primary);
    if let Some((language, _)) = primary.split_once('-') {
        push(&mut chain, language);
    }
    for fallback in fallbacks {
        push(&mut chain, fallback);
        if let Some((language, _)) = fallback.split_once('-') {
            push(&mut chain, language);
        }
    }
    chain
}

/// Walk the message trees for the first locale in the chain that
/// resolves the key to a leaf or plural-form node.
///
/// A branch at the end of the walk means a namespace-style subtree
/// shadowed the key; that locale counts as a miss and the chain
/// continues. Missing intermediate nodes fail the same way.
pub fn resolve<'a>(
    trees: &'a HashMap<String, MessageNode>,
    segments: &PathSegments,
    namespace: Option<&str>,
    chain: &[String],
) -> Option<ResolvedMessage<'a>> {
    for locale in chain {
        let Some(mut node) = trees.get(locale) else {
            continue;
        };
        if let Some(ns) = namespace {
            match node.child(ns) {
                Some(subtree) => node = subtree,
                None => continue,
            }
        }

        let mut found = true;
        for segment in segments.segments() {
            match node.child(segment) {
                Some(child) => node = child,
                None => {
                    found = false;
                    break;
                }
            }
        }
        if !found {
            continue;
        }

        match node {
            MessageNode::Leaf(_) | MessageNode::Plural(_) => {
                return Some(ResolvedMessage {
                    node,
                    locale: locale.clone(),
                });
            }
            MessageNode::Branch(_) => continue,
        }
    }
    None
}
