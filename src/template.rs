use std::collections::HashMap;
use std::sync::Arc;

use crate::cache::LruCache;
use crate::error::{EngineError, EngineResult};
use crate::params::{ParamValue, Params};

/// One step of a compiled interpolation plan.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateNode {
    /// Verbatim text
    Literal(String),
    /// A `{{path}}` or `{{path, format}}` placeholder
    Variable {
        /// Dotted identifier split into lookup segments
        path: Vec<String>,
        format: Option<String>,
        /// Original tag text, echoed when the parameter is missing
        raw: String,
    },
}

/// A template parsed once into an executable node list.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledTemplate {
    nodes: Vec<TemplateNode>,
    is_static: bool,
}

/// A registered value formatter: receives the stringified (and, if
/// enabled, escaped) value plus the active locale.
pub type FormatterFn = dyn Fn(&str, &str) -> String + Send + Sync;

/// Named formatters dispatched from `{{var, format}}` tags.
pub struct FormatterRegistry {
    formatters: HashMap<String, Box<FormatterFn>>,
}

impl FormatterRegistry {
    pub fn new() -> Self {
        FormatterRegistry {
            formatters: HashMap::new(),
        }
    }

    /// Registry preloaded with `uppercase` and `lowercase`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("uppercase", |value, _locale| value.to_uppercase());
        registry.register("lowercase", |value, _locale| value.to_lowercase());
        registry
    }

    pub fn register(
        &mut self,
        name: &str,
        formatter: impl Fn(&str, &str) -> String + Send + Sync + 'static,
    ) {
        self.formatters.insert(name.to_string(), Box::new(formatter));
    }

    pub fn get(&self, name: &str) -> Option<&FormatterFn> {
        self.formatters.get(name).map(|f| f.as_ref())
    }
}

impl Default for FormatterRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

impl CompiledTemplate {
    /// Compile a template in a single left-to-right scan.
    ///
    /// Text outside `{{...}}` tags accumulates as literals. A tag body
    /// is a dotted identifier with an optional `, format` suffix. An
    /// opening `{{` with no closing `}}` is a syntax error.
    pub fn compile(template: &str) -> EngineResult<CompiledTemplate> {
        let mut nodes = Vec::new();
        let mut has_variables = false;
        let mut pos = 0;
        let mut literal_start = 0;

        while let Some(found) = template[pos..].find("{{") {
            let open = pos + found;
            let close = match template[open + 2..].find("}}") {
                Some(c) => open + 2 + c,
                None => {
                    return Err(EngineError::TemplateSyntax {
                        template: template.to_string(),
                        position: open,
                    });
                }
            };

            if open > literal_start {
                nodes.push(TemplateNode::Literal(
                    template[literal_start..open].to_string(),
                ));
            }

            let body = &template[open + 2..close];
            let (identifier, format) = match body.split_once(',') {
                Some((ident, fmt)) => (ident.trim(), Some(fmt.trim().to_string())),
                None => (body.trim(), None),
            };
            nodes.push(TemplateNode::Variable {
                path: identifier.split('.').map(str::to_string).collect(),
                format,
                raw: template[open..close + 2].to_string(),
            });
            has_variables = true;

            pos = close + 2;
            literal_start = pos;
        }

        if literal_start < template.len() {
            nodes.push(TemplateNode::Literal(template[literal_start..].to_string()));
        }

        if !has_variables {
            // Static plan: one literal, rendered without interpolation
            return Ok(CompiledTemplate {
                nodes: vec![TemplateNode::Literal(template.to_string())],
                is_static: true,
            });
        }

        Ok(CompiledTemplate {
            nodes,
            is_static: false,
        })
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Execute the plan against a parameter set.
    ///
    /// Variables render in document order. A missing parameter echoes
    /// the original tag text, a visible marker of the incomplete
    /// parameter set rather than a failure.
    pub fn render(
        &self,
        params: &Params,
        locale: &str,
        formatters: &FormatterRegistry,
        escape: bool,
    ) -> String {
        if self.is_static {
            return match &self.nodes[0] {
                TemplateNode::Literal(text) => text.clone(),
                TemplateNode::Variable { raw, .. } => raw.clone(),
            };
        }

        let mut out = String::new();
        for node in &self.nodes {
            match node {
                TemplateNode::Literal(text) => out.push_str(text),
                TemplateNode::Variable { path, format, raw } => {
                    match ParamValue::lookup(params, path) {
                        None => out.push_str(raw),
                        Some(value) => {
                            let mut rendered = value.render();
                            if escape {
                                rendered = escape_html(&rendered);
                            }
                            if let Some(name) = format {
                                if let Some(formatter) = formatters.get(name) {
                                    rendered = formatter(&rendered, locale);
                                }
                            }
                            out.push_str(&rendered);
                        }
                    }
                }
            }
        }
        out
    }
}

/// Memoizing compiler front-end: one compiled plan per unique template
/// string, LRU-bounded.
pub struct TemplateCompiler {
    cache: LruCache<String, Arc<CompiledTemplate>>,
}

impl TemplateCompiler {
    pub fn new(capacity: usize) -> Self {
        TemplateCompiler {
            cache: LruCache::new(capacity),
        }
    }

    pub fn compile(&mut self, template: &str) -> EngineResult<Arc<CompiledTemplate>> {
        if let Some(hit) = self.cache.get(template) {
            return Ok(Arc::clone(hit));
        }
        let compiled = Arc::new(CompiledTemplate::compile(template)?);
        self.cache
            .insert(template.to_string(), Arc::clone(&compiled), None);
        Ok(compiled)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
