//! Template expressions over a settings tree.
//!
//! String leaves may embed `${id:arg1_arg2}` placeholders. The handler
//! registered under `id` (default `node`) is called with the arguments,
//! after any `$[...]` sub-expressions inside them have been resolved. A
//! string that is exactly one placeholder takes the handler's native
//! result; otherwise each placeholder is replaced by its text form.
//!
//! Before expressions run, every [`NodeParser`] gets a chance to rewrite
//! each map in the tree.

mod extends;
mod handlers;
mod math;

pub use extends::ExtendsParser;
pub use handlers::{JoinExpression, NodeExpression, SizeExpression, SplitExpression};
pub use math::{Evaluation, Evaluator, MathExpression, ResultKind};

use crate::error::{Result, SettingsError};
use crate::node::Node;
use crate::strings;
use indexmap::IndexMap;
use serde_json::Value;
use std::rc::Rc;
use tracing::{debug, trace};

/// Default limit on nested `$[...]` sub-expressions.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Handler id used when an expression names none.
pub const DEFAULT_EXPRESSION: &str = "node";

/// Computes the value of one `${id:args}` placeholder.
///
/// `root` is the tree being resolved and `provider` the node whose string
/// holds the placeholder. Returning `Null` leaves a whole-string
/// placeholder untouched and renders as `null` inside larger strings.
pub trait ExpressionHandler {
    fn evaluate(&self, root: &Node, provider: &Node, args: &[String]) -> Result<Value>;
}

impl<F> ExpressionHandler for F
where
    F: Fn(&Node, &Node, &[String]) -> Result<Value>,
{
    fn evaluate(&self, root: &Node, provider: &Node, args: &[String]) -> Result<Value> {
        self(root, provider, args)
    }
}

/// Structural rewrite applied to every map before expressions run.
pub trait NodeParser {
    fn parse(&self, root: &Node, node: &Node) -> Result<()>;
}

/// Resolves node parsers and expressions across a tree.
#[derive(Clone)]
pub struct SettingsParser {
    parsers: Vec<Rc<dyn NodeParser>>,
    expressions: IndexMap<String, Rc<dyn ExpressionHandler>>,
    max_depth: usize,
}

impl Default for SettingsParser {
    fn default() -> Self {
        Self::empty()
    }
}

impl SettingsParser {
    /// No node parsers and no expressions; parsing changes nothing.
    pub fn empty() -> Self {
        Self {
            parsers: Vec::new(),
            expressions: IndexMap::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Only the `node` expression.
    pub fn simple() -> Self {
        Self::empty().with_expression(DEFAULT_EXPRESSION, NodeExpression)
    }

    /// Every built-in expression and the `extends` node parser. The `math`
    /// expression fails until an evaluator is supplied with
    /// [`SettingsParser::with_evaluator`].
    pub fn all() -> Self {
        Self::simple()
            .with_parser(ExtendsParser)
            .with_expression("size", SizeExpression)
            .with_expression("join", JoinExpression)
            .with_expression("split", SplitExpression)
            .with_expression("math", MathExpression::new())
    }

    pub fn with_parser(mut self, parser: impl NodeParser + 'static) -> Self {
        self.parsers.push(Rc::new(parser));
        self
    }

    pub fn with_expression(
        mut self,
        id: impl Into<String>,
        handler: impl ExpressionHandler + 'static,
    ) -> Self {
        self.expressions.insert(id.into(), Rc::new(handler));
        self
    }

    /// Installs `evaluator` behind the `math` expression.
    pub fn with_evaluator(self, evaluator: impl Evaluator + 'static) -> Self {
        self.with_expression("math", MathExpression::with_evaluator(evaluator))
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn remove_expression(&mut self, id: &str) -> bool {
        self.expressions.shift_remove(id).is_some()
    }

    pub fn has_expression(&self, id: &str) -> bool {
        self.expressions.contains_key(id)
    }

    pub fn expression_ids(&self) -> Vec<&str> {
        self.expressions.keys().map(String::as_str).collect()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Resolves `node` and everything below it against `node`'s root.
    pub fn parse(&self, node: &Node) -> Result<()> {
        let root = node.root();
        self.parse_with_root(&root, node)
    }

    /// Resolves `node` and everything below it against `root`.
    pub fn parse_with_root(&self, root: &Node, node: &Node) -> Result<()> {
        if !self.parsers.is_empty() {
            self.apply_node_parsers(root, node)?;
        }
        if self.expressions.is_empty() {
            return Ok(());
        }

        let mut resolved = 0usize;
        node.try_edit(&mut |leaf| {
            if let Value::String(text) = leaf.value() {
                if let Some(value) = self.resolve_string(root, leaf, &text)? {
                    if value != Value::String(text) {
                        leaf.set_value(value);
                        resolved += 1;
                    }
                }
            }
            Ok::<_, SettingsError>(Some(leaf.clone()))
        })?;
        debug!(resolved, "Resolved template expressions");
        Ok(())
    }

    /// Sets the value at the dotted `path` and resolves the new subtree.
    pub fn set(&self, root: &Node, path: &str, value: impl Into<Value>) -> Result<Node> {
        let node = root.get_split(path);
        node.set_value(value);
        self.parse_with_root(root, &node)?;
        Ok(node)
    }

    fn apply_node_parsers(&self, root: &Node, node: &Node) -> Result<()> {
        if node.is_map() {
            for parser in &self.parsers {
                parser.parse(root, node)?;
            }
        }
        for child in node.children() {
            self.apply_node_parsers(root, &child)?;
        }
        Ok(())
    }

    /// Resolves the placeholders in `text`.
    ///
    /// Returns `None` when `text` has no placeholders, or when it is a
    /// single placeholder that resolved to `null`.
    pub fn resolve_string(&self, root: &Node, provider: &Node, text: &str) -> Result<Option<Value>> {
        if !text.contains("${") {
            return Ok(None);
        }
        let placeholders = strings::find_placeholders(text);
        let Some(first) = placeholders.first() else {
            return Ok(None);
        };

        if placeholders.len() == 1 && first.range == (0..text.len()) {
            let value = self.resolve_at(root, provider, first.content, 0)?;
            return Ok((!value.is_null()).then_some(value));
        }

        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for placeholder in &placeholders {
            out.push_str(&text[last..placeholder.range.start]);
            let value = self.resolve_at(root, provider, placeholder.content, 0)?;
            out.push_str(&strings::text(&value));
            last = placeholder.range.end;
        }
        out.push_str(&text[last..]);
        Ok(Some(Value::String(out)))
    }

    /// Resolves the content of a single placeholder, such as `size:a.b`.
    pub fn resolve(&self, root: &Node, provider: &Node, expression: &str) -> Result<Value> {
        self.resolve_at(root, provider, expression, 0)
    }

    fn resolve_at(&self, root: &Node, provider: &Node, expression: &str, depth: usize) -> Result<Value> {
        if depth > self.max_depth {
            return Err(SettingsError::DepthExceeded(self.max_depth));
        }

        let (id, content) = match expression.find(':') {
            Some(0) => (DEFAULT_EXPRESSION, &expression[1..]),
            Some(i) => (&expression[..i], &expression[i + 1..]),
            None => (DEFAULT_EXPRESSION, expression),
        };
        let Some(handler) = self.expressions.get(id) else {
            trace!(id, "Unknown expression left verbatim");
            return Ok(Value::String(format!("${{{expression}}}")));
        };

        let mut args = Vec::new();
        for arg in strings::split_args(content) {
            if arg.contains("$[") {
                args.push(self.expand_subs(root, provider, &arg, depth + 1)?);
            } else {
                args.push(arg);
            }
        }
        trace!(id, ?args, "Evaluating expression");
        handler.evaluate(root, provider, &args)
    }

    fn expand_subs(&self, root: &Node, provider: &Node, arg: &str, depth: usize) -> Result<String> {
        let mut out = String::with_capacity(arg.len());
        let mut last = 0;
        for sub in strings::find_sub_placeholders(arg) {
            out.push_str(&arg[last..sub.range.start]);
            let value = self.resolve_at(root, provider, sub.content, depth)?;
            out.push_str(&strings::text(&value));
            last = sub.range.end;
        }
        out.push_str(&arg[last..]);
        Ok(out)
    }
}
