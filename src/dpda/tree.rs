use std::fmt::Write;

/// Deepest level that still gets its own indentation in [`ParseTree::display`].
pub const MAX_INDENT: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub symbol: String,
    /// Matched literal, set on leaves only.
    pub value: Option<String>,
    pub children: Vec<NodeId>,
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        self.value.is_some()
    }
}

/// A concrete parse tree stored as an arena. The root is always the first node;
/// every other node is owned by exactly one parent and children are kept in
/// production order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParseTree {
    nodes: Vec<Node>,
}

impl ParseTree {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends a node. Only the first node may come without a parent.
    pub(crate) fn push(
        &mut self,
        parent: Option<NodeId>,
        symbol: &str,
        value: Option<&str>,
    ) -> NodeId {
        debug_assert!(parent.is_some() || self.nodes.is_empty());
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            symbol: symbol.to_string(),
            value: value.map(str::to_string),
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        id
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Depth-first, left-to-right walk yielding `(depth, node)`.
    pub fn preorder(&self) -> Preorder<'_> {
        let stack = if self.nodes.is_empty() {
            Vec::new()
        } else {
            vec![(0, self.root())]
        };
        Preorder { tree: self, stack }
    }

    pub fn leaves(&self) -> impl Iterator<Item = &Node> {
        self.preorder()
            .map(move |(_, id)| self.node(id))
            .filter(|node| node.is_leaf())
    }

    pub fn leaf_kinds(&self) -> Vec<&str> {
        self.leaves().map(|node| node.symbol.as_str()).collect()
    }

    pub fn leaf_values(&self) -> Vec<&str> {
        self.leaves()
            .filter_map(|node| node.value.as_deref())
            .collect()
    }

    /// Replaces the literal `old` by `new` on every leaf of kind `kind`.
    /// Returns the number of rewritten leaves.
    pub fn rename_leaves(&mut self, kind: &str, old: &str, new: &str) -> usize {
        let mut renamed = 0;
        for node in &mut self.nodes {
            if node.symbol == kind && node.value.as_deref() == Some(old) {
                node.value = Some(new.to_string());
                renamed += 1;
            }
        }
        renamed
    }

    /// One line per node, indented two spaces per level, leaves as `kind: literal`.
    ///
    /// Indentation stops growing at [`MAX_INDENT`] levels; deeper lines keep that
    /// indent and start with their depth in brackets, e.g. `[40] S`. This keeps the
    /// output linear in the number of nodes for deep right-recursive trees.
    pub fn display(&self) -> String {
        let mut out = String::new();
        for (depth, id) in self.preorder() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&"  ".repeat(depth.min(MAX_INDENT)));
            if depth > MAX_INDENT {
                let _ = write!(out, "[{}] ", depth);
            }
            let node = self.node(id);
            out.push_str(&node.symbol);
            if let Some(value) = &node.value {
                out.push_str(": ");
                out.push_str(value);
            }
        }
        out
    }

    /// Nested `{symbol, value, children}` objects starting at the root, `null` for an
    /// empty tree. Written with an explicit stack, so the depth of the tree is only
    /// bounded by the parser's node limit.
    pub fn to_json(&self) -> serde_json::Result<String> {
        enum Step {
            Open { id: NodeId, first: bool },
            Close,
        }

        if self.nodes.is_empty() {
            return Ok("null".to_string());
        }
        let mut out = String::new();
        let mut stack = vec![Step::Open {
            id: self.root(),
            first: true,
        }];
        while let Some(step) = stack.pop() {
            let (id, first) = match step {
                Step::Close => {
                    out.push_str("]}");
                    continue;
                }
                Step::Open { id, first } => (id, first),
            };
            let node = self.node(id);
            if !first {
                out.push(',');
            }
            out.push_str("{\"symbol\":");
            out.push_str(&serde_json::to_string(&node.symbol)?);
            out.push_str(",\"value\":");
            out.push_str(&serde_json::to_string(&node.value)?);
            out.push_str(",\"children\":[");
            stack.push(Step::Close);
            stack.extend(
                node.children
                    .iter()
                    .enumerate()
                    .rev()
                    .map(|(i, &id)| Step::Open { id, first: i == 0 }),
            );
        }
        Ok(out)
    }
}

pub struct Preorder<'a> {
    tree: &'a ParseTree,
    stack: Vec<(usize, NodeId)>,
}

impl Iterator for Preorder<'_> {
    type Item = (usize, NodeId);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, id) = self.stack.pop()?;
        self.stack.extend(
            self.tree
                .children(id)
                .iter()
                .rev()
                .map(|&child| (depth + 1, child)),
        );
        Some((depth, id))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{ParseTree, MAX_INDENT};

    fn sample() -> ParseTree {
        // S -> A b ; A -> a
        let mut tree = ParseTree::new();
        let s = tree.push(None, "S", None);
        let a = tree.push(Some(s), "A", None);
        tree.push(Some(a), "a", Some("x"));
        tree.push(Some(s), "b", Some("y"));
        tree
    }

    #[test]
    fn preorder_is_left_to_right() {
        let tree = sample();
        let order: Vec<(usize, &str)> = tree
            .preorder()
            .map(|(depth, id)| (depth, tree.node(id).symbol.as_str()))
            .collect();
        assert_eq!(order, vec![(0, "S"), (1, "A"), (2, "a"), (1, "b")]);
    }

    #[test]
    fn display_indents_children() {
        assert_eq!(sample().display(), "S\n  A\n    a: x\n  b: y");
    }

    #[test]
    fn rename_touches_matching_leaves_only() {
        let mut tree = sample();
        assert_eq!(tree.rename_leaves("a", "x", "z"), 1);
        assert_eq!(tree.rename_leaves("b", "x", "z"), 0);
        assert_eq!(tree.leaf_values(), vec!["z", "y"]);
    }

    #[test]
    fn json_is_nested() {
        let mut tree = ParseTree::new();
        let s = tree.push(None, "S", None);
        tree.push(Some(s), "a", Some("1"));
        assert_eq!(
            tree.to_json().unwrap(),
            r#"{"symbol":"S","value":null,"children":[{"symbol":"a","value":"1","children":[]}]}"#
        );
    }

    #[test]
    fn json_escapes_literals() {
        let mut tree = ParseTree::new();
        let s = tree.push(None, "S", None);
        tree.push(Some(s), "str", Some("\"a\"\n"));
        tree.push(Some(s), "b", Some("b"));
        assert_eq!(
            tree.to_json().unwrap(),
            r#"{"symbol":"S","value":null,"children":[{"symbol":"str","value":"\"a\"\n","children":[]},{"symbol":"b","value":"b","children":[]}]}"#
        );
        assert_eq!(ParseTree::new().to_json().unwrap(), "null");
    }

    /// S -> a S | eps over `n` tokens: a spine of `n + 1` S nodes.
    fn right_recursive(n: usize) -> ParseTree {
        let mut tree = ParseTree::new();
        let mut s = tree.push(None, "S", None);
        for _ in 0..n {
            tree.push(Some(s), "a", Some("a"));
            s = tree.push(Some(s), "S", None);
        }
        tree
    }

    #[test]
    fn deep_tree_to_json() {
        let n = 20_000;
        let json = right_recursive(n).to_json().unwrap();
        assert!(json.starts_with(r#"{"symbol":"S","value":null,"children":[{"symbol":"a""#));
        assert!(json.ends_with(&"]}".repeat(n + 1)));
        assert_eq!(json.matches(r#""value":"a""#).count(), n);
        assert_eq!(json.matches(r#""symbol":"S""#).count(), n + 1);
    }

    #[test]
    fn deep_tree_display_caps_indent() {
        let n = 10_000;
        let text = right_recursive(n).display();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2 * n + 1);
        let widest = "  ".repeat(MAX_INDENT).len() + format!("[{}] a: a", n).len();
        assert!(lines.iter().all(|line| line.len() <= widest));
        assert_eq!(lines[2 * MAX_INDENT], format!("{}S", "  ".repeat(MAX_INDENT)));
        assert_eq!(
            lines[2 * MAX_INDENT + 2],
            format!("{}[{}] S", "  ".repeat(MAX_INDENT), MAX_INDENT + 1)
        );
    }
}
