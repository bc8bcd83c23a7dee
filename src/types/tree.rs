use std::fmt;

/// Position of a node inside a [`DirectiveTree`].
///
/// Ids are handed out in document (pre-order) order, so comparing two ids
/// from the same tree compares their position in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct NodeId(usize);

impl NodeId {
    /// The implicit root block every tree starts with.
    pub const ROOT: NodeId = NodeId(0);

    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct Node {
    kind: String,
    args: Vec<String>,
    block: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A read-only tree of parsed configuration directives.
///
/// All nodes live in one arena owned by the tree. Children are owned
/// root-to-leaf; the parent link is a plain [`NodeId`] used only for
/// walking up the ancestor chain.
#[derive(Debug, Clone)]
pub struct DirectiveTree {
    nodes: Vec<Node>,
}

impl DirectiveTree {
    /// Handle to the implicit root block.
    #[must_use]
    pub fn root(&self) -> Directive<'_> {
        Directive {
            tree: self,
            id: NodeId::ROOT,
        }
    }

    /// Resolve an id produced by this tree. Returns `None` for foreign or
    /// out-of-range ids.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<Directive<'_>> {
        (id.0 < self.nodes.len()).then_some(Directive { tree: self, id })
    }

    /// Every directive except the root, in document order.
    pub fn walk(&self) -> impl Iterator<Item = Directive<'_>> + '_ {
        (1..self.nodes.len()).map(move |i| Directive {
            tree: self,
            id: NodeId(i),
        })
    }

    /// Number of directives, not counting the root.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Whether the tree holds nothing but the root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Builder for a [`DirectiveTree`], fed top-down by a parser.
///
/// # Example
///
/// ```
/// use nginx_audit::TreeBuilder;
///
/// let tree = TreeBuilder::new()
///     .block("server", &[], |s| {
///         s.directive("add_header", &["X-Frame-Options", "DENY"])
///             .block("location", &["/"], |l| l.directive("return", &["204"]))
///     })
///     .build();
///
/// assert_eq!(tree.len(), 4);
/// ```
#[derive(Debug)]
pub struct TreeBuilder {
    nodes: Vec<Node>,
    cursor: NodeId,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: String::new(),
                args: Vec::new(),
                block: true,
                parent: None,
                children: Vec::new(),
            }],
            cursor: NodeId::ROOT,
        }
    }

    /// Append a simple directive to the current block.
    #[must_use]
    pub fn directive(mut self, kind: &str, args: &[&str]) -> Self {
        self.push(kind, args, false);
        self
    }

    /// Append a block directive and fill it with the closure.
    #[must_use]
    pub fn block(
        mut self,
        kind: &str,
        args: &[&str],
        f: impl FnOnce(TreeBuilder) -> TreeBuilder,
    ) -> Self {
        let id = self.push(kind, args, true);
        let outer = std::mem::replace(&mut self.cursor, id);
        let mut inner = f(self);
        inner.cursor = outer;
        inner
    }

    #[must_use]
    pub fn build(self) -> DirectiveTree {
        DirectiveTree { nodes: self.nodes }
    }

    fn push(&mut self, kind: &str, args: &[&str], block: bool) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind: kind.to_owned(),
            args: args.iter().map(|a| (*a).to_owned()).collect(),
            block,
            parent: Some(self.cursor),
            children: Vec::new(),
        });
        self.nodes[self.cursor.0].children.push(id);
        id
    }
}

/// A borrowed handle to one node of a [`DirectiveTree`].
#[derive(Clone, Copy)]
pub struct Directive<'t> {
    tree: &'t DirectiveTree,
    id: NodeId,
}

impl<'t> Directive<'t> {
    fn node(self) -> &'t Node {
        &self.tree.nodes[self.id.0]
    }

    fn at(self, id: NodeId) -> Directive<'t> {
        Directive {
            tree: self.tree,
            id,
        }
    }

    #[must_use]
    pub fn id(self) -> NodeId {
        self.id
    }

    /// Directive name, e.g. `"location"` or `"add_header"`. Empty for the root.
    #[must_use]
    pub fn kind(self) -> &'t str {
        &self.node().kind
    }

    #[must_use]
    pub fn args(self) -> &'t [String] {
        &self.node().args
    }

    /// First argument, if any.
    #[must_use]
    pub fn arg(self) -> Option<&'t str> {
        self.node().args.first().map(String::as_str)
    }

    #[must_use]
    pub fn is_block(self) -> bool {
        self.node().block
    }

    #[must_use]
    pub fn is_root(self) -> bool {
        self.id == NodeId::ROOT
    }

    #[must_use]
    pub fn parent(self) -> Option<Directive<'t>> {
        self.node().parent.map(|id| self.at(id))
    }

    pub fn children(self) -> impl Iterator<Item = Directive<'t>> {
        self.node().children.iter().map(move |&id| self.at(id))
    }

    /// Direct children with the given kind, in source order.
    #[must_use]
    pub fn find(self, kind: &str) -> Vec<Directive<'t>> {
        self.children().filter(|c| c.kind() == kind).collect()
    }

    /// Descendants at any depth with the given kind, in document order.
    #[must_use]
    pub fn find_recursive(self, kind: &str) -> Vec<Directive<'t>> {
        let mut out = Vec::new();
        self.collect_recursive(kind, &mut out);
        out
    }

    fn collect_recursive(self, kind: &str, out: &mut Vec<Directive<'t>>) {
        for child in self.children() {
            if child.kind() == kind {
                out.push(child);
            }
            if child.is_block() {
                child.collect_recursive(kind, out);
            }
        }
    }

    /// Enclosing blocks from nearest to outermost, ending with the root.
    #[must_use]
    pub fn ancestors(self) -> Ancestors<'t> {
        Ancestors {
            next: self.parent(),
        }
    }
}

impl PartialEq for Directive<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for Directive<'_> {}

impl fmt::Debug for Directive<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Directive")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .field("args", &self.args())
            .field("block", &self.is_block())
            .finish()
    }
}

/// Renders the directive the way it reads in a config file, e.g.
/// `add_header X-Frame-Options DENY;` or `location / {`.
impl fmt::Display for Directive<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return Ok(());
        }
        f.write_str(self.kind())?;
        for arg in self.args() {
            if needs_quotes(arg) {
                write!(f, " \"{}\"", arg.replace('"', "\\\""))?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        f.write_str(if self.is_block() { " {" } else { ";" })
    }
}

fn needs_quotes(arg: &str) -> bool {
    arg.is_empty()
        || arg
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, ';' | '{' | '}' | '"' | '\''))
}

/// Iterator over a directive's enclosing blocks, nearest first.
#[derive(Debug, Clone)]
pub struct Ancestors<'t> {
    next: Option<Directive<'t>>,
}

impl<'t> Iterator for Ancestors<'t> {
    type Item = Directive<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent();
        Some(current)
    }
}
