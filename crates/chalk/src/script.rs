use indexmap::IndexMap;

/// Identifier of a script in a [`Scripts`] registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScriptId(usize);

impl ScriptId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Opaque handle to a parse-tree node owned by a script's parser.
///
/// The object runtime never dereferences these; function bodies carry one
/// and hand it back to the evaluator at call time. A handle must not
/// outlive the script that owns the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle(usize);

impl NodeHandle {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Opaque handle to the parser context that produced a script's tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParserHandle(usize);

impl ParserHandle {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// One loaded script: the lifetime anchor for its source bytes and parse
/// tree, and for every function defined in it.
#[derive(Debug)]
pub struct Script {
    /// Source path, kept for diagnostics.
    path: String,
    /// The raw script bytes.
    data: Vec<u8>,
    /// The parse tree, once the parser has produced one.
    parse_tree: Option<NodeHandle>,
    /// Position in the load sequence, starting at 1.
    order: u32,
    /// The interpreter generation this script was first executed in, or 0
    /// if it has not run yet.
    generation: u32,
    /// The parser context that owns the tree.
    parser: Option<ParserHandle>,
}

impl Script {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The size of the script data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn parse_tree(&self) -> Option<NodeHandle> {
        self.parse_tree
    }

    pub fn order(&self) -> u32 {
        self.order
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn parser(&self) -> Option<ParserHandle> {
        self.parser
    }

    /// Attaches the parse tree and the parser context that owns it.
    pub fn set_parse_tree(&mut self, tree: NodeHandle, parser: ParserHandle) {
        self.parse_tree = Some(tree);
        self.parser = Some(parser);
    }

    /// Records the interpreter generation of the script's first execution.
    pub fn mark_executed(&mut self, generation: u32) {
        self.generation = generation;
    }

    /// Whether the script has been executed at least once.
    pub fn is_executed(&self) -> bool {
        self.generation != 0
    }
}

/// The scripts loaded into an interpreter, in load order.
///
/// Ids are stable positions; reloading a path appends a fresh script and
/// repoints the path index at it, leaving earlier loads addressable by id.
#[derive(Debug, Default)]
pub struct Scripts {
    scripts: Vec<Script>,
    by_path: IndexMap<String, ScriptId>,
}

impl Scripts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a script, assigning it the next order number.
    pub fn load(&mut self, path: impl Into<String>, data: Vec<u8>) -> ScriptId {
        let path = path.into();
        let id = ScriptId(self.scripts.len());
        self.scripts.push(Script {
            path: path.clone(),
            data,
            parse_tree: None,
            order: u32::try_from(self.scripts.len()).map_or(u32::MAX, |n| n.saturating_add(1)),
            generation: 0,
            parser: None,
        });
        self.by_path.insert(path, id);
        id
    }

    pub fn get(&self, id: ScriptId) -> &Script {
        &self.scripts[id.index()]
    }

    pub fn get_mut(&mut self, id: ScriptId) -> &mut Script {
        &mut self.scripts[id.index()]
    }

    /// The most recent script loaded from `path`.
    pub fn by_path(&self, path: &str) -> Option<ScriptId> {
        self.by_path.get(path).copied()
    }

    /// Iterates scripts in load order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (ScriptId, &Script)> {
        self.scripts
            .iter()
            .enumerate()
            .map(|(index, script)| (ScriptId(index), script))
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}
