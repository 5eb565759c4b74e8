//! In-memory program used by the evaluator tests.

use super::*;
use pyz_binder::bind;
use pyz_parser::{ParseTree, parse};
use pyz_solver::TypeInterner;
use rustc_hash::FxHashMap;

pub(crate) struct TestFile {
    pub path: String,
    pub module: String,
    pub is_package: bool,
    pub source: String,
    pub tree: ParseTree<NodeAnalysis>,
    pub binding: Arc<Binding>,
}

/// A fixed set of files, parsed and bound up front.
pub(crate) struct TestProgram {
    pub files: Vec<TestFile>,
    pub diagnostics: FxHashMap<FileId, Vec<Diagnostic>>,
    pub interner: Arc<TypeInterner>,
    pub options: CheckerOptions,
}

fn module_name(path: &str) -> (String, bool) {
    let stem = path.trim_end_matches(".pyi").trim_end_matches(".py");
    let dotted = stem.replace('/', ".");
    match dotted.strip_suffix(".__init__") {
        Some(package) => (package.to_string(), true),
        None => (dotted, false),
    }
}

impl TestProgram {
    pub fn new(files: &[(&str, &str)]) -> Self {
        let mut parsed: Vec<(String, String, bool, String, ParseTree<NodeAnalysis>, Binding)> =
            Vec::new();
        for &(path, source) in files {
            let tree = parse::<NodeAnalysis>(source).tree;
            let binding = bind(&tree);
            let (module, is_package) = module_name(path);
            parsed.push((path.to_string(), module, is_package, source.to_string(), tree, binding));
        }

        // wildcard imports, one level deep
        let exports: FxHashMap<String, Vec<String>> = parsed
            .iter()
            .map(|(_, module, _, _, _, binding)| {
                let names = binding
                    .public_symbols()
                    .iter()
                    .map(|(name, _)| name.to_string())
                    .collect();
                (module.clone(), names)
            })
            .collect();
        for (_, _, _, _, _, binding) in &mut parsed {
            for &import in binding.wildcard_imports().to_vec().iter() {
                let Some(record) = binding.imports().get(import as usize) else {
                    continue;
                };
                if let Some(names) = exports.get(&record.module) {
                    let names = names.clone();
                    binding.add_wildcard_names(import, &names);
                }
            }
        }

        TestProgram {
            files: parsed
                .into_iter()
                .map(|(path, module, is_package, source, tree, binding)| TestFile {
                    path,
                    module,
                    is_package,
                    source,
                    tree,
                    binding: Arc::new(binding),
                })
                .collect(),
            diagnostics: FxHashMap::default(),
            interner: Arc::new(TypeInterner::new()),
            options: CheckerOptions::default(),
        }
    }

    pub fn single(source: &str) -> Self {
        Self::new(&[("main.py", source)])
    }

    pub fn file(&self, path: &str) -> FileId {
        let index = self
            .files
            .iter()
            .position(|f| f.path == path)
            .unwrap_or_else(|| panic!("no test file {path}"));
        FileId(index as u32)
    }

    fn by_module(&self, module: &str) -> Option<FileId> {
        self.files
            .iter()
            .position(|f| f.module == module)
            .map(|i| FileId(i as u32))
    }

    pub fn with_evaluator<R>(&mut self, run: impl FnOnce(&mut TypeEvaluator<'_>) -> R) -> R {
        let interner = Arc::clone(&self.interner);
        let options = self.options;
        let mut evaluator = TypeEvaluator::new(self, &interner, options);
        run(&mut evaluator)
    }

    /// Outermost node starting at the last occurrence of `text` whose span
    /// stays within it, or the first one covering it.
    pub fn node_for(&self, path: &str, text: &str) -> NodeIndex {
        let file = &self.files[self.file(path).0 as usize];
        let start = file
            .source
            .rfind(text)
            .unwrap_or_else(|| panic!("`{text}` not in {path}")) as u32;
        let end = start + text.len() as u32;
        let arena = file.tree.arena();
        let mut node = arena.node_at_offset(file.tree.root(), start);
        loop {
            if arena.span(node).end >= end {
                return node;
            }
            let parent = arena.parent(node);
            if parent.is_none() || arena.span(parent).start != start {
                return node;
            }
            node = parent;
        }
    }

    /// Formatted type of the expression (or declaration name) `text`.
    pub fn reveal(&mut self, path: &str, text: &str) -> String {
        let file = self.file(path);
        let node = self.node_for(path, text);
        let interner = Arc::clone(&self.interner);
        let ty = self.with_evaluator(|ev| ev.type_of_node(file, node));
        match ty {
            Some(ty) => pyz_solver::format_type(&interner, ty),
            None => "<none>".to_string(),
        }
    }

    /// Formatted type of a module-level symbol.
    pub fn symbol(&mut self, path: &str, name: &str) -> String {
        let file = self.file(path);
        let symbol = self.files[file.0 as usize]
            .binding
            .module_symbol(name)
            .unwrap_or_else(|| panic!("no symbol {name}"));
        let interner = Arc::clone(&self.interner);
        let ty = self.with_evaluator(|ev| ev.symbol_type(file, symbol));
        pyz_solver::format_type(&interner, ty)
    }

    pub fn check(&mut self, path: &str) -> Vec<Diagnostic> {
        let file = self.file(path);
        self.with_evaluator(|ev| ev.check_file(file));
        let mut diagnostics = self.diagnostics.get(&file).cloned().unwrap_or_default();
        diagnostics.sort_by_key(|d| (d.span.start, d.code));
        diagnostics
    }

    pub fn codes(&mut self, path: &str) -> Vec<u32> {
        self.check(path).iter().map(|d| d.code).collect()
    }

    pub fn messages(&mut self, path: &str) -> Vec<String> {
        self.check(path)
            .into_iter()
            .map(|d| d.message_text)
            .collect()
    }
}

impl ProgramView for TestProgram {
    fn bound_file(&mut self, file: FileId) -> Option<BoundFile> {
        let entry = self.files.get(file.0 as usize)?;
        Some(BoundFile {
            file,
            path: Arc::from(entry.path.as_str()),
            module_name: Arc::from(entry.module.as_str()),
            arena: entry.tree.shared_arena(),
            root: entry.tree.root(),
            binding: Arc::clone(&entry.binding),
        })
    }

    fn analysis_mut(&mut self, file: FileId) -> Option<&mut AnalysisSideTable<NodeAnalysis>> {
        self.files
            .get_mut(file.0 as usize)
            .map(|f| &mut f.tree.analysis)
    }

    fn resolve_import(&mut self, from: FileId, module: &str, level: u32) -> Option<FileId> {
        if level == 0 {
            return self.by_module(module);
        }
        let importer = self.files.get(from.0 as usize)?;
        let mut base: Vec<&str> = importer.module.split('.').collect();
        if !importer.is_package {
            base.pop();
        }
        for _ in 1..level {
            base.pop()?;
        }
        let mut target = base.join(".");
        if !module.is_empty() {
            if !target.is_empty() {
                target.push('.');
            }
            target.push_str(module);
        }
        self.by_module(&target)
    }

    fn resolve_submodule(&mut self, package: FileId, name: &str) -> Option<FileId> {
        let entry = self.files.get(package.0 as usize)?;
        if !entry.is_package {
            return None;
        }
        let target = format!("{}.{name}", entry.module);
        self.by_module(&target)
    }

    fn report(&mut self, file: FileId, diagnostic: Diagnostic) {
        let list = self.diagnostics.entry(file).or_default();
        if !list.iter().any(|d| d.dedup_key() == diagnostic.dedup_key()) {
            list.push(diagnostic);
        }
    }
}
