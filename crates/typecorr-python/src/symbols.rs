//! Package symbol table and object resolution.
//!
//! [`PackageSymbols`] indexes the outlines of every module in a package by
//! module name. A module's scope holds its top-level classes and functions,
//! the names it re-exports through `from ... import ...`, its wildcard
//! imports, and its direct submodules. Lookups follow re-exports and
//! wildcard imports up to [`MAX_LOOKUP_DEPTH`] hops.
//!
//! [`ObjectResolver`] answers the questions the correlation walker asks:
//! which class or function a top-level name denotes, which members a class
//! has (including inherited ones), and what documentation applies to a
//! symbol once base classes are taken into account.

use indexmap::IndexMap;

use crate::outline::{ClassDef, Definition, FunctionDef, ImportFrom, ModuleOutline};

/// Maximum number of re-export, wildcard or base-class hops per lookup.
pub const MAX_LOOKUP_DEPTH: usize = 8;

/// A named entity in a module scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Symbol {
    Class {
        doc: Option<String>,
        members: IndexMap<String, Symbol>,
        /// Base class expressions as written.
        bases: Vec<String>,
        /// Module whose scope the bases are resolved in.
        module: String,
    },
    Function {
        doc: Option<String>,
    },
    Module {
        name: String,
    },
}

impl Symbol {
    /// The symbol's own docstring.
    pub fn own_doc(&self) -> Option<&str> {
        match self {
            Symbol::Class { doc, .. } | Symbol::Function { doc } => doc.as_deref(),
            Symbol::Module { .. } => None,
        }
    }

    fn from_class(class: &ClassDef, module: &str) -> Self {
        let mut members = IndexMap::new();
        for def in &class.body {
            match def {
                Definition::Class(inner) => {
                    define(&mut members, &inner.name, Symbol::from_class(inner, module))
                }
                Definition::Function(f) => define(&mut members, &f.name, Symbol::from_function(f)),
                Definition::ImportFrom(_) => {}
            }
        }
        Symbol::Class {
            doc: class.docstring.clone(),
            members,
            bases: class.bases.clone(),
            module: module.to_string(),
        }
    }

    fn from_function(function: &FunctionDef) -> Self {
        Symbol::Function {
            doc: function.docstring.clone(),
        }
    }
}

/// Result of a symbol lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<'a> {
    Found(&'a Symbol),
    NotFound,
}

impl<'a> Lookup<'a> {
    pub fn found(self) -> Option<&'a Symbol> {
        match self {
            Lookup::Found(sym) => Some(sym),
            Lookup::NotFound => None,
        }
    }
}

/// Name lookup within a scope.
pub trait SymbolTable {
    fn by_name(&self, scope: &str, name: &str) -> Lookup<'_>;
}

/// Keep the first class or function defined under a name; a definition
/// replaces a submodule link of the same name.
fn define(symbols: &mut IndexMap<String, Symbol>, name: &str, symbol: Symbol) {
    match symbols.get(name) {
        Some(Symbol::Class { .. } | Symbol::Function { .. }) => {}
        _ => {
            symbols.insert(name.to_string(), symbol);
        }
    }
}

#[derive(Debug, Default)]
struct Scope {
    symbols: IndexMap<String, Symbol>,
    /// bound name -> (source module, name in source module)
    reexports: IndexMap<String, (String, String)>,
    wildcards: Vec<String>,
}

/// Symbol table of one package.
#[derive(Debug, Default)]
pub struct PackageSymbols {
    package: String,
    scopes: IndexMap<String, Scope>,
}

impl PackageSymbols {
    pub fn new(package: &str) -> Self {
        PackageSymbols {
            package: package.to_string(),
            scopes: IndexMap::new(),
        }
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    /// Index one module. `is_package` is true for `__init__.py` files.
    pub fn add_module(&mut self, module: &str, is_package: bool, outline: &ModuleOutline) {
        let imports: Vec<(String, &ImportFrom)> = outline
            .imports()
            .map(|i| (self.import_target(module, is_package, i), i))
            .collect();

        let scope = self.scopes.entry(module.to_string()).or_default();
        for def in outline.definitions() {
            match def {
                Definition::Class(c) => define(&mut scope.symbols, &c.name, Symbol::from_class(c, module)),
                Definition::Function(f) => {
                    define(&mut scope.symbols, &f.name, Symbol::from_function(f))
                }
                Definition::ImportFrom(_) => {}
            }
        }

        for (target, import) in imports {
            if target.is_empty() {
                continue;
            }
            if import.wildcard {
                scope.wildcards.push(target);
                continue;
            }
            for name in &import.names {
                scope
                    .reexports
                    .entry(name.bound_name().to_string())
                    .or_insert_with(|| (target.clone(), name.name.clone()));
            }
        }

        if let Some((parent, leaf)) = module.rsplit_once('.') {
            self.scopes
                .entry(parent.to_string())
                .or_default()
                .symbols
                .entry(leaf.to_string())
                .or_insert_with(|| Symbol::Module {
                    name: module.to_string(),
                });
        }
    }

    /// Absolute module an import refers to, or an empty string when it
    /// points outside the package.
    fn import_target(&self, module: &str, is_package: bool, import: &ImportFrom) -> String {
        if import.level == 0 {
            let inside = import.module == self.package
                || import.module.starts_with(&format!("{}.", self.package));
            return if inside {
                import.module.clone()
            } else {
                String::new()
            };
        }

        let mut base: Vec<&str> = module.split('.').collect();
        let ups = if is_package {
            import.level - 1
        } else {
            import.level
        };
        if ups >= base.len() {
            return String::new();
        }
        base.truncate(base.len() - ups);
        if !import.module.is_empty() {
            base.push(&import.module);
        }
        base.join(".")
    }

    fn lookup(&self, scope: &str, name: &str, depth: usize) -> Lookup<'_> {
        if depth > MAX_LOOKUP_DEPTH {
            return Lookup::NotFound;
        }
        let Some(s) = self.scopes.get(scope) else {
            return Lookup::NotFound;
        };
        if let Some(sym) = s.symbols.get(name) {
            return Lookup::Found(sym);
        }
        if let Some((source, original)) = s.reexports.get(name) {
            if let Lookup::Found(sym) = self.lookup(source, original, depth + 1) {
                return Lookup::Found(sym);
            }
        }
        for source in &s.wildcards {
            if let Lookup::Found(sym) = self.lookup(source, name, depth + 1) {
                return Lookup::Found(sym);
            }
        }
        Lookup::NotFound
    }
}

impl SymbolTable for PackageSymbols {
    fn by_name(&self, scope: &str, name: &str) -> Lookup<'_> {
        self.lookup(scope, name, 0)
    }
}

/// Resolves names to symbols, the way attribute access on live modules
/// and classes would.
#[derive(Debug)]
pub struct ObjectResolver<'a, T: SymbolTable> {
    table: &'a T,
}

impl<'a, T: SymbolTable> ObjectResolver<'a, T> {
    pub fn new(table: &'a T) -> Self {
        ObjectResolver { table }
    }

    /// Resolve `name` in `module`, falling back to the submodule named
    /// `stem` for packages that re-export from private submodules.
    pub fn resolve(&self, module: &str, stem: &str, name: &str) -> Option<&'a Symbol> {
        if let Lookup::Found(sym) = self.table.by_name(module, name) {
            return Some(sym);
        }
        match self.table.by_name(module, stem) {
            Lookup::Found(Symbol::Module { name: submodule }) => {
                self.table.by_name(submodule, name).found()
            }
            _ => None,
        }
    }

    /// Resolve a possibly dotted expression such as `base.Mixin`.
    pub fn resolve_path(&self, module: &str, path: &str) -> Option<&'a Symbol> {
        let mut parts = path.split('.');
        let first = parts.next()?;
        let mut current = self.table.by_name(module, first).found()?;
        for part in parts {
            current = match current {
                Symbol::Module { name } => self.table.by_name(name, part).found()?,
                Symbol::Class { members, .. } => members.get(part)?,
                Symbol::Function { .. } => return None,
            };
        }
        Some(current)
    }

    fn bases(&self, class: &'a Symbol) -> Vec<&'a Symbol> {
        match class {
            Symbol::Class { bases, module, .. } => bases
                .iter()
                .filter_map(|b| self.resolve_path(module, b))
                .filter(|b| matches!(b, Symbol::Class { .. }))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// A member of `class`, searching base classes depth-first.
    pub fn member(&self, class: &'a Symbol, name: &str) -> Option<&'a Symbol> {
        self.member_at(class, name, 0)
    }

    fn member_at(&self, class: &'a Symbol, name: &str, depth: usize) -> Option<&'a Symbol> {
        if depth > MAX_LOOKUP_DEPTH {
            return None;
        }
        if let Symbol::Class { members, .. } = class {
            if let Some(sym) = members.get(name) {
                return Some(sym);
            }
        }
        self.bases(class)
            .into_iter()
            .find_map(|base| self.member_at(base, name, depth + 1))
    }

    /// Documentation of a class, inherited from base classes when the
    /// class has none of its own.
    pub fn class_doc(&self, class: &'a Symbol) -> Option<&'a str> {
        self.class_doc_at(class, 0)
    }

    fn class_doc_at(&self, class: &'a Symbol, depth: usize) -> Option<&'a str> {
        if depth > MAX_LOOKUP_DEPTH {
            return None;
        }
        class.own_doc().or_else(|| {
            self.bases(class)
                .into_iter()
                .find_map(|base| self.class_doc_at(base, depth + 1))
        })
    }

    /// Documentation of method `name` of `class`: the first documented
    /// definition along the base classes.
    pub fn member_doc(&self, class: &'a Symbol, name: &str) -> Option<&'a str> {
        self.member_doc_at(class, name, 0)
    }

    fn member_doc_at(&self, class: &'a Symbol, name: &str, depth: usize) -> Option<&'a str> {
        if depth > MAX_LOOKUP_DEPTH {
            return None;
        }
        if let Symbol::Class { members, .. } = class {
            if let Some(doc) = members.get(name).and_then(Symbol::own_doc) {
                return Some(doc);
            }
        }
        self.bases(class)
            .into_iter()
            .find_map(|base| self.member_doc_at(base, name, depth + 1))
    }
}
