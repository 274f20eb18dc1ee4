use crate::error::AllocationFailure;

use super::Ty;

pub const BUCKET_COUNT: usize = 211;

const RULE: &str = "*******************************************************";

fn hash(key: &str) -> usize {
    key.bytes()
        .fold(0, |h, b| ((h << 4) + b as usize) % BUCKET_COUNT)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

/// Stable address of one entry: scopes are never dropped and buckets only grow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SymbolRef {
    scope: ScopeId,
    bucket: usize,
    slot: usize,
}

impl SymbolRef {
    pub fn scope(&self) -> ScopeId {
        self.scope
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SymbolEntry {
    pub name: String,
    pub ty: Ty,
    pub memloc: usize,
    lines: Vec<usize>,
}

impl SymbolEntry {
    /// Declaration line first, then every later reference in visiting order.
    pub fn lines(&self) -> &[usize] {
        &self.lines
    }

    fn push_line(&mut self, line: usize) -> Result<(), AllocationFailure> {
        self.lines
            .try_reserve(1)
            .map_err(|_| AllocationFailure("recording a symbol reference"))?;
        self.lines.push(line);
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct Scope {
    name: String,
    level: usize,
    parent: Option<ScopeId>,
    buckets: Vec<Vec<SymbolEntry>>,
}

impl Scope {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> usize {
        self.level
    }

    /// Entries in bucket order, insertion order within a bucket.
    pub fn entries(&self) -> impl Iterator<Item = &SymbolEntry> {
        self.buckets.iter().flatten()
    }

    fn find(&self, name: &str) -> Option<(usize, usize)> {
        let bucket = hash(name);
        self.buckets[bucket]
            .iter()
            .position(|e| e.name == name)
            .map(|slot| (bucket, slot))
    }
}

/// Chain of hashed scopes. `scopes` records every scope ever pushed, in
/// creation order; `current` walks the parent links for lookup.
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    current: Option<ScopeId>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_scope(&mut self, name: &str) -> Result<ScopeId, AllocationFailure> {
        let mut buckets = Vec::new();
        buckets
            .try_reserve_exact(BUCKET_COUNT)
            .and_then(|_| self.scopes.try_reserve(1))
            .map_err(|_| AllocationFailure("creating a scope"))?;
        buckets.resize_with(BUCKET_COUNT, Vec::new);

        let level = self.current_scope().map_or(0, |parent| parent.level + 1);
        self.scopes.push(Scope {
            name: name.to_string(),
            level,
            parent: self.current,
            buckets,
        });

        let id = ScopeId(self.scopes.len() - 1);
        self.current = Some(id);
        Ok(id)
    }

    /// Leaves the current scope. Its entries stay available for the report.
    pub fn pop_scope(&mut self) {
        if let Some(id) = self.current {
            self.current = self.scopes[id.0].parent;
        }
    }

    pub fn current_scope(&self) -> Option<&Scope> {
        self.current.map(|id| &self.scopes[id.0])
    }

    pub fn is_global(&self) -> bool {
        self.current_scope().is_some_and(|s| s.level == 0)
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    pub fn scopes(&self) -> impl Iterator<Item = &Scope> {
        self.scopes.iter()
    }

    /// Binds `name` in the current scope. A name already bound there keeps its
    /// entry and only gets `line` appended. Returns `None` if no scope is active.
    pub fn insert(
        &mut self,
        name: &str,
        ty: Ty,
        line: usize,
        memloc: usize,
    ) -> Result<Option<SymbolRef>, AllocationFailure> {
        let Some(scope_id) = self.current else {
            return Ok(None);
        };
        let scope = &mut self.scopes[scope_id.0];

        if let Some((bucket, slot)) = scope.find(name) {
            scope.buckets[bucket][slot].push_line(line)?;
            return Ok(Some(SymbolRef {
                scope: scope_id,
                bucket,
                slot,
            }));
        }

        let bucket = hash(name);
        let chain = &mut scope.buckets[bucket];
        chain
            .try_reserve(1)
            .map_err(|_| AllocationFailure("inserting a symbol"))?;
        chain.push(SymbolEntry {
            name: name.to_string(),
            ty,
            memloc,
            lines: vec![line],
        });

        Ok(Some(SymbolRef {
            scope: scope_id,
            bucket,
            slot: chain.len() - 1,
        }))
    }

    /// Finds `name` in the current scope or the nearest enclosing one.
    pub fn resolve(&self, name: &str) -> Option<SymbolRef> {
        let mut scope_id = self.current;
        while let Some(id) = scope_id {
            let scope = &self.scopes[id.0];
            if let Some((bucket, slot)) = scope.find(name) {
                return Some(SymbolRef {
                    scope: id,
                    bucket,
                    slot,
                });
            }
            scope_id = scope.parent;
        }
        None
    }

    pub fn resolve_local(&self, name: &str) -> Option<SymbolRef> {
        let id = self.current?;
        let (bucket, slot) = self.scopes[id.0].find(name)?;
        Some(SymbolRef {
            scope: id,
            bucket,
            slot,
        })
    }

    pub fn lookup(&self, name: &str) -> Option<&SymbolEntry> {
        self.resolve(name).map(|r| self.entry(r))
    }

    pub fn lookup_local(&self, name: &str) -> Option<&SymbolEntry> {
        self.resolve_local(name).map(|r| self.entry(r))
    }

    pub fn entry(&self, r: SymbolRef) -> &SymbolEntry {
        &self.scopes[r.scope.0].buckets[r.bucket][r.slot]
    }

    pub fn add_line(&mut self, r: SymbolRef, line: usize) -> Result<(), AllocationFailure> {
        self.scopes[r.scope.0].buckets[r.bucket][r.slot].push_line(line)
    }

    pub fn report(&self) -> String {
        let mut out = String::new();
        for scope in &self.scopes {
            out.push_str(&format!("\nScope: {} (level {})\n", scope.name, scope.level));
            out.push_str(&format!(
                "{:<15} {:<10} {:<10} {:<15}\n",
                "Name", "Type", "MemLoc", "Lines"
            ));
            out.push_str(RULE);
            out.push('\n');
            for entry in scope.entries() {
                let lines = entry
                    .lines
                    .iter()
                    .map(|l| l.to_string())
                    .collect::<Vec<_>>()
                    .join(" ");
                out.push_str(&format!(
                    "{:<15} {:<10} {:<10} {}\n",
                    entry.name,
                    entry.ty.to_string(),
                    entry.memloc,
                    lines
                ));
            }
        }
        out.push_str(&format!("\n{RULE}\n"));
        out
    }
}
