use super::tables::ALL_TABLES;
use super::types::TableSchema;
use std::collections::{HashMap, HashSet};

/// Resolves foreign-key ordering between tables
pub struct DependencyResolver {
    /// Tables under consideration, in declaration order
    tables: Vec<&'static TableSchema>,
    /// Map of table name -> tables it depends on
    deps: HashMap<&'static str, Vec<&'static str>>,
    /// Map of table name -> tables that depend on it
    reverse_deps: HashMap<&'static str, Vec<&'static str>>,
}

impl DependencyResolver {
    pub fn new() -> Self {
        Self::from_tables(ALL_TABLES)
    }

    pub fn from_tables(tables: &[&'static TableSchema]) -> Self {
        let mut deps: HashMap<&'static str, Vec<&'static str>> = HashMap::new();
        let mut reverse_deps: HashMap<&'static str, Vec<&'static str>> = HashMap::new();

        for table in tables {
            let table_deps = table.dependencies();
            for dep in &table_deps {
                reverse_deps.entry(*dep).or_default().push(table.name);
            }
            deps.insert(table.name, table_deps);
        }

        Self {
            tables: tables.to_vec(),
            deps,
            reverse_deps,
        }
    }

    /// Tables `name` references through foreign keys
    pub fn parents(&self, name: &str) -> &[&'static str] {
        self.deps.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Tables that reference `name` through foreign keys
    pub fn children(&self, name: &str) -> &[&'static str] {
        self.reverse_deps.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Return all resolver tables in dependency order (parents before children).
    ///
    /// Ties keep declaration order, so the result is stable across runs.
    /// References to tables outside the resolver are ignored.
    pub fn all_tables_ordered(&self) -> Result<Vec<&'static TableSchema>, String> {
        let names: Vec<&str> = self.tables.iter().map(|t| t.name).collect();
        self.topological_sort(&names)
    }

    fn table(&self, name: &str) -> Option<&'static TableSchema> {
        self.tables.iter().copied().find(|t| t.name == name)
    }

    /// Topological sort of tables by dependencies
    fn topological_sort(&self, included: &[&str]) -> Result<Vec<&'static TableSchema>, String> {
        let mut result = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut temp_visited: HashSet<&str> = HashSet::new();

        for table_name in included {
            if !visited.contains(table_name) {
                self.visit(
                    *table_name,
                    included,
                    &mut visited,
                    &mut temp_visited,
                    &mut result,
                )?;
            }
        }

        Ok(result)
    }

    fn visit<'a>(
        &self,
        name: &'a str,
        included: &[&'a str],
        visited: &mut HashSet<&'a str>,
        temp_visited: &mut HashSet<&'a str>,
        result: &mut Vec<&'static TableSchema>,
    ) -> Result<(), String> {
        if temp_visited.contains(name) {
            return Err(format!("Circular dependency detected at: {}", name));
        }
        if visited.contains(name) {
            return Ok(());
        }

        temp_visited.insert(name);

        for dep in self.parents(name) {
            if included.contains(dep) {
                self.visit(*dep, included, visited, temp_visited, result)?;
            }
        }

        temp_visited.remove(name);
        visited.insert(name);

        match self.table(name) {
            Some(table) => result.push(table),
            None => return Err(format!("Unknown table: {}", name)),
        }

        Ok(())
    }
}

impl Default for DependencyResolver {
    fn default() -> Self {
        Self::new()
    }
}
