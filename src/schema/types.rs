/// Column data type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Varchar,
    Int,
    BigInt,
    Decimal,
    /// Auto-generated surrogate key, `INT IDENTITY(0,1)` on Redshift
    Identity,
}

/// Where a table sits in the star schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    /// Raw bulk-loaded rows, rebuilt on every schema reset
    Staging,
    Dimension,
    Fact,
}

impl TableKind {
    pub fn is_analytics(self) -> bool {
        !matches!(self, TableKind::Staging)
    }
}

impl std::fmt::Display for TableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableKind::Staging => write!(f, "staging"),
            TableKind::Dimension => write!(f, "dimension"),
            TableKind::Fact => write!(f, "fact"),
        }
    }
}

/// Column definition
#[derive(Debug, Clone)]
pub struct Column {
    pub name: &'static str,
    pub col_type: ColumnType,
    pub nullable: bool,
    pub primary_key: bool,
    /// Redshift distribution key
    pub dist_key: bool,
    /// Redshift single-column sort key
    pub sort_key: bool,
}

impl Column {
    /// Create an optional (nullable) column
    pub const fn new(name: &'static str, col_type: ColumnType) -> Self {
        Self {
            name,
            col_type,
            nullable: true,
            primary_key: false,
            dist_key: false,
            sort_key: false,
        }
    }

    /// Create a required (non-nullable) column
    pub const fn required(name: &'static str, col_type: ColumnType) -> Self {
        Self {
            nullable: false,
            ..Self::new(name, col_type)
        }
    }

    pub const fn primary_key(self) -> Self {
        Self {
            primary_key: true,
            ..self
        }
    }

    pub const fn dist_key(self) -> Self {
        Self {
            dist_key: true,
            ..self
        }
    }

    pub const fn sort_key(self) -> Self {
        Self {
            sort_key: true,
            ..self
        }
    }
}

/// Foreign key reference
#[derive(Debug, Clone)]
pub struct ForeignKey {
    pub column: &'static str,
    pub references_table: &'static str,
    pub references_column: &'static str,
}

impl ForeignKey {
    /// Reference a parent column of the same name
    pub const fn new(column: &'static str, references_table: &'static str) -> Self {
        Self {
            column,
            references_table,
            references_column: column,
        }
    }
}

/// Table schema definition
#[derive(Debug, Clone)]
pub struct TableSchema {
    pub name: &'static str,
    pub kind: TableKind,
    pub columns: &'static [Column],
    /// Declared after creation through `ALTER TABLE ... ADD CONSTRAINT`
    pub foreign_keys: &'static [ForeignKey],
    pub compound_sort_key: &'static [&'static str],
}

impl TableSchema {
    /// Get all tables this table depends on (FK parents), in declaration order
    pub fn dependencies(&self) -> Vec<&'static str> {
        let mut deps: Vec<&'static str> = Vec::new();
        for fk in self.foreign_keys {
            if fk.references_table != self.name && !deps.contains(&fk.references_table) {
                deps.push(fk.references_table);
            }
        }
        deps
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}
