//! Delimited text records into an [`EntityCatalog`].
//!
//! Each line describes one entity:
//!
//! ```text
//! identifier,attribute;attribute;...,invocation;invocation;...
//! ```
//!
//! Rows degrade instead of failing. A row with only an attribute column keeps
//! the attributes; a row with no list columns yields an empty reference set.
//! Empty list items are dropped, so a missing column never turns into a `""`
//! reference. Fields are split verbatim; quoting is not interpreted.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, warn};

use crate::catalog::{Entity, EntityCatalog};
use crate::error::{Error, Result};

/// Record parsing options.
#[derive(Clone, Debug)]
pub struct IngestOptions {
    /// Skip the first non-blank line.
    pub has_header: bool,

    /// Separates identifier, attribute list and invocation list.
    pub field_separator: char,

    /// Separates items inside a list column.
    pub list_separator: char,

    /// Add each entity's own identifier to its reference set.
    ///
    /// Counting the identifier itself keeps two otherwise unrelated procedures
    /// from looking identical when both reference nothing.
    pub include_self: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            field_separator: ',',
            list_separator: ';',
            include_self: true,
        }
    }
}

impl IngestOptions {
    /// Set whether the first line is a header.
    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Set the column separator.
    pub fn with_field_separator(mut self, sep: char) -> Self {
        self.field_separator = sep;
        self
    }

    /// Set the list item separator.
    pub fn with_list_separator(mut self, sep: char) -> Self {
        self.list_separator = sep;
        self
    }

    /// Set whether an entity references itself.
    pub fn with_include_self(mut self, include_self: bool) -> Self {
        self.include_self = include_self;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.field_separator == self.list_separator {
            return Err(Error::InvalidParameter {
                name: "list_separator",
                message: "must differ from the field separator",
            });
        }
        Ok(())
    }
}

/// Which columns a row actually carried.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RowShape {
    Complete,
    AttributesOnly,
    Bare,
}

/// Parse records from a string.
pub fn parse_str(text: &str, opts: &IngestOptions) -> Result<EntityCatalog> {
    read_from(text.as_bytes(), opts)
}

/// Read records from a file.
pub fn read_path(path: impl AsRef<Path>, opts: &IngestOptions) -> Result<EntityCatalog> {
    let path = path.as_ref();
    debug!(path = %path.display(), "reading entity records");
    read_from(BufReader::new(File::open(path)?), opts)
}

/// Read records from any buffered reader.
pub fn read_from(reader: impl BufRead, opts: &IngestOptions) -> Result<EntityCatalog> {
    opts.validate()?;

    let mut catalog = EntityCatalog::new();
    let mut header_pending = opts.has_header;
    let mut rows = 0usize;
    let mut degraded = 0usize;

    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        if header_pending {
            header_pending = false;
            continue;
        }

        let Some((entity, shape)) = parse_row(&line, opts) else {
            warn!(line = lineno + 1, "skipping record without identifier");
            continue;
        };
        if shape != RowShape::Complete {
            warn!(
                line = lineno + 1,
                entity = entity.id(),
                shape = ?shape,
                "record is missing reference columns"
            );
            degraded += 1;
        }
        catalog.push(entity)?;
        rows += 1;
    }

    debug!(rows, degraded, "ingested entity records");
    Ok(catalog)
}

fn parse_row(line: &str, opts: &IngestOptions) -> Option<(Entity, RowShape)> {
    let mut fields = line.split(opts.field_separator);
    let id = fields.next().map(str::trim).filter(|s| !s.is_empty())?;

    let attributes = fields.next();
    let invocations = fields.next();
    let shape = match (attributes, invocations) {
        (Some(_), Some(_)) => RowShape::Complete,
        (Some(_), None) => RowShape::AttributesOnly,
        _ => RowShape::Bare,
    };

    let items = attributes
        .into_iter()
        .chain(invocations)
        .flat_map(|col| col.split(opts.list_separator))
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let self_ref = opts.include_self.then_some(id);

    Some((Entity::new(id, items.chain(self_ref)), shape))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_complete_rows() {
        let text = "Procedure,Attributes,Invocations\n\
                    p1,a;b,m1\n\
                    p2,a,m1;m2\n";
        let catalog = parse_str(text, &IngestOptions::default()).unwrap();
        assert_eq!(catalog.identifiers(), vec!["p1", "p2"]);

        let p1: Vec<&str> = catalog.get(0).unwrap().references().iter().map(String::as_str).collect();
        assert_eq!(p1, vec!["a", "b", "m1", "p1"]);
    }

    #[test]
    fn test_fallback_tiers() {
        let text = "p1,a;b,m\np2,a;b\np3\n";
        let opts = IngestOptions::default()
            .with_header(false)
            .with_include_self(false);
        let catalog = parse_str(text, &opts).unwrap();

        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.get(0).unwrap().references().len(), 3);
        assert_eq!(catalog.get(1).unwrap().references().len(), 2);
        assert!(catalog.get(2).unwrap().references().is_empty());
    }

    #[test]
    fn test_empty_items_dropped() {
        let text = "p1,;a;;, ;\n";
        let opts = IngestOptions::default()
            .with_header(false)
            .with_include_self(false);
        let catalog = parse_str(text, &opts).unwrap();
        let refs = catalog.get(0).unwrap().references();
        assert_eq!(refs.len(), 1);
        assert!(refs.contains("a"));
    }

    #[test]
    fn test_include_self() {
        let text = "p1\n";
        let catalog = parse_str(text, &IngestOptions::default().with_header(false)).unwrap();
        let refs = catalog.get(0).unwrap().references();
        assert_eq!(refs.len(), 1);
        assert!(refs.contains("p1"));
    }

    #[test]
    fn test_blank_and_nameless_lines_skipped() {
        let text = "\nheader\n\n p1 ,a,b\n,x,y\n";
        let catalog = parse_str(text, &IngestOptions::default()).unwrap();
        assert_eq!(catalog.identifiers(), vec!["p1"]);
    }

    #[test]
    fn test_duplicate_identifier_errors() {
        let text = "p1,a,b\np1,c,d\n";
        let err = parse_str(text, &IngestOptions::default().with_header(false)).unwrap_err();
        assert!(matches!(err, Error::DuplicateEntity(ref id) if id == "p1"));
    }

    #[test]
    fn test_custom_separators() {
        let text = "p1\ta|b\tc\n";
        let opts = IngestOptions::default()
            .with_header(false)
            .with_field_separator('\t')
            .with_list_separator('|')
            .with_include_self(false);
        let catalog = parse_str(text, &opts).unwrap();
        assert_eq!(catalog.get(0).unwrap().references().len(), 3);

        let bad = IngestOptions::default().with_list_separator(',');
        assert!(matches!(
            parse_str(text, &bad),
            Err(Error::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_read_path_missing_file() {
        let err = read_path("/nonexistent/records.csv", &IngestOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
