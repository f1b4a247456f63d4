//! CSV export
//!
//! Projects already paginated entities onto named columns. The exporter never
//! filters or reorders rows.

use std::borrow::{Borrow, Cow};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::catalog::EntityCatalog;
use crate::entity::FieldSource;
use crate::error::QueryError;
use crate::paginate::{PaginationArgs, Paginator};
use crate::predicate::Predicate;
use crate::storage::QueryableCollection;

/// Errors raised while exporting
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("'{column}' is not a column of {entity}")]
    UnknownColumn { entity: String, column: String },

    #[error("{headers} headers supplied for {columns} columns")]
    HeaderCount { headers: usize, columns: usize },

    #[error("write failed: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Query(#[from] QueryError),
}

impl ExportError {
    /// True when the caller asked for something invalid.
    pub fn is_client_error(&self) -> bool {
        match self {
            ExportError::UnknownColumn { .. } | ExportError::HeaderCount { .. } => true,
            ExportError::Io(_) => false,
            ExportError::Query(e) => e.is_client_error(),
        }
    }
}

type Getter<'a, E> = Box<dyn Fn(&E) -> String + 'a>;

/// Column layout for exporting entities of one type.
pub struct CsvExport<'a, E> {
    entity: String,
    known: Vec<String>,
    columns: Vec<String>,
    headers: Option<Vec<String>>,
    additional: Vec<(String, Getter<'a, E>)>,
}

impl<'a, E: FieldSource> CsvExport<'a, E> {
    /// Every field of `entity`, in declared order, without a header row.
    pub fn for_entity<C: EntityCatalog + ?Sized>(catalog: &C, entity: &str) -> Self {
        let known: Vec<String> = catalog
            .field_names(entity)
            .into_iter()
            .map(String::from)
            .collect();
        Self {
            entity: entity.to_string(),
            columns: known.clone(),
            known,
            headers: None,
            additional: Vec::new(),
        }
    }

    /// Restrict the export to `columns`, written in the given order.
    /// An empty list keeps every field.
    pub fn columns<I, S>(mut self, columns: I) -> Result<Self, ExportError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if columns.is_empty() {
            return Ok(self);
        }
        if let Some(unknown) = columns.iter().find(|c| !self.known.contains(c)) {
            return Err(ExportError::UnknownColumn {
                entity: self.entity.clone(),
                column: unknown.clone(),
            });
        }
        self.columns = columns;
        Ok(self)
    }

    /// Write a header row, one entry per selected column. Headers of
    /// additional columns are appended automatically.
    pub fn headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.headers = Some(headers.into_iter().map(Into::into).collect());
        self
    }

    /// Append a computed column.
    pub fn additional(mut self, header: impl Into<String>, getter: impl Fn(&E) -> String + 'a) -> Self {
        self.additional.push((header.into(), Box::new(getter)));
        self
    }

    pub fn selected_columns(&self) -> &[String] {
        &self.columns
    }

    /// Stream `entities` as CSV, one row at a time. Returns the number of
    /// data rows written.
    pub fn write_to<W, I>(&self, writer: W, entities: I) -> Result<usize, ExportError>
    where
        W: Write,
        I: IntoIterator,
        I::Item: Borrow<E>,
    {
        let mut writer = writer;
        if let Some(headers) = &self.headers {
            if headers.len() != self.columns.len() {
                return Err(ExportError::HeaderCount {
                    headers: headers.len(),
                    columns: self.columns.len(),
                });
            }
            let row = headers
                .iter()
                .map(String::as_str)
                .chain(self.additional.iter().map(|(h, _)| h.as_str()));
            write_row(&mut writer, row)?;
        }

        let mut rows = 0;
        for entity in entities {
            let entity: &E = entity.borrow();
            let fields: Vec<String> = self
                .columns
                .iter()
                .map(|c| entity.field(c).map(|v| v.to_string()).unwrap_or_default())
                .collect();
            let computed: Vec<String> = self.additional.iter().map(|(_, get)| get(entity)).collect();
            write_row(
                &mut writer,
                fields.iter().chain(computed.iter()).map(String::as_str),
            )?;
            rows += 1;
        }

        writer.flush()?;
        debug!(entity = %self.entity, rows, "exported csv");
        Ok(rows)
    }

    /// Write `entities` to a new file at `path`.
    pub fn write_file<P, I>(&self, path: P, entities: I) -> Result<usize, ExportError>
    where
        P: AsRef<Path>,
        I: IntoIterator,
        I::Item: Borrow<E>,
    {
        let file = File::create(path)?;
        self.write_to(BufWriter::new(file), entities)
    }

    /// Paginate with `args`, then export the page.
    pub fn export_page<C, S, W>(
        &self,
        paginator: &Paginator<'_, C>,
        store: &S,
        args: &PaginationArgs,
        extra: &[Predicate],
        writer: W,
    ) -> Result<usize, ExportError>
    where
        C: EntityCatalog + ?Sized,
        S: QueryableCollection<Item = E> + ?Sized,
        W: Write,
    {
        let entities = paginator.paginate(store, args, extra)?;
        self.write_to(writer, entities)
    }
}

fn write_row<'r, W: Write>(
    writer: &mut W,
    cells: impl Iterator<Item = &'r str>,
) -> io::Result<()> {
    for (i, cell) in cells.enumerate() {
        if i > 0 {
            writer.write_all(b",")?;
        }
        writer.write_all(escape_field(cell).as_bytes())?;
    }
    writer.write_all(b"\r\n")
}

/// Quote a cell when it contains a separator, quote or line break.
fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\r', '\n']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}
