//! The `lectarium-export` command
//!
//! Loads a catalog and a data source, applies filter, order and pagination
//! arguments to one entity type, and writes CSV, a row count, or a JSON
//! explanation of the compiled query.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use clap::Parser as ClapParser;
use lectarium_core::{
    Catalog, CsvExport, FilterNode, MemoryStore, OrderClause, PaginationArgs, Paginator, Parser,
    QueryableCollection, Record,
};
use lectarium_sqlite::SqliteCollection;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Error, Result};

/// Command-line arguments
#[derive(ClapParser, Debug, Clone)]
#[command(name = "lectarium-export")]
#[command(about = "Filter, order and page an entity collection, then export it as CSV")]
#[command(version)]
pub struct ExportArgs {
    /// Catalog describing entity fields and relationships (JSON)
    #[arg(long)]
    pub catalog: PathBuf,

    /// Entity type to list
    #[arg(long)]
    pub entity: String,

    /// JSON dataset of the form {"entity": [{...}, ...]}
    #[arg(long, conflicts_with = "database")]
    pub data: Option<PathBuf>,

    /// SQLite database (defaults to LECTARIUM_DATABASE)
    #[arg(long)]
    pub database: Option<PathBuf>,

    /// Filter expression, e.g. 'name EQ "Math", ANY(wtokens, lect_id EQ "5") EQ "true"'
    #[arg(long, default_value = "")]
    pub filter: String,

    /// Comma-separated sort fields, '-' prefix for descending
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub order_by: String,

    /// 1-based page number
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    pub page: i64,

    /// Page size, 0 for unbounded
    #[arg(long, default_value_t = 0)]
    pub size: usize,

    /// Rows to skip before the first page
    #[arg(long, default_value_t = 0)]
    pub offset: usize,

    /// Columns to export, in order (defaults to every field)
    #[arg(long, value_delimiter = ',')]
    pub columns: Vec<String>,

    /// Header for the next column; repeat once per column
    #[arg(long = "header", value_name = "TEXT")]
    pub headers: Option<Vec<String>>,

    /// Reject malformed filter clauses instead of skipping them
    #[arg(long)]
    pub strict: bool,

    /// Print the number of matching rows instead of exporting
    #[arg(long, conflicts_with = "explain")]
    pub count: bool,

    /// Print the parsed filter and compiled query as JSON instead of exporting
    #[arg(long)]
    pub explain: bool,

    /// Write to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl ExportArgs {
    fn pagination(&self, config: &Config) -> PaginationArgs {
        PaginationArgs::new()
            .page(self.page)
            .size(self.size)
            .offset(self.offset)
            .filter(self.filter.clone())
            .order_by(self.order_by.clone())
            .capped(config.max_page_size)
    }
}

/// Run the command, writing its output to `out`. Returns the number of rows
/// exported or counted.
pub fn run<W: Write>(args: &ExportArgs, config: &Config, mut out: W) -> Result<usize> {
    let catalog = Catalog::from_json(&fs::read_to_string(&args.catalog)?)?;
    let paginator = Paginator::new(&catalog, &args.entity)?;
    let pagination = args.pagination(config);

    if args.strict {
        paginator.parse_filters_strict(&pagination.filter)?;
    }

    if args.explain {
        return explain(&paginator, &pagination, &mut out);
    }

    if let Some(data) = &args.data {
        let store = MemoryStore::from_json_dataset(catalog.clone(), &fs::read_to_string(data)?)?;
        debug!(path = %data.display(), "loaded dataset");
        return execute(args, &catalog, &paginator, &pagination, &store, out);
    }

    let database = args
        .database
        .as_ref()
        .or(config.database.as_ref())
        .ok_or_else(|| {
            Error::Config(
                "no data source: pass --data or --database, or set LECTARIUM_DATABASE".into(),
            )
        })?;
    let store = SqliteCollection::open(database, catalog.clone())?;
    debug!(path = %database.display(), "opened database");
    execute(args, &catalog, &paginator, &pagination, &store, out)
}

fn execute<S, W>(
    args: &ExportArgs,
    catalog: &Catalog,
    paginator: &Paginator<'_, Catalog>,
    pagination: &PaginationArgs,
    store: &S,
    mut out: W,
) -> Result<usize>
where
    S: QueryableCollection<Item = Record>,
    W: Write,
{
    if args.count {
        let count = paginator.items_count(store, &pagination.filter, &[])?;
        writeln!(out, "{}", count)?;
        out.flush()?;
        info!(entity = %args.entity, count, "counted");
        return Ok(count);
    }

    let mut exporter = CsvExport::for_entity(catalog, &args.entity).columns(args.columns.clone())?;
    if let Some(headers) = &args.headers {
        exporter = exporter.headers(headers.clone());
    }
    let rows = exporter.export_page(paginator, store, pagination, &[], out)?;
    info!(entity = %args.entity, rows, "exported");
    Ok(rows)
}

#[derive(Serialize)]
struct Explanation<'a> {
    entity: &'a str,
    tree: Option<&'a FilterNode<'a>>,
    skipped: Vec<String>,
    predicate: String,
    order: Vec<OrderClause>,
    window: String,
}

fn explain<W: Write>(
    paginator: &Paginator<'_, Catalog>,
    pagination: &PaginationArgs,
    out: &mut W,
) -> Result<usize> {
    let parsed = Parser::parse(&pagination.filter);
    let request = paginator.request(pagination, &[])?;

    let explanation = Explanation {
        entity: paginator.entity(),
        tree: parsed.tree.as_ref(),
        skipped: parsed
            .skipped
            .iter()
            .map(|s| format!("clause {}: {}", s.index, s.error))
            .collect(),
        predicate: request.predicate.to_string(),
        order: request.order,
        window: format!("{:?}", request.window),
    };
    serde_json::to_writer_pretty(&mut *out, &explanation)?;
    writeln!(out)?;
    out.flush()?;
    Ok(0)
}
