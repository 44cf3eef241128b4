//! Event capture for economy runs.
//!
//! A `tracing` subscriber turns every INFO event into one row of a table
//! named after the event's target. Columns appear the first time a field is
//! seen; rows that lack a field get a zero value (0, 0.0, false or "").
//!
//! ```ignore
//! // engine side
//! tracing::info!(target: "dividend", firm_id, dividend, cash_after);
//!
//! // test side
//! tracing::subscriber::with_default(instrument::EventSubscriber, || run());
//! let tables = instrument::drain();
//! let paid: f64 = tables.sum("dividend", "dividend");
//! ```

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Record};
use tracing::{Event, Id, Metadata, Subscriber};

// === COLUMNS ===

#[derive(Debug, Clone, PartialEq)]
pub enum EventColumn {
    U64(Vec<u64>),
    I64(Vec<i64>),
    F64(Vec<f64>),
    Bool(Vec<bool>),
    Str(Vec<String>),
}

impl EventColumn {
    pub fn len(&self) -> usize {
        match self {
            EventColumn::U64(v) => v.len(),
            EventColumn::I64(v) => v.len(),
            EventColumn::F64(v) => v.len(),
            EventColumn::Bool(v) => v.len(),
            EventColumn::Str(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Extend with zero values up to `rows`.
    fn fill_to(&mut self, rows: usize) {
        let missing = rows.saturating_sub(self.len());
        match self {
            EventColumn::U64(v) => v.resize(v.len() + missing, 0),
            EventColumn::I64(v) => v.resize(v.len() + missing, 0),
            EventColumn::F64(v) => v.resize(v.len() + missing, 0.0),
            EventColumn::Bool(v) => v.resize(v.len() + missing, false),
            EventColumn::Str(v) => v.resize(v.len() + missing, String::new()),
        }
    }

    fn to_column(&self, name: &str) -> Column {
        match self {
            EventColumn::U64(v) => Column::new(name.into(), v),
            EventColumn::I64(v) => Column::new(name.into(), v),
            EventColumn::F64(v) => Column::new(name.into(), v),
            EventColumn::Bool(v) => Column::new(name.into(), v),
            EventColumn::Str(v) => Column::new(name.into(), v),
        }
    }
}

// === TABLES ===

/// All events of one target, one row per event. Columns are kept in name
/// order so exported frames have a stable layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventTable {
    pub columns: BTreeMap<String, EventColumn>,
    pub rows: usize,
}

impl EventTable {
    pub fn f64s(&self, name: &str) -> Option<&[f64]> {
        match self.columns.get(name)? {
            EventColumn::F64(v) => Some(v),
            _ => None,
        }
    }

    pub fn u64s(&self, name: &str) -> Option<&[u64]> {
        match self.columns.get(name)? {
            EventColumn::U64(v) => Some(v),
            _ => None,
        }
    }

    pub fn strs(&self, name: &str) -> Option<&[String]> {
        match self.columns.get(name)? {
            EventColumn::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let columns = self
            .columns
            .iter()
            .map(|(name, column)| column.to_column(name))
            .collect();
        DataFrame::new(columns)
    }

    fn close_row(&mut self) {
        self.rows += 1;
        for column in self.columns.values_mut() {
            column.fill_to(self.rows);
        }
    }
}

/// Tables keyed by tracing target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventTables {
    pub tables: HashMap<String, EventTable>,
}

impl EventTables {
    pub fn table(&self, target: &str) -> Option<&EventTable> {
        self.tables.get(target)
    }

    /// Number of events recorded under `target`.
    pub fn count(&self, target: &str) -> usize {
        self.table(target).map_or(0, |t| t.rows)
    }

    /// Sum of an f64 field over every event of `target`. Missing tables or
    /// fields sum to 0.
    pub fn sum(&self, target: &str, field: &str) -> f64 {
        self.table(target)
            .and_then(|t| t.f64s(field))
            .map_or(0.0, |v| v.iter().sum())
    }

    /// Frames for every table that converts cleanly.
    pub fn to_dataframes(&self) -> HashMap<String, DataFrame> {
        self.tables
            .iter()
            .filter_map(|(name, table)| table.to_dataframe().ok().map(|df| (name.clone(), df)))
            .collect()
    }
}

thread_local! {
    static TABLES: RefCell<EventTables> = RefCell::default();
}

/// Take everything recorded on this thread so far.
pub fn drain() -> EventTables {
    TABLES.with(|t| std::mem::take(&mut *t.borrow_mut()))
}

pub fn clear() {
    TABLES.with(|t| *t.borrow_mut() = EventTables::default());
}

pub fn drain_to_dataframes() -> HashMap<String, DataFrame> {
    drain().to_dataframes()
}

// === SUBSCRIBER ===

struct RowVisitor<'a> {
    table: &'a mut EventTable,
}

impl RowVisitor<'_> {
    /// Column for `field`, created zero-filled for earlier rows.
    fn column(&mut self, field: &Field, empty: fn(usize) -> EventColumn) -> &mut EventColumn {
        let rows = self.table.rows;
        self.table
            .columns
            .entry(field.name().to_string())
            .or_insert_with(|| empty(rows))
    }
}

impl Visit for RowVisitor<'_> {
    fn record_u64(&mut self, field: &Field, value: u64) {
        if let EventColumn::U64(v) = self.column(field, |n| EventColumn::U64(vec![0; n])) {
            v.push(value);
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        if let EventColumn::I64(v) = self.column(field, |n| EventColumn::I64(vec![0; n])) {
            v.push(value);
        }
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        if let EventColumn::F64(v) = self.column(field, |n| EventColumn::F64(vec![0.0; n])) {
            v.push(value);
        }
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        if let EventColumn::Bool(v) = self.column(field, |n| EventColumn::Bool(vec![false; n])) {
            v.push(value);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if let EventColumn::Str(v) =
            self.column(field, |n| EventColumn::Str(vec![String::new(); n]))
        {
            v.push(value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.record_str(field, &format!("{value:?}"));
    }
}

/// Records INFO-and-above events into the thread-local tables. Spans are
/// ignored.
pub struct EventSubscriber;

impl Subscriber for EventSubscriber {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.is_event() && *metadata.level() <= tracing::Level::INFO
    }

    fn new_span(&self, _span: &Attributes<'_>) -> Id {
        Id::from_u64(1)
    }

    fn record(&self, _span: &Id, _values: &Record<'_>) {}

    fn record_follows_from(&self, _span: &Id, _follows: &Id) {}

    fn event(&self, event: &Event<'_>) {
        let target = event.metadata().target().to_string();
        TABLES.with(|t| {
            let mut tables = t.borrow_mut();
            let table = tables.tables.entry(target).or_default();
            event.record(&mut RowVisitor { table });
            table.close_row();
        });
    }

    fn enter(&self, _span: &Id) {}

    fn exit(&self, _span: &Id) {}
}

/// Install [`EventSubscriber`] process-wide. Later calls are no-ops.
pub fn install_subscriber() {
    let _ = tracing::subscriber::set_global_default(EventSubscriber);
}

// === PERSISTENCE ===

fn io_error(e: std::io::Error) -> PolarsError {
    PolarsError::IO {
        error: e.into(),
        msg: None,
    }
}

/// Write each frame to `{dir}/{name}.parquet`.
pub fn save_parquet(dfs: &mut HashMap<String, DataFrame>, dir: &Path) -> PolarsResult<()> {
    std::fs::create_dir_all(dir).map_err(io_error)?;
    for (name, df) in dfs.iter_mut() {
        let file = std::fs::File::create(dir.join(format!("{name}.parquet"))).map_err(io_error)?;
        ParquetWriter::new(file).finish(df)?;
    }
    Ok(())
}

fn run_label(name: &str) -> String {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let name: String = name
        .chars()
        .take(60)
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{name}_{secs}")
}

/// Captures one run. Clears this thread's tables on creation; on drop,
/// writes whatever was captured to `{parent}/{name}_{unix_secs}/` followed by
/// a `_ready` marker.
pub struct RunCapture {
    dir: PathBuf,
    dfs: Option<HashMap<String, DataFrame>>,
}

impl RunCapture {
    pub fn new(parent: impl Into<PathBuf>, name: &str) -> Self {
        clear();
        install_subscriber();
        Self {
            dir: parent.into().join(run_label(name)),
            dfs: None,
        }
    }

    /// Frames captured so far. The first call drains the recorder.
    pub fn frames(&mut self) -> &HashMap<String, DataFrame> {
        self.dfs.get_or_insert_with(drain_to_dataframes)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Drop for RunCapture {
    fn drop(&mut self) {
        let mut dfs = self.dfs.take().unwrap_or_else(drain_to_dataframes);
        if dfs.is_empty() {
            return;
        }
        if let Err(e) = save_parquet(&mut dfs, &self.dir) {
            eprintln!("RunCapture: parquet write to {} failed: {e}", self.dir.display());
            return;
        }
        if let Err(e) = std::fs::File::create(self.dir.join("_ready")) {
            eprintln!("RunCapture: _ready marker in {} failed: {e}", self.dir.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::subscriber::with_default;

    #[test]
    fn events_become_rows_per_target() {
        clear();
        with_default(EventSubscriber, || {
            tracing::info!(target: "loan", firm_id = 1u64, principal = 2.5);
            tracing::info!(target: "loan", firm_id = 2u64, principal = 0.5);
            tracing::info!(target: "dividend", firm_id = 1u64, dividend = 3.0);
        });
        let tables = drain();

        assert_eq!(tables.count("loan"), 2);
        assert_eq!(tables.count("dividend"), 1);
        assert_eq!(tables.count("fund"), 0);
        assert_eq!(tables.sum("loan", "principal"), 3.0);

        let loan = tables.table("loan").unwrap();
        assert_eq!(loan.u64s("firm_id"), Some(&[1, 2][..]));
    }

    #[test]
    fn missing_fields_are_zero_filled() {
        clear();
        with_default(EventSubscriber, || {
            tracing::info!(target: "fund", invested = 1.0);
            tracing::info!(target: "fund", withdrawn = 4.0, note = "over ceiling");
            tracing::info!(target: "fund", invested = 2.0);
        });
        let tables = drain();
        let fund = tables.table("fund").unwrap();

        assert_eq!(fund.rows, 3);
        assert_eq!(fund.f64s("invested"), Some(&[1.0, 0.0, 2.0][..]));
        assert_eq!(fund.f64s("withdrawn"), Some(&[0.0, 4.0, 0.0][..]));
        let notes = fund.strs("note").unwrap();
        assert_eq!(notes, &["", "over ceiling", ""]);
    }

    #[test]
    fn debug_level_events_are_skipped() {
        clear();
        with_default(EventSubscriber, || {
            tracing::debug!(target: "loan", principal = 1.0);
        });
        assert_eq!(drain().count("loan"), 0);
    }

    #[test]
    fn tables_export_to_dataframes() {
        clear();
        with_default(EventSubscriber, || {
            tracing::info!(target: "goods_sale", quantity = 0.5, price = 5.0);
            tracing::info!(target: "goods_sale", quantity = 0.55, price = 6.0);
        });
        let dfs = drain_to_dataframes();
        let df = &dfs["goods_sale"];

        assert_eq!(df.height(), 2);
        let names: Vec<&str> = df.get_column_names().iter().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["price", "quantity"]);
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("instrument-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn saved_frames_read_back() {
        let dir = scratch_dir("save");
        clear();
        with_default(EventSubscriber, || {
            tracing::info!(target: "dividend", dividend = 0.95);
            tracing::info!(target: "dividend", dividend = 1.62);
        });
        let mut dfs = drain_to_dataframes();

        save_parquet(&mut dfs, &dir).unwrap();

        let file = std::fs::File::open(dir.join("dividend.parquet")).unwrap();
        let back = ParquetReader::new(file).finish().unwrap();
        assert_eq!(back.height(), 2);
        assert!(back.equals(&dfs["dividend"]));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn run_capture_writes_tables_and_marker_on_drop() {
        let parent = scratch_dir("capture");
        let mut capture = RunCapture::new(&parent, "loan run");
        with_default(EventSubscriber, || {
            tracing::info!(target: "loan", principal = 0.5, rate = 0.1);
        });

        assert_eq!(capture.frames()["loan"].height(), 1);
        let dir = capture.dir().to_path_buf();
        assert!(dir.starts_with(&parent));
        drop(capture);

        assert!(dir.join("loan.parquet").exists());
        assert!(dir.join("_ready").exists());
        std::fs::remove_dir_all(&parent).unwrap();
    }

    #[test]
    fn empty_run_capture_writes_nothing() {
        let parent = scratch_dir("empty");
        let capture = RunCapture::new(&parent, "idle");
        let dir = capture.dir().to_path_buf();
        drop(capture);
        assert!(!dir.exists());
    }

    #[test]
    fn run_labels_are_path_safe() {
        let label = run_label("firm oracle/v2");
        assert!(label.starts_with("firm_oracle_v2_"));
    }
}
