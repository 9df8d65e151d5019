use cxref_core::model::{Definition, IndexFile};
use cxref_core::storage::{
    CacheStore, Format, SchemaVersion, read_cache_file, read_cache_version, write_cache_file,
};
use std::path::{Path, PathBuf};
use tabled::{Table, Tabled};
use tracing::info;

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

impl FieldRow {
    fn new(field: &'static str, value: impl ToString) -> Self {
        Self {
            field,
            value: value.to_string(),
        }
    }
}

#[derive(Tabled)]
struct EntityRow {
    #[tabled(rename = "Kind")]
    kind: &'static str,
    #[tabled(rename = "Id")]
    id: u32,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Usr")]
    usr: String,
    #[tabled(rename = "Defined")]
    defined: String,
}

impl EntityRow {
    fn new(kind: &'static str, id: u32, def: &impl Definition, usr: &str) -> Self {
        let name = match def.short_name() {
            "" => def.detailed_name().to_string(),
            short => short.to_string(),
        };
        Self {
            kind,
            id,
            name,
            usr: usr.to_string(),
            defined: def
                .definition_spelling()
                .map(|r| r.to_string())
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

pub fn path(source: &Path) -> CliResult {
    let store = CacheStore::from_env()?;
    println!("{}", store.cache_path(source).display());
    Ok(())
}

pub fn inspect(file: &Path, entities: bool) -> CliResult {
    let index = read_cache_file(file)?;
    let version = read_cache_version(file)?;
    let size = std::fs::metadata(file)?.len();

    let rows = summary_rows(file, size, version, &index);
    println!("{}", Table::new(rows));

    if entities {
        let rows = entity_rows(&index);
        if rows.is_empty() {
            println!("No entities.");
        } else {
            println!("{}", Table::new(rows));
        }
    }
    Ok(())
}

fn summary_rows(file: &Path, size: u64, version: SchemaVersion, index: &IndexFile) -> Vec<FieldRow> {
    let schema = if version == SchemaVersion::CURRENT {
        version.to_string()
    } else {
        format!("{} (current {})", version, SchemaVersion::CURRENT)
    };
    vec![
        FieldRow::new("Cache file", file.display()),
        FieldRow::new("Size", format_size(size)),
        FieldRow::new("Schema", schema),
        FieldRow::new("Source", &index.path),
        FieldRow::new("Language", index.language),
        FieldRow::new("Import file", &index.import_file),
        FieldRow::new("Modified", index.last_modification_time),
        FieldRow::new("Args", index.args.join(" ")),
        FieldRow::new("Includes", index.includes.len()),
        FieldRow::new("Dependencies", index.dependencies.len()),
        FieldRow::new("Skipped ranges", index.skipped_by_preprocessor.len()),
        FieldRow::new("Types", index.types.len()),
        FieldRow::new("Functions", index.funcs.len()),
        FieldRow::new("Variables", index.vars.len()),
    ]
}

fn entity_rows(index: &IndexFile) -> Vec<EntityRow> {
    let types = index
        .types
        .iter()
        .map(|t| EntityRow::new("type", t.id.raw(), &t.def, t.usr.as_str()));
    let funcs = index
        .funcs
        .iter()
        .map(|f| EntityRow::new("func", f.id.raw(), &f.def, f.usr.as_str()));
    let vars = index
        .vars
        .iter()
        .map(|v| EntityRow::new("var", v.id.raw(), &v.def, v.usr.as_str()));
    types.chain(funcs).chain(vars).collect()
}

pub fn dump(file: &Path) -> CliResult {
    let index = read_cache_file(file)?;
    println!("{}", index.to_pretty_json()?);
    Ok(())
}

pub fn convert(file: &Path, to: Format, output: Option<PathBuf>) -> CliResult {
    let index = read_cache_file(file)?;
    let output = output.unwrap_or_else(|| file.with_extension(to.extension()));
    if output == file {
        return Err(format!("{} is already a {} cache file", file.display(), to).into());
    }

    let store = CacheStore::from_env()?;
    write_cache_file(&output, &index, to, store.config().compress)?;
    info!("Converted {} to {}", file.display(), output.display());
    println!("{}", output.display());
    Ok(())
}

pub fn clear() -> CliResult {
    let store = CacheStore::from_env()?;
    let removed = store.clear()?;
    println!(
        "Removed {} files from {}",
        removed,
        store.config().cache_dir.display()
    );
    Ok(())
}

pub fn stats() -> CliResult {
    let store = CacheStore::from_env()?;
    let stats = store.stats()?;
    println!("Cache Directory: {}", stats.cache_dir.display());
    println!("Cache Format:    {}", store.config().format);
    println!("Index Files:     {}", stats.index_files);
    println!("  json:          {}", stats.json_files);
    println!("  msgpack:       {}", stats.msgpack_files);
    println!("Source Snapshots: {}", stats.contents_files);
    println!("Total Size:      {}", format_size(stats.total_bytes));
    Ok(())
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / 1024.0 / 1024.0)
    }
}
