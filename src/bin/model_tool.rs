use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use modelbase::naming::{tableize, to_natural_key, to_storage_key};
use modelbase::{Column, DataType, TableSchema};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "model-tool")]
#[command(about = "Developer tooling for modelbase models")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the table name derived from a type name
    Tableize { type_name: String },
    /// Print a key in storage (snake_case) form
    Snake { key: String },
    /// Print a key in natural (camelCase) form
    Camel { key: String },
    /// Print the CREATE TABLE statement of a standard model relation
    Schema {
        /// Table name; derived from --model when omitted
        #[arg(long)]
        table: Option<String>,
        #[arg(long)]
        model: Option<String>,
        /// Comma separated `name:type` pairs, e.g. `foo:text,viewCount:integer`
        #[arg(long, default_value = "")]
        columns: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Tableize { type_name } => {
            println!("{}", tableize(&type_name));
            Ok(())
        }
        Command::Snake { key } => {
            println!("{}", to_storage_key(&key));
            Ok(())
        }
        Command::Camel { key } => {
            println!("{}", to_natural_key(&key));
            Ok(())
        }
        Command::Schema {
            table,
            model,
            columns,
            out,
        } => schema(table, model, &columns, out.as_deref()),
    }
}

fn schema(table: Option<String>, model: Option<String>, columns: &str, out: Option<&Path>) -> Result<()> {
    let table = match (table, model) {
        (Some(table), _) => table,
        (None, Some(model)) => tableize(&model),
        (None, None) => return Err(anyhow!("Provide --table <name> or --model <TypeName>")),
    };

    let sql = TableSchema::standard(table, parse_columns(columns)?).to_create_sql();

    match out {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create parent directory '{}'", parent.display())
                })?;
            }
            fs::write(path, format!("{}\n", sql))
                .with_context(|| format!("Failed to write schema to '{}'", path.display()))?;
            println!("Wrote schema: {}", path.display());
        }
        None => println!("{}", sql),
    }
    Ok(())
}

fn parse_columns(input: &str) -> Result<Vec<Column>> {
    let mut columns = Vec::new();

    for part in input.split(',') {
        let trimmed = part.trim();
        if trimmed.is_empty() {
            continue;
        }
        let (name, ty) = trimmed.split_once(':').unwrap_or((trimmed, "text"));
        let data_type = DataType::parse(ty.trim())
            .ok_or_else(|| anyhow!("Unknown column type '{}' for '{}'", ty.trim(), name.trim()))?;
        columns.push(Column::new(to_storage_key(name.trim()), data_type));
    }

    Ok(columns)
}
