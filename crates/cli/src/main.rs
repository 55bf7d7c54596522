mod cli;
mod logging;

use clap::Parser;

use cli::{Cli, CliError, Command};
use geofill_engine::TableSummary;

fn main() {
    logging::init();

    if let Err(error) = run() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), CliError> {
    let cli = Cli::parse();

    match cli.command {
        Command::List(args) => {
            let tables = geofill_engine::list_tables(&args.input)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&tables)?);
            } else {
                for table in &tables {
                    println!("{}", describe(table));
                }
            }
            Ok(())
        }
        Command::Run(args) => {
            let config = args.to_config()?;
            let report = geofill_engine::run(&config)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{report}");
                for diagnostic in &report.diagnostics {
                    println!(
                        "  row {}: {}",
                        diagnostic.row,
                        diagnostic.message.as_deref().unwrap_or(diagnostic.outcome.as_str())
                    );
                }
                println!("wrote {}", config.dest_path.display());
            }
            Ok(())
        }
    }
}

fn describe(table: &TableSummary) -> String {
    if table.geometry_columns.is_empty() {
        format!("Table {} with {} rows has no spatial columns", table.name, table.row_count)
    } else {
        format!(
            "Table {} with {} rows has {} spatial columns: [{}]",
            table.name,
            table.row_count,
            table.geometry_columns.len(),
            table.geometry_columns.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_tables_with_and_without_geometry() {
        let plain = TableSummary {
            name: "Extract".into(),
            row_count: 3,
            geometry_columns: vec![],
        };
        assert_eq!(describe(&plain), "Table Extract with 3 rows has no spatial columns");

        let spatial = TableSummary {
            name: "LocalDatamunicipalities".into(),
            row_count: 2,
            geometry_columns: vec!["Geometry".into()],
        };
        assert_eq!(
            describe(&spatial),
            "Table LocalDatamunicipalities with 2 rows has 1 spatial columns: [Geometry]"
        );
    }
}
