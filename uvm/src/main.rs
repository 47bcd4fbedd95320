use clap::Parser;
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::process;
use uvm::cli::{parse_range, Cli};
use uvm::Vm;

#[derive(Serialize)]
struct DumpRecord {
    address: usize,
    value: i64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let binary = fs::read(&cli.binary_file).unwrap_or_else(|e| {
        eprintln!("Error reading file '{}': {}", cli.binary_file.display(), e);
        process::exit(1);
    });

    let mut vm = Vm::new(cli.memory);
    if let Err(e) = vm.load(&binary) {
        eprintln!("Error loading binary: {e}");
        process::exit(1);
    }

    let run_result = vm.run();
    if let Err(ref e) = run_result {
        eprintln!("Execution fault: {e}");
    }

    // Write the requested dump even after a fault; a post-mortem view
    // of memory is the main diagnostic this machine offers
    if let Some(range) = &cli.dump {
        let (start, end) = parse_range(range).unwrap_or_else(|e| {
            eprintln!("Error: {e}");
            process::exit(1);
        });

        match vm.dump(start, end) {
            Ok(cells) => {
                write_dump(&cells, &cli.dump_format, cli.output.as_deref())?;
            }
            Err(e) => {
                eprintln!("Dump failed: {e}");
                process::exit(1);
            }
        }
    }

    if run_result.is_err() {
        process::exit(1);
    }
    Ok(())
}

fn write_dump(
    cells: &[(usize, i64)],
    format: &str,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = match format {
        "csv" => {
            let mut out = String::from("address,value\n");
            for (address, value) in cells {
                out.push_str(&format!("{address},{value}\n"));
            }
            out
        }
        "json" => {
            let records: Vec<DumpRecord> = cells
                .iter()
                .map(|&(address, value)| DumpRecord { address, value })
                .collect();
            let mut json = serde_json::to_string_pretty(&records)?;
            json.push('\n');
            json
        }
        _ => {
            eprintln!("Unknown dump format: {format}");
            process::exit(1);
        }
    };

    match output {
        Some(path) => {
            fs::write(path, text)?;
            println!(
                "Memory dump written to {} ({} cells)",
                path.display(),
                cells.len()
            );
        }
        None => print!("{text}"),
    }
    Ok(())
}
