use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use uvm_asm::{Assembler, AssemblerOptions};

#[derive(Parser)]
#[command(name = "uasm")]
#[command(about = "UVM Assembler - Assembles UVM source files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble source file to a binary image
    Assemble {
        /// Input assembly file
        input: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (binary, json)
        #[arg(short, long, default_value = "binary")]
        format: String,

        /// Match mnemonics case-sensitively (default is insensitive)
        #[arg(long)]
        case_sensitive: bool,
    },

    /// Validate an assembly file without writing output
    Check {
        /// Input assembly file
        input: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Assemble {
            input,
            output,
            format,
            case_sensitive,
        } => {
            let source = fs::read_to_string(&input)?;
            let assembler = Assembler::new(AssemblerOptions {
                case_insensitive: !case_sensitive,
            });

            let output_path = output.unwrap_or_else(|| {
                let mut path = input.clone();
                path.set_extension(match format.as_str() {
                    "json" => "json",
                    _ => "bin",
                });
                path
            });

            match format.as_str() {
                "binary" => match assembler.assemble_to_binary(&source) {
                    Ok(binary) => {
                        fs::write(&output_path, &binary)?;
                        println!("Assembled to {}", output_path.display());
                        println!("  Instructions: {}", binary.len() / 3);
                        println!("  Bytes: {}", binary.len());
                    }
                    Err(error) => {
                        eprintln!("Assembly failed: {error}");
                        std::process::exit(1);
                    }
                },
                "json" => match assembler.assemble(&source) {
                    Ok(instructions) => {
                        let json = serde_json::to_string_pretty(&instructions)?;
                        fs::write(&output_path, json)?;
                        println!("Listing written to {}", output_path.display());
                        println!("  Instructions: {}", instructions.len());
                    }
                    Err(error) => {
                        eprintln!("Assembly failed: {error}");
                        std::process::exit(1);
                    }
                },
                _ => {
                    eprintln!("Unknown format: {format}");
                    std::process::exit(1);
                }
            }
        }

        Commands::Check { input } => {
            let source = fs::read_to_string(&input)?;
            let assembler = Assembler::default();

            match assembler.assemble(&source) {
                Ok(instructions) => {
                    println!("{} is valid", input.display());
                    println!("  Instructions: {}", instructions.len());
                    for instruction in &instructions {
                        println!("  {instruction}");
                    }
                }
                Err(error) => {
                    eprintln!("{} has errors:", input.display());
                    eprintln!("  - {error}");
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_sensitive_flag_reaches_assembler() {
        let cli = Cli::try_parse_from(["uasm", "assemble", "prog.asm", "--case-sensitive"])
            .unwrap();
        match cli.command {
            Commands::Assemble { case_sensitive, .. } => assert!(case_sensitive),
            _ => panic!("expected assemble subcommand"),
        }

        let cli = Cli::try_parse_from(["uasm", "assemble", "prog.asm"]).unwrap();
        match cli.command {
            Commands::Assemble { case_sensitive, .. } => assert!(!case_sensitive),
            _ => panic!("expected assemble subcommand"),
        }
    }

    #[test]
    fn test_case_sensitive_mode_rejects_lowercase() {
        let assembler = Assembler::new(AssemblerOptions {
            case_insensitive: false,
        });
        assert!(assembler.assemble("load #1").is_err());
        assert!(assembler.assemble("LOAD #1").is_ok());
    }
}
