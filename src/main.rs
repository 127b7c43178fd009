use anyhow::{Context, Result};
use clap::Parser;
use lmcc::frontend::printer;
use std::fs;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "lmcc", version)]
#[command(about = "Compile a small imperative language to Little Man Computer assembly", long_about = None)]
struct Cli {
    /// Source file to compile
    source: Option<PathBuf>,

    /// Print the parsed program before compiling
    #[arg(long)]
    debug: bool,

    /// Where to write the assembly listing
    #[arg(long, default_value = "output.txt")]
    output: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let Some(source_path) = cli.source else {
        println!("no source file");
        return Ok(());
    };

    let source_code = fs::read_to_string(&source_path)
        .with_context(|| format!("failed to read {}", source_path.display()))?;

    let program = lmcc::parse(&source_code).unwrap_or_else(|errors| {
        for err in &errors {
            println!("{err}");
        }
        process::exit(1);
    });

    if cli.debug {
        print!("{}", printer::print(&program)?);
    }

    let output = match lmcc::compile(&program) {
        Ok(output) => output,
        Err(lmcc::Error::Compile(errors)) => {
            for err in &errors {
                println!("{err}");
            }
            process::exit(1);
        }
        Err(err) => return Err(err.into()),
    };

    fs::write(&cli.output, output)
        .with_context(|| format!("failed to write {}", cli.output.display()))?;

    Ok(())
}
