use clap::{App, Arg};
use std::fs;
use anyhow::{Context, Result};
use tracing::{info, warn, Level};

use sol_lower::errors::TranspileError;
use sol_lower::transpiler::{self, LowerOptions};
use sol_lower::{generator, parser};

fn main() -> Result<()> {
    let matches = App::new("sol-lower")
        .version("0.1.0")
        .author("Replit")
        .about("Lowers Solidity contracts towards a flat target language")
        .arg(
            Arg::with_name("INPUT")
                .help("Input Solidity file")
                .required_unless("list-passes")
                .index(1),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .value_name("FILE")
                .help("Write the lowered source here instead of stdout")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("until")
                .long("until")
                .value_name("KEY")
                .help("Stop after the pass with this key")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("list-passes")
                .long("list-passes")
                .help("Print the pass keys in pipeline order and exit"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .help("Increase log verbosity (-v debug, -vv trace)"),
        )
        .get_matches();

    let level = match matches.occurrences_of("verbose") {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();

    if matches.is_present("list-passes") {
        for pass in transpiler::PASSES {
            println!("{}\t{}", pass.key, pass.description);
        }
        return Ok(());
    }

    let input_file = matches
        .value_of("INPUT")
        .context("No input file given")?;
    let options = LowerOptions {
        until: matches.value_of("until").map(String::from),
    };

    let source = fs::read_to_string(input_file)
        .with_context(|| format!("Failed to read input file: {}", input_file))?;

    let mut ast = parser::parse_all(&[(input_file, source.as_str())])
        .map_err(|err| {
            warn_if_unsupported(err.downcast_ref::<TranspileError>(), input_file);
            err
        })
        .with_context(|| "Failed to parse Solidity code")?;

    transpiler::lower(&mut ast, &options)
        .map_err(|err| {
            warn_if_unsupported(Some(&err), input_file);
            err
        })
        .with_context(|| format!("Failed to lower {}", input_file))?;

    let output = generator::generate(&ast);
    match matches.value_of("output") {
        Some(output_file) => {
            fs::write(output_file, output)
                .with_context(|| format!("Failed to write output file: {}", output_file))?;
            info!("Successfully lowered {} to {}", input_file, output_file);
        }
        None => print!("{}", output),
    }

    Ok(())
}

fn warn_if_unsupported(err: Option<&TranspileError>, input_file: &str) {
    if err.map_or(false, TranspileError::is_not_supported) {
        warn!("{} uses Solidity this tool does not lower yet", input_file);
    }
}
