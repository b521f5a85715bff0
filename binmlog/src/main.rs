//! mlog command-line tool for parsing and transcoding server log files.
//!
//! Usage: mlog [OPTIONS] [FILE]
//!
//! Options:
//!   -t, --to <FORMAT>              Output format (log, json, yaml, cbor) [default: json]
//!   -m, --metadata-field <NAME>    Capture a leading token before the timestamp as NAME
//!   -o, --output <FILE>            Write output to specified file
//!   --check                        Only report lines that fail to parse
//!   -h, --help                     Print help
//!   -V, --version                  Print version

use libmlog::{encode_line, parse_with_context, Format, LogLine, ParseContext};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::process;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod transcode;

/// Output format for the CLI, a superset of the library's formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Log,
    Json,
    Yaml,
    Cbor,
}

fn parse_format(s: &str) -> Option<OutputFormat> {
    match s {
        "log" => Some(OutputFormat::Log),
        "json" => Some(OutputFormat::Json),
        "yaml" | "yml" => Some(OutputFormat::Yaml),
        "cbor" => Some(OutputFormat::Cbor),
        _ => None,
    }
}

/// Used when `RUST_LOG` is unset. Targets are crate names: `mlog` is the
/// binary target, not the `binmlog` package.
const DEFAULT_LOG_FILTER: &str = "mlog=warn,libmlog=warn";

/// Logs go to stderr so they never mix with rendered output.
fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()))
        .with(fmt::layer().with_writer(io::stderr))
        .init();
}

fn main() {
    init_logging();

    let args: Vec<String> = std::env::args().collect();

    let mut to_format = OutputFormat::Json;
    let mut metadata_field: Option<&str> = None;
    let mut output_file: Option<&str> = None;
    let mut check_only = false;
    let mut input_path: Option<&str> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                return;
            }
            "-V" | "--version" => {
                println!("mlog {}", env!("CARGO_PKG_VERSION"));
                return;
            }
            "-t" | "--to" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: -t requires a format argument");
                    process::exit(1);
                }
                to_format = match parse_format(&args[i]) {
                    Some(format) => format,
                    None => {
                        eprintln!("Error: Unknown format: {}", args[i]);
                        process::exit(1);
                    }
                };
            }
            "-m" | "--metadata-field" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: -m requires a field name");
                    process::exit(1);
                }
                metadata_field = Some(&args[i]);
            }
            "-o" | "--output" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --output requires an argument");
                    process::exit(1);
                }
                output_file = Some(&args[i]);
            }
            "--check" => {
                check_only = true;
            }
            "-" => {
                // Explicit stdin
                input_path = None;
            }
            arg if arg.starts_with('-') => {
                eprintln!("Error: Unknown option: {}", arg);
                eprintln!("Run 'mlog --help' for usage.");
                process::exit(1);
            }
            arg => {
                if input_path.is_some() {
                    eprintln!("Error: Only one input file may be given");
                    process::exit(1);
                }
                input_path = Some(arg);
            }
        }
        i += 1;
    }

    let reader: Box<dyn BufRead> = match input_path {
        Some(path) => match File::open(path) {
            Ok(file) => Box::new(BufReader::new(file)),
            Err(e) => {
                eprintln!("Error reading {}: {}", path, e);
                process::exit(1);
            }
        },
        None => Box::new(BufReader::new(io::stdin())),
    };

    let writer: Box<dyn Write> = match output_file {
        Some(path) => match File::create(path) {
            Ok(file) => Box::new(BufWriter::new(file)),
            Err(e) => {
                eprintln!("Error writing {}: {}", path, e);
                process::exit(1);
            }
        },
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let mut ctx = ParseContext::new(input_path.map(display_name).as_deref());
    if let Some(name) = metadata_field {
        ctx = ctx.with_metadata_field(name);
    }

    let failed = process_input(reader, writer, &mut ctx, to_format, check_only);
    process::exit(if failed > 0 { 1 } else { 0 });
}

/// File name used in error locations.
fn display_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string())
}

/// Parse every non-blank line, writing one rendering per parsed line.
///
/// Returns the number of lines that failed to parse.
fn process_input(
    reader: impl BufRead,
    mut writer: impl Write,
    ctx: &mut ParseContext,
    format: OutputFormat,
    check_only: bool,
) -> usize {
    let mut parsed = 0;
    let mut failed = 0;

    for (line_num, line) in reader.lines().enumerate() {
        ctx.line_num = Some(line_num);
        let line = match line {
            Ok(line) => line,
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                eprintln!("Error: {}{}", e, ctx.loc_suffix(0));
                failed += 1;
                continue;
            }
            Err(e) => {
                eprintln!("Error reading input: {}", e);
                process::exit(1);
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match parse_with_context(&line, ctx) {
            Ok(log_line) => {
                parsed += 1;
                if check_only {
                    continue;
                }
                if let Err(e) = write_line(&mut writer, &log_line, format) {
                    eprintln!("Error: {}", e);
                    process::exit(1);
                }
            }
            Err(e) => {
                failed += 1;
                eprintln!("Error: {}", e);
            }
        }
    }

    if let Err(e) = writer.flush() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
    tracing::debug!(parsed, failed, "finished input");
    failed
}

fn write_line(writer: &mut impl Write, line: &LogLine, format: OutputFormat) -> Result<(), String> {
    let io_result = match format {
        OutputFormat::Log => writeln!(writer, "{}", encode_line(line, Format::Log)),
        OutputFormat::Json => writeln!(writer, "{}", encode_line(line, Format::Json)),
        OutputFormat::Yaml => {
            let output = transcode::yaml::encode(line)
                .map_err(|e| format!("Cannot convert to YAML: {}", e))?;
            write!(writer, "---\n{}", output)
        }
        OutputFormat::Cbor => {
            let bytes = transcode::cbor::encode(line)
                .map_err(|e| format!("Cannot convert to CBOR: {}", e))?;
            writer.write_all(&bytes)
        }
    };
    io_result.map_err(|e| e.to_string())
}

fn print_help() {
    println!(
        "mlog - server log line parser

USAGE:
    mlog [OPTIONS] [FILE]

ARGS:
    [FILE]    Input log file (reads from stdin if not provided or '-')

OPTIONS:
    -t, --to <FORMAT>              Output format [default: json]
                                   Supported: log, json, yaml, cbor

                                   'log' re-renders each line in the server's
                                   own literal syntax. 'yaml' writes one
                                   document per line; 'cbor' writes one data
                                   item per line (a CBOR sequence).

    -m, --metadata-field <NAME>    Capture a leading token (such as a host tag
                                   added by a log collector) as field NAME when
                                   a timestamp follows it

    -o, --output <FILE>            Write output to specified file

    --check                        Only report lines that fail to parse
                                   (exit 0 if all parse, 1 otherwise)

    -h, --help                     Print help

    -V, --version                  Print version

ENVIRONMENT:
    RUST_LOG                       Log filter [default: mlog=warn,libmlog=warn]

EXAMPLES:
    # Convert a log file to JSON, one object per line
    mlog mongod.log

    # Find lines the parser cannot read
    mlog --check mongod.log

    # Convert to YAML from stdin
    tail -n 100 mongod.log | mlog -t yaml

    # Lines prefixed with a host name by a collector
    mlog -m host aggregated.log

    # Write CBOR to a file
    mlog -t cbor mongod.log -o mongod.cbor

    # Show recovered documents as they happen
    RUST_LOG=libmlog=debug mlog mongod.log
"
    );
}
