use clap::{App, Arg};
use log::{debug, error, info, LevelFilter};
use std::io::{self, Read};
use std::process;

use ts_to_zod::{convert_ts_to_zod, Config, ConversionError};

/// Read the source from a file, or from stdin for `-`
fn read_source(input: &str) -> io::Result<String> {
    if input == "-" {
        let mut source = String::new();
        io::stdin().read_to_string(&mut source)?;
        Ok(source)
    } else {
        std::fs::read_to_string(input)
    }
}

fn run() -> Result<bool, ConversionError> {
    let matches = App::new("ts-to-zod")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Generate Zod schemas from TypeScript type declarations")
        .arg(
            Arg::with_name("INPUT")
                .help("TypeScript source file, or - for stdin")
                .index(1),
        )
        .arg(
            Arg::with_name("OUTPUT")
                .help("Schema file to write (prints to stdout when omitted)")
                .index(2),
        )
        .arg(
            Arg::with_name("config")
                .long("config")
                .short("c")
                .value_name("FILE")
                .takes_value(true)
                .help("JSON configuration file"),
        )
        .arg(
            Arg::with_name("keep-comments")
                .long("keep-comments")
                .short("k")
                .help("Keep JSDoc comments on the generated schemas"),
        )
        .arg(
            Arg::with_name("strict")
                .long("strict")
                .help("Reject unknown keys on object schemas"),
        )
        .arg(
            Arg::with_name("max-run")
                .long("max-run")
                .value_name("N")
                .takes_value(true)
                .help("Maximum number of dependency resolution passes"),
        )
        .arg(
            Arg::with_name("name-filter")
                .long("name-filter")
                .value_name("REGEX")
                .takes_value(true)
                .help("Only generate schemas for declarations matching REGEX"),
        )
        .arg(
            Arg::with_name("skip-validation")
                .long("skip-validation")
                .help("Do not write the integration test file"),
        )
        .arg(
            Arg::with_name("verbose")
                .long("verbose")
                .short("v")
                .help("Enable debug logging"),
        )
        .get_matches();

    let mut logger = env_logger::Builder::from_default_env();
    if matches.is_present("verbose") {
        logger.filter_level(LevelFilter::Debug);
    }
    logger.init();

    let mut config = match matches.value_of("config") {
        Some(path) => {
            info!("Loading configuration from {}", path);
            Config::from_file(path)?
        }
        None => Config::default(),
    };

    if let Some(input) = matches.value_of("INPUT") {
        config.input = Some(input.to_string());
    }
    if let Some(output) = matches.value_of("OUTPUT") {
        config.output = Some(output.to_string());
    }
    if let Some(max_run) = matches.value_of("max-run") {
        config.max_run = max_run.parse().map_err(|_| {
            ConversionError::InvalidArgument(format!("--max-run expects a number, got {}", max_run))
        })?;
    }
    if let Some(filter) = matches.value_of("name-filter") {
        config.name_filter = Some(filter.to_string());
    }
    config.keep_comments |= matches.is_present("keep-comments");
    config.strict |= matches.is_present("strict");
    config.skip_validation |= matches.is_present("skip-validation");

    if config.input.is_none() && !atty::is(atty::Stream::Stdin) {
        debug!("No input given, reading from stdin");
        config.input = Some("-".to_string());
    }
    let input = config.input.clone().ok_or_else(|| {
        ConversionError::MissingInput("no input file given (use - for stdin)".to_string())
    })?;

    let source = read_source(&input)?;
    let conversion = convert_ts_to_zod(&config, source)?;

    if conversion.written.is_empty() {
        print!("{}", conversion.schemas_file);
    } else {
        for path in &conversion.written {
            info!("Generated {}", path.display());
        }
    }

    for message in &conversion.errors {
        eprintln!("{}", message);
    }

    Ok(conversion.errors.is_empty())
}

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(err) => {
            error!("{}", err);
            eprintln!("Error: {}", err);
            process::exit(1);
        }
    }
}
