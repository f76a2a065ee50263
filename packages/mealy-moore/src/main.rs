use anyhow::Context;
use clap::Parser;
use mealy_moore_lib::{
    config::{ConfigFile, ConversionMode, ConverterConfig},
    convert::{ConversionKind, Converter},
    logger::{LogLevel, Logger},
};

#[derive(Parser, Debug)]
#[command(name = "Mealy/Moore Converter")]
#[command(version = "0.1")]
#[command(about = "Convert between Mealy and Moore machine tables", long_about = None)]
struct Args {
    /// Either `mealy-to-moore` or `moore-to-mealy`.
    kind: ConversionKind,
    input: String,
    output: String,

    #[arg(short, long)]
    config: Option<String>,

    #[arg(short, long)]
    mode: Option<ConversionMode>,

    #[arg(long)]
    max_states: Option<usize>,

    /// Overrides the configured log level and enables logging.
    #[arg(short, long)]
    log_level: Option<LogLevel>,

    /// Also write the result together with its start state as JSON.
    #[arg(long)]
    json: Option<String>,

    #[arg(long)]
    graphviz: Option<String>,
}

impl Args {
    fn config(&self) -> anyhow::Result<ConverterConfig> {
        let mut config = ConverterConfig::from_optional_file(self.config.as_ref())?;

        if let Some(mode) = self.mode {
            config.set_mode(mode);
        }
        if let Some(max_states) = self.max_states {
            let split = config.get_split().clone().with_max_states(Some(max_states));
            config.set_split(split);
        }
        if let Some(level) = self.log_level {
            let logger = config
                .get_logger()
                .clone()
                .with_enabled(true)
                .with_log_level(level);
            config.set_logger(logger);
        }

        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = args.config()?;

    let level = if *config.get_logger().get_enabled() {
        *config.get_logger().get_log_level()
    } else {
        LogLevel::Error
    };
    tracing_subscriber::fmt::Subscriber::builder()
        .with_max_level(level.to_tracing())
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let logger = Logger::from_config(config.get_logger(), "Converter".into())?;

    tracing::debug!(input = %args.input, kind = %args.kind, "reading table");
    let text = std::fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {} table {}", args.kind.source(), args.input))?;
    if let Some(logger) = &logger {
        logger.debug(&format!("read {} bytes from {}", text.len(), args.input));
    }

    let conversion = Converter::new(config).convert(&text, args.kind);
    let conversion = match conversion {
        Ok(conversion) => conversion,
        Err(err) => {
            if let Some(logger) = &logger {
                logger.error(&err.to_string());
            }
            return Err(err).with_context(|| format!("{} failed for {}", args.kind, args.input));
        }
    };

    std::fs::write(&args.output, &conversion.text)
        .with_context(|| format!("failed to write {}", args.output))?;
    tracing::debug!(output = %args.output, "wrote table");
    if let Some(logger) = &logger {
        logger.info(&format!("wrote {} table to {}", conversion.machine.kind(), args.output));
    }

    if let Some(path) = &args.json {
        let json = conversion.machine.to_json(&conversion.start)?;
        std::fs::write(path, json).with_context(|| format!("failed to write {}", path))?;
    }

    if let Some(path) = &args.graphviz {
        let dot = conversion.machine.to_graphviz(&conversion.start)?;
        std::fs::write(path, dot).with_context(|| format!("failed to write {}", path))?;
    }

    if let Some(logger) = &logger {
        logger
            .object("conversion")
            .add_field("kind", args.kind)
            .add_field("result", conversion.machine.kind())
            .add_field("states", conversion.machine.state_count())
            .add_field("start", &conversion.start)
            .add_field("output", &args.output)
            .log(LogLevel::Info);
    }

    println!("{}", conversion.start);

    Ok(())
}
