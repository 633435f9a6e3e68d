use builder_synth::{
    load_schema, synthesize, CollectionFamily, FlagUsage, Severity, SynthConfig,
};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "builder-synth-inspect")]
#[command(about = "Synthesize a builder from a JSON schema descriptor and print its method surface")]
struct Cli {
    /// Path to the schema descriptor
    schema: PathBuf,

    /// Disable singular name inference
    #[arg(long)]
    no_infer: bool,

    /// Materialize into persistent `im` collections
    #[arg(long)]
    persistent: bool,

    /// Report every use of builder, singular and default features
    #[arg(long, value_enum)]
    flag_usage: Option<Level>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Level {
    Warning,
    Error,
}

impl From<Level> for Severity {
    fn from(level: Level) -> Self {
        match level {
            Level::Warning => Severity::Warning,
            Level::Error => Severity::Error,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let family = if cli.persistent {
        CollectionFamily::Persistent
    } else {
        CollectionFamily::Frozen
    };
    let mut config = SynthConfig::default().with_family(family);
    if cli.no_infer {
        config = config.without_inference();
    }
    if let Some(level) = cli.flag_usage {
        let severity = Some(Severity::from(level));
        config = config.with_flag_usage(FlagUsage {
            builder: severity,
            singular: severity,
            default: severity,
        });
    }

    info!("Loading schema from {}", cli.schema.display());
    let schema = load_schema(&cli.schema, family)?;
    let model = synthesize(&schema, &config)?;

    println!("{} ({} parameters)", model.product(), model.parameters().len());
    for plan in model.parameters() {
        println!("  {:<16} {:<20} {}", plan.name, plan.kind.to_string(), plan.strategy);
    }
    println!("  build method: {}", model.build_method());

    if !model.diagnostics().is_empty() {
        println!();
        for diagnostic in model.diagnostics() {
            println!("{}", diagnostic);
        }
    }

    Ok(())
}
