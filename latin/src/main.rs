use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use liblatin::{InputAttributes, InputPurpose, LatinConfig, Simulator};
use std::io::{self, BufRead};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Replay keystroke scripts against the input engine and an in-memory editor.
///
/// Each script line is typed in order into the same editor; after every line
/// the editor contents are printed with `|` at the caret.
#[derive(Parser)]
#[command(name = "liblatin", version)]
struct Args {
    /// Script file; reads stdin when omitted
    script: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Language whose spacing rules apply (overrides the config file)
    #[arg(long)]
    lang: Option<String>,

    /// Field type reported by the simulated editor
    #[arg(long, value_enum, default_value_t = Purpose::Text)]
    purpose: Purpose,

    /// Read the editor on the calling thread instead of the reload worker
    #[arg(long)]
    inline_reload: bool,

    /// Disable the dead-key combiner
    #[arg(long)]
    no_dead_keys: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,

    /// One JSON report per line instead of the rendered text
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Purpose {
    Text,
    Email,
    Url,
    Password,
    Number,
    Phone,
    Terminal,
}

impl From<Purpose> for InputPurpose {
    fn from(purpose: Purpose) -> Self {
        match purpose {
            Purpose::Text => InputPurpose::FreeForm,
            Purpose::Email => InputPurpose::Email,
            Purpose::Url => InputPurpose::Url,
            Purpose::Password => InputPurpose::Password,
            Purpose::Number => InputPurpose::Number,
            Purpose::Phone => InputPurpose::Phone,
            Purpose::Terminal => InputPurpose::Terminal,
        }
    }
}

fn load_config(args: &Args) -> Result<LatinConfig> {
    let mut config = match &args.config {
        Some(path) => LatinConfig::load_toml(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => LatinConfig::default(),
    };
    if let Some(lang) = &args.lang {
        config.set_language(lang)?;
    }
    if args.inline_reload {
        config.base_mut().reload_in_background = false;
    }
    if args.no_dead_keys {
        config.dead_keys = false;
    }
    Ok(config)
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "liblatin=info,libkeyboard_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    if args.print_config {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    let reader: Box<dyn BufRead> = match &args.script {
        Some(path) => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("failed to open script {}", path.display()))?;
            Box::new(io::BufReader::new(file))
        }
        None => Box::new(io::stdin().lock()),
    };

    let attributes = InputAttributes::for_purpose(args.purpose.into());
    let mut simulator = Simulator::with_attributes(&config, attributes);
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let report = simulator
            .run_line(&line)
            .with_context(|| format!("script line {}", index + 1))?;
        if args.json {
            println!("{}", serde_json::to_string(&report)?);
        } else {
            println!("{}", report.rendered);
        }
    }
    Ok(())
}
