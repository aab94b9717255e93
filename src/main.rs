use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use dftrace::Result;
use dftrace::config::{ContentMode, DedupScope, EmitConfig, Qualify};
use dftrace::emit::TraceEmitter;

#[derive(Parser)]
#[command(name = "dftrace")]
#[command(about = "Dataflow trace writer", long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Emit a trace from an analysis document (analysis.json).
    Emit {
        #[arg(long)]
        input: String,

        #[arg(short = 'o', long)]
        out: String,

        /// Replace newlines in node text and payloads with spaces.
        #[arg(long)]
        flatten: bool,

        /// Do not qualify ids with the selected group.
        #[arg(long)]
        explicit_groups: bool,

        #[arg(long, value_enum, default_value_t = DedupScope::Session)]
        dedup: DedupScope,
    },

    /// Read a trace back and print a summary (fails on malformed traces).
    Check { trace: String },

    /// Write a small example trace.
    Demo {
        #[arg(short = 'o', long)]
        out: String,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("dftrace={}", level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.cmd {
        Commands::Emit {
            input,
            out,
            flatten,
            explicit_groups,
            dedup,
        } => {
            let config = EmitConfig {
                content: if flatten {
                    ContentMode::Flatten
                } else {
                    ContentMode::Verbatim
                },
                qualify: if explicit_groups {
                    Qualify::Explicit
                } else {
                    Qualify::Current
                },
                dedup,
            };

            let analysis = dftrace::source::load_analysis(&input)?;

            // The file is closed when the emitter drops, on error paths too.
            let mut emitter = TraceEmitter::create(&out, config)?;
            dftrace::source::emit_analysis(&analysis, &mut emitter)
                .with_context(|| format!("write trace {}", out))?;
            emitter
                .finish()
                .with_context(|| format!("flush trace {}", out))?;
            println!("Wrote {}", out);
        }
        Commands::Check { trace } => {
            let parsed = dftrace::trace::parse_trace_file(&trace)?;
            println!("{}", serde_json::to_string_pretty(&parsed.summary())?);
        }
        Commands::Demo { out } => {
            let mut emitter = TraceEmitter::create(&out, EmitConfig::default())?;
            dftrace::demo::write_demo(&mut emitter)
                .with_context(|| format!("write trace {}", out))?;
            emitter
                .finish()
                .with_context(|| format!("flush trace {}", out))?;
            println!("Wrote {}", out);
        }
    }

    Ok(())
}
