use std::process;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use calltree::{Resolution, TraceConfig, TraceController};
use clap::Parser;

/// Run a synthetic nested workload and print its call-tree report
#[derive(Parser)]
#[command(name = "calltree")]
#[command(about = "Run a synthetic nested workload and print its call-tree report", long_about = None)]
#[command(version)]
#[command(after_long_help = r#"EXAMPLES:
  # Three levels of two probes each, reported in microseconds
  calltree --depth 3 --breadth 2 --resolution us

  # Show trace lifecycle diagnostics on stderr
  calltree -v

  # Show the loaded configuration (file + CALLTREE_* env)
  calltree --print-config

The demo always traces unless --disable is passed; the configured `enabled`
flag applies to library users of TraceConfig.
"#)]
struct Cli {
    /// Enable verbose output (trace lifecycle and sequencing diagnostics)
    #[arg(long, short = 'v')]
    verbose: bool,

    /// Report unit (overrides the configured resolution)
    #[arg(long, short = 'r', value_enum)]
    resolution: Option<Resolution>,

    /// Probe nesting depth
    #[arg(long, default_value_t = 2)]
    depth: usize,

    /// Probes opened at each level
    #[arg(long, default_value_t = 2)]
    breadth: usize,

    /// Time spent in each innermost probe, in milliseconds
    #[arg(long, default_value_t = 1)]
    sleep_ms: u64,

    /// Trace name
    #[arg(long, default_value = "workload")]
    name: String,

    /// Run with tracing disabled (the report is empty)
    #[arg(long)]
    disable: bool,

    /// Print the loaded configuration (file + CALLTREE_* env, plus --resolution) as TOML and exit
    #[arg(long)]
    print_config: bool,
}

/// Shape of the synthetic call tree.
struct Workload {
    depth: usize,
    breadth: usize,
    sleep: Duration,
}

impl Workload {
    fn run(&self, tracer: &mut TraceController) {
        if self.depth == 0 {
            thread::sleep(self.sleep);
            return;
        }
        self.run_level(tracer, 1, "step ");
    }

    fn run_level(&self, tracer: &mut TraceController, level: usize, prefix: &str) {
        for index in 1..=self.breadth {
            let name = format!("{prefix}{index}");
            let mut probe = tracer.probe_scope(&name);
            if level < self.depth {
                self.run_level(&mut probe, level + 1, &format!("{name}."));
            } else {
                thread::sleep(self.sleep);
            }
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = TraceConfig::load().context("Failed to load config")?;

    if let Some(resolution) = cli.resolution {
        config.resolution = resolution;
    }

    if cli.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    // The demo traces unless told otherwise, whatever the config says
    config.enabled = !cli.disable;

    let workload = Workload {
        depth: cli.depth,
        breadth: cli.breadth,
        sleep: Duration::from_millis(cli.sleep_ms),
    };

    let mut tracer = TraceController::from_config(&config);
    {
        let mut trace = tracer.trace_scope(&cli.name);
        workload.run(&mut trace);
    }

    let report = tracer.report();
    if report.is_empty() {
        log::debug!("Tracing disabled, no report");
        return Ok(());
    }

    log::debug!("Rendering report for {} probe(s)", tracer.probe_count());
    print!("{report}");
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    // Configure logging based on --verbose flag or RUST_LOG env var
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if cli.verbose { "debug" } else { "off" }),
    )
    .format(|buf, record| {
        use anstyle::{AnsiColor, Color, Style};
        use std::io::Write;

        let dim = Style::new().dimmed();
        let msg = record.args();

        // Sequencing errors stand out from lifecycle chatter
        if record.level() <= log::Level::Warn {
            let yellow = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow)));
            writeln!(buf, "{dim}[calltree]{dim:#} {yellow}{msg}{yellow:#}")
        } else {
            writeln!(buf, "{dim}[calltree]{dim:#} {msg}")
        }
    })
    .init();

    if let Err(e) = run(cli) {
        eprintln!("{:#}", e);
        process::exit(1);
    }
}
