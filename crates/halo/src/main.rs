use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Once;

use clap::Parser;
use halo::{HaloError, InterpreterConfig, Session, SourceFile};
use halo_eval::config::{DEFAULT_GC_THRESHOLD, DEFAULT_MAX_RECURSION_DEPTH};

#[derive(Parser, Debug)]
#[command(name = "halo")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Tree-walking interpreter for the halo scripting language", long_about = None)]
struct Args {
    /// Script to run; starts the REPL when omitted.
    #[arg(value_name = "SCRIPT")]
    script: Option<PathBuf>,

    /// Maximum nesting of user-level calls.
    #[arg(long = "max-depth", value_name = "N", default_value_t = DEFAULT_MAX_RECURSION_DEPTH)]
    max_depth: usize,

    /// Allocations between automatic collections (0 disables them).
    #[arg(long = "gc-threshold", value_name = "N", default_value_t = DEFAULT_GC_THRESHOLD)]
    gc_threshold: usize,

    /// Report errors as JSON on stderr.
    #[arg(long = "json-errors")]
    json_errors: bool,
}

static TRACING_INIT: Once = Once::new();

/// Install the stderr subscriber. Filter directives come from `HALO_LOG`,
/// e.g. `HALO_LOG=halo_eval=trace`; the default level is `warn`.
fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let filter = EnvFilter::try_from_env("HALO_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(io::stderr).with_target(true))
            .with(filter)
            .init();
    });
}

fn main() {
    let args = Args::parse();
    init_tracing();

    if args.max_depth == 0 {
        eprintln!("error: --max-depth must be at least 1");
        process::exit(2);
    }
    let config = InterpreterConfig::default()
        .with_max_recursion_depth(args.max_depth)
        .with_gc_threshold(args.gc_threshold);
    let session = Session::new(config);

    match &args.script {
        Some(path) => run_script(session, path, args.json_errors),
        None => run_repl(session, args.json_errors),
    }
}

fn run_script(mut session: Session<'static>, path: &Path, json_errors: bool) {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("error: cannot read '{}': {e}", path.display());
            process::exit(1);
        }
    };
    let file = SourceFile::new(path.display().to_string(), source);
    if let Err(err) = session.run_source(&file.source) {
        if json_errors {
            report(&err, true);
        } else {
            eprintln!("{}", err.render_with_source(&file));
        }
        process::exit(1);
    }
}

fn run_repl(mut session: Session<'static>, json_errors: bool) {
    let mut line = String::new();
    loop {
        print!(">>> ");
        if io::stdout().flush().is_err() {
            break;
        }

        line.clear();
        match session.read_line(&mut line) {
            Ok(0) => {
                println!();
                break;
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("error: cannot read input: {e}");
                break;
            }
        }
        if line.trim().is_empty() {
            continue;
        }

        match session.eval_line(&line) {
            Ok(Some(value)) => println!("{value}"),
            Ok(None) => {}
            Err(err) => report(&err, json_errors),
        }
    }
}

fn report(err: &HaloError, json: bool) {
    if json {
        if let Ok(rendered) = serde_json::to_string(err) {
            eprintln!("{rendered}");
            return;
        }
    }
    eprintln!("{err}");
}
