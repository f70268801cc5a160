use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use filter_script::{Context, Engine, EvalError, ScriptValueProvider, StringComparison};
use tracing::Level;

/// Simple runner: evaluate a criteria script against values given on the CLI.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Criteria script, e.g. `status == "active" && level < 10`
    script: String,
    /// Context values as a JSON object
    #[arg(long, conflicts_with = "context_doc")]
    context: Option<String>,
    /// Context as `{"comparison": ..., "values": {...}}`
    #[arg(long)]
    context_doc: Option<String>,
    /// Extra value as `key=value`; the value is read as JSON, else as text
    #[arg(long = "var", value_name = "KEY=VALUE")]
    vars: Vec<String>,
    /// Compare text case-insensitively
    #[arg(long)]
    ignore_case: bool,
    /// Print the canonical form of the parsed script instead of running it
    #[arg(long)]
    parse_only: bool,
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn build_context(args: &Args) -> Result<Option<Arc<dyn Context>>, EvalError> {
    if args.context.is_none() && args.context_doc.is_none() && args.vars.is_empty() && !args.ignore_case {
        return Ok(None);
    }
    let mut provider = match (args.context.as_deref(), args.context_doc.as_deref()) {
        (Some(json), _) => ScriptValueProvider::from_json(json)?,
        (None, Some(doc)) => ScriptValueProvider::from_document(doc)?,
        (None, None) => ScriptValueProvider::new(),
    };
    for var in &args.vars {
        let Some((key, raw)) = var.split_once('=') else {
            return Err(EvalError::Format {
                message: "expected KEY=VALUE".into(),
                fragment: var.clone(),
                position: 0,
            });
        };
        let value = serde_json::from_str::<serde_json::Value>(raw)
            .unwrap_or_else(|_| serde_json::Value::String(raw.to_string()));
        provider.insert(key.trim(), value);
    }
    if args.ignore_case {
        provider = provider.with_comparison(StringComparison::OrdinalIgnoreCase);
    }
    Ok(Some(Arc::new(provider)))
}

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments.
    let args = Args::parse();

    let level = match args.verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let engine = Engine::default();
    let outcome = match build_context(&args) {
        Ok(ctx) if args.parse_only => engine
            .parse(&args.script, ctx)
            .await
            .map(|script| script.expression().to_string()),
        Ok(ctx) => engine.run(&args.script, ctx).await.map(|m| m.to_string()),
        Err(e) => Err(e),
    };

    match outcome {
        Ok(out) => {
            println!("{out}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
