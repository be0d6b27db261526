use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use serde_json::Value;
use vizquery_compiler::compile_request_value;
use vizquery_core::Calendar;

#[derive(Parser, Debug)]
#[command(
    name = "vizquery-cli",
    about = "Compile a visualization config into a fetch descriptor and cache key."
)]
struct Args {
    /// Path to the JSON compile request (metric, config, options, period_bounds).
    #[arg(short, long)]
    input: PathBuf,

    /// Override the calendar used for relative period filters.
    #[arg(long, value_parser = parse_calendar)]
    calendar: Option<Calendar>,

    /// Print the descriptor as indented JSON.
    #[arg(long)]
    pretty: bool,
}

// Accepts the same snake_case names the JSON options use.
fn parse_calendar(name: &str) -> Result<Calendar, String> {
    serde_json::from_value(Value::from(name))
        .map_err(|_| format!("unknown calendar `{name}` (expected gregorian or ethiopian)"))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let data = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Cannot read file {:?}", args.input))?;
    let mut request: Value = serde_json::from_str(&data)
        .with_context(|| format!("{:?} is not valid JSON", args.input))?;

    if let Some(calendar) = args.calendar {
        let Some(object) = request.as_object_mut() else {
            anyhow::bail!("Compile request must be a JSON object");
        };
        let options = object
            .entry("options")
            .or_insert_with(|| Value::Object(Default::default()));
        let Some(options) = options.as_object_mut() else {
            anyhow::bail!("`options` must be a JSON object");
        };
        options.insert("calendar".to_string(), serde_json::to_value(calendar)?);
        log::debug!("calendar overridden to {calendar:?}");
    }

    let compiled = compile_request_value(&request).context("Compilation failed")?;

    let descriptor = if args.pretty {
        serde_json::to_string_pretty(&compiled.fetch_config)?
    } else {
        serde_json::to_string(&compiled.fetch_config)?
    };
    let period = match compiled.resolved_period {
        Some(bounds) => format!("{}..{} ({})", bounds.min, bounds.max, bounds.period_option),
        None => "unbounded".to_string(),
    };

    println!(
        "Fetch config: {descriptor}\nHash: {}\nResolved period: {period}",
        compiled.hash
    );

    Ok(())
}
