// Reads a schema and an input object, both JSON, and prints the coerced
// attributes of the resulting instance as JSON.
//
// usage: attrcast <schema.json> <input.json> [settings-file]

use std::sync::Arc;
use std::{env, fs, process};

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use attrcast::compiler::Compiler;
use attrcast::datatype::Value;
use attrcast::error::{CastError, Result};
use attrcast::schema::Schema;
use attrcast::settings::Settings;

fn main() {
    if let Err(e) = run() {
        error!(error = %e, "attrcast failed");
        eprintln!("{}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        return Err(CastError::Config(format!(
            "usage: {} <schema.json> <input.json> [settings-file]",
            args.first().map(String::as_str).unwrap_or("attrcast")
        )));
    }
    let settings = Settings::load(args.get(3).map(String::as_str))?;
    // RUST_LOG wins over the configured filter
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let schema = Schema::from_json(&fs::read_to_string(&args[1])?)?;
    // the tool always constructs, whatever the options say
    let options = schema.options.clone().unwrap_or(settings.compiler).with_constructor();
    let model = Arc::new(Compiler::global().compile_attributes(&schema.owner, schema.declarations()?, options)?);
    info!(model = %model, "schema compiled");

    let input: serde_json::Value = serde_json::from_str(&fs::read_to_string(&args[2])?)?;
    let supplied = match Value::from(input) {
        Value::Map(map) => map,
        other => {
            return Err(CastError::Json(format!("input must be a JSON object, got {}", other.type_name())));
        }
    };
    let instance = model.construct(supplied)?;
    println!("{}", serde_json::to_string_pretty(&Value::Object(instance).to_json())?);
    Ok(())
}
