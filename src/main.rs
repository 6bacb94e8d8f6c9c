use std::io::{Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use env_logger::{Builder, Env};
use serde_json::Value;
use structopt::StructOpt;

#[derive(StructOpt)]
#[structopt(name = "road-geometry")]
struct Flags {
    /// Pretty-print the output
    #[structopt(long = "pretty")]
    pub pretty: bool,

    /// A JSON document with `roads` and `settings`; read from STDIN if absent
    #[structopt(parse(from_os_str))]
    pub input: Option<PathBuf>,
}

fn main() -> Result<()> {
    Builder::from_env(Env::default().default_filter_or("info")).init();
    let flags = Flags::from_args();

    let raw = match &flags.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading STDIN")?;
            buf
        }
    };
    let doc: Value = serde_json::from_str(&raw).context("parsing input JSON")?;
    let null = Value::Null;
    let roads = doc.get("roads").unwrap_or(&null);
    let settings = doc.get("settings").unwrap_or(&null);

    let derived = road_geometry::compile_value(roads, settings);
    log::info!(
        "{} roads, {} segments, {} junctions, {} primitives",
        derived.roads.len(),
        derived.segments.len(),
        derived.junctions.len(),
        derived.primitives.len()
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if flags.pretty {
        serde_json::to_writer_pretty(&mut out, &derived)?;
    } else {
        serde_json::to_writer(&mut out, &derived)?;
    }
    writeln!(out)?;
    Ok(())
}
