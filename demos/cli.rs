use std::error;
use bibfill::{condition, highlight, Bibliography, Parser, Style};
use std::fs;

use clap;
use clap::Parser as CLIParser;

#[cfg(not(feature = "serde_json"))]
#[derive(clap::Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Settings {
    /// Filepath to file to parse
    #[clap(short, long)]
    input: String,

    /// Return only entries with this ID
    #[clap(short, long)]
    query_id: Option<String>,

    /// Representation of escaped characters, “html” or “unicode”
    #[clap(short, long, default_value = "html")]
    style: Style,

    /// Return only entries having all these fields, e.g. “author year”
    #[clap(short, long)]
    require: Option<String>,

    /// Name to highlight wherever it occurs, e.g. “Potharaju, Rahul”
    #[clap(long)]
    highlight: Option<String>,
}

#[cfg(feature = "serde_json")]
#[derive(clap::Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Settings {
    /// Filepath to file to parse
    #[clap(short, long)]
    input: String,

    /// Return only entries with this ID
    #[clap(short, long)]
    query_id: Option<String>,

    /// Representation of escaped characters, “html” or “unicode”
    #[clap(short, long, default_value = "html")]
    style: Style,

    /// Return only entries having all these fields, e.g. “author year”
    #[clap(short, long)]
    require: Option<String>,

    /// Name to highlight wherever it occurs, e.g. “Potharaju, Rahul”
    #[clap(long)]
    highlight: Option<String>,

    #[clap(long)]
    json: bool,
}

fn selected(s: &Settings, entry: &bibfill::BibEntry) -> bool {
    if let Some(query) = &s.query_id {
        if !query.eq_ignore_ascii_case(&entry.id) {
            return false;
        }
    }
    match &s.require {
        Some(names) => condition::condition_holds(names, entry),
        None => true,
    }
}

fn load(s: &Settings) -> Result<Bibliography, Box<dyn error::Error>> {
    let mut src = fs::read_to_string(&s.input)?;
    if let Some(name) = &s.highlight {
        src = highlight::highlight_default(&src, name);
    }
    Ok(Parser::from_string(src).parse()?)
}

fn print_human_readable(s: &Settings) -> Result<(), Box<dyn error::Error>> {
    let bib = load(s)?;
    for entry in bib.iter().filter(|e| selected(s, e)) {
        println!("id = {}", entry.id);
        let mut names: Vec<&str> = entry.keys().collect();
        names.sort_unstable();
        for name in names {
            println!("\t{}\t= {}", name, entry.normalized(name, s.style).unwrap_or_default());
        }
    }

    Ok(())
}

#[cfg(feature = "serde_json")]
fn print_json(s: &Settings) -> Result<(), Box<dyn error::Error>> {
    use serde_json::{json, Map, Value};

    let bib = load(s)?;
    let mut data = Vec::new();
    for entry in bib.iter().filter(|e| selected(s, e)) {
        let fields: Map<String, Value> = entry
            .keys()
            .map(|name| {
                let value = entry.normalized(name, s.style).unwrap_or_default();
                (name.to_string(), Value::String(value))
            })
            .collect();
        data.push(json!({ "id": entry.id, "fields": fields }));
    }

    println!("{}", serde_json::to_string(&json!({ "data": data }))?);

    Ok(())
}

fn main() -> Result<(), Box<dyn error::Error>> {
    env_logger::init();
    let settings = Settings::parse();

    #[cfg(feature = "serde_json")]
    {
        if settings.json {
            return print_json(&settings);
        }
    }

    print_human_readable(&settings)
}
