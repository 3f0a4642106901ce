use clap::Parser;
use std::{
    collections::HashMap,
    error::Error,
    fs,
    io::{self, Read},
    path::PathBuf,
    process,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use whatif::{
    counterfactual::{CounterfactualProgram, EngineConfig},
    serialize::{SerProgram, SerQuery},
};

/// Answers counterfactual queries over a ground probabilistic program
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// ground programs in JSON form, merged into one; read from stdin when
    /// none is given
    #[clap(value_parser)]
    programs: Vec<PathBuf>,

    /// query atom; may be repeated
    #[clap(short, long, value_parser)]
    query: Vec<String>,

    /// observed atom, as `NAME,True` or `NAME,False`; may be repeated
    #[clap(short, long, value_parser = parse_assignment)]
    evidence: Vec<(String, bool)>,

    /// intervened atom, as `NAME,True` or `NAME,False`; may be repeated
    #[clap(short, long, value_parser = parse_assignment)]
    intervene: Vec<(String, bool)>,

    /// evaluation strategy: `top-down`, `bottom-up`, `d4` or `c2d`
    /// (defaults to the configured strategy)
    #[clap(short = 'k', long, value_parser)]
    strategy: Option<String>,

    /// JSON list of query batches, answered one after the other while
    /// reusing compiled state
    #[clap(long, value_parser)]
    batches: Option<String>,

    /// engine configuration in JSON form
    #[clap(long, value_parser)]
    config: Option<String>,

    /// log filter, e.g. `info` or `whatif=debug`; overrides RUST_LOG
    #[clap(short, long, value_parser)]
    verbosity: Option<String>,
}

/// Splits at the last comma, so that names may carry argument lists
fn parse_assignment(s: &str) -> Result<(String, bool), String> {
    let (name, value) = s
        .rsplit_once(',')
        .ok_or_else(|| format!("expected NAME,True or NAME,False, got `{}`", s))?;
    let value = match value.trim().to_ascii_lowercase().as_str() {
        "true" => true,
        "false" => false,
        other => return Err(format!("expected True or False, got `{}`", other)),
    };
    Ok((name.trim().to_string(), value))
}

/// Later assignments to the same atom win
fn to_map(assignments: &[(String, bool)], what: &str) -> HashMap<String, bool> {
    let mut map = HashMap::new();
    for (name, value) in assignments.iter() {
        if let Some(old) = map.insert(name.clone(), *value) {
            warn!("{} on `{}` given twice ({} and {}), keeping {}", what, name, old, value, value);
        }
    }
    map
}

fn load_program(paths: &[PathBuf]) -> Result<SerProgram, Box<dyn Error>> {
    if paths.is_empty() {
        let mut src = String::new();
        io::stdin().read_to_string(&mut src)?;
        info!("reading program from stdin");
        return Ok(serde_json::from_str(&src)?);
    }
    let mut program = SerProgram::default();
    for path in paths.iter() {
        let part: SerProgram = serde_json::from_str(&fs::read_to_string(path)?)?;
        info!(rules = part.rules.len(), "loaded {}", path.display());
        program.merge(part);
    }
    Ok(program)
}

fn print_results(queries: &[String], results: &[f64]) {
    for (q, p) in queries.iter().zip(results.iter()) {
        println!("{}: {}", q, p);
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let config = match &args.config {
        Some(path) => EngineConfig::from_json(&fs::read_to_string(path)?)?,
        None => EngineConfig::default(),
    };
    let strategy = match &args.strategy {
        Some(name) => config.strategy(name)?,
        None => config.default_strategy()?,
    };

    let source = load_program(&args.programs)?;
    let mut program = CounterfactualProgram::new(source.to_program())?;
    info!(%strategy, rules = source.rules.len(), "prepared program");

    match &args.batches {
        Some(path) => {
            let batches: Vec<SerQuery> = serde_json::from_str(&fs::read_to_string(path)?)?;
            for (idx, batch) in batches.iter().enumerate() {
                let interventions = HashMap::from_iter(batch.interventions.clone());
                let evidence = HashMap::from_iter(batch.evidence.clone());
                let results =
                    program.multi_query(&interventions, &evidence, &batch.queries, &strategy)?;
                println!("batch {}", idx);
                print_results(&batch.queries, &results);
            }
        }
        None => {
            let interventions = to_map(&args.intervene, "intervention");
            let evidence = to_map(&args.evidence, "evidence");
            let results = program.single_query(&interventions, &evidence, &args.query, &strategy)?;
            print_results(&args.query, &results);
        }
    }
    Ok(())
}

fn main() {
    let args = Args::parse();
    let filter = match &args.verbosity {
        Some(v) => EnvFilter::new(v),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(args) {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignments_split_at_the_last_comma() {
        assert_eq!(
            parse_assignment("path(a,b),True"),
            Ok(("path(a,b)".to_string(), true))
        );
        assert_eq!(parse_assignment("rain,false"), Ok(("rain".to_string(), false)));
        assert!(parse_assignment("rain").is_err());
        assert!(parse_assignment("rain,maybe").is_err());
    }

    #[test]
    fn program_files_are_merged() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.json");
        let second = dir.path().join("second.json");
        fs::write(&first, r#"{ "probabilities": { "u": 0.5 }, "rules": [] }"#).unwrap();
        fs::write(&second, r#"{ "rules": [ { "head": ["a"], "pos": ["u"] } ] }"#).unwrap();
        let program = load_program(&[first, second]).unwrap();
        assert_eq!(program.probabilities.len(), 1);
        assert_eq!(program.rules.len(), 1);
    }

    #[test]
    fn later_assignments_win() {
        let map = to_map(
            &[("a".to_string(), true), ("a".to_string(), false)],
            "evidence",
        );
        assert_eq!(map["a"], false);
    }
}
