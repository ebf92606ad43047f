use std::{fmt::Display, str::FromStr};

use clap::Parser;
use serde::Serialize;
use sym_automata_lib::{
    automaton::{
        Automaton,
        counter::SymbolicCounter,
        dfa::witness::FirstPathHeuristic,
        relational::{
            MultiTrackAutomaton,
            relation::{StringRelation, TrackMap},
        },
        string::{PrintableHeuristic, StringAutomaton},
    },
    config::{EngineConfig, GeneralConfig},
    logger::{LogLevel, Logger},
};

/// What to compute for the compiled automaton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Count,
    Witness,
    Dot,
    Counter,
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "count" => Ok(Mode::Count),
            "witness" => Ok(Mode::Witness),
            "dot" => Ok(Mode::Dot),
            "counter" => Ok(Mode::Counter),
            _ => Err(format!("Invalid mode: {}", s)),
        }
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Count => write!(f, "count"),
            Mode::Witness => write!(f, "witness"),
            Mode::Dot => write!(f, "dot"),
            Mode::Counter => write!(f, "counter"),
        }
    }
}

/// Either kind of automaton the tool can compile.
enum Compiled {
    String(StringAutomaton),
    MultiTrack(MultiTrackAutomaton),
}

impl Compiled {
    fn automaton(&self) -> &dyn Automaton {
        match self {
            Compiled::String(auto) => auto,
            Compiled::MultiTrack(auto) => auto,
        }
    }

    fn tracks(&self) -> Vec<String> {
        match self {
            Compiled::String(_) => vec![],
            Compiled::MultiTrack(auto) => auto.tracks().names().to_vec(),
        }
    }

    fn witness(&self, printable: bool) -> Option<Vec<String>> {
        match self {
            Compiled::String(auto) => {
                let witness = if printable {
                    auto.get_string_with(&PrintableHeuristic)
                } else {
                    auto.get_string_with(&FirstPathHeuristic)
                };
                witness.map(|w| vec![w])
            }
            Compiled::MultiTrack(auto) => auto.get_an_accepting_string_for_each_track(),
        }
    }
}

#[derive(Debug, Serialize)]
struct QueryResult {
    kind: String,
    tracks: Vec<String>,
    states: usize,
    empty: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    witness: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dot: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    counter: Option<SymbolicCounter>,
}

#[derive(Parser, Debug)]
#[command(name = "Symbolic Automata Tool")]
#[command(version = "0.1")]
#[command(about = "Compile string constraints into automata and query them", long_about = None)]
struct Args {
    /// A regular expression, or a JSON encoded relation with `--relation`.
    input: String,

    #[arg(short, long, default_value_t = Mode::Count)]
    mode: Mode,

    /// Read the input as a relation over string variables.
    #[arg(short, long)]
    relation: bool,

    /// Length bound for counting, defaults to the configured one.
    #[arg(short, long)]
    bound: Option<u64>,

    #[arg(short, long)]
    config: Option<String>,
}

fn compile(args: &Args) -> anyhow::Result<Compiled> {
    if !args.relation {
        return Ok(Compiled::String(StringAutomaton::make_regex(&args.input)?));
    }

    let relation: StringRelation = serde_json::from_str(&args.input)?;
    let names = relation.variables();
    let names = names.iter().map(|n| n.as_str()).collect::<Vec<_>>();
    let auto = MultiTrackAutomaton::make_automaton(&relation, TrackMap::new(&names))?;
    Ok(Compiled::MultiTrack(auto))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = EngineConfig::from_optional_file(args.config.as_ref())?;
    let logger = Logger::from_config(config.logger(), "Query")?;

    if let Some(logger) = &logger
        && logger.level() == LogLevel::Debug
    {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(std::io::stderr)
            .init();
    }

    if let Some(logger) = &logger {
        let record = config
            .describe()
            .into_iter()
            .fold(logger.object("config"), |record, (name, value)| {
                record.add_field(name, value)
            });
        record.log(LogLevel::Debug);
    }

    let compiled = compile(&args)?;
    let auto = compiled.automaton();
    let bound = args.bound.unwrap_or(*config.get_count_bound());

    let mut result = QueryResult {
        kind: format!("{:?}", auto.kind()),
        tracks: compiled.tracks(),
        states: auto.state_count(),
        empty: auto.is_empty_language(),
        count: None,
        witness: None,
        dot: None,
        counter: None,
    };

    match args.mode {
        Mode::Count => result.count = Some(auto.count(bound).to_string()),
        Mode::Witness => result.witness = compiled.witness(*config.get_printable_witness()),
        Mode::Dot => result.dot = Some(auto.to_dot(false)),
        Mode::Counter => result.counter = Some(auto.symbolic_counter()),
    }

    if let Some(logger) = &logger {
        logger
            .object("query")
            .add_field("mode", args.mode)
            .add_field("states", result.states)
            .add_field("empty", result.empty)
            .log(LogLevel::Info);
    }

    let json_res = serde_json::to_string_pretty(&result)?;
    println!("{}", json_res);

    Ok(())
}
