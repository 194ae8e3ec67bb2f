//! Command-line front end for the mpex model program explorer.

mod programs;
mod registry;

use clap::{Parser, Subcommand, ValueEnum};
use miette::{Diagnostic, NamedSource, SourceSpan};
use mpex_dot::{to_dot, DotConfig, MergePolicy, RankDir, TransitionLabels};
use mpex_explore::{ExploreConfig, ExploreOutcome, ExploredTransitions, SymmetryReduction};
use mpex_term::parse_term;
use registry::ProgramRegistry;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// CLI error with source context for pretty printing.
#[derive(Debug, Error, Diagnostic)]
enum CliError {
    #[error("failed to write file: {message}")]
    IoError { message: String },

    #[error("parse error: {message}")]
    #[diagnostic(code(mpex::parse_error))]
    ParseError {
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("unknown program `{name}` (available: {available})")]
    UnknownProgram { name: String, available: String },

    #[error("program `{name}` has no isomorphism checker; symmetry reduction is unavailable")]
    NoChecker { name: String },

    #[error("exploration failed: {message}")]
    ExploreFailed { message: String },
}

type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "mpex", version)]
#[command(about = "Incremental state-space explorer for model programs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SymmetryArg {
    Off,
    Annotate,
    Collapse,
}

impl From<SymmetryArg> for SymmetryReduction {
    fn from(arg: SymmetryArg) -> Self {
        match arg {
            SymmetryArg::Off => SymmetryReduction::Off,
            SymmetryArg::Annotate => SymmetryReduction::Annotate,
            SymmetryArg::Collapse => SymmetryReduction::Collapse,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LabelsArg {
    None,
    Symbol,
    Action,
}

impl From<LabelsArg> for TransitionLabels {
    fn from(arg: LabelsArg) -> Self {
        match arg {
            LabelsArg::None => TransitionLabels::None,
            LabelsArg::Symbol => TransitionLabels::ActionSymbol,
            LabelsArg::Action => TransitionLabels::Action,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RankDirArg {
    Tb,
    Lr,
}

impl From<RankDirArg> for RankDir {
    fn from(arg: RankDirArg) -> Self {
        match arg {
            RankDirArg::Tb => RankDir::TB,
            RankDirArg::Lr => RankDir::LR,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the registered model programs
    Programs,

    /// Parse a term and print its canonical form
    Parse {
        /// Term text, e.g. 'Transfer(1, "a")'
        #[arg(value_name = "TERM")]
        term: String,

        /// Show the parsed structure
        #[arg(short, long)]
        verbose: bool,
    },

    /// Explore a model program and export the visible automaton as dot
    Explore {
        /// Name of a registered model program
        #[arg(value_name = "PROGRAM")]
        program: String,

        /// Visible-transition budget for the first exploration
        #[arg(long, default_value = "200")]
        initial_budget: usize,

        /// Budget for each further exploration step
        #[arg(long, default_value = "100")]
        step_budget: usize,

        /// Number of exploration steps to run
        #[arg(long, default_value = "1")]
        steps: usize,

        /// Symmetry-reduction policy for isomorphic states
        #[arg(long, value_enum, default_value = "off")]
        symmetry: SymmetryArg,

        /// Write the dot output to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// How much of each action to show on edges
        #[arg(long, value_enum, default_value = "action")]
        labels: LabelsArg,

        /// Emit one edge per label instead of merging parallel edges
        #[arg(long)]
        no_combine: bool,

        /// Combine matching Start/Finish action pairs into one edge
        #[arg(long)]
        merge_start_finish: bool,

        /// Graph layout direction
        #[arg(long, value_enum, default_value = "tb")]
        rankdir: RankDirArg,

        /// Graph name in the dot output
        #[arg(long, default_value = "model")]
        name: String,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))
    .ok();

    let cli = Cli::parse();

    let filter = if matches!(
        &cli.command,
        Commands::Parse { verbose: true, .. } | Commands::Explore { verbose: true, .. }
    ) {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    let result = match cli.command {
        Commands::Programs => cmd_programs(),
        Commands::Parse { term, verbose } => cmd_parse(&term, verbose),
        Commands::Explore {
            program,
            initial_budget,
            step_budget,
            steps,
            symmetry,
            output,
            labels,
            no_combine,
            merge_start_finish,
            rankdir,
            name,
            verbose: _,
        } => cmd_explore(ExploreArgs {
            program,
            initial_budget,
            step_budget,
            steps,
            symmetry: symmetry.into(),
            output,
            labels: labels.into(),
            combine_labels: !no_combine,
            merge_start_finish,
            rankdir: rankdir.into(),
            name,
        }),
    };

    if let Err(e) = result {
        eprintln!("{:?}", miette::Report::new(e));
        std::process::exit(1);
    }
}

fn cmd_programs() -> CliResult<()> {
    let registry = ProgramRegistry::builtin();
    for program in registry.iter() {
        println!("{:<14} {}", program.name, program.description);
    }
    Ok(())
}

fn cmd_parse(text: &str, verbose: bool) -> CliResult<()> {
    let term = parse_term(text).map_err(|e| {
        let span = e.span();
        CliError::ParseError {
            message: e.to_string(),
            src: NamedSource::new("<term>", text.to_string()),
            span: (span.start, span.len().max(1)).into(),
        }
    })?;
    println!("{}", term);
    if verbose {
        match term.symbol() {
            Some(symbol) => println!("compound: symbol {}, {} args", symbol, term.args().len()),
            None => println!("atomic (ground: {})", term.is_ground()),
        }
    }
    Ok(())
}

struct ExploreArgs {
    program: String,
    initial_budget: usize,
    step_budget: usize,
    steps: usize,
    symmetry: SymmetryReduction,
    output: Option<PathBuf>,
    labels: TransitionLabels,
    combine_labels: bool,
    merge_start_finish: bool,
    rankdir: RankDir,
    name: String,
}

fn cmd_explore(args: ExploreArgs) -> CliResult<()> {
    let registry = ProgramRegistry::builtin();
    let Some((program, checker)) = registry.resolve(&args.program) else {
        return Err(CliError::UnknownProgram {
            name: args.program,
            available: registry.names().join(", "),
        });
    };

    let config = ExploreConfig {
        initial_budget: args.initial_budget,
        per_step_budget: args.step_budget,
        symmetry: args.symmetry,
    };
    let mut explorer = if args.symmetry.is_enabled() {
        let Some(checker) = checker else {
            return Err(CliError::NoChecker { name: args.program });
        };
        ExploredTransitions::with_isomorphism_checker(program, config, checker)
    } else {
        ExploredTransitions::new(program, config)
    };

    let initial = explorer.initial_node().clone();
    for step in 0..args.steps.max(1) {
        let outcome = explorer
            .show_reachable(&initial)
            .map_err(|e| CliError::ExploreFailed {
                message: e.to_string(),
            })?;
        match outcome {
            ExploreOutcome::Complete { transitions_added } => {
                info!(step, transitions_added, "exploration complete");
                break;
            }
            ExploreOutcome::BudgetReached {
                transitions_added,
                frontier,
            } => {
                info!(step, transitions_added, frontier, "budget reached");
            }
        }
    }

    let fsm = explorer.get_fa();
    info!(
        nodes = fsm.nodes.len(),
        transitions = fsm.transitions.len(),
        accepting = fsm.accepting.len(),
        dead = fsm.dead_nodes().len(),
        "visible automaton"
    );

    let dot_config = DotConfig {
        graph_name: args.name,
        rankdir: args.rankdir,
        transition_labels: args.labels,
        merge: MergePolicy {
            combine_labels: args.combine_labels,
            merge_start_finish: args.merge_start_finish,
        },
        ..Default::default()
    };
    let dot = to_dot(&fsm, &dot_config);

    match args.output {
        Some(path) => {
            fs::write(&path, &dot).map_err(|e| CliError::IoError {
                message: e.to_string(),
            })?;
            info!(path = %path.display(), "wrote dot file");
        }
        None => print!("{}", dot),
    }
    Ok(())
}
