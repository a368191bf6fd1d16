use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::Verbosity;
use dictplex_lang::{CompiledProblem, Compiler, Sense};
use dictplex_solver::{Dictionary, EnteringRule, Problem, SolutionStatus, Solver, Step};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "dictplex")]
#[command(about = "Dictionary simplex solver for standard-form linear programs", long_about = None)]
struct Cli {
    #[command(flatten)]
    verbose: Verbosity,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a problem file (.lp text format or .json)
    Solve {
        /// The file containing the problem
        file: PathBuf,
        #[command(flatten)]
        options: SolveOptions,
        /// Output format (pretty, json)
        #[arg(short, long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
    },
    /// Parse a .lp file and output the AST
    Parse {
        /// The file to parse
        file: PathBuf,
        /// Output format (pretty, json)
        #[arg(short, long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
    },
    /// Check a problem file for errors
    Check {
        /// The file to check
        file: PathBuf,
    },
    /// Solve the built-in shipping example
    Demo {
        #[command(flatten)]
        options: SolveOptions,
    },
}

#[derive(clap::Args)]
struct SolveOptions {
    /// Print the dictionary after every pivot
    #[arg(short, long)]
    trace: bool,
    /// Entering variable rule
    #[arg(short, long, value_enum, default_value_t = Rule::Dantzig)]
    rule: Rule,
    /// Give up after this many pivots
    #[arg(long, default_value_t = 10000)]
    max_iterations: usize,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Pretty,
    Json,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Rule {
    Dantzig,
    Bland,
}

impl From<Rule> for EnteringRule {
    fn from(rule: Rule) -> Self {
        match rule {
            Rule::Dantzig => EnteringRule::Dantzig,
            Rule::Bland => EnteringRule::Bland,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.verbose.log_level_filter())
        .init();

    match cli.command {
        Commands::Solve { file, options, format } => {
            let compiled = load(&file);
            solve(&compiled, &options, format);
        }
        Commands::Parse { file, format } => {
            let source = read_source(&file);
            match dictplex_lang::Parser::parse(&source) {
                Ok(program) => {
                    if format == Format::Json {
                        match serde_json::to_string_pretty(&program) {
                            Ok(json) => println!("{}", json),
                            Err(e) => {
                                eprintln!("Error serializing AST: {}", e);
                                std::process::exit(1);
                            }
                        }
                    } else {
                        println!("{:#?}", program);
                    }
                }
                Err(e) => {
                    eprintln!("Parse error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Check { file } => {
            let compiled = load(&file);
            let problem = &compiled.problem;
            match problem.validate() {
                Ok(()) => {
                    println!("✓ {} is valid", file.display());
                    println!("  {} variables", problem.num_variables());
                    println!("  {} constraints", problem.num_constraints());
                }
                Err(e) => {
                    eprintln!("✗ {} has errors:", file.display());
                    eprintln!("  {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Demo { options } => {
            let compiled = CompiledProblem {
                sense: Sense::Maximize,
                problem: demo_problem(),
            };
            solve(&compiled, &options, Format::Pretty);
        }
    }
}

fn read_source(file: &Path) -> String {
    match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            std::process::exit(1);
        }
    }
}

/// Load a `.json` problem through serde, anything else through the text format.
fn load(file: &Path) -> CompiledProblem {
    if file.extension().is_some_and(|ext| ext == "json") {
        let source = read_source(file);
        return match serde_json::from_str::<Problem>(&source) {
            Ok(problem) => CompiledProblem {
                sense: Sense::Maximize,
                problem,
            },
            Err(e) => {
                eprintln!("JSON error: {}", e);
                std::process::exit(1);
            }
        };
    }

    match Compiler::compile_file(file) {
        Ok(compiled) => compiled,
        Err(e) => {
            eprintln!("Compile error: {}", e);
            std::process::exit(1);
        }
    }
}

fn solve(compiled: &CompiledProblem, options: &SolveOptions, format: Format) {
    let problem = &compiled.problem;
    let solver = Solver::new()
        .with_rule(options.rule.into())
        .with_max_iterations(options.max_iterations);

    if options.trace {
        if let Ok(dictionary) = Dictionary::new(problem) {
            dump(&dictionary, 0);
        }
    }

    let result = solver.solve_with(problem, |simplex, step| {
        if let (true, Step::Pivoted { iteration, entering, leaving, .. }) = (options.trace, step) {
            println!("Entering variable: x{}", entering);
            println!("Leaving variable: x{}", leaving);
            dump(simplex.dictionary(), *iteration);
        }
    });

    let solution = match result {
        Ok(solution) => solution,
        Err(e) => {
            eprintln!("Solver error: {}", e);
            std::process::exit(1);
        }
    };

    if format == Format::Json {
        match serde_json::to_string_pretty(&solution) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing solution: {}", e);
                std::process::exit(1);
            }
        }
        if solution.status != SolutionStatus::Optimal {
            std::process::exit(1);
        }
        return;
    }

    match solution.status {
        SolutionStatus::Optimal => {
            let label = match compiled.sense {
                Sense::Maximize => "Maximal",
                Sense::Minimize => "Minimal",
            };
            println!();
            println!("Optimal solution found!");
            println!(
                "\t{} objective value: {:.2}",
                label,
                compiled.reported_objective(solution.objective_value)
            );
            println!("\tThe optimal solution is:");
            for (name, value) in problem.variables.iter().zip(&solution.values) {
                println!("\t\t{} = {:.2}", name, value);
            }
            log::info!("{} pivots", solution.iterations);
        }
        SolutionStatus::Unbounded => {
            println!("Status: UNBOUNDED");
            if let Some(name) = solution.unbounded_variable.and_then(|v| problem.variables.get(v)) {
                println!("{} can grow without limit.", name);
            } else {
                println!("The problem has no finite optimal solution.");
            }
            std::process::exit(1);
        }
    }
}

fn dump(dictionary: &Dictionary, iteration: usize) {
    println!();
    println!("Dumping current dictionary (iteration {}):", iteration);
    print!("{}", dictionary);
    println!();
}

/// The shipping example from `demos/transport.lp`, in flat form.
fn demo_problem() -> Problem {
    #[rustfmt::skip]
    let a = [
        1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
        0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0,
        0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0,
        0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0,
        0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0,
    ];
    let b = [480.0, 400.0, 230.0, 420.0, 250.0];
    let c = [8.0, 14.0, 11.0, 4.0, 12.0, 7.0, 4.0, 13.0, 9.0];

    match Problem::from_dense(&a, &b, &c) {
        Ok(problem) => problem,
        Err(e) => {
            eprintln!("Demo problem is malformed: {}", e);
            std::process::exit(1);
        }
    }
}
