use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use tml::{
    compile_source, encode, Configuration, Outcome, ProgramLoader, Step, TuringMachine,
    MAX_EXECUTION_STEPS,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(author, version, about, long_about = None, arg_required_else_help = true)]
struct Cli {
    /// The TML program file to compile
    #[clap(short, long)]
    program: String,

    /// The input tape, one symbol per character ('_' for blank)
    #[clap(short, long, default_value = "")]
    input: String,

    /// Maximum number of transitions before giving up
    #[clap(short, long, default_value_t = MAX_EXECUTION_STEPS)]
    max_steps: usize,

    /// Print each step of the execution
    #[clap(short = 'd', long)]
    debug: bool,

    /// Print the compiled automaton as JSON instead of running it
    #[clap(long)]
    emit_json: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let automaton = match ProgramLoader::read_source(Path::new(&cli.program))
        .and_then(|source| Ok(compile_source(&source)?))
    {
        Ok(automaton) => automaton,
        Err(e) => {
            eprintln!("{}: {}", cli.program, e);
            return ExitCode::from(2);
        }
    };

    if cli.emit_json {
        return match encode(&automaton) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{e}");
                ExitCode::from(2)
            }
        };
    }

    let mut machine = match TuringMachine::new(automaton, &cli.input) {
        Ok(machine) => machine,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(2);
        }
    };

    let outcome = if cli.debug {
        print_configuration(&machine.configuration(), machine.step_count());

        let mut halt = None;
        for _ in 0..cli.max_steps {
            match machine.step() {
                Step::Continue(configuration) => {
                    print_configuration(&configuration, machine.step_count())
                }
                Step::Halt(h) => {
                    halt = Some(h);
                    break;
                }
            }
        }

        match halt {
            Some(halt) => Outcome::from(halt),
            None => machine.run(0).outcome,
        }
    } else {
        machine.run(cli.max_steps).outcome
    };

    match &outcome {
        Outcome::Accept => println!("accept"),
        Outcome::Reject => println!("reject"),
        Outcome::Timeout => println!("timeout after {} steps", machine.step_count()),
        Outcome::Fault(fault) => println!("fault: {fault}"),
    }
    println!("{}", machine.tape_window());

    if outcome == Outcome::Accept {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn print_configuration(configuration: &Configuration, step: usize) {
    println!(
        "Step: {}, State: {}, Head: {}, Symbol: {}",
        step, configuration.label, configuration.head, configuration.symbol
    );
}
