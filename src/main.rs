use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use meow::{init_tracing, parse_and_dump, tokenize_and_dump, Interpreter, MeowError};
use std::fs;
use std::path::Path;
use std::process;

const EX_USAGE: i32 = 64;
const EX_DATAERR: i32 = 65;
const EX_NOINPUT: i32 = 66;
const EX_SOFTWARE: i32 = 70;

fn app() -> App<'static, 'static> {
    let script = || {
        Arg::with_name("script")
            .help("Path to a meow source file")
            .required(true)
            .index(1)
    };
    App::new("meow")
        .about("Runs programs written in the meow scripting language")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("max-call-depth")
                .long("max-call-depth")
                .takes_value(true)
                .value_name("N")
                .global(true)
                .help("Maximum nesting of function calls"),
        )
        .subcommand(SubCommand::with_name("exec").about("Run a script").arg(script()))
        .subcommand(SubCommand::with_name("ast").about("Print the syntax tree").arg(script()))
        .subcommand(SubCommand::with_name("tokens").about("Print the tokens").arg(script()))
}

fn main() {
    init_tracing();
    let matches = app().get_matches_safe().unwrap_or_else(|err| {
        if err.use_stderr() {
            eprintln!("{}", err.message);
            process::exit(EX_USAGE);
        }
        println!("{}", err.message);
        process::exit(0);
    });
    let (command, sub) = match matches.subcommand() {
        (command, Some(sub)) => (command, sub),
        _ => usage("a subcommand is required"),
    };
    let path = sub.value_of("script").unwrap_or_default();
    let source = fs::read_to_string(path).unwrap_or_else(|err| {
        eprintln!("Error: cannot read {}: {}", path, err);
        process::exit(EX_NOINPUT);
    });

    match command {
        "exec" => exec(path, &source, sub),
        "ast" => match parse_and_dump(&source) {
            Ok(program) => println!("{:#?}", program),
            Err(err) => fail(err),
        },
        "tokens" => match tokenize_and_dump(&source) {
            Ok(tokens) => {
                for token in tokens {
                    println!("{}", token);
                }
            }
            Err(err) => fail(err.into()),
        },
        _ => usage("unknown subcommand"),
    }
}

fn exec(path: &str, source: &str, matches: &ArgMatches<'_>) {
    let mut interpreter = Interpreter::new();
    if let Some(depth) = matches.value_of("max-call-depth") {
        match depth.parse() {
            Ok(depth) => interpreter = interpreter.with_max_call_depth(depth),
            Err(_) => usage("--max-call-depth expects a non-negative integer"),
        }
    }
    if let Some(dir) = Path::new(path).parent() {
        interpreter = interpreter.with_base_dir(dir);
    }
    if let Err(err) = interpreter.run(source) {
        fail(err);
    }
}

fn usage(message: &str) -> ! {
    eprintln!("Error: {}", message);
    process::exit(EX_USAGE);
}

fn fail(err: MeowError) -> ! {
    eprintln!("{}", err);
    match err {
        MeowError::Lex(_) | MeowError::Parse(_) => process::exit(EX_DATAERR),
        MeowError::Runtime(_) => process::exit(EX_SOFTWARE),
    }
}
