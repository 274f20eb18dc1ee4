use std::process::ExitCode;

use clap::Parser as _;
use clap_stdin::FileOrStdin;

use cminus::{codegen::Codegen, parser::printer, CompileError};

/// Semantic analysis and three-address code generation for C- programs.
#[derive(clap::Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Source file to compile, or `-` to read standard input
    input: FileOrStdin,

    /// Print the syntax tree before analysis
    #[arg(long)]
    ast: bool,

    /// Report phase progress on stderr
    #[arg(long)]
    trace: bool,

    /// Do not print the symbol table report
    #[arg(long)]
    no_symtab: bool,
}

struct Options {
    ast: bool,
    trace: bool,
    symtab: bool,
}

impl Options {
    fn trace(&self, phase: &str) {
        if self.trace {
            eprintln!("cminus: {phase}...");
        }
    }
}

fn exit_code(err: &CompileError) -> u8 {
    match err {
        CompileError::Lex(_) | CompileError::Parse(_) => 2,
        CompileError::Declaration(_) | CompileError::TypeCheck(_) => 3,
        CompileError::AllocationFailure(_) => 4,
    }
}

fn run(source: &str, options: &Options) -> Result<(), CompileError> {
    options.trace("parsing");
    let mut tree = cminus::parse(source)?;
    if options.ast {
        println!("{}", printer::render(&tree));
    }

    options.trace("building symbol table and checking types");
    let symbol_table = cminus::analyze(&mut tree)?;

    options.trace("generating intermediate code");
    let code = Codegen::new().generate(&tree)?;

    if options.symtab {
        println!("{}", symbol_table.report());
    }
    for instruction in code {
        println!("{instruction}");
    }
    Ok(())
}

fn main() -> ExitCode {
    let Args {
        input,
        ast,
        trace,
        no_symtab,
    } = Args::parse();
    let options = Options {
        ast,
        trace,
        symtab: !no_symtab,
    };

    let filename = input.filename().to_string();
    let source = match input.contents() {
        Ok(source) => source,
        Err(err) => {
            eprintln!("cminus: cannot read '{filename}': {err}");
            return ExitCode::from(1);
        }
    };
    options.trace(&format!("compiling {filename}"));

    match run(&source, &options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            for diagnostic in err.diagnostics() {
                eprintln!("{diagnostic}");
            }
            eprintln!("cminus: {err}, compilation aborted");
            ExitCode::from(exit_code(&err))
        }
    }
}
