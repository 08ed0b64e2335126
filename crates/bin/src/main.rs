//! `asm-bin` is the executable of `asm`.
//!
//! This crate contains all the implementation to make `asm` an executable
//! that can be used by happy users.

mod error;

use std::{
    env,
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
    process,
};

use argh::FromArgs;
use asm_assembler::Configuration;
use asm_errors::Error as AsmError;
use error::Error;

fn default_output_file() -> PathBuf {
    PathBuf::from("a.out.txt")
}

/// The `asm` command is a single-pass assembler for a 16-bit toy
/// architecture: it classifies a source file line by line, resolves symbols
/// and `.equ` expressions, and produces a textual object dump.
#[derive(Debug, FromArgs)]
struct Asm {
    /// explain a particular error based on its code (of kind `E...`).
    #[argh(option)]
    explain: Option<String>,

    /// input file.
    #[argh(positional)]
    input_file: PathBuf,

    /// specify the name and location of the output file. If not specified,
    /// `a.out.txt` is used.
    #[argh(option, short = 'o', default = "default_output_file()")]
    output_file: PathBuf,
}

impl Asm {
    /// Creates a new `Self` type based on [`std::env::args_os`].
    fn new() -> Result<Self, Error> {
        // Collect all arguments.
        let arguments =
            env::args_os().map(OsString::into_string).collect::<Result<Vec<_>, _>>().map_err(
                |argument| Error::InvalidArgumentEncoding(argument.to_string_lossy().to_string()),
            )?;

        // Check whether `argv` is present.
        if arguments.is_empty() {
            return Err(Error::ProgramNameIsMissing);
        }

        // Extract the base command from a path.
        let command = Path::new(&arguments[0])
            .file_name()
            .and_then(|file_name| file_name.to_str())
            .unwrap_or(&arguments[0]);

        // Extract all arguments.
        let arguments =
            arguments.iter().skip(1).map(|argument| argument.as_str()).collect::<Vec<_>>();

        // Parse and build `Self`.
        match Asm::from_args(&[command], &arguments) {
            Ok(asm) => Ok(asm),
            Err(early_exit) => match early_exit.status {
                // The command was parsed successfully and the early exit is due to a flag like
                // `--help` causing early exit with output.
                Ok(()) => {
                    println!("{}", early_exit.output);

                    process::exit(0);
                }

                // The arguments were not successfully parsed.
                Err(()) => Err(Error::CommandLine(early_exit.output.trim().to_string())),
            },
        }
    }
}

fn main() -> miette::Result<()> {
    // Install the error report.
    Error::install_and_configure()?;

    // Build the command-line arguments.
    let asm = Asm::new()?;

    // Handle the `--explain` option.
    if let Some(error_code) = asm.explain {
        println!("{}", Error::explain(&error_code)?);

        return Ok(());
    }

    let source = fs::read_to_string(&asm.input_file).map_err(Error::Io)?;

    // Configure and create the assembler.
    let assembler = Configuration::new(source).assembler();

    // Take a deep breath, and here we are!
    match assembler.assemble() {
        Ok(object) => {
            let mut output = fs::File::create(&asm.output_file).map_err(Error::Io)?;
            asm_object::write::write_object(&mut output, &object).map_err(Error::Io)?;

            Ok(())
        }
        Err(AsmError::Diagnostics(diagnostics)) => {
            for diagnostic in diagnostics {
                eprintln!("{:?}", miette::Report::new(diagnostic));
            }

            process::exit(1);
        }
        Err(error) => Err(Error::Assembly(error).into()),
    }
}
