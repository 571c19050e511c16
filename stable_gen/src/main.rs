use clap::{Parser, Subcommand};
use stable_gen::cmds;
use stable_gen::cmds::analyze::IrOutputFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "stable-gen")]
#[command(about = "Hash-stable codec generation tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /* Generate encode/size routines from schema files */
    Codegen {
        /* Input YAML files containing type declarations */
        #[arg(short = 'f', long = "files", value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /* Include directories for imported schema files */
        #[arg(short = 'i', long = "include-dir", value_name = "DIR")]
        include_dirs: Vec<PathBuf>,

        /* Output directory for generated code */
        #[arg(
            short = 'o',
            long = "output",
            value_name = "DIR",
            default_value = "generated"
        )]
        output_dir: PathBuf,

        /* Version manifest path (default: <output>/stable_manifest.yaml) */
        #[arg(long = "manifest", value_name = "FILE")]
        manifest: Option<PathBuf>,

        /* Skip generation of hash-stability tests */
        #[arg(long = "no-tests")]
        no_tests: bool,

        /* Enable verbose output */
        #[arg(short = 'v', long = "verbose")]
        verbose: bool,
    },

    /* Analyze schema files and show resolution and instruction detail */
    Analyze {
        /* Input YAML files containing type declarations */
        #[arg(short = 'f', long = "files", value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /* Include directories for imported schema files */
        #[arg(short = 'i', long = "include-dir", value_name = "DIR")]
        include_dirs: Vec<PathBuf>,

        /* Print the generated encode instruction stream for a type */
        #[arg(long = "print-encode", value_name = "TYPE")]
        print_encode: Option<String>,

        /* Print the generated size terms for a type */
        #[arg(long = "print-size", value_name = "TYPE")]
        print_size: Option<String>,

        /* Format to use when printing instruction streams */
        #[arg(long = "ir-format", value_enum, default_value = "json")]
        ir_format: IrOutputFormat,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Codegen {
            files,
            include_dirs,
            output_dir,
            manifest,
            no_tests,
            verbose,
        } => {
            cmds::codegen::run(files, include_dirs, output_dir, manifest, !no_tests, verbose)?;
        }

        Commands::Analyze {
            files,
            include_dirs,
            print_encode,
            print_size,
            ir_format,
        } => {
            cmds::analyze::run(files, include_dirs, print_encode, print_size, ir_format)?;
        }
    }

    Ok(())
}
