use std::path::PathBuf;

use lazy_static::lazy_static;
use log::LevelFilter;
use structopt::StructOpt;

lazy_static! {
    /// Directory containing the running executable
    static ref PROGRAM_DIR: PathBuf = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));
    static ref DEFAULT_INPUT: String = PROGRAM_DIR.join("cheat.db").display().to_string();
    static ref DEFAULT_OUTPUT: String = PROGRAM_DIR.join("output").display().to_string();
}

#[derive(StructOpt)]
struct Opts {
    /// Path to the cheat database to split
    #[structopt(long, default_value = DEFAULT_INPUT.as_str())]
    input: PathBuf,

    /// Directory to write one `.ini` file per game code into
    #[structopt(long, default_value = DEFAULT_OUTPUT.as_str())]
    output: PathBuf,

    /// Log every written file
    #[structopt(short, long)]
    verbose: bool,
}

fn main() {
    let opts = Opts::from_args();

    env_logger::Builder::new()
        .filter_level(if opts.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        })
        .parse_default_env()
        .init();

    match cheat_db_split::split_cheat_db(&opts.input, &opts.output) {
        Ok(report) => println!(
            "Done. Wrote/updated {} files in '{}'.",
            report.files_written,
            report.output_dir.display()
        ),
        Err(err) => {
            eprintln!("Error: {}", err);
            std::process::exit(1);
        }
    }
}
