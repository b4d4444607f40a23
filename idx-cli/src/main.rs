mod dump;
mod info;
mod logging;
mod tree;

use std::path::PathBuf;

use clap::Parser;
use idx_format::{DEFAULT_ROOT, DatasetBinding};
use idx_io::DEFAULT_CHUNK_SIZE;
use tokio::runtime::Builder;

use crate::dump::{DumpArgs, exec_dump};
use crate::info::exec_info;
use crate::logging::{default_env_filter, setup_logger};
use crate::tree::exec_tree;

#[derive(clap::Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log the IDX crates at TRACE unless `RUST_LOG` is set.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Print the header geometry of an IDX file.
    Info { file: PathBuf },
    /// Stream a window of (image, label) pairs from a dataset directory.
    Dump {
        /// Directory holding the dataset files.
        #[arg(long, env = "IDX_DATA_DIR", default_value = DEFAULT_ROOT)]
        root: PathBuf,
        /// Which file pair to read: training or testing.
        #[arg(short, long, default_value = "training")]
        dataset: DatasetBinding,
        /// Index of the first record.
        #[arg(short, long, default_value_t = 0)]
        begin: u64,
        /// Number of records, defaulting to the rest of the file.
        #[arg(short, long)]
        count: Option<u64>,
        /// Bytes requested from disk per read.
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE.get())]
        chunk_size: u64,
    },
    /// Print the first records of an IDX file as typed values.
    Tree {
        file: PathBuf,
        /// Number of records to print.
        #[arg(short = 'n', long, default_value_t = 3)]
        count: u64,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logger(default_env_filter(cli.verbose), cli.verbose);

    let runtime = Builder::new_current_thread().enable_all().build()?;
    match cli.command {
        Commands::Info { file } => runtime.block_on(exec_info(file))?,
        Commands::Dump {
            root,
            dataset,
            begin,
            count,
            chunk_size,
        } => runtime.block_on(exec_dump(DumpArgs {
            root,
            dataset,
            begin,
            count,
            chunk_size,
        }))?,
        Commands::Tree { file, count } => runtime.block_on(exec_tree(file, count))?,
    };

    Ok(())
}
