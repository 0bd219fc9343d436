pub use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "gridbroker")]
#[command(about = "Service broker for StorageGRID S3 buckets")]
pub struct Args {
    #[command(subcommand)]
    pub command: crate::Command,
}
