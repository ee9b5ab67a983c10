use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dos_ls")]
#[command(about = "List the directory tree of a FAT12 disk image", long_about = None)]
struct Cli {
    /// Raw FAT12 volume image
    image: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    env_logger::init();

    let lines = scandisk_filesystems::list_path(&cli.image)
        .with_context(|| format!("Failed to read {}", cli.image.display()))?;
    for line in lines {
        println!("{}", line);
    }
    Ok(())
}
