use anyhow::Context;
use clap::{ArgAction, Parser};
use log::LevelFilter;
use scandisk_core::{CheckOptions, CheckReport, ClusterCountPolicy};
use scandisk_filesystems::ScanDisk;
use std::path::PathBuf;

/// Exit status when the image is too damaged to repair.
const EXIT_CORRUPT: i32 = 3;

#[derive(Parser)]
#[command(name = "scandisk")]
#[command(about = "Check and repair a FAT12 disk image", long_about = None)]
struct Cli {
    /// Raw FAT12 volume image
    image: PathBuf,

    /// Report what would change without writing the image
    #[arg(long)]
    dry_run: bool,

    /// Expect ceil(size / cluster size) clusters per file instead of
    /// size / cluster size + 1
    #[arg(long)]
    exact_sizes: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// More log output (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        })
        .parse_default_env()
        .init();

    let options = CheckOptions {
        dry_run: cli.dry_run,
        cluster_policy: if cli.exact_sizes {
            ClusterCountPolicy::Exact
        } else {
            ClusterCountPolicy::Historical
        },
    };

    let report = match ScanDisk::new(options).check_path(&cli.image) {
        Ok(report) => report,
        Err(err) if err.is_corruption() => {
            eprintln!("{}: {}", cli.image.display(), err);
            eprintln!("Image left unchanged");
            std::process::exit(EXIT_CORRUPT);
        }
        Err(err) => {
            return Err(err).with_context(|| format!("Failed to check {}", cli.image.display()));
        }
    };

    if cli.json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", render_text(&report));
    }
    Ok(())
}

/// Lost clusters, then the recovered files, then the size corrections.
fn render_text(report: &CheckReport) -> String {
    let mut out = String::from("Unreferenced:");
    for chain in &report.lost_chains {
        for cluster in &chain.clusters {
            out.push_str(&format!(" {}", cluster));
        }
    }
    out.push('\n');

    for chain in &report.lost_chains {
        out.push_str(&format!("Lost file: {} {}\n", chain.start_cluster, chain.length()));
    }
    for correction in &report.size_corrections {
        out.push_str(&format!(
            "{} {} {}\n",
            correction.display_name(),
            correction.declared_size,
            correction.previous_extent
        ));
    }
    out
}
