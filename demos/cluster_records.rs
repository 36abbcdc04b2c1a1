//! Cluster procedure records from a CSV-like file and print the results.
//!
//! ```bash
//! RUST_LOG=setclump=debug cargo run --example cluster_records -- records.csv --threshold 0.64
//! ```

use std::path::PathBuf;

use clap::Parser;
use setclump::{ingest, report, AverageLinkage, Clustering, CutMode, DistanceMatrix, IngestOptions};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Average-linkage clustering of procedures by shared references")]
struct Args {
    /// Records: `procedure,attr;attr,call;call` with a header line.
    input: PathBuf,

    /// Maximum merge distance for flat clusters; omit for the full dendrogram.
    #[arg(short, long, conflicts_with = "clusters")]
    threshold: Option<f64>,

    /// Cut into exactly this many clusters.
    #[arg(short = 'k', long)]
    clusters: Option<usize>,

    /// Do not count a procedure's own name among its references.
    #[arg(long)]
    no_self: bool,

    /// Print the hierarchy as JSON instead of text.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let opts = IngestOptions::default().with_include_self(!args.no_self);
    let catalog = ingest::read_path(&args.input, &opts)?;

    println!("=== Entity sets ===");
    print!("{catalog}");

    if catalog.len() > 1 {
        println!();
        println!("=== Distance matrix ===");
        print!("{}", DistanceMatrix::from_catalog(&catalog)?);
    }

    let mode = match (args.threshold, args.clusters) {
        (Some(threshold), _) => CutMode::FlatCut { threshold },
        (None, Some(k)) => CutMode::Clusters { k },
        (None, None) => CutMode::Full,
    };
    let tree = AverageLinkage::new(mode).fit(&catalog)?;

    if args.json {
        println!("{}", report::to_json(&tree)?);
        return Ok(());
    }

    println!("\n=== Dendrogram ===");
    print!("{}", report::render_tree(&tree));
    println!("\n=== Clusters ===");
    print!("{}", report::render_clusters(&tree));
    println!("\n=== Labels ===");
    print!("{}", report::render_labels(&tree));
    Ok(())
}
