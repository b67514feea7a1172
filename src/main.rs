use anyhow::{bail, Context, Result};
use clap::Parser;
use flate2::read::MultiGzDecoder;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use taxonomy_fasta_headers::{resolve_output_path, rewrite_records, Database, Rewriter};

#[derive(Parser)]
#[command(name = "taxonomy-fasta-headers", version)]
#[command(about = "Reformat FASTA headers with a taxonomy prefix based on the source database")]
struct Args {
    #[arg(long, help = "Input FASTA file (plain or gzip-compressed)")]
    fasta: PathBuf,

    #[arg(long, value_enum, ignore_case = true, help = "Database the FASTA file originates from")]
    database: Database,

    #[arg(
        long,
        help = "Genus_Species information (e.g. Homo_sapiens). Required for ENSEMBL and \
                Gencode files, must not be provided for NCBI or UniRef files"
    )]
    taxonomy: Option<String>,

    #[arg(
        short = 'o',
        long,
        help = "Output file or directory. Defaults to <input stem>_Tax_Headers.fa next to the input"
    )]
    output: Option<String>,
}

fn open_reader(path: &Path) -> Result<Box<dyn BufRead>> {
    let file =
        File::open(path).with_context(|| format!("cannot open input file {}", path.display()))?;

    if path.extension().and_then(|s| s.to_str()) == Some("gz") {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Check that the input exists and that its first line starts with '>'.
fn validate_fasta(path: &Path) -> Result<()> {
    if !path.is_file() {
        bail!("FASTA file not found: {}", path.display());
    }
    let mut reader = open_reader(path)?;
    let mut first_line = Vec::new();
    reader
        .read_until(b'\n', &mut first_line)
        .with_context(|| format!("cannot read {}", path.display()))?;
    if !first_line.starts_with(b">") {
        bail!("{} does not appear to be in FASTA format", path.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Configuration errors are reported before any file I/O happens.
    let rewriter = Rewriter::new(args.database, args.taxonomy.as_deref())?;
    validate_fasta(&args.fasta)?;

    let output = resolve_output_path(&args.fasta, args.output.as_deref());
    if let Some(dir) = output.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            fs::create_dir_all(dir)
                .with_context(|| format!("cannot create output directory {}", dir.display()))?;
        }
    }

    let reader = open_reader(&args.fasta)?;
    let file = File::create(&output)
        .with_context(|| format!("cannot create output file {}", output.display()))?;
    let mut writer = BufWriter::new(file);

    let stats = rewrite_records(reader, &mut writer, &rewriter)?;
    writer
        .flush()
        .with_context(|| format!("cannot write output file {}", output.display()))?;

    if stats.untagged > 0 {
        eprintln!(
            "Warning: {} header(s) had no recognizable taxonomy and were left unchanged",
            stats.untagged
        );
    }
    println!(
        "Processing complete. {} records written to {}",
        stats.records,
        output.display()
    );

    Ok(())
}
