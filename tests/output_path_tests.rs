use std::path::{Path, PathBuf};

use taxonomy_fasta_headers::resolve_output_path;

#[test]
fn test_default_output_next_to_input() {
    let out = resolve_output_path(Path::new("data/genome.fasta"), None);
    assert_eq!(out, PathBuf::from("data/genome_Tax_Headers.fa"));
}

#[test]
fn test_default_output_for_bare_filename() {
    let out = resolve_output_path(Path::new("genome.fa"), None);
    assert_eq!(out, PathBuf::from("genome_Tax_Headers.fa"));
}

#[test]
fn test_gzipped_input_strips_only_last_extension() {
    let out = resolve_output_path(Path::new("data/genome.fa.gz"), None);
    assert_eq!(out, PathBuf::from("data/genome.fa_Tax_Headers.fa"));
}

#[test]
fn test_output_with_trailing_separator_is_a_directory() {
    let out = resolve_output_path(Path::new("in/genome.fasta"), Some("results/"));
    assert_eq!(out, PathBuf::from("results/genome_Tax_Headers.fa"));
}

#[test]
fn test_existing_directory_output() {
    let dir = std::env::temp_dir();
    let out = resolve_output_path(Path::new("genome.fa"), Some(dir.to_str().unwrap()));
    assert_eq!(out, dir.join("genome_Tax_Headers.fa"));
}

#[test]
fn test_output_file_with_fasta_extension_kept_as_is() {
    let out = resolve_output_path(Path::new("genome.fa"), Some("renamed.fasta"));
    assert_eq!(out, PathBuf::from("renamed.fasta"));
}

#[test]
fn test_output_extension_check_is_case_insensitive() {
    let out = resolve_output_path(Path::new("genome.fa"), Some("RENAMED.FAA"));
    assert_eq!(out, PathBuf::from("RENAMED.FAA"));
}

#[test]
fn test_output_without_fasta_extension_gets_fa_appended() {
    let out = resolve_output_path(Path::new("genome.fa"), Some("results/tagged"));
    assert_eq!(out, PathBuf::from("results/tagged.fa"));
}
