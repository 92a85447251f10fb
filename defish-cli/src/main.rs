//! defish CLI
//!
//! Command-line front end for the `.defish` archive engine: compress a
//! file or directory, decompress an archive, or print its stored tree.

mod stat;

use clap::{Parser, Subcommand};
use defish_archive::{ARCHIVE_EXTENSION, Engine};
use defish_core::error::Result;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "defish")]
#[command(author, version, about = "Streaming LZ77 + Huffman archiver")]
#[command(long_about = "
defish packs a file or directory into a single .defish archive using
per-block adaptive Huffman coding, with optional LZ77 matching and an
optional password-derived stream cipher.

Examples:
  defish compress notes/ --use-lz77
  defish compress secrets.txt --password hunter2
  defish decompress notes.defish --destination restored/
  defish stat notes.defish
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a file or directory into an archive
    #[command(alias = "c")]
    Compress {
        /// File or directory to compress
        src: PathBuf,

        /// Directory the archive is written into
        #[arg(short, long, default_value = ".")]
        destination: PathBuf,

        /// Encipher the archive with this password
        #[arg(short, long)]
        password: Option<String>,

        /// Run the LZ77 matcher in front of the Huffman coder
        #[arg(long)]
        use_lz77: bool,

        /// Cap on archive size, in MiB
        #[arg(short = 'w', long)]
        write_limit: Option<u64>,
    },

    /// Decompress an archive
    #[command(alias = "d")]
    Decompress {
        /// Archive to decompress
        archive: PathBuf,

        /// Directory to extract into
        #[arg(short, long, default_value = ".")]
        destination: PathBuf,

        /// Password the archive was enciphered with
        #[arg(short, long)]
        password: Option<String>,

        /// Cap on extracted bytes, in MiB
        #[arg(short = 'w', long)]
        write_limit: Option<u64>,
    },

    /// Print the directory tree stored in an archive
    Stat {
        /// Archive to inspect
        archive: PathBuf,
    },
}

/// Derive the cipher seed from a password: the first eight bytes of its
/// SHA-256 digest, big-endian.
fn seed_from_password(password: &str) -> u64 {
    let digest = Sha256::digest(password.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

fn configure(
    engine: Engine,
    password: Option<&str>,
    write_limit_mib: Option<u64>,
) -> Engine {
    let engine = match password {
        Some(password) => engine.with_seed(seed_from_password(password)),
        None => engine,
    };
    match write_limit_mib {
        Some(mib) => engine.with_write_limit(mib * 1024 * 1024),
        None => engine,
    }
}

fn cmd_compress(
    src: &Path,
    destination: &Path,
    password: Option<&str>,
    use_lz77: bool,
    write_limit: Option<u64>,
) -> Result<()> {
    let engine = configure(Engine::new(src, destination), password, write_limit)
        .with_lz77(use_lz77);
    let report = engine.compress()?;
    println!(
        "compressed {} files, {} -> {} bytes: {}",
        report.files_stored,
        report.original_size,
        report.bytes_written,
        report.archive.display()
    );
    Ok(())
}

fn cmd_decompress(
    archive: &Path,
    destination: &Path,
    password: Option<&str>,
    write_limit: Option<u64>,
) -> Result<()> {
    if archive.extension().and_then(|e| e.to_str()) != Some(ARCHIVE_EXTENSION) {
        eprintln!(
            "warning: {} does not look like a .{ARCHIVE_EXTENSION} file",
            archive.display()
        );
    }
    let engine = configure(Engine::new(archive, destination), password, write_limit);
    let report = engine.decompress()?;
    if report.quota_exhausted {
        eprintln!(
            "warning: write limit reached, extraction stopped after {} bytes",
            report.bytes_written
        );
    }
    println!(
        "decompressed {} files, {} bytes written",
        report.files_restored, report.bytes_written
    );
    Ok(())
}

fn cmd_stat(archive: &Path) -> Result<()> {
    let engine = Engine::new(archive, archive);
    let (flags, tree) = engine.read_tree()?;
    let mut stages = Vec::new();
    if flags.cipher() {
        stages.push("cipher");
    }
    if flags.lz77() {
        stages.push("lz77");
    }
    stages.push("huffman");
    println!("stages: {}", stages.join(" + "));
    stat::print_tree(&tree);
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Compress {
            src,
            destination,
            password,
            use_lz77,
            write_limit,
        } => cmd_compress(&src, &destination, password.as_deref(), use_lz77, write_limit),
        Commands::Decompress {
            archive,
            destination,
            password,
            write_limit,
        } => cmd_decompress(&archive, &destination, password.as_deref(), write_limit),
        Commands::Stat { archive } => cmd_stat(&archive),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_is_stable_per_password() {
        assert_eq!(
            seed_from_password("hunter2"),
            seed_from_password("hunter2")
        );
        assert_ne!(seed_from_password("hunter2"), seed_from_password("hunter3"));
    }

    #[test]
    fn test_seed_matches_sha256_prefix() {
        // SHA-256("") starts with e3b0c44298fc1c14.
        assert_eq!(seed_from_password(""), 0xE3B0_C442_98FC_1C14);
    }

    #[test]
    fn test_compress_then_decompress_roundtrip() {
        let work = tempfile::tempdir().unwrap();
        let src = work.path().join("notes.txt");
        std::fs::write(&src, b"command line roundtrip").unwrap();

        cmd_compress(&src, work.path(), Some("hunter2"), true, None).unwrap();
        let archive = work.path().join("notes.defish");
        assert!(archive.exists());

        let out = work.path().join("restored");
        std::fs::create_dir_all(&out).unwrap();
        cmd_decompress(&archive, &out, Some("hunter2"), None).unwrap();
        assert_eq!(
            std::fs::read(out.join("notes/notes.txt")).unwrap(),
            b"command line roundtrip"
        );
    }

    #[test]
    fn test_decompress_warns_but_accepts_foreign_extension() {
        let work = tempfile::tempdir().unwrap();
        let src = work.path().join("data.txt");
        std::fs::write(&src, b"renamed but intact").unwrap();
        cmd_compress(&src, work.path(), None, false, None).unwrap();

        let renamed = work.path().join("data.bin");
        std::fs::rename(work.path().join("data.defish"), &renamed).unwrap();

        let out = work.path().join("restored");
        std::fs::create_dir_all(&out).unwrap();
        cmd_decompress(&renamed, &out, None, None).unwrap();
        assert_eq!(
            std::fs::read(out.join("data/data.txt")).unwrap(),
            b"renamed but intact"
        );
    }
}
