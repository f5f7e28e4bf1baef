use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "zipitem")]
#[command(version)]
#[command(about = "Pack files into a ZIP archive and unpack them again", long_about = None)]
#[command(after_help = "Examples:\n  \
  zipitem compress -n bundle a.txt data/b.bin   write bundle.zip with two entries\n  \
  zipitem decompress -l bundle.zip              list the items in bundle.zip\n  \
  zipitem decompress -d out bundle.zip          unpack bundle.zip into out/")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Pack files into a new ZIP archive
    Compress(CompressArgs),
    /// Unpack or list a ZIP archive
    Decompress(DecompressArgs),
}

#[derive(Args, Debug)]
pub struct CompressArgs {
    /// Files to pack, in entry order
    #[arg(value_name = "FILES", required = true)]
    pub files: Vec<String>,

    /// Archive base name (default: a fresh GUID)
    #[arg(short = 'n', value_name = "NAME")]
    pub name: Option<String>,

    /// Write the archive into this directory
    #[arg(short = 'd', value_name = "DIR", default_value = ".")]
    pub output_dir: String,

    /// Junk paths (store base names only)
    #[arg(short = 'j')]
    pub junk_paths: bool,

    /// Quiet mode
    #[arg(short = 'q')]
    pub quiet: bool,
}

#[derive(Args, Debug)]
pub struct DecompressArgs {
    /// ZIP archive path
    #[arg(value_name = "ARCHIVE")]
    pub archive: String,

    /// List items (short format)
    #[arg(short = 'l')]
    pub list: bool,

    /// List verbosely with sizes
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Extract items into exdir
    #[arg(short = 'd', value_name = "DIR", default_value = ".")]
    pub extract_dir: String,

    /// Never overwrite existing files
    #[arg(short = 'n')]
    pub never_overwrite: bool,

    /// Overwrite files WITHOUT prompting
    #[arg(short = 'o')]
    pub overwrite: bool,

    /// Quiet mode
    #[arg(short = 'q')]
    pub quiet: bool,
}

impl CompressArgs {
    /// Entry id for a file argument: forward slashes, optionally base name only
    pub fn entry_id(&self, path: &str) -> String {
        let normalized = path.replace('\\', "/");
        let normalized = normalized.trim_start_matches("./");
        if self.junk_paths {
            normalized
                .rsplit('/')
                .next()
                .unwrap_or(normalized)
                .to_string()
        } else {
            normalized.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_compress() {
        let cli = Cli::parse_from(["zipitem", "compress", "-n", "bundle", "-j", "a/b.txt", "c"]);
        let Command::Compress(args) = cli.command else {
            panic!("expected compress");
        };
        assert_eq!(args.name.as_deref(), Some("bundle"));
        assert_eq!(args.files, ["a/b.txt", "c"]);
        assert_eq!(args.output_dir, ".");
        assert_eq!(args.entry_id("a/b.txt"), "b.txt");
    }

    #[test]
    fn test_entry_id_keeps_relative_path() {
        let cli = Cli::parse_from(["zipitem", "compress", "x"]);
        let Command::Compress(args) = cli.command else {
            panic!("expected compress");
        };
        assert_eq!(args.entry_id("./docs\\a.txt"), "docs/a.txt");
    }

    #[test]
    fn test_parse_decompress() {
        let cli = Cli::parse_from(["zipitem", "decompress", "-v", "-d", "out", "x.zip"]);
        let Command::Decompress(args) = cli.command else {
            panic!("expected decompress");
        };
        assert!(args.verbose);
        assert_eq!(args.extract_dir, "out");
        assert_eq!(args.archive, "x.zip");
    }
}
