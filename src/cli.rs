use clap::Parser;
use std::path::PathBuf;

/// Command line flags
#[derive(Debug, Clone, Parser)]
#[command(name = "biscuit-server", version, about = "Identify the body of text a snippet belongs to")]
pub struct Cli {
    /// Server port assignment
    #[arg(short, long)]
    pub port: Option<u16>,

    /// List all supported bodies of text and exit
    #[arg(short, long)]
    pub supported: bool,

    /// Comma separated list of bodies to load (all by default)
    #[arg(short, long, value_delimiter = ',')]
    pub load: Vec<String>,

    /// Load settings from this file instead of config/
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Text printed for `--supported`
pub fn format_supported(bodies: &[String]) -> String {
    if bodies.is_empty() {
        return "None found ... Maybe check your path?".to_string();
    }

    let mut out = format!("{} Found:\n", bodies.len());
    for body in bodies {
        out.push_str("- ");
        out.push_str(body);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let cli = Cli::parse_from(["biscuit-server", "-p", "9000", "-l", "en,fr"]);
        assert_eq!(cli.port, Some(9000));
        assert_eq!(cli.load, vec!["en", "fr"]);
        assert!(!cli.supported);
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["biscuit-server"]);
        assert_eq!(cli.port, None);
        assert!(cli.load.is_empty());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_format_supported() {
        let out = format_supported(&["en".to_string(), "fr".to_string()]);
        assert_eq!(out, "2 Found:\n- en\n- fr\n");
        assert_eq!(format_supported(&[]), "None found ... Maybe check your path?");
    }
}
