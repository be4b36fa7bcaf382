use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing::warn;

use dostman_lib::config::{AppConfig, ConfigStore};
use dostman_lib::curl::{generate_curl, parse_curl};
use dostman_lib::request::RequestData;
use dostman_lib::search::{self, SearchOptions};
use dostman_lib::{file, node, AppState, Error, Result};

/// dostman-cli - browse, search and copy from JSON documents; convert cURL commands
#[derive(Parser)]
#[command(name = "dostman-cli")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a JSON document as a tree
    View(ViewArgs),
    /// Convert between cURL commands and requests
    Curl {
        #[command(subcommand)]
        command: CurlCommand,
    },
    /// Inspect the configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Args)]
struct ViewArgs {
    /// JSON file to open, or `-` for stdin
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Highlight every occurrence of this text
    #[arg(short, long, value_name = "TERM")]
    search: Option<String>,

    #[arg(long)]
    match_case: bool,

    #[arg(long)]
    whole_word: bool,

    /// Expand every node instead of only the path to the current match
    #[arg(long)]
    expand_all: bool,

    /// Advance to the next match this many times (wraps around)
    #[arg(long, value_name = "N", default_value_t = 0)]
    next: usize,

    /// Maximum number of matches listed
    #[arg(long, value_name = "N", default_value_t = 50)]
    limit: usize,

    /// Copy the node at this JSON Pointer to the clipboard and print it
    #[arg(long, value_name = "POINTER")]
    copy: Option<String>,

    /// Print the source text untouched
    #[arg(long)]
    raw: bool,
}

#[derive(Subcommand)]
enum CurlCommand {
    /// Parse a cURL command and print the request as JSON
    Import {
        #[arg(value_name = "COMMAND")]
        command: String,
    },
    /// Print a request JSON file as a cURL command
    Export {
        /// Request JSON file, or `-` for stdin
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration
    Show,
    /// Print the configuration file location
    Path,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    dostman_lib::init_tracing(if cli.verbose { "debug" } else { "warn" });

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::View(args) => view(args),
        Commands::Curl { command: CurlCommand::Import { command } } => {
            let request = parse_curl(&command)?;
            println!("{}", serde_json::to_string_pretty(&request)?);
            Ok(())
        }
        Commands::Curl { command: CurlCommand::Export { input } } => {
            let request: RequestData = serde_json::from_str(&read_input(&input)?)?;
            println!("{}", generate_curl(&request));
            Ok(())
        }
        Commands::Config { command } => {
            let store = ConfigStore::default_location()?;
            match command {
                ConfigCommand::Show => {
                    println!("{}", serde_json::to_string_pretty(&store.load()?)?);
                }
                ConfigCommand::Path => println!("{}", store.path().display()),
            }
            Ok(())
        }
    }
}

fn read_input(input: &Path) -> Result<String> {
    if input == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        Ok(text)
    } else {
        Ok(std::fs::read_to_string(input)?)
    }
}

fn load_config() -> (Option<ConfigStore>, AppConfig) {
    let store = match ConfigStore::default_location() {
        Ok(store) => store,
        Err(e) => {
            warn!(error = %e, "using default config");
            return (None, AppConfig::default());
        }
    };
    match store.load() {
        Ok(config) => (Some(store), config),
        Err(e) => {
            warn!(error = %e, "using default config");
            (Some(store), AppConfig::default())
        }
    }
}

fn view(args: ViewArgs) -> Result<()> {
    let text = read_input(&args.input)?;
    if args.raw {
        print!("{text}");
        return Ok(());
    }

    let (store, mut config) = load_config();
    config.viewer.expand_all |= args.expand_all;
    config.viewer.match_case |= args.match_case;
    config.viewer.whole_word |= args.whole_word;
    let options = SearchOptions {
        match_case: config.viewer.match_case,
        whole_word: config.viewer.whole_word,
    };
    let state = AppState::with_config(config);

    match file::open_text(text, &state) {
        Ok(_) => {}
        Err(Error::Parse(e)) => eprintln!("warning: {e}; showing raw text"),
        Err(e) => return Err(e),
    }
    if let Some(store) = store.filter(|_| args.input != Path::new("-")) {
        if let Err(e) = store.save_last_opened_file(&args.input) {
            warn!(error = %e, "could not remember the opened file");
        }
    }

    let mut response = None;
    if let Some(term) = args.search {
        response = Some(search::search(term, options, 0, args.limit, &state)?);
        for _ in 0..args.next {
            response = Some(search::next_match(args.limit, &state)?);
        }
    }

    if let Some(pointer) = args.copy {
        let text = match node::copy_node_value(&pointer, &state) {
            Ok(text) => text,
            Err(Error::Clipboard(e)) => {
                warn!(error = %e, "clipboard unavailable, printing only");
                let guard = state.viewer.read();
                let viewer = guard.as_ref().ok_or(Error::NoDocument)?;
                viewer.copy_text(&pointer)?
            }
            Err(e) => return Err(e),
        };
        println!("{text}");
        return Ok(());
    }

    println!("{}", node::render_tree(&state)?);

    if let Some(response) = response {
        println!();
        println!("Matches: {}", response.display);
        for hit in &response.hits {
            let marker = if hit.current { '>' } else { ' ' };
            println!(
                "{marker} {:>4}  {:<24} {}",
                hit.index + 1,
                hit.pointer.as_deref().unwrap_or("-"),
                hit.context
            );
        }
        if response.has_more {
            println!("  ... {} more", response.total_count - response.hits.len());
        }
    }
    Ok(())
}
