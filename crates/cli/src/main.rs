mod arguments;
mod conform;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use macrostore_backend::{open_backend, Backend, BackendKind, StoreConfig};
use macrostore_storage::{Id, Macro, MacroArguments, MacroService, MacroUpdate, NewMacro};
use tracing_subscriber::EnvFilter;

use crate::arguments::ArgumentFlags;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Backend selection on the command line, overriding the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BackendArg {
    Memory,
    File,
}

impl From<BackendArg> for BackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Memory => BackendKind::Memory,
            BackendArg::File => BackendKind::File,
        }
    }
}

/// Macro store toolchain.
#[derive(Parser)]
#[command(name = "macrostore", version, about = "Macro store conformance runner and CRUD tool")]
struct Cli {
    /// Path to the store config (TOML). Defaults to ./macrostore.toml if present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the MacroService conformance suite against fresh backend instances
    Conform {
        /// Backend kind to test (defaults to the configured one)
        #[arg(long, value_enum)]
        backend: Option<BackendArg>,
    },

    #[command(flatten)]
    Crud(CrudCommand),
}

/// Commands that operate on the configured store.
#[derive(Subcommand)]
enum CrudCommand {
    /// List every stored macro
    List,

    /// Show a single macro
    Get {
        /// Macro id (16 hex characters)
        id: String,
    },

    /// Create a macro; the store assigns its id
    Create {
        #[arg(long)]
        name: String,
        #[command(flatten)]
        arguments: ArgumentFlags,
    },

    /// Update a macro's name and/or arguments
    Update {
        /// Macro id (16 hex characters)
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        arguments: ArgumentFlags,
    },

    /// Store a macro under the given id, inserting or overwriting
    Replace {
        /// Macro id (16 hex characters)
        id: String,
        #[arg(long)]
        name: String,
        #[command(flatten)]
        arguments: ArgumentFlags,
    },

    /// Delete a macro
    Delete {
        /// Macro id (16 hex characters)
        id: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref());
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => die(format!("failed to create tokio runtime: {}", e)),
    };

    match cli.command {
        Commands::Conform { backend } => {
            let kind = backend.map(BackendKind::from).unwrap_or(config.store.backend);
            let ok = rt.block_on(conform::cmd_conform(kind, cli.output, cli.quiet));
            if !ok {
                process::exit(1);
            }
        }
        Commands::Crud(command) => {
            let backend = match rt.block_on(open_backend(&config)) {
                Ok(backend) => backend,
                Err(e) => die(e),
            };
            rt.block_on(run_crud(&backend, command, cli.output, cli.quiet));
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> StoreConfig {
    let result = match path {
        Some(path) => StoreConfig::load(path),
        None => StoreConfig::load_or_default(Path::new(StoreConfig::DEFAULT_FILE)),
    };
    match result {
        Ok(config) => config,
        Err(e) => die(e),
    }
}

pub(crate) fn die(msg: impl std::fmt::Display) -> ! {
    eprintln!("error: {}", msg);
    process::exit(1);
}

fn parse_id(raw: &str) -> Id {
    match raw.parse() {
        Ok(id) => id,
        Err(e) => die(format!("invalid id {:?}: {}", raw, e)),
    }
}

fn parse_arguments(flags: ArgumentFlags) -> Option<MacroArguments> {
    match flags.into_arguments() {
        Ok(arguments) => arguments,
        Err(e) => die(e),
    }
}

async fn run_crud(backend: &Backend, command: CrudCommand, output: OutputFormat, quiet: bool) {
    if command.is_mutation()
        && matches!(backend, Backend::Memory(_))
        && !quiet
        && output == OutputFormat::Text
    {
        eprintln!("warning: the memory backend is not persisted; this change is lost on exit");
    }

    match command {
        CrudCommand::List => match backend.find_macros().await {
            Ok(macros) => print_macros(&macros, output),
            Err(e) => die(e),
        },
        CrudCommand::Get { id } => match backend.find_macro_by_id(parse_id(&id)).await {
            Ok(m) => print_macro(&m, output),
            Err(e) => die(e),
        },
        CrudCommand::Create { name, arguments } => {
            let new = NewMacro::new(name, parse_arguments(arguments).unwrap_or_default());
            match backend.create_macro(new).await {
                Ok(m) => {
                    if !quiet && output == OutputFormat::Text {
                        eprintln!("Created macro {}", m.id);
                    }
                    print_macro(&m, output);
                }
                Err(e) => die(e),
            }
        }
        CrudCommand::Update {
            id,
            name,
            arguments,
        } => {
            let update = MacroUpdate {
                name,
                arguments: parse_arguments(arguments),
            };
            match backend.update_macro(parse_id(&id), &update).await {
                Ok(m) => print_macro(&m, output),
                Err(e) => die(e),
            }
        }
        CrudCommand::Replace {
            id,
            name,
            arguments,
        } => {
            let m = Macro {
                id: parse_id(&id),
                name,
                arguments: parse_arguments(arguments).unwrap_or_default(),
            };
            match backend.replace_macro(m.clone()).await {
                Ok(()) => print_macro(&m, output),
                Err(e) => die(e),
            }
        }
        CrudCommand::Delete { id } => {
            let id = parse_id(&id);
            match backend.delete_macro(id).await {
                Ok(()) => {
                    if !quiet {
                        eprintln!("Deleted macro {}", id);
                    }
                }
                Err(e) => die(e),
            }
        }
    }
}

impl CrudCommand {
    fn is_mutation(&self) -> bool {
        !matches!(self, CrudCommand::List | CrudCommand::Get { .. })
    }
}

fn print_macros(macros: &[Macro], output: OutputFormat) {
    match output {
        OutputFormat::Json => print_json(macros),
        OutputFormat::Text => {
            for m in macros {
                println!("{}\t{}\t{}", m.id, m.name, describe_arguments(&m.arguments));
            }
        }
    }
}

fn print_macro(m: &Macro, output: OutputFormat) {
    match output {
        OutputFormat::Json => print_json(m),
        OutputFormat::Text => {
            println!("id:        {}", m.id);
            println!("name:      {}", m.name);
            println!("arguments: {}", describe_arguments(&m.arguments));
        }
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => die(format!("failed to serialize output: {}", e)),
    }
}

fn describe_arguments(arguments: &MacroArguments) -> String {
    match arguments {
        MacroArguments::Constant(values) => format!("constant [{}]", values.join(", ")),
        MacroArguments::Map(values) => {
            let pairs: Vec<String> = values.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            format!("map {{{}}}", pairs.join(", "))
        }
        MacroArguments::Query { query, language } => format!("query ({}) {}", language, query),
    }
}
