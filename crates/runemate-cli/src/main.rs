use clap::{Parser, Subcommand};
use runemate::{
    commands::{
        config::{self, ConfigAction},
        deps, init, publish,
    },
    common::GlobalOpts,
    pipeline::StageKind,
};
use runemate_logger as logger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "runemate")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Publish RuneMate bots",
    long_about = "RuneMate declares bot manifests, validates them, bundles the sources and submits them for store review."
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write manifest files for every published declaration
    Generate,
    /// Generate, then check every manifest against the store rules
    Validate,
    /// Validate, then copy the sources into the staging area
    Collect,
    /// Collect every project and build the submission archive
    Bundle,
    /// Bundle, then upload the archive for review
    Submit {
        /// Submission key (overrides RUNEMATE_SUBMISSION_KEY and the config)
        #[arg(long, value_name = "KEY")]
        key: Option<String>,
    },
    /// Check declared dependencies against the allow-list
    Deps,
    /// Create a starter runemate.toml
    Init {
        /// Project name (default: the directory name)
        #[arg(long)]
        name: Option<String>,
    },
    /// Configure runemate
    #[command(subcommand_required = false, arg_required_else_help = false)]
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

fn init_tracing(opts: &GlobalOpts) {
    let directive = opts.tracing_directive();
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| directive.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr),
        )
        .try_init();
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logger::init_with_verbosity(cli.global.verbosity_level(), cli.global.quiet) {
        eprintln!("Warning: Failed to initialize logger: {}", e);
    }
    init_tracing(&cli.global);

    let result = match cli.command {
        Commands::Generate => publish::handle_stage(StageKind::Generate, None, &cli.global),
        Commands::Validate => publish::handle_stage(StageKind::Validate, None, &cli.global),
        Commands::Collect => publish::handle_stage(StageKind::Collect, None, &cli.global),
        Commands::Bundle => publish::handle_stage(StageKind::Bundle, None, &cli.global),
        Commands::Submit { key } => publish::handle_stage(StageKind::Submit, key, &cli.global),
        Commands::Deps => deps::handle_deps(&cli.global),
        Commands::Init { name } => init::handle_init(name, &cli.global),
        Commands::Config { action } => config::handle_config(action, &cli.global),
    };

    if let Err(e) = result {
        logger::error(&format!("{:#}", e));
        logger::show_log_path();
        std::process::exit(1);
    }
}
