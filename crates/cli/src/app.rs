use {
    crate::{args, cmd_lookup, cmd_providers},
    anyhow::{Context, Result},
    clap::{Parser as ClapParser, Subcommand as ClapSubcommand},
    std::process::exit,
    time::{UtcOffset, macros::format_description},
    tokio::runtime::Builder as RuntimeBuilder,
    tracing::error,
    tracing_subscriber::fmt::time::OffsetTime,
};

// The application itself.
#[derive(ClapParser)]
#[command(version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub(crate) struct App {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    global: args::Global,

    // Options of the "lookup" command, used when no command is given.
    #[command(flatten)]
    lookup: cmd_lookup::Args,
}

#[derive(ClapSubcommand)]
pub(crate) enum Command {
    /// Look up public IPv4 and IPv6 addresses (the default)
    Lookup(cmd_lookup::Args),
    /// List the built-in providers
    Providers(cmd_providers::Args),
}

// Implemented by every command's options type:
// first adjusted by `setup`, then consumed by `run`.
pub(crate) trait Executable: Sized {
    fn setup(self) -> Result<Self>;
    async fn run(self, global: &args::Global) -> Result<()>;
}

// ========================================================================== //

impl App {
    fn setup(self) -> Self {
        self.setup_logging();
        self
    }

    fn setup_logging(&self) {
        let timestamp_format =
            format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

        // The local offset is unknown on some platforms, UTC is good enough then.
        let traces_timer = OffsetTime::new(
            UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC),
            timestamp_format,
        );

        let max_log_level = match self.global.verbose {
            0 => tracing::Level::INFO,
            1 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        tracing_subscriber::fmt()
            .compact()
            .with_timer(traces_timer)
            .with_ansi(true)
            .with_max_level(max_log_level)
            .init();
    }

    // Explodes the current object and returns the global arguments
    // along with the CLI command to execute.
    fn into_command(self) -> (args::Global, Command) {
        let command = self.command.unwrap_or(Command::Lookup(self.lookup));
        (self.global, command)
    }
}

impl Command {
    async fn execute(self, global: &args::Global) -> Result<()> {
        match self {
            Command::Lookup(cmd_args) => cmd_args.setup()?.run(global).await,
            Command::Providers(cmd_args) => cmd_args.setup()?.run(global).await,
        }
    }
}

// ========================================================================== //

// The "setup" function that initializes logging, parses CLI, ENV parameters
// and executes the requested command on a single threaded runtime.
//
// Exits with 1 only if the command itself could not be carried out;
// providers failing is not a reason for that.
pub fn exec() {
    let (global, command) = App::parse().setup().into_command();

    let result = RuntimeBuilder::new_current_thread()
        .enable_all()
        .build()
        .with_context(|| format!("cannot start async runtime"))
        .and_then(|runtime| runtime.block_on(command.execute(&global)));

    if let Err(err) = result {
        let err = format!("{}, because {}", err.to_string(), err.root_cause());
        error!(err = err, "critical error");
        exit(1);
    }
}
