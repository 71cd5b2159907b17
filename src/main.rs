use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

use crossenv::{
    commands,
    envctx::EnvContext,
    paths::Paths,
    prompt::TerminalPrompt,
    ui::{ColorMode, Ui},
};

#[derive(Parser)]
#[command(name = "crossenv")]
#[command(about = "Cross-compilation sysroot profile switcher - manage toolchain environments by name")]
#[command(version)]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// When to use colors: always, auto, never
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: ColorMode,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a sysroot directory as a named profile
    Add {
        /// Path to the sysroot directory
        path: PathBuf,

        /// Profile name (defaults to the directory name)
        name: Option<String>,
    },

    /// List all registered profiles
    List,

    /// Activate a profile (interactive picker when no name given)
    Select {
        /// Name of the profile to activate
        name: Option<String>,
    },

    /// Remove a profile from the registry
    Remove {
        /// Name of the profile to remove
        name: String,
    },

    /// Show the currently active profile
    Current,

    /// Deactivate: restore PATH and unset all exported variables
    Reset,

    /// Export a profile's environment as shell code
    Env {
        /// Write a standalone sourcable script here instead of printing
        dest: Option<PathBuf>,

        /// Export this profile instead of the active one
        #[arg(long)]
        profile: Option<String>,
    },

    /// Manage C/C++ standard flag sets (independent of profiles)
    #[command(subcommand)]
    Flags(FlagCommands),

    /// Run diagnostics on the crossenv setup
    Doctor,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
enum FlagCommands {
    /// Set C/C++ standard flags, e.g. 'crossenv flags set c11 c++17'
    Set {
        /// Standard tokens (one C and/or one C++ standard)
        standards: Vec<String>,

        /// Add -fpermissive without asking
        #[arg(long)]
        permissive: bool,

        /// Enable 32-bit compilation without asking
        #[arg(long)]
        m32: bool,

        /// Skip the interactive questions, answering no
        #[arg(long)]
        no_input: bool,
    },

    /// Show the current flag variables
    Show,

    /// Export the current flag variables as shell code
    Env {
        /// Write a standalone sourcable script here instead of printing
        dest: Option<PathBuf>,
    },

    /// Unset CFLAGS, CXXFLAGS, and ASFLAGS
    Clear,

    /// Restore flag variables from the backup
    Reset,

    /// List standards the host compiler supports
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let paths = Paths::new()?;
    let ui = Ui::new(cli.color, cli.no_color);
    let prompt = TerminalPrompt;
    let mut env = EnvContext::from_process();

    let result = match cli.command {
        Commands::Add { path, name } => commands::add(&paths, &path, name.as_deref(), &ui),
        Commands::List => commands::list(&paths, &ui),
        Commands::Select { name } => {
            commands::select(&paths, &mut env, &prompt, name.as_deref(), &ui)
        }
        Commands::Remove { name } => commands::remove(&paths, &name, &ui),
        Commands::Current => commands::current(&paths, &ui),
        Commands::Reset => commands::reset(&paths, &mut env, &ui),
        Commands::Env { dest, profile } => {
            commands::env_export(&paths, &env, profile.as_deref(), dest.as_deref(), &ui)
        }
        Commands::Flags(flag_command) => match flag_command {
            FlagCommands::Set {
                standards,
                permissive,
                m32,
                no_input,
            } => commands::flags_set(
                &paths,
                &mut env,
                &prompt,
                &standards,
                permissive,
                m32,
                no_input,
                &ui,
            ),
            FlagCommands::Show => commands::flags_show(&env, &ui),
            FlagCommands::Env { dest } => commands::flags_env(&env, dest.as_deref(), &ui),
            FlagCommands::Clear => commands::flags_clear(&mut env, &ui),
            FlagCommands::Reset => commands::flags_reset(&paths, &mut env, &ui),
            FlagCommands::List => commands::flags_list(&ui),
        },
        Commands::Doctor => commands::doctor(&paths, &ui),
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "crossenv",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    };

    // Boundary adapter: environment mutations only reach the shell through the
    // session script, which the shell wrapper sources after each invocation.
    if env.dirty() {
        paths.ensure_dirs()?;
        env.flush(&paths.session_file)?;
    }

    result
}
