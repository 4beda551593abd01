//! Personal shell shortcut dispatcher. Shortcuts are either plain shell commands or scripts that
//! accept extra arguments; both share one 1-based numbering, commands first.

use std::{fmt::Display, process::Command};

use ansi_term::Colour;
use anyhow::{bail, Context, Result};
use clap::Parser;
use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::{
    catalog::{load_json_config, Catalog},
    utils::{
        clipboard::{Clipboard, SystemClipboard},
        dir::{config_dir, create_application_default_path},
        logging::{LogArgs, SHORTCUT_PREFIX},
    },
};

const CONFIG_FILE_NAME: &str = "commands.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutKind {
    /// Runs as written, extra arguments are ignored.
    Command,
    /// Extra arguments are appended, shell quoted.
    Script,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortcut {
    pub command: String,
    pub kind: ShortcutKind,
}

impl Shortcut {
    pub fn command_line(&self, args: &[String]) -> String {
        match self.kind {
            ShortcutKind::Script if !args.is_empty() => {
                format!("{} {}", self.command, shell_words::join(args))
            }
            ShortcutKind::Script | ShortcutKind::Command => self.command.clone(),
        }
    }
}

impl Display for Shortcut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.command)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutConfig {
    pub shortcuts: Catalog<Shortcut>,
}

#[derive(Debug, Default, Deserialize)]
struct ShortcutConfigFile {
    #[serde(default)]
    commands: IndexMap<String, String>,
    #[serde(default)]
    scripts: IndexMap<String, String>,
}

impl Default for ShortcutConfig {
    fn default() -> Self {
        let commands = [
            ("ssh_work", "ssh-add ~/.ssh/id_ed25519"),
            ("ssh_private", "ssh-add ~/.ssh/github_private"),
            ("zshrc", "${EDITOR:-nvim} ~/.zshrc"),
            ("reload", "exec zsh"),
        ];
        let scripts = [
            ("ast", "ast-explorer"),
            ("link", "linker"),
            ("clip", "clipper"),
            ("track", "time-tracker"),
        ];
        let table = |entries: &[(&str, &str)]| {
            entries
                .iter()
                .map(|(key, command)| (key.to_string(), command.to_string()))
                .collect()
        };
        Self::from_file(ShortcutConfigFile {
            commands: table(&commands),
            scripts: table(&scripts),
        })
    }
}

impl ShortcutConfig {
    /// The shortcuts from `commands.json` in the config directory, or the built-in table.
    pub fn load() -> Result<Self> {
        let Some(dir) = config_dir() else {
            return Ok(Self::default());
        };
        let Some(file) = load_json_config::<ShortcutConfigFile>(&dir.join(CONFIG_FILE_NAME))?
        else {
            return Ok(Self::default());
        };
        Ok(Self::from_file(file))
    }

    fn from_file(file: ShortcutConfigFile) -> Self {
        let mut shortcuts = Catalog::new();
        let commands = file
            .commands
            .into_iter()
            .map(|entry| (entry, ShortcutKind::Command));
        let scripts = file
            .scripts
            .into_iter()
            .map(|entry| (entry, ShortcutKind::Script));

        for ((key, command), kind) in commands.chain(scripts) {
            if !shortcuts.insert(key.clone(), Shortcut { command, kind }) {
                warn!("Shortcut {key} is defined twice, keeping the first definition");
            }
        }
        Self { shortcuts }
    }
}

/// Runs command lines.
#[cfg_attr(test, mockall::automock)]
pub trait Shell {
    /// Fails when the command can't be spawned or exits unsuccessfully.
    fn run(&mut self, command_line: &str) -> Result<()>;
}

pub struct SystemShell;

impl Shell for SystemShell {
    fn run(&mut self, command_line: &str) -> Result<()> {
        info!("Running {command_line}");
        let status = shell_command(command_line)
            .status()
            .with_context(|| format!("Can't spawn '{command_line}'"))?;
        if !status.success() {
            let code = status
                .code()
                .map_or_else(|| "unknown".to_owned(), |code| code.to_string());
            bail!("Command '{command_line}' returned non-zero exit status {code}");
        }
        Ok(())
    }
}

fn shell_command(command_line: &str) -> Command {
    cfg_if::cfg_if! {
        if #[cfg(windows)] {
            let mut command = Command::new("cmd");
            command.args(["/C", command_line]);
            command
        } else {
            let mut command = Command::new("sh");
            command.args(["-c", command_line]);
            command
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutDelivery {
    Execute,
    Clipboard,
}

#[derive(Debug)]
pub enum DispatchOutcome {
    Executed(String),
    Copied(String),
    Invalid(String),
    Failed(anyhow::Error),
}

impl DispatchOutcome {
    pub fn message(&self) -> Option<String> {
        match self {
            DispatchOutcome::Executed(_) => None,
            DispatchOutcome::Copied(command_line) => Some(format!(
                "{}{command_line}",
                Colour::Green.paint("Command copied to clipboard: ")
            )),
            DispatchOutcome::Invalid(key) => Some(
                Colour::Red
                    .paint(format!("Invalid command: {key}"))
                    .to_string(),
            ),
            DispatchOutcome::Failed(e) => {
                Some(Colour::Red.paint(format!("Command failed: {e}")).to_string())
            }
        }
    }
}

pub struct Dispatcher<'a, S, C> {
    config: &'a ShortcutConfig,
    shell: S,
    clipboard: C,
    delivery: ShortcutDelivery,
}

impl<'a, S: Shell, C: Clipboard> Dispatcher<'a, S, C> {
    pub fn new(
        config: &'a ShortcutConfig,
        shell: S,
        clipboard: C,
        delivery: ShortcutDelivery,
    ) -> Self {
        Self {
            config,
            shell,
            clipboard,
            delivery,
        }
    }

    pub fn dispatch(&mut self, key_or_index: &str, args: &[String]) -> DispatchOutcome {
        let command_line = match self.config.shortcuts.lookup(key_or_index) {
            Ok((_, shortcut)) => shortcut.command_line(args),
            Err(e) => {
                debug!("Lookup of {key_or_index} failed: {e}");
                return DispatchOutcome::Invalid(key_or_index.to_owned());
            }
        };

        let result = match self.delivery {
            ShortcutDelivery::Execute => self.shell.run(&command_line),
            ShortcutDelivery::Clipboard => self.clipboard.copy(&command_line),
        };

        match (result, self.delivery) {
            (Ok(()), ShortcutDelivery::Execute) => DispatchOutcome::Executed(command_line),
            (Ok(()), ShortcutDelivery::Clipboard) => DispatchOutcome::Copied(command_line),
            (Err(e), _) => {
                error!("Shortcut {key_or_index} failed {e:?}");
                DispatchOutcome::Failed(e)
            }
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "shortcut", version, long_about = None)]
#[command(about = "Run personal shell shortcuts. Without arguments lists them")]
pub struct ShortcutArgs {
    #[arg(short, long, help = "Copy the command line to the clipboard instead of running it")]
    clipboard: bool,
    #[arg(help = "Shortcut key or 1-based number")]
    shortcut: Option<String>,
    #[arg(
        trailing_var_arg = true,
        allow_hyphen_values = true,
        help = "Arguments passed on to script shortcuts"
    )]
    args: Vec<String>,
    #[command(flatten)]
    logging: LogArgs,
}

pub fn run_shortcut() -> Result<()> {
    let args = ShortcutArgs::parse();
    args.logging
        .enable(SHORTCUT_PREFIX, &create_application_default_path()?)?;

    let config = ShortcutConfig::load()?;

    let Some(key) = args.shortcut else {
        for line in config.shortcuts.listing() {
            println!("{line}");
        }
        return Ok(());
    };

    let delivery = if args.clipboard {
        ShortcutDelivery::Clipboard
    } else {
        ShortcutDelivery::Execute
    };
    let mut dispatcher = Dispatcher::new(&config, SystemShell, SystemClipboard, delivery);
    if let Some(message) = dispatcher.dispatch(&key, &args.args).message() {
        println!("{message}");
    }
    Ok(())
}
