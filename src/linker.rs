//! Bookmark launcher. Opens links from a [LinkConfig] in the browser or copies them to the
//! clipboard, addressed by key, 1-based index or group name.

use std::process::{Command, Stdio};

use ansi_term::Colour;
use anyhow::{bail, Result};
use clap::Parser;
use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::{
    catalog::{load_json_config, Catalog},
    utils::{
        clipboard::{Clipboard, SystemClipboard},
        dir::{config_dir, create_application_default_path},
        logging::{LogArgs, LINKER_PREFIX},
    },
};

const CONFIG_FILE_NAME: &str = "links.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    pub links: Catalog<String>,
    pub groups: IndexMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct LinkConfigFile {
    #[serde(default)]
    links: IndexMap<String, String>,
    #[serde(default)]
    groups: IndexMap<String, Vec<String>>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        let links = [
            ("github", "https://github.com"),
            ("crates", "https://crates.io"),
            ("docs", "https://docs.rs"),
            ("std", "https://doc.rust-lang.org/std/"),
            ("book", "https://doc.rust-lang.org/book/"),
            ("playground", "https://play.rust-lang.org"),
            ("opengl", "https://learnopengl.com"),
            ("d2l", "https://d2l.ai"),
            ("gpt", "https://chatgpt.com"),
        ]
        .into_iter()
        .map(|(key, url)| (key.to_owned(), url.to_owned()))
        .collect();

        let mut groups = IndexMap::new();
        groups.insert(
            "rust".to_owned(),
            vec!["docs".to_owned(), "std".to_owned(), "crates".to_owned()],
        );

        Self { links, groups }
    }
}

impl LinkConfig {
    /// The links from `links.json` in the config directory, or the built-in table.
    pub fn load() -> Result<Self> {
        let Some(dir) = config_dir() else {
            return Ok(Self::default());
        };
        let Some(file) = load_json_config::<LinkConfigFile>(&dir.join(CONFIG_FILE_NAME))? else {
            return Ok(Self::default());
        };
        Ok(Self::from_file(file))
    }

    fn from_file(file: LinkConfigFile) -> Self {
        for (group, keys) in &file.groups {
            for key in keys.iter().filter(|key| !file.links.contains_key(*key)) {
                warn!("Group {group} refers to unknown link {key}");
            }
        }
        Self {
            links: file.links.into_iter().collect(),
            groups: file.groups,
        }
    }

    pub fn listing(&self) -> Vec<String> {
        let mut lines = vec![Colour::Blue.paint("Links:").to_string()];
        lines.extend(self.links.listing());
        lines.push(String::new());
        lines.push(Colour::Blue.paint("Groups:").to_string());
        for (name, keys) in &self.groups {
            lines.push(format!("{}: {}", Colour::Purple.paint(name.as_str()), keys.join(", ")));
        }
        lines
    }
}

/// Something that can display a url.
#[cfg_attr(test, mockall::automock)]
pub trait Browser {
    fn open(&mut self, url: &str) -> Result<()>;
}

/// Hands urls to the platform's default opener.
pub struct SystemBrowser;

impl Browser for SystemBrowser {
    fn open(&mut self, url: &str) -> Result<()> {
        let mut command = opener_command(url);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        let status = command.status()?;
        if !status.success() {
            bail!("Opener exited with {status} for {url}");
        }
        info!("Opened {url}");
        Ok(())
    }
}

fn opener_command(url: &str) -> Command {
    cfg_if::cfg_if! {
        if #[cfg(target_os = "macos")] {
            let mut command = Command::new("open");
            command.arg(url);
            command
        } else if #[cfg(windows)] {
            let mut command = Command::new("cmd");
            command.args(["/C", "start", "", url]);
            command
        } else {
            let mut command = Command::new("xdg-open");
            command.arg(url);
            command
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Browser,
    Clipboard,
}

#[derive(Debug)]
pub enum LaunchOutcome {
    Opened(String),
    Copied(String),
    Invalid(String),
    Failed(String, anyhow::Error),
}

impl LaunchOutcome {
    /// Line printed for the outcome. Opening a browser is silent.
    pub fn message(&self) -> Option<String> {
        match self {
            LaunchOutcome::Opened(_) => None,
            LaunchOutcome::Copied(url) => Some(format!(
                "{}{url}",
                Colour::Green.paint("Link copied to clipboard: ")
            )),
            LaunchOutcome::Invalid(target) => Some(
                Colour::Red
                    .paint(format!("Invalid link key or number: {target}"))
                    .to_string(),
            ),
            LaunchOutcome::Failed(url, e) => Some(
                Colour::Red
                    .paint(format!("Failed to deliver {url}: {e}"))
                    .to_string(),
            ),
        }
    }
}

pub struct Launcher<'a, B, C> {
    config: &'a LinkConfig,
    browser: B,
    clipboard: C,
    delivery: Delivery,
}

impl<'a, B: Browser, C: Clipboard> Launcher<'a, B, C> {
    pub fn new(config: &'a LinkConfig, browser: B, clipboard: C, delivery: Delivery) -> Self {
        Self {
            config,
            browser,
            clipboard,
            delivery,
        }
    }

    /// Delivers one link, or every link of a group when `target` names one.
    pub fn launch(&mut self, target: &str) -> Vec<LaunchOutcome> {
        let config = self.config;
        match config.groups.get(target) {
            Some(keys) => {
                debug!("Expanding group {target}");
                keys.iter().map(|key| self.launch_link(key)).collect()
            }
            None => vec![self.launch_link(target)],
        }
    }

    fn launch_link(&mut self, key_or_index: &str) -> LaunchOutcome {
        let url = match self.config.links.lookup(key_or_index) {
            Ok((_, url)) => url.clone(),
            Err(e) => {
                debug!("Lookup of {key_or_index} failed: {e}");
                return LaunchOutcome::Invalid(key_or_index.to_owned());
            }
        };

        let result = match self.delivery {
            Delivery::Browser => self.browser.open(&url),
            Delivery::Clipboard => self.clipboard.copy(&url),
        };

        match (result, self.delivery) {
            (Ok(()), Delivery::Browser) => LaunchOutcome::Opened(url),
            (Ok(()), Delivery::Clipboard) => LaunchOutcome::Copied(url),
            (Err(e), _) => {
                error!("Failed to deliver {url} {e:?}");
                LaunchOutcome::Failed(url, e)
            }
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "linker", version, long_about = None)]
#[command(about = "Open or copy bookmarked links. Without arguments lists them")]
pub struct LinkerArgs {
    #[arg(help = "Link keys, 1-based numbers or group names")]
    targets: Vec<String>,
    #[arg(short, long, help = "Copy to the clipboard instead of opening")]
    clipboard: bool,
    #[command(flatten)]
    logging: LogArgs,
}

pub fn run_linker() -> Result<()> {
    let args = LinkerArgs::parse();
    args.logging
        .enable(LINKER_PREFIX, &create_application_default_path()?)?;

    let config = LinkConfig::load()?;

    if args.targets.is_empty() {
        for line in config.listing() {
            println!("{line}");
        }
        return Ok(());
    }

    let delivery = if args.clipboard {
        Delivery::Clipboard
    } else {
        Delivery::Browser
    };
    let mut launcher = Launcher::new(&config, SystemBrowser, SystemClipboard, delivery);
    for target in &args.targets {
        for outcome in launcher.launch(target) {
            if let Some(message) = outcome.message() {
                println!("{message}");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;
    use mockall::predicate::eq;

    use crate::utils::clipboard::MockClipboard;

    use super::{Delivery, LaunchOutcome, Launcher, LinkConfig, LinkConfigFile, MockBrowser};

    fn config() -> LinkConfig {
        let mut links = IndexMap::new();
        links.insert("jira".to_owned(), "https://jira.example.com".to_owned());
        links.insert("gh".to_owned(), "https://github.com".to_owned());
        let mut groups = IndexMap::new();
        groups.insert("work".to_owned(), vec!["gh".to_owned(), "jira".to_owned()]);
        LinkConfig::from_file(LinkConfigFile { links, groups })
    }

    #[test]
    fn opens_by_index_in_browser() {
        let config = config();
        let mut browser = MockBrowser::new();
        browser
            .expect_open()
            .with(eq("https://github.com"))
            .times(1)
            .returning(|_| Ok(()));
        let mut clipboard = MockClipboard::new();
        clipboard.expect_copy().never();

        let mut launcher = Launcher::new(&config, browser, clipboard, Delivery::Browser);
        let outcomes = launcher.launch("2");

        assert!(matches!(&outcomes[..], [LaunchOutcome::Opened(url)] if url == "https://github.com"));
        assert!(outcomes[0].message().is_none());
    }

    #[test]
    fn group_copies_every_link() {
        let config = config();
        let mut browser = MockBrowser::new();
        browser.expect_open().never();
        let mut clipboard = MockClipboard::new();
        clipboard.expect_copy().times(2).returning(|_| Ok(()));

        let mut launcher = Launcher::new(&config, browser, clipboard, Delivery::Clipboard);
        let outcomes = launcher.launch("work");

        assert_eq!(outcomes.len(), 2);
        assert!(matches!(&outcomes[1], LaunchOutcome::Copied(url) if url == "https://jira.example.com"));
        assert!(outcomes[0].message().unwrap().contains("copied to clipboard"));
    }

    #[test]
    fn invalid_targets_never_open_anything() {
        let config = config();
        let mut browser = MockBrowser::new();
        browser.expect_open().never();
        let mut clipboard = MockClipboard::new();
        clipboard.expect_copy().never();

        let mut launcher = Launcher::new(&config, browser, clipboard, Delivery::Browser);
        for target in ["3", "0", "gitlab"] {
            let outcomes = launcher.launch(target);
            assert!(matches!(&outcomes[..], [LaunchOutcome::Invalid(t)] if t == target));
            assert!(outcomes[0].message().unwrap().contains("Invalid"));
        }
    }

    #[test]
    fn browser_failure_is_reported() {
        let config = config();
        let mut browser = MockBrowser::new();
        browser
            .expect_open()
            .returning(|_| Err(anyhow::anyhow!("no display")));

        let mut launcher =
            Launcher::new(&config, browser, MockClipboard::new(), Delivery::Browser);
        let outcomes = launcher.launch("jira");

        assert!(matches!(&outcomes[..], [LaunchOutcome::Failed(..)]));
        assert!(outcomes[0].message().unwrap().contains("no display"));
    }

    #[test]
    fn default_groups_refer_to_known_links() {
        let config = LinkConfig::default();
        for keys in config.groups.values() {
            for key in keys {
                assert!(config.links.contains_key(key));
            }
        }
    }
}
