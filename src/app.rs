use std::{
    fs,
    io::{self, Read, Write},
    path::{Path, PathBuf},
};

use log::{info, warn};

use crate::editor::{generate_selector, FileStorage, MemoryStorage, Storage, StyleEditorSession};
use crate::error::{Error, Result};
use crate::html::parse_html;
use crate::utils::PrintableTree;

#[derive(Debug, Clone)]
pub struct Config {
    /// The page to edit.
    pub html: PathBuf,
    /// Storage file. Without one the session starts empty and nothing is kept.
    pub storage: Option<PathBuf>,
    /// Where to write the page, with the injected stylesheet, after the command ran.
    pub output_html: Option<PathBuf>,
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Prints the generated selector of every element matching the query.
    Selector { query: String },
    /// Selects the first match and prints the toolbox values as JSON.
    Inspect { query: String },
    Apply {
        query: String,
        declarations: Vec<(String, String)>,
    },
    /// Runs a script of session commands. Reads stdin without a path.
    Run { script: Option<PathBuf> },
    /// Prints the exported style sheet, or writes it to `output`.
    Export { output: Option<PathBuf> },
    Stylesheet,
    ClearPage,
    ClearAll,
    Stats,
    Tree { full: bool },
    Option {
        force_important: Option<bool>,
        debug: Option<bool>,
    },
}

#[derive(Debug)]
pub struct Runner {
    config: Config,
}

impl Runner {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn run(&self) -> Result<()> {
        let stdout = io::stdout();
        self.run_with_output(&mut stdout.lock())
    }

    pub fn run_with_output(&self, out: &mut impl Write) -> Result<()> {
        let html = fs::read_to_string(&self.config.html)?;
        let document = parse_html(&html)?;
        match &self.config.storage {
            Some(path) => {
                let storage = FileStorage::new(path);
                self.execute(StyleEditorSession::new(document, storage), out)
            }
            None => self.execute(StyleEditorSession::new(document, MemoryStorage::new()), out),
        }
    }

    fn execute<S: Storage>(
        &self,
        mut session: StyleEditorSession<S>,
        out: &mut impl Write,
    ) -> Result<()> {
        match &self.config.command {
            Command::Selector { query } => {
                let matched = session.document().query_selector_all(query)?;
                if matched.is_empty() {
                    return Err(Error::NoMatchingElement(query.clone()));
                }
                for node in matched {
                    writeln!(out, "{}", generate_selector(&node, session.config()))?;
                }
            }
            Command::Inspect { query } => {
                session.select_selector(query)?;
                print_prefill(&session, out)?;
            }
            Command::Apply {
                query,
                declarations,
            } => {
                let selector = session.select_selector(query)?;
                for (property, value) in declarations {
                    session.apply_style(property, value)?;
                }
                writeln!(out, "{}", selector)?;
            }
            Command::Run { script } => {
                let text = match script {
                    Some(path) => fs::read_to_string(path)?,
                    None => {
                        let mut text = String::new();
                        io::stdin().read_to_string(&mut text)?;
                        text
                    }
                };
                run_script(&mut session, &text, out)?;
            }
            Command::Export { output: Some(path) } => {
                let path = session.export_to(path)?;
                writeln!(out, "{}", path.display())?;
            }
            Command::Export { output: None } => write!(out, "{}", session.export_stylesheet())?,
            Command::Stylesheet => write!(out, "{}", session.injected_stylesheet_text())?,
            Command::ClearPage => {
                let removed = session.clear_current_page_styles();
                writeln!(out, "Removed {} selectors", removed)?;
            }
            Command::ClearAll => session.clear_all_styles(),
            Command::Stats => writeln!(out, "{}", session.stats())?,
            Command::Tree { full } => session.document().print(*full),
            Command::Option {
                force_important,
                debug,
            } => {
                if let Some(force_important) = force_important {
                    session.set_force_important(*force_important);
                }
                if let Some(debug) = debug {
                    session.set_debug_mode(*debug);
                }
                writeln!(out, "force-important: {}", session.force_important())?;
                writeln!(out, "debug: {}", session.debug_mode())?;
            }
        }

        if let Some(path) = &self.config.output_html {
            fs::write(path, session.document().to_html())?;
            info!("Wrote the page to {}", path.display());
        }
        Ok(())
    }
}

fn print_prefill<S: Storage>(session: &StyleEditorSession<S>, out: &mut impl Write) -> Result<()> {
    let node = session.active_element().ok_or(Error::NoActiveElement)?;
    let prefill = session.prefill(node);
    writeln!(out, "{}", serde_json::to_string_pretty(&prefill)?)?;
    Ok(())
}

/// Executes one session command per line. `#` starts a comment line.
///
/// Malformed lines abort the script. Editor errors (nothing selected, nothing to undo, ...) are
/// logged and the script goes on, as the toolbox would.
pub fn run_script<S: Storage>(
    session: &mut StyleEditorSession<S>,
    script: &str,
    out: &mut impl Write,
) -> Result<()> {
    for (i, line) in script.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (command, args) = line
            .split_once(char::is_whitespace)
            .map(|(c, a)| (c, a.trim()))
            .unwrap_or((line, ""));
        let script_error = |msg: &str| Error::Other(format!("line {}: {}", i + 1, msg));

        let result = match command {
            "select" => match session.select_selector(args) {
                Ok(selector) => {
                    writeln!(out, "{}", selector)?;
                    Ok(())
                }
                Err(e) => Err(e),
            },
            "level" => {
                let index = args
                    .parse::<usize>()
                    .map_err(|_| script_error("`level` takes a hierarchy index"))?;
                session.select_from_hierarchy(index).map(|_| ())
            }
            "hierarchy" => {
                for (index, entry) in session.hierarchy().iter().enumerate() {
                    writeln!(out, "{}: {} ({})", index, entry.display_name, entry.selector)?;
                }
                Ok(())
            }
            "apply" => {
                let (property, value) = args
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| script_error("`apply` takes a property and a value"))?;
                session.apply_style(property, value)
            }
            "undo" => session.undo_last_change().map(|_| ()),
            "reset" => match session.active_element().cloned() {
                Some(node) => session.reset_to_original(&node),
                None => Err(Error::NoActiveElement),
            },
            "deselect" => {
                session.deselect();
                Ok(())
            }
            "hide" => {
                session.hide();
                Ok(())
            }
            "clear-page" => {
                session.clear_current_page_styles();
                Ok(())
            }
            "clear-all" => {
                session.clear_all_styles();
                Ok(())
            }
            "stylesheet" => {
                write!(out, "{}", session.injected_stylesheet_text())?;
                Ok(())
            }
            "export" if args.is_empty() => {
                write!(out, "{}", session.export_stylesheet())?;
                Ok(())
            }
            "export" => session.export_to(Path::new(args)).map(|_| ()),
            "stats" => {
                writeln!(out, "{}", session.stats())?;
                Ok(())
            }
            "resolve" => match session.active_element().cloned() {
                Some(node) => {
                    writeln!(out, "{}", session.resolve_for_display(&node, args))?;
                    Ok(())
                }
                None => Err(Error::NoActiveElement),
            },
            "prefill" => print_prefill(session, out),
            "force-important" | "debug" => {
                let on = parse_switch(args).ok_or_else(|| script_error("expected `on` or `off`"))?;
                if command == "debug" {
                    session.set_debug_mode(on);
                } else {
                    session.set_force_important(on);
                }
                Ok(())
            }
            "html" => {
                writeln!(out, "{}", session.document().to_html())?;
                Ok(())
            }
            "tree" => {
                writeln!(out, "{}", session.document())?;
                Ok(())
            }
            _ => return Err(script_error(&format!("unknown command `{}`", command))),
        };

        match result {
            Err(e @ (Error::Io(_) | Error::Other(_))) => return Err(e),
            Err(e) => warn!("line {}: {}", i + 1, e),
            Ok(()) => {}
        }
    }
    Ok(())
}

fn parse_switch(value: &str) -> Option<bool> {
    match value {
        "on" | "true" => Some(true),
        "off" | "false" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::StyleRuleSet;

    const PAGE: &str = r#"<div id="main"><p class="foo ojs-bar">a</p><p class="foo">b</p></div>"#;

    fn run(script: &str) -> (StyleEditorSession<MemoryStorage>, String) {
        let mut session = StyleEditorSession::new(parse_html(PAGE).unwrap(), MemoryStorage::new());
        let mut out = Vec::new();
        run_script(&mut session, script, &mut out).unwrap();
        (session, String::from_utf8(out).unwrap())
    }

    #[test]
    fn script_edits_and_prints() {
        let (session, out) = run(
            "# pick the first paragraph
            select p
            apply color #ff0000
            apply padding 4px 8px
            undo
            stylesheet
            stats",
        );
        assert_eq!(
            out,
            "#main > p.foo\n#main > p.foo {\n  color: #ff0000 !important;\n}\n1 selectors, 1 declarations\n"
        );
        assert_eq!(session.history().get_value("#main > p.foo", "padding"), None);
    }

    #[test]
    fn editor_errors_do_not_stop_the_script() {
        let (session, out) = run("undo\napply color red\nreset\nselect p\napply color red\nstats");
        assert_eq!(out, "#main > p.foo\n1 selectors, 1 declarations\n");
        assert_eq!(session.rules().len(), 1);
    }

    #[test]
    fn malformed_lines_abort() {
        let mut session = StyleEditorSession::new(parse_html(PAGE).unwrap(), MemoryStorage::new());
        let mut out = Vec::new();
        assert!(matches!(
            run_script(&mut session, "select p\nfrobnicate", &mut out),
            Err(Error::Other(msg)) if msg == "line 2: unknown command `frobnicate`"
        ));
        assert!(run_script(&mut session, "level x", &mut out).is_err());
        assert!(run_script(&mut session, "apply color", &mut out).is_err());
    }

    #[test]
    fn hierarchy_levels() {
        let (session, out) = run("select p\nhierarchy\nlevel 0\napply margin 0");
        assert_eq!(out, "#main > p.foo\n0: div#main (#main)\n1: p.foo (#main > p.foo)\n");
        assert_eq!(session.rules().get_value("#main", "margin"), Some("0"));
    }

    #[test]
    fn runner_uses_file_storage() {
        let dir = std::env::temp_dir().join(format!("restyle-runner-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let html = dir.join("page.html");
        fs::write(&html, PAGE).unwrap();
        let storage = dir.join("state").join("storage.json");

        let runner = |command: Command| {
            let mut out = Vec::new();
            Runner::new(Config {
                html: html.clone(),
                storage: Some(storage.clone()),
                output_html: None,
                command,
            })
            .run_with_output(&mut out)
            .unwrap();
            String::from_utf8(out).unwrap()
        };

        runner(Command::Apply {
            query: "p".into(),
            declarations: vec![("fontSize".into(), "20px".into())],
        });
        assert_eq!(
            runner(Command::Stylesheet),
            "#main > p.foo {\n  font-size: 20px !important;\n}\n"
        );

        let stored = FileStorage::new(&storage)
            .get(crate::editor::storage::RULES_KEY)
            .unwrap()
            .unwrap();
        let rules: StyleRuleSet = serde_json::from_str(&stored).unwrap();
        assert_eq!(rules.get_value("#main > p.foo", "font-size"), Some("20px"));

        runner(Command::ClearAll);
        assert_eq!(runner(Command::Stats), "0 selectors, 0 declarations\n");

        fs::remove_dir_all(&dir).unwrap();
    }
}
