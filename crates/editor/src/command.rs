//! Console command parsing.
//!
//! Frame and transition indexes are zero-based positions: `n` names the
//! concrete frame with `order == n` or the `n`-th transition.

use reelboard_core::keyboard::{Key, KeyEvent, Modifiers};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add { url: String, thumbnail: Option<String> },
    GenerateFrame { prompt: String },
    Remove { frame: usize },
    Move { from: usize, to: usize },
    Select { frame: usize },
    SelectTransition { transition: usize },
    Prompt { transition: usize, text: String },
    Draft { transition: usize, text: String },
    Preset { transition: usize, preset_id: String },
    Keyword { transition: usize, keyword: String },
    Generate { transition: usize, prompt: Option<String> },
    Regenerate { transition: usize },
    Cancel { transition: usize },
    Key(KeyEvent),
    Show,
    Help,
    Quit,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty command")]
    Empty,

    #[error("unknown command {0:?} (try `help`)")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("{0:?} is not an index")]
    BadIndex(String),

    #[error("unknown key {0:?}")]
    BadKey(String),
}

pub const HELP: &str = "\
add <url> [thumb]        append a frame
gen-frame <prompt>       generate an image and append it as a frame
remove <n>               remove frame n
move <from> <to>         move a frame
select <n>               select frame n
select-t <n>             select transition n
prompt <n> <text>        set the prompt of transition n
draft <n> <text>         save a prompt draft, marking n for regeneration
preset <n> <preset-id>   use a preset prompt for transition n
keyword <n> <word>       append a style keyword (cinematic, slow shutter, ...)
generate <n> [prompt]    generate transition n
regen <n>                mark a ready transition for regeneration
cancel <n>               stop generating transition n
key <name>               press a key (delete, up, down, esc, ctrl+z, ...)
show                     print the timeline
quit                     leave the editor";

impl Command {
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        match verb.to_ascii_lowercase().as_str() {
            "" => Err(ParseError::Empty),
            "add" => {
                let mut parts = rest.split_whitespace();
                let url = parts.next().ok_or(ParseError::Usage("add <url> [thumb]"))?;
                Ok(Self::Add {
                    url: url.to_string(),
                    thumbnail: parts.next().map(str::to_string),
                })
            }
            "gen-frame" => Ok(Self::GenerateFrame {
                prompt: required_text(rest, "gen-frame <prompt>")?,
            }),
            "remove" | "rm" => Ok(Self::Remove {
                frame: single_index(rest, "remove <n>")?,
            }),
            "move" | "mv" => {
                let (from, to) = rest
                    .split_once(char::is_whitespace)
                    .ok_or(ParseError::Usage("move <from> <to>"))?;
                Ok(Self::Move {
                    from: index(from)?,
                    to: index(to.trim())?,
                })
            }
            "select" => Ok(Self::Select {
                frame: single_index(rest, "select <n>")?,
            }),
            "select-t" => Ok(Self::SelectTransition {
                transition: single_index(rest, "select-t <n>")?,
            }),
            "prompt" => {
                let (transition, text) = index_and_text(rest, "prompt <n> <text>")?;
                Ok(Self::Prompt { transition, text })
            }
            "draft" => {
                let (transition, text) = index_and_text(rest, "draft <n> <text>")?;
                Ok(Self::Draft { transition, text })
            }
            "preset" => {
                let (transition, preset_id) = index_and_text(rest, "preset <n> <preset-id>")?;
                Ok(Self::Preset {
                    transition,
                    preset_id,
                })
            }
            "keyword" | "kw" => {
                let (transition, keyword) = index_and_text(rest, "keyword <n> <word>")?;
                Ok(Self::Keyword {
                    transition,
                    keyword: keyword.to_ascii_lowercase(),
                })
            }
            "generate" | "gen" => {
                let (n, prompt) = match rest.split_once(char::is_whitespace) {
                    Some((n, prompt)) => (n, Some(prompt.trim().to_string())),
                    None => (rest, None),
                };
                if n.is_empty() {
                    return Err(ParseError::Usage("generate <n> [prompt]"));
                }
                Ok(Self::Generate {
                    transition: index(n)?,
                    prompt,
                })
            }
            "regen" => Ok(Self::Regenerate {
                transition: single_index(rest, "regen <n>")?,
            }),
            "cancel" => Ok(Self::Cancel {
                transition: single_index(rest, "cancel <n>")?,
            }),
            "key" => {
                if rest.is_empty() {
                    return Err(ParseError::Usage("key <name>"));
                }
                parse_key(rest).map(Self::Key)
            }
            "show" | "ls" => Ok(Self::Show),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" | "q" => Ok(Self::Quit),
            other => Err(ParseError::Unknown(other.to_string())),
        }
    }
}

fn index(raw: &str) -> Result<usize, ParseError> {
    raw.parse().map_err(|_| ParseError::BadIndex(raw.to_string()))
}

fn single_index(rest: &str, usage: &'static str) -> Result<usize, ParseError> {
    match rest.split_whitespace().collect::<Vec<_>>().as_slice() {
        [n] => index(n),
        _ => Err(ParseError::Usage(usage)),
    }
}

fn required_text(rest: &str, usage: &'static str) -> Result<String, ParseError> {
    if rest.is_empty() {
        Err(ParseError::Usage(usage))
    } else {
        Ok(rest.to_string())
    }
}

fn index_and_text(rest: &str, usage: &'static str) -> Result<(usize, String), ParseError> {
    let (n, text) = rest
        .split_once(char::is_whitespace)
        .ok_or(ParseError::Usage(usage))?;
    Ok((index(n)?, required_text(text.trim(), usage)?))
}

/// Parse `ctrl+shift+z`, `cmd+a`, `delete`, `up`, ...
pub fn parse_key(raw: &str) -> Result<KeyEvent, ParseError> {
    let lowered = raw.trim().to_ascii_lowercase();
    let mut parts: Vec<&str> = lowered.split('+').map(str::trim).collect();
    let key_name = parts.pop().unwrap_or_default();

    let mut modifiers = Modifiers::default();
    for part in parts {
        match part {
            "ctrl" | "control" => modifiers.ctrl = true,
            "cmd" | "meta" | "super" => modifiers.meta = true,
            "shift" => modifiers.shift = true,
            "alt" | "option" => modifiers.alt = true,
            _ => return Err(ParseError::BadKey(raw.to_string())),
        }
    }

    let key = match key_name {
        "delete" | "del" => Key::Delete,
        "backspace" => Key::Backspace,
        "up" | "arrowup" => Key::ArrowUp,
        "down" | "arrowdown" => Key::ArrowDown,
        "esc" | "escape" => Key::Escape,
        single if single.chars().count() == 1 => {
            Key::Char(single.chars().next().ok_or_else(|| ParseError::BadKey(raw.to_string()))?)
        }
        _ => return Err(ParseError::BadKey(raw.to_string())),
    };

    Ok(KeyEvent::new(key).with_modifiers(modifiers))
}
