//! Shareable deep links and clipboard copy.

use anyhow::{Context, Result, bail};
use base64::{Engine, engine::general_purpose::STANDARD};
use std::borrow::Cow;
use std::io::Write;
use std::process::{Command, Stdio};
use tracing::debug;
use url::Url;

pub const CHAT_PARAM: &str = "chat";
pub const MSG_PARAM: &str = "msg";

/// Chat and message ids carried in a page URL's query string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeepLink {
    pub chat: Option<String>,
    pub msg: Option<String>,
}

impl DeepLink {
    pub fn conversation(chat_id: &str) -> Self {
        Self {
            chat: Some(chat_id.to_string()),
            msg: None,
        }
    }

    pub fn message(chat_id: &str, msg_id: &str) -> Self {
        Self {
            chat: Some(chat_id.to_string()),
            msg: Some(msg_id.to_string()),
        }
    }

    pub fn from_url(raw: &str) -> Result<Self> {
        let url = Url::parse(raw).with_context(|| format!("invalid URL: {raw}"))?;
        Ok(Self::from_pairs(url.query_pairs()))
    }

    /// Parse a bare query string, with or without the leading `?`
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self::from_pairs(url::form_urlencoded::parse(query.as_bytes()))
    }

    fn from_pairs<'a>(pairs: impl Iterator<Item = (Cow<'a, str>, Cow<'a, str>)>) -> Self {
        let mut link = Self::default();
        for (key, value) in pairs {
            if value.is_empty() {
                continue;
            }
            // First occurrence wins, like URLSearchParams.get
            match key.as_ref() {
                CHAT_PARAM if link.chat.is_none() => link.chat = Some(value.into_owned()),
                MSG_PARAM if link.msg.is_none() => link.msg = Some(value.into_owned()),
                _ => {}
            }
        }
        link
    }

    pub fn is_empty(&self) -> bool {
        self.chat.is_none() && self.msg.is_none()
    }

    /// Build `<page>?chat=<id>[&msg=<id>]`, replacing any query the page URL had
    pub fn to_url(&self, page_url: &str) -> Result<String> {
        let mut url =
            Url::parse(page_url).with_context(|| format!("invalid page URL: {page_url}"))?;
        url.set_query(None);
        url.set_fragment(None);
        if !self.is_empty() {
            let mut pairs = url.query_pairs_mut();
            if let Some(chat) = &self.chat {
                pairs.append_pair(CHAT_PARAM, chat);
            }
            if let Some(msg) = &self.msg {
                pairs.append_pair(MSG_PARAM, msg);
            }
        }
        Ok(url.to_string())
    }
}

pub fn conversation_url(page_url: &str, chat_id: &str) -> Result<String> {
    DeepLink::conversation(chat_id).to_url(page_url)
}

pub fn message_url(page_url: &str, chat_id: &str, msg_id: &str) -> Result<String> {
    DeepLink::message(chat_id, msg_id).to_url(page_url)
}

/// How a copy reached the clipboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyMethod {
    Command(&'static str),
    Osc52,
}

const CLIPBOARD_COMMANDS: [(&str, &[&str]); 5] = [
    ("pbcopy", &[]),
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
    ("clip", &[]),
];

fn pipe_to(program: &str, args: &[&str], text: &str) -> Result<()> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(text.as_bytes())?;
    }
    let status = child.wait()?;
    if !status.success() {
        bail!("{program} exited with {status}");
    }
    Ok(())
}

/// Terminal escape that asks the emulator to set its clipboard
pub fn osc52_sequence(text: &str) -> String {
    format!("\x1b]52;c;{}\x07", STANDARD.encode(text))
}

/// Copy via the first platform clipboard tool that works, falling back to an
/// OSC 52 escape on stderr.
pub fn copy_to_clipboard(text: &str) -> Result<CopyMethod> {
    for (program, args) in CLIPBOARD_COMMANDS {
        match pipe_to(program, args, text) {
            Ok(()) => return Ok(CopyMethod::Command(program)),
            Err(err) => debug!(program, %err, "clipboard command unavailable"),
        }
    }
    let mut stderr = std::io::stderr();
    stderr
        .write_all(osc52_sequence(text).as_bytes())
        .context("failed to write clipboard escape")?;
    stderr.flush()?;
    Ok(CopyMethod::Osc52)
}
