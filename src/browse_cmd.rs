//! Interactive conversation browser.

use anyhow::Result;
use dialoguer::{Select, theme::ColorfulTheme};
use time::OffsetDateTime;

use rumie_reader::{
    Config,
    GatewaySource,
    Notice,
    RefreshControl,
    RefreshError,
    ViewState,
    Viewer,
    format::{PREVIEW_CHARS, format_date, plain_text, to_local, truncate},
    render::thread_text,
    share,
};

use crate::report_copy;

pub fn run(config: &Config, gateway: &str) -> Result<()> {
    let theme = ColorfulTheme::default();
    let state = ViewState {
        filter: config.default_filter,
        ..ViewState::default()
    };
    let mut viewer = Viewer::new(GatewaySource::new(gateway), state);
    let mut control = RefreshControl::new();
    let page_url = config.page_url();

    // A failed first load is reported like any other notice; the user can refresh
    let _ = viewer.load();

    loop {
        print_notices(viewer.take_notices());
        println!("{}", viewer.status());

        let mut items: Vec<String> = viewer
            .dataset()
            .conversations()
            .iter()
            .map(|conv| {
                format!(
                    "{} · {} · {} msgs · {}",
                    conv.sender_name(),
                    format_date(conv.latest_at().map(to_local)),
                    conv.len(),
                    conv.preview()
                )
            })
            .collect();
        let conv_count = items.len();
        items.push(control.label().to_string());
        items.push("Exit".to_string());

        let selection = Select::with_theme(&theme)
            .with_prompt("Select a conversation")
            .items(&items)
            .default(0)
            .interact()?;

        if selection == conv_count {
            refresh(&mut viewer, &mut control);
            continue;
        }
        if selection > conv_count {
            break;
        }

        let chat_id = viewer.dataset().conversations()[selection].chat_id.clone();
        viewer.open_chat(&chat_id);
        thread_menu(&theme, &mut viewer, &page_url, &chat_id)?;
    }

    Ok(())
}

fn thread_menu(
    theme: &ColorfulTheme,
    viewer: &mut Viewer<GatewaySource>,
    page_url: &str,
    chat_id: &str,
) -> Result<()> {
    loop {
        let filter = viewer.state().filter;
        let now = OffsetDateTime::now_utc();
        let Some(conv) = viewer.active_conversation() else {
            return Ok(());
        };
        println!("\n{}", thread_text(conv, filter, now));

        let actions = [
            format!("Show {}", filter.toggled().label()),
            "Copy conversation link".to_string(),
            "Copy message link".to_string(),
            "Back".to_string(),
        ];
        let action = Select::with_theme(theme)
            .with_prompt("Action")
            .items(&actions)
            .default(0)
            .interact()?;

        match action {
            0 => viewer.set_filter(filter.toggled()),
            1 => {
                let url = share::conversation_url(page_url, chat_id)?;
                println!("\n{url}\n");
                report_copy(&url)?;
            }
            2 => {
                let messages: Vec<(String, String)> = viewer
                    .thread(now)
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|msg| {
                        let record_id = msg.record_id()?;
                        let text = if msg.user_message().is_empty() {
                            plain_text(msg.bot_message())
                        } else {
                            msg.user_message().to_string()
                        };
                        Some((record_id, truncate(&text, PREVIEW_CHARS)))
                    })
                    .collect();
                if messages.is_empty() {
                    println!("No messages with an R-ID in this view.");
                    continue;
                }
                let labels: Vec<String> = messages
                    .iter()
                    .map(|(id, text)| format!("{id} · {text}"))
                    .collect();
                let picked = Select::with_theme(theme)
                    .with_prompt("Message")
                    .items(&labels)
                    .default(labels.len() - 1)
                    .interact()?;
                let url = share::message_url(page_url, chat_id, &messages[picked].0)?;
                println!("\n{url}\n");
                report_copy(&url)?;
            }
            _ => return Ok(()),
        }
    }
}

fn refresh(viewer: &mut Viewer<GatewaySource>, control: &mut RefreshControl) {
    match viewer.refresh(control) {
        Ok(_) => {}
        Err(RefreshError::Busy) => viewer.push_notice(Notice::info("Refresh already running")),
        Err(RefreshError::Fetch(_)) => {}
    }
}

fn print_notices(notices: Vec<Notice>) {
    for notice in notices {
        if notice.is_error {
            eprintln!("! {}", notice.message);
        } else {
            println!("{}", notice.message);
        }
    }
}
