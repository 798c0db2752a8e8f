//! Rendering: the standalone HTML page and plain terminal text.
//!
//! The page carries every conversation's thread so the sidebar, the filter
//! bar and deep links keep working without a server round trip. Grouping,
//! ordering, window membership and sanitizing all happen here; the embedded
//! script only toggles visibility and copies links.

use anyhow::Result;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use time::OffsetDateTime;

use crate::conversation::Conversation;
use crate::filter::TimeFilter;
use crate::format::{format_date, format_date_time, format_html_message, plain_text, to_local};
use crate::records::MessageRecord;
use crate::share::{conversation_url, message_url};
use crate::viewer::{Dataset, Notice, ViewState};

pub const TITLE: &str = "Rūmie Reader";

/// Inputs for a page beyond the dataset and view state
#[derive(Debug, Clone, Copy)]
pub struct PageOptions<'a> {
    /// Where the page will be served from; share links are built on it
    pub page_url: &'a str,
    pub status: &'a str,
    pub notices: &'a [Notice],
    pub now: OffsetDateTime,
}

fn local_date(record: &MessageRecord) -> String {
    format_date(record.created_at().map(to_local))
}

fn local_date_time(record: &MessageRecord) -> String {
    format_date_time(record.created_at().map(to_local))
}

pub fn render_page(dataset: &Dataset, state: &ViewState, opts: &PageOptions<'_>) -> Result<Markup> {
    let active = state
        .active_chat
        .as_deref()
        .and_then(|id| dataset.conversation(id));

    let mut threads = Vec::with_capacity(dataset.conversations().len());
    for conv in dataset.conversations() {
        let is_active = active.is_some_and(|a| a.chat_id == conv.chat_id);
        threads.push(render_thread(conv, state, is_active, opts)?);
    }

    Ok(html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (TITLE) }
                style { (PreEscaped(STYLE)) }
            }
            body {
                div.app {
                    aside.sidebar {
                        div.sidebar-header {
                            h1 { (TITLE) }
                            div #count .count { (opts.status) }
                        }
                        (render_sidebar(dataset.conversations(), active.map(|c| c.chat_id.as_str())))
                    }
                    main #content {
                        @if active.is_none() {
                            div.empty-state { "Select a conversation" }
                        }
                        @for thread in &threads {
                            (thread)
                        }
                    }
                }
                div #toasts {
                    @for notice in opts.notices {
                        div.toast.error[notice.is_error] { (notice.message) }
                    }
                }
                script { (PreEscaped(SCRIPT)) }
            }
        }
    })
}

/// One preview entry per conversation; at most one marked active
pub fn render_sidebar(conversations: &[Conversation], active: Option<&str>) -> Markup {
    html! {
        div #convs {
            @for (index, conv) in conversations.iter().enumerate() {
                div.conv.active[active == Some(conv.chat_id.as_str())]
                    data-chat=(conv.chat_id)
                    style=(format!("animation-delay: {:.2}s", index as f64 * 0.05)) {
                    div.conv-name { (conv.sender_name()) }
                    div.conv-preview { (conv.preview()) }
                    div.conv-meta {
                        span { (local_date(conv.latest())) }
                        span { (conv.len()) " msgs" }
                    }
                }
            }
        }
    }
}

/// Header, filter bar and message groups for one conversation.
///
/// Every message is rendered oldest first; the ones outside the recent window
/// are tagged so the filter bar can hide them without re-rendering.
pub fn render_thread(
    conv: &Conversation,
    state: &ViewState,
    is_active: bool,
    opts: &PageOptions<'_>,
) -> Result<Markup> {
    let recent_count = conv.thread(TimeFilter::Recent, opts.now).len();
    let all_count = conv.len();
    let shown = match state.filter {
        TimeFilter::Recent => recent_count,
        TimeFilter::All => all_count,
    };
    let share_url = conversation_url(opts.page_url, &conv.chat_id)?;
    let focus = if is_active {
        state.focus_message.as_deref()
    } else {
        None
    };

    let mut groups = Vec::with_capacity(all_count);
    for (idx, msg) in conv.thread(TimeFilter::All, opts.now).into_iter().enumerate() {
        let in_window = TimeFilter::Recent.includes(msg, opts.now);
        groups.push(render_message(conv, msg, idx, in_window, focus, opts)?);
    }

    Ok(html! {
        section.thread data-chat=(conv.chat_id) hidden[!is_active] {
            div.chat-header {
                div.chat-header-left {
                    div.chat-name {
                        (conv.sender_name())
                        @if let Some(handle) = conv.username() {
                            " "
                            span.handle { "@" (handle) }
                        }
                    }
                    div.chat-id {
                        "Chat ID: " (conv.chat_id) " • "
                        span.msg-count data-recent=(recent_count) data-all=(all_count) { (shown) }
                        " messages"
                    }
                }
                button.share-btn data-share-url=(share_url) data-toast="Link copied to clipboard! ✓" {
                    "🔗 Share Conversation"
                }
            }
            div.filter-bar {
                span.filter-label { "Show:" }
                @for filter in [TimeFilter::Recent, TimeFilter::All] {
                    button.filter-btn.active[filter == state.filter] data-filter=(filter.as_str()) {
                        (filter.label())
                    }
                }
            }
            div.messages data-filter=(state.filter.as_str()) {
                @for group in &groups {
                    (group)
                }
            }
        }
    })
}

fn render_message(
    conv: &Conversation,
    msg: &MessageRecord,
    idx: usize,
    in_window: bool,
    focus: Option<&str>,
    opts: &PageOptions<'_>,
) -> Result<Markup> {
    let record_id = msg.record_id().unwrap_or_default();
    let focused = focus.is_some_and(|f| f == record_id);
    let share_url = message_url(opts.page_url, &conv.chat_id, &record_id)?;
    let recent = if in_window { "true" } else { "false" };

    Ok(html! {
        div.msg-group.focus[focused]
            id=(format!("msg-{record_id}"))
            data-recent=(recent)
            style=(format!("animation-delay: {:.2}s", idx as f64 * 0.03)) {
            div.user-msg {
                div.user-bubble {
                    (msg.user_message())
                    div.msg-time { (local_date_time(msg)) }
                }
            }
            div.bot-msg {
                div.bot-bubble {
                    (PreEscaped(format_html_message(msg.bot_message())))
                    @if let Some(category) = msg.category() {
                        div.category { (category) }
                    }
                    div.msg-time { "R-ID: " (record_id) }
                    button.share-msg-btn data-share-url=(share_url) data-toast="Message link copied! ✓" {
                        "🔗 Share this message"
                    }
                }
            }
        }
    })
}

/// Sidebar as terminal text
pub fn conversation_list_text(dataset: &Dataset, status: &str) -> String {
    let mut out = format!("{status}\n");
    for conv in dataset.conversations() {
        out.push_str(&format!(
            "\n[{}] {} · {} · {} msgs\n",
            conv.chat_id,
            conv.sender_name(),
            local_date(conv.latest()),
            conv.len()
        ));
        let preview = conv.preview();
        if !preview.is_empty() {
            out.push_str(&format!("    {preview}\n"));
        }
    }
    out
}

/// Open thread as terminal text, oldest first
pub fn thread_text(conv: &Conversation, filter: TimeFilter, now: OffsetDateTime) -> String {
    let messages = conv.thread(filter, now);
    let mut out = String::new();

    out.push_str(conv.sender_name());
    if let Some(handle) = conv.username() {
        out.push_str(&format!(" @{handle}"));
    }
    out.push('\n');
    out.push_str(&format!(
        "Chat ID: {} • {} messages ({})\n",
        conv.chat_id,
        messages.len(),
        filter.label()
    ));

    for msg in messages {
        out.push_str(&format!(
            "\n[{}] {}\n",
            local_date_time(msg),
            msg.user_message()
        ));
        for line in plain_text(msg.bot_message()).lines() {
            out.push_str(&format!("  > {line}\n"));
        }
        let record_id = msg.record_id().unwrap_or_default();
        match msg.category() {
            Some(category) => out.push_str(&format!("  [{category}] R-ID: {record_id}\n")),
            None => out.push_str(&format!("  R-ID: {record_id}\n")),
        }
    }
    out
}

const STYLE: &str = r#"
* { margin: 0; padding: 0; box-sizing: border-box; }
:root {
    --bg: #1a1a1a; --panel: #232323; --border: #333; --text: #e0e0e0;
    --text-muted: #8a8a8a; --accent: #0084ff; --bot: #2d2d2d; --error: #ff6b6b;
}
body {
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
    background: var(--bg); color: var(--text); height: 100vh;
}
.app { display: flex; height: 100vh; }
.sidebar { width: 320px; border-right: 1px solid var(--border); overflow-y: auto; background: var(--panel); }
.sidebar-header { padding: 1rem; border-bottom: 1px solid var(--border); }
.sidebar-header h1 { font-size: 1.2rem; margin-bottom: 0.25rem; }
.count { font-size: 0.8rem; color: var(--text-muted); }
.conv { padding: 0.75rem 1rem; border-bottom: 1px solid var(--border); cursor: pointer; animation: fadeIn 0.3s ease both; }
.conv:hover { background: #2a2a2a; }
.conv.active { background: #1f3347; border-left: 3px solid var(--accent); }
.conv-name { font-weight: 600; }
.conv-preview { font-size: 0.85rem; color: var(--text-muted); margin: 0.2rem 0; }
.conv-meta { display: flex; justify-content: space-between; font-size: 0.75rem; color: var(--text-muted); }
#content { flex: 1; overflow-y: auto; padding: 1.5rem; }
.empty-state { color: var(--text-muted); text-align: center; margin-top: 30vh; }
.chat-header { display: flex; justify-content: space-between; align-items: center; margin-bottom: 1rem; }
.chat-name { font-size: 1.3rem; font-weight: 600; }
.handle { color: var(--text-muted); font-size: 0.7em; }
.chat-id { font-size: 0.8rem; color: var(--text-muted); }
.share-btn, .share-msg-btn, .filter-btn {
    background: none; border: 1px solid var(--border); color: var(--text);
    border-radius: 6px; padding: 0.35rem 0.7rem; cursor: pointer;
}
.share-msg-btn { font-size: 0.7rem; margin-top: 0.4rem; padding: 0.2rem 0.5rem; }
.filter-bar { display: flex; gap: 0.5rem; align-items: center; margin-bottom: 1rem; }
.filter-label { color: var(--text-muted); font-size: 0.85rem; }
.filter-btn.active { background: var(--accent); border-color: var(--accent); }
.messages[data-filter="recent"] .msg-group[data-recent="false"] { display: none; }
.msg-group { margin-bottom: 1.25rem; animation: fadeIn 0.3s ease both; border-radius: 12px; }
.user-msg { display: flex; justify-content: flex-end; }
.user-bubble { background: var(--accent); color: #fff; padding: 0.6rem 0.9rem; border-radius: 12px; max-width: 70%; white-space: pre-wrap; }
.bot-msg { display: flex; margin-top: 0.5rem; }
.bot-bubble { background: var(--bot); padding: 0.6rem 0.9rem; border-radius: 12px; max-width: 70%; }
.bot-bubble a { color: #6cb6ff; }
.category { display: inline-block; margin-top: 0.4rem; font-size: 0.7rem; padding: 0.1rem 0.5rem; border-radius: 999px; background: #3a3a3a; }
.msg-time { font-size: 0.7rem; color: var(--text-muted); margin-top: 0.3rem; }
.user-bubble .msg-time { color: rgba(255,255,255,0.75); }
.toast { position: fixed; bottom: 1.5rem; right: 1.5rem; background: #2e7d32; color: #fff; padding: 0.7rem 1rem; border-radius: 8px; animation: toastIn 0.3s ease; }
.toast.error { background: var(--error); }
@keyframes fadeIn { from { opacity: 0; transform: translateY(4px); } to { opacity: 1; transform: none; } }
@keyframes toastIn { from { opacity: 0; transform: translateY(10px); } to { opacity: 1; transform: none; } }
@keyframes toastOut { to { opacity: 0; transform: translateY(10px); } }
@keyframes highlight { from { background: rgba(0, 132, 255, 0.35); } to { background: transparent; } }
"#;

const SCRIPT: &str = r#"
(function () {
    function showToast(message, isError) {
        document.querySelectorAll('.toast').forEach(function (t) { t.remove(); });
        var toast = document.createElement('div');
        toast.className = 'toast' + (isError ? ' error' : '');
        toast.textContent = message;
        document.body.appendChild(toast);
        fadeToast(toast);
    }

    function fadeToast(toast) {
        setTimeout(function () {
            toast.style.animation = 'toastOut 0.4s ease forwards';
            setTimeout(function () { toast.remove(); }, 400);
        }, 3000);
    }

    function copyLink(text, message) {
        function fallback() {
            var area = document.createElement('textarea');
            area.value = text;
            area.style.cssText = 'position:fixed;opacity:0';
            document.body.appendChild(area);
            area.select();
            try {
                document.execCommand('copy');
                showToast(message);
            } catch (e) {
                showToast('Could not copy link', true);
            }
            document.body.removeChild(area);
        }
        if (navigator.clipboard && navigator.clipboard.writeText) {
            navigator.clipboard.writeText(text).then(function () { showToast(message); }, fallback);
        } else {
            fallback();
        }
    }

    function showChat(chatId) {
        var found = null;
        document.querySelectorAll('.thread').forEach(function (section) {
            var match = section.dataset.chat === chatId;
            section.hidden = !match;
            if (match) found = section;
        });
        if (!found) return null;
        var empty = document.querySelector('.empty-state');
        if (empty) empty.remove();
        document.querySelectorAll('.conv').forEach(function (el) {
            el.classList.toggle('active', el.dataset.chat === chatId);
        });
        return found;
    }

    function setFilter(filter) {
        document.querySelectorAll('.messages').forEach(function (m) { m.dataset.filter = filter; });
        document.querySelectorAll('.filter-btn').forEach(function (b) {
            b.classList.toggle('active', b.dataset.filter === filter);
        });
        document.querySelectorAll('.msg-count').forEach(function (c) {
            c.textContent = c.dataset[filter];
        });
    }

    function focusMessage(el) {
        setTimeout(function () {
            el.scrollIntoView({ behavior: 'smooth', block: 'center' });
            el.style.animation = 'highlight 2s ease-out';
        }, 300);
    }

    document.querySelectorAll('.conv').forEach(function (el) {
        el.addEventListener('click', function () { showChat(el.dataset.chat); });
    });
    document.querySelectorAll('.filter-btn').forEach(function (b) {
        b.addEventListener('click', function () { setFilter(b.dataset.filter); });
    });
    document.querySelectorAll('[data-share-url]').forEach(function (b) {
        b.addEventListener('click', function () { copyLink(b.dataset.shareUrl, b.dataset.toast); });
    });
    document.querySelectorAll('.toast').forEach(fadeToast);

    var params = new URLSearchParams(window.location.search);
    var chat = params.get('chat');
    var msg = params.get('msg');
    if (chat && showChat(chat)) {
        var target = msg ? document.getElementById('msg-' + msg) : null;
        if (target) focusMessage(target);
    } else {
        var focused = document.querySelector('.thread:not([hidden]) .msg-group.focus');
        if (focused) focusMessage(focused);
    }
    var active = document.querySelector('.conv.active');
    if (active) {
        setTimeout(function () { active.scrollIntoView({ behavior: 'smooth', block: 'center' }); }, 100);
    }
})();
"#;
