//! Signal-driven propagation of remote dialog state into the facade.
//!
//! One subscription per session, scoped to the session's object path. The
//! signals carry no payload beyond the `finished` code, so every handler
//! re-queries what it needs and folds it into the facade mirror. A failed
//! re-query is logged and swallowed; the next delivery retries naturally.

use {
    crate::{
        dialog::{DialogState, Finisher},
        error::Error,
        filters,
        manager::DialogManager,
        protocol::{self, AcceptMode, DialogCode},
        response::ResponseMap,
        rpc::RpcBridge,
    },
    futures_util::StreamExt,
    parking_lot::Mutex,
    std::sync::Weak,
    zbus::{MatchRule, MessageStream, message},
};

/// Everything a signal handler needs, held per session. The facade state is
/// weak so the drain thread dies with the facade instead of pinning it.
pub(crate) struct SessionContext {
    pub rpc: RpcBridge,
    pub path: zbus::zvariant::OwnedObjectPath,
    pub state: Weak<Mutex<DialogState>>,
    pub manager: DialogManager,
    pub map: ResponseMap,
    pub finisher: Finisher,
}

pub(crate) fn subscribe(conn: &zbus::Connection, ctx: SessionContext) -> crate::error::Result<()> {
    let stream = zbus::block_on(async {
        let rule = MatchRule::builder()
            .msg_type(message::Type::Signal)
            .interface(protocol::DIALOG_INTERFACE)?
            .path(ctx.path.as_str())?
            .build();
        MessageStream::for_match_rule(rule, conn, Some(24)).await
    })
    .map_err(|source| Error::CallFailed {
        method: "AddMatch".to_owned(),
        source,
    })?;
    std::thread::Builder::new()
        .name("filedialog-signals".into())
        .spawn(move || drain(stream, &ctx))
        .map_err(|_| Error::NotAvailable)?;
    Ok(())
}

fn drain(mut stream: MessageStream, ctx: &SessionContext) {
    while let Some(next) = zbus::block_on(stream.next()) {
        let Ok(msg) = next else { continue };
        let header = msg.header();
        let Some(member) = header.member() else {
            continue;
        };
        let Some(state) = ctx.state.upgrade() else {
            // Facade is gone; the subscription is inert from here on.
            break;
        };
        match member.as_str() {
            protocol::signal::FINISHED => match msg.body().deserialize::<i32>() {
                Ok(code) => on_finished(ctx, &state, DialogCode::from_code(code)),
                Err(e) => tracing::debug!("undecodable finished payload: {e}"),
            },
            protocol::signal::SELECTION_FILES_CHANGED => on_selection_changed(ctx, &state),
            protocol::signal::CURRENT_URL_CHANGED => on_current_url_changed(ctx, &state),
            protocol::signal::SELECTED_NAME_FILTER_CHANGED => on_filter_changed(ctx, &state),
            _ => {}
        }
    }
}

fn on_finished(ctx: &SessionContext, state: &Mutex<DialogState>, code: DialogCode) {
    finish(state, ctx.map, &ctx.finisher, code, || {
        ctx.rpc
            .call::<_, Vec<String>>(&ctx.path, protocol::DIALOG_INTERFACE, "selectedFiles", &())
            .map_err(|e| tracing::debug!("selectedFiles query failed after accept: {e}"))
            .ok()
    });
}

/// Drive the facade to its terminal response.
///
/// When the dialog was accepted with save intent, the chosen file's base
/// name is settled into the facade before the terminal callback observes
/// anything. Heartbeat loss funnels through here as a plain reject.
pub(crate) fn finish(
    state: &Mutex<DialogState>,
    map: ResponseMap,
    finisher: &Finisher,
    code: DialogCode,
    selected: impl FnOnce() -> Option<Vec<String>>,
) {
    if code == DialogCode::Accepted && state.lock().accept_mode() == AcceptMode::Save {
        if let Some(files) = selected() {
            if let Some(first) = files.first() {
                state.lock().current_name = base_name(first).to_owned();
            }
        }
    }
    let id = map.outcome(code);
    state.lock().outcome = Some(id);
    finisher.fire(id);
}

fn on_selection_changed(ctx: &SessionContext, state: &Mutex<DialogState>) {
    replace_selection(state, || {
        ctx.rpc
            .call::<_, Vec<String>>(&ctx.path, protocol::DIALOG_INTERFACE, "selectedUrls", &())
            .map_err(|e| tracing::debug!("selectedUrls re-query failed: {e}"))
            .ok()
    });
}

/// Replace the mirror wholesale, in delivery order. A failed re-query
/// leaves the mirror as it was.
pub(crate) fn replace_selection(
    state: &Mutex<DialogState>,
    delivered: impl FnOnce() -> Option<Vec<String>>,
) {
    if let Some(urls) = delivered() {
        state.lock().selection = urls;
    }
}

fn on_current_url_changed(ctx: &SessionContext, state: &Mutex<DialogState>) {
    // One directional, remote to facade; writing directoryUrl back here
    // would loop through the remote's own change notification.
    match ctx
        .rpc
        .get_property::<String>(&ctx.path, protocol::DIALOG_INTERFACE, "directoryUrl")
    {
        Ok(url) => state.lock().current_folder = url,
        Err(e) => tracing::debug!("directoryUrl re-read failed: {e}"),
    }
}

fn on_filter_changed(ctx: &SessionContext, state: &Mutex<DialogState>) {
    match ctx.rpc.call::<_, String>(
        &ctx.path,
        protocol::DIALOG_INTERFACE,
        "selectedNameFilter",
        &(),
    ) {
        Ok(encoded) => apply_filter_selection(state, &encoded, &ctx.manager),
        Err(e) => tracing::debug!("selectedNameFilter re-query failed: {e}"),
    }
}

/// Select the first local filter whose encoding matches; no match leaves
/// the current filter alone. Encoding runs on a snapshot so the lock is
/// never held across the MIME resolution round trips.
pub(crate) fn apply_filter_selection(
    state: &Mutex<DialogState>,
    encoded: &str,
    resolver: &dyn filters::MimeGlobResolver,
) {
    let snapshot = state.lock().filters.clone();
    if let Some(index) = filters::matching_filter(&snapshot, encoded, resolver) {
        state.lock().current_filter = Some(index);
    }
}

pub(crate) fn base_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}
