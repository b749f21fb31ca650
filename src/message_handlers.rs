use super::*;

pub(super) async fn handle_message(
    bot: Bot,
    msg: Message,
    state: std::sync::Arc<AppState>,
) -> Result<()> {
    let user_id = match msg.from() {
        Some(user) => user.id.0,
        None => return Ok(()),
    };

    let text = match msg.text() {
        Some(text) => text.to_string(),
        None => return Ok(()),
    };

    if parse_command(&text).is_some() {
        let Some(command) = Command::parse(&text) else {
            // Unknown command.
            return Ok(());
        };
        if !is_authorized(&state.config, command, user_id) {
            return reject_unauthorized(&bot, msg.chat.id, user_id).await;
        }
        match command {
            Command::Start => handle_start_command(&bot, msg.chat.id, &state).await?,
            Command::Help => {
                let text = help_text(is_admin(&state.config, user_id));
                bot.send_message(msg.chat.id, text).await?;
            }
            Command::Add => handle_add_command(&bot, msg.chat.id, &state, user_id).await?,
            Command::Edit => {
                let prompt = "Select a product to edit:";
                handle_pick_command(&bot, msg.chat.id, &state, prompt, CallbackAction::Edit)
                    .await?
            }
            Command::Delete => {
                let prompt = "Select a product to delete:";
                handle_pick_command(&bot, msg.chat.id, &state, prompt, CallbackAction::Delete)
                    .await?
            }
            Command::List => handle_list_command(&bot, msg.chat.id, &state).await?,
            Command::Cancel => handle_cancel_command(&bot, msg.chat.id, &state, user_id).await?,
        }
        return Ok(());
    }

    handle_submission(&bot, msg.chat.id, &state, user_id, &text).await
}

async fn handle_start_command(
    bot: &Bot,
    chat_id: ChatId,
    state: &std::sync::Arc<AppState>,
) -> Result<()> {
    let products = load_products(&state.config.products_path);
    let (text, keyboard) = build_start_view(&products);
    send_with_keyboard(bot, chat_id, text, keyboard).await
}

async fn handle_add_command(
    bot: &Bot,
    chat_id: ChatId,
    state: &std::sync::Arc<AppState>,
    user_id: u64,
) -> Result<()> {
    state.sessions.lock().await.begin_add(user_id);
    bot.send_message(chat_id, submission_prompt(None)).await?;
    Ok(())
}

/// Shared by /edit and /delete: offers the catalog as buttons tagged with `action`.
async fn handle_pick_command(
    bot: &Bot,
    chat_id: ChatId,
    state: &std::sync::Arc<AppState>,
    prompt: &str,
    action: fn(String) -> CallbackAction,
) -> Result<()> {
    let products = load_products(&state.config.products_path);
    if products.is_empty() {
        bot.send_message(chat_id, NO_PRODUCTS_TEXT).await?;
        return Ok(());
    }
    let keyboard = build_product_keyboard(&products, action);
    bot.send_message(chat_id, prompt)
        .reply_markup(keyboard)
        .await?;
    Ok(())
}

async fn handle_list_command(
    bot: &Bot,
    chat_id: ChatId,
    state: &std::sync::Arc<AppState>,
) -> Result<()> {
    let products = load_products(&state.config.products_path);
    if products.is_empty() {
        bot.send_message(chat_id, NO_PRODUCTS_TEXT).await?;
        return Ok(());
    }
    for chunk in format_product_list(&products) {
        bot.send_message(chat_id, chunk).await?;
    }
    Ok(())
}

async fn handle_cancel_command(
    bot: &Bot,
    chat_id: ChatId,
    state: &std::sync::Arc<AppState>,
    user_id: u64,
) -> Result<()> {
    let pending = state.sessions.lock().await.take(user_id);
    let text = if pending == Session::Idle {
        "Nothing to cancel."
    } else {
        "Cancelled."
    };
    bot.send_message(chat_id, text).await?;
    Ok(())
}

async fn handle_submission(
    bot: &Bot,
    chat_id: ChatId,
    state: &std::sync::Arc<AppState>,
    user_id: u64,
    text: &str,
) -> Result<()> {
    let pending = state.sessions.lock().await.take(user_id);
    if pending == Session::Idle {
        return Ok(());
    }

    let outcome = {
        let _guard = state.write_lock.lock().await;
        apply_submission(&state.config.products_path, pending, text)?
    };

    if let Some(reply) = submission_reply(&outcome) {
        bot.send_message(chat_id, reply).await?;
    }
    Ok(())
}
