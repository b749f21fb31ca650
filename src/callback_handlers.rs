use super::*;

pub(super) async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    state: std::sync::Arc<AppState>,
) -> Result<()> {
    bot.answer_callback_query(q.id.clone()).await?;

    let Some(message) = q.message.as_ref() else {
        return Ok(());
    };
    let Some(action) = q.data.as_deref().and_then(parse_callback_data) else {
        return Ok(());
    };
    let chat_id = message.chat.id;
    let user_id = q.from.id.0;

    if !is_action_authorized(&state.config, &action, user_id) {
        return reject_unauthorized(&bot, chat_id, user_id).await;
    }

    match action {
        CallbackAction::Select(name) => handle_select_callback(&bot, chat_id, &state, &name).await?,
        CallbackAction::Edit(name) => {
            handle_edit_callback(&bot, chat_id, &state, user_id, &name).await?
        }
        CallbackAction::Delete(name) => {
            handle_delete_callback(&bot, chat_id, &state, user_id, &name).await?
        }
    }

    Ok(())
}

async fn handle_select_callback(
    bot: &Bot,
    chat_id: ChatId,
    state: &std::sync::Arc<AppState>,
    name: &str,
) -> Result<()> {
    let products = load_products(&state.config.products_path);
    // A stale button for a removed product gets no reply.
    if let Some(product) = find_product(&products, name) {
        let text = format_product_details(product, &state.config.payment_base_url);
        bot.send_message(chat_id, text).await?;
    }
    Ok(())
}

async fn handle_edit_callback(
    bot: &Bot,
    chat_id: ChatId,
    state: &std::sync::Arc<AppState>,
    user_id: u64,
    name: &str,
) -> Result<()> {
    let products = load_products(&state.config.products_path);
    if find_product(&products, name).is_none() {
        bot.send_message(chat_id, PRODUCT_NOT_FOUND_TEXT).await?;
        return Ok(());
    }
    state.sessions.lock().await.begin_edit(user_id, name);
    bot.send_message(chat_id, submission_prompt(Some(name))).await?;
    Ok(())
}

async fn handle_delete_callback(
    bot: &Bot,
    chat_id: ChatId,
    state: &std::sync::Arc<AppState>,
    user_id: u64,
    name: &str,
) -> Result<()> {
    let outcome = {
        let _guard = state.write_lock.lock().await;
        delete_products_as(&state.config, user_id, name)?
    };
    let text = match outcome {
        Some(ModifyOutcome::Applied) => format!("🗑 Product '{}' deleted successfully!", name),
        Some(ModifyOutcome::NotFound) => PRODUCT_NOT_FOUND_TEXT.to_string(),
        None => return reject_unauthorized(bot, chat_id, user_id).await,
    };
    bot.send_message(chat_id, text).await?;
    Ok(())
}
