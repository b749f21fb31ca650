use super::*;

pub(super) const UNAUTHORIZED_TEXT: &str = "🚫 You are not authorized.";
pub(super) const NO_PRODUCTS_TEXT: &str = "No products found.";
pub(super) const PRODUCT_NOT_FOUND_TEXT: &str = "Product not found.";
pub(super) const SUBMISSION_FORMAT: &str = "name | description | price";

/// Telegram rejects a whole keyboard when any button's data exceeds this.
pub(super) const MAX_CALLBACK_DATA_BYTES: usize = 64;
/// Telegram's message text limit, counted in UTF-16 code units.
pub(super) const MAX_MESSAGE_UNITS: usize = 4096;

const PRODUCT_TAG: &str = "product";
const EDIT_TAG: &str = "edit";
const DELETE_TAG: &str = "delete";

pub(super) fn load_config(path: &Path) -> Result<Config> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let config_dir = path.parent().unwrap_or_else(|| Path::new("."));
    parse_config(&contents, config_dir)
}

pub(super) fn parse_config(contents: &str, config_dir: &Path) -> Result<Config> {
    let config_file: ConfigFile = toml::from_str(contents).context("parse config")?;
    let token = resolve_token(
        config_file.token.as_deref(),
        config_file.token_file.as_deref(),
        config_dir,
    )?;
    let admin_id = resolve_admin_id(config_file.admin_id, config_dir)?;
    let payment_base_url = config_file.payment_base_url.trim().to_string();
    if payment_base_url.is_empty() {
        return Err(anyhow!("payment_base_url is empty"));
    }
    Ok(Config {
        token,
        admin_id,
        payment_base_url,
        products_path: resolve_config_path(&config_file.products_path, config_dir),
    })
}

pub(super) fn resolve_token(
    token: Option<&str>,
    token_file: Option<&Path>,
    config_dir: &Path,
) -> Result<String> {
    let token = match (token, token_file) {
        (Some(token), _) => token.trim().to_string(),
        (None, Some(file)) => {
            let path = resolve_config_path(file, config_dir);
            fs::read_to_string(&path)
                .with_context(|| format!("read token file {}", path.display()))?
                .trim()
                .to_string()
        }
        (None, None) => return Err(anyhow!("config needs token or token_file")),
    };
    if token.is_empty() {
        return Err(anyhow!("bot token is empty"));
    }
    Ok(token)
}

pub(super) fn resolve_admin_id(input: AdminIdInput, config_dir: &Path) -> Result<u64> {
    match input {
        AdminIdInput::Number(value) => Ok(value),
        AdminIdInput::String(raw) => parse_admin_id_value(&raw),
        AdminIdInput::File { file } => {
            let path = resolve_config_path(&file, config_dir);
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("read admin_id file {}", path.display()))?;
            parse_admin_id_value(&contents)
                .with_context(|| format!("parse admin_id from {}", path.display()))
        }
    }
}

pub(super) fn parse_admin_id_value(raw: &str) -> Result<u64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("admin_id is empty"));
    }
    trimmed.parse::<u64>().context("parse admin_id")
}

pub(super) fn resolve_config_path(path: &Path, config_dir: &Path) -> PathBuf {
    if path.is_relative() {
        config_dir.join(path)
    } else {
        path.to_path_buf()
    }
}

pub(super) fn parse_command(text: &str) -> Option<&str> {
    if !text.starts_with('/') {
        return None;
    }
    let first = text.split_whitespace().next()?;
    let cmd = first.trim_start_matches('/');
    Some(cmd.split('@').next().unwrap_or(cmd))
}

impl Command {
    pub(super) fn parse(text: &str) -> Option<Self> {
        let command = match parse_command(text)? {
            "start" => Command::Start,
            "help" => Command::Help,
            "add" => Command::Add,
            "edit" => Command::Edit,
            "delete" => Command::Delete,
            "list" => Command::List,
            "cancel" => Command::Cancel,
            _ => return None,
        };
        Some(command)
    }

    pub(super) fn requires_admin(self) -> bool {
        !matches!(self, Command::Start | Command::Help)
    }
}

impl CallbackAction {
    pub(super) fn requires_admin(&self) -> bool {
        !matches!(self, CallbackAction::Select(_))
    }
}

pub(super) fn is_admin(config: &Config, user_id: u64) -> bool {
    user_id == config.admin_id
}

/// The single admin check shared by commands and button presses.
pub(super) fn authorize(config: &Config, user_id: u64, requires_admin: bool) -> bool {
    !requires_admin || is_admin(config, user_id)
}

pub(super) fn is_authorized(config: &Config, command: Command, user_id: u64) -> bool {
    authorize(config, user_id, command.requires_admin())
}

pub(super) fn is_action_authorized(config: &Config, action: &CallbackAction, user_id: u64) -> bool {
    authorize(config, user_id, action.requires_admin())
}

pub(super) async fn reject_unauthorized(bot: &Bot, chat_id: ChatId, user_id: u64) -> Result<()> {
    warn!("rejected admin action from user {}", user_id);
    bot.send_message(chat_id, UNAUTHORIZED_TEXT).await?;
    Ok(())
}

pub(super) fn callback_data(action: &CallbackAction) -> String {
    match action {
        CallbackAction::Select(name) => format!("{}:{}", PRODUCT_TAG, name),
        CallbackAction::Edit(name) => format!("{}:{}", EDIT_TAG, name),
        CallbackAction::Delete(name) => format!("{}:{}", DELETE_TAG, name),
    }
}

pub(super) fn parse_callback_data(data: &str) -> Option<CallbackAction> {
    let (tag, name) = data.split_once(':')?;
    let name = name.to_string();
    match tag {
        PRODUCT_TAG => Some(CallbackAction::Select(name)),
        EDIT_TAG => Some(CallbackAction::Edit(name)),
        DELETE_TAG => Some(CallbackAction::Delete(name)),
        _ => None,
    }
}

/// Whether every button kind can carry `name` within Telegram's limit.
pub(super) fn name_fits_callback_data(name: &str) -> bool {
    [PRODUCT_TAG, EDIT_TAG, DELETE_TAG]
        .iter()
        .all(|tag| tag.len() + 1 + name.len() <= MAX_CALLBACK_DATA_BYTES)
}

pub(super) fn max_name_bytes() -> usize {
    let longest_tag = [PRODUCT_TAG, EDIT_TAG, DELETE_TAG]
        .iter()
        .map(|tag| tag.len())
        .max()
        .unwrap_or(0);
    MAX_CALLBACK_DATA_BYTES - longest_tag - 1
}

/// One button per product, in catalog order. Products whose name cannot fit
/// in callback data (hand-edited catalogs) are left out so the rest still send.
pub(super) fn build_product_keyboard(
    products: &[Product],
    action: fn(String) -> CallbackAction,
) -> InlineKeyboardMarkup {
    let rows = products
        .iter()
        .filter_map(|product| {
            let data = callback_data(&action(product.name.clone()));
            if data.len() > MAX_CALLBACK_DATA_BYTES {
                warn!("skipping button for '{}': name too long", product.name);
                return None;
            }
            Some(vec![InlineKeyboardButton::callback(product.name.clone(), data)])
        })
        .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(rows)
}

pub(super) fn build_start_view(products: &[Product]) -> (String, Option<InlineKeyboardMarkup>) {
    if products.is_empty() {
        return (
            "Welcome to the shop! No products are available yet.".to_string(),
            None,
        );
    }
    (
        "Welcome to the shop! Select a product:".to_string(),
        Some(build_product_keyboard(products, CallbackAction::Select)),
    )
}

pub(super) fn help_text(is_admin: bool) -> String {
    let mut lines = vec![
        "/start - browse products".to_string(),
        "/help - show this message".to_string(),
    ];
    if is_admin {
        lines.push(format!("/add - add a product ({})", SUBMISSION_FORMAT));
        lines.push("/edit - edit a product".to_string());
        lines.push("/delete - delete a product".to_string());
        lines.push("/list - list all products".to_string());
        lines.push("/cancel - abandon a pending add or edit".to_string());
    }
    lines.join("\n")
}

pub(super) fn payment_link(base_url: &str, price: &str) -> String {
    let price = price.trim().replace(',', ".");
    format!("{}/{}", base_url.trim_end_matches('/'), price)
}

pub(super) fn format_product_details(product: &Product, base_url: &str) -> String {
    format!(
        "🛍 {}\n💬 {}\n💲 {}\n\n💰 Pay now: {}\nAfter payment, send proof of transaction.",
        product.name,
        product.description,
        product.price,
        payment_link(base_url, &product.price)
    )
}

/// Renders the catalog as one or more messages, each within Telegram's limit.
pub(super) fn format_product_list(products: &[Product]) -> Vec<String> {
    let lines = products
        .iter()
        .map(|product| format!("🛍 {} - 💲{}", product.name, product.price));
    chunk_lines(std::iter::once("📝 Product List:".to_string()).chain(lines))
}

pub(super) fn chunk_lines(lines: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_units = 0;
    for line in lines {
        let line = truncate_to_units(&line, MAX_MESSAGE_UNITS);
        let units = line.encode_utf16().count();
        if !current.is_empty() && current_units + 1 + units > MAX_MESSAGE_UNITS {
            chunks.push(std::mem::take(&mut current));
            current_units = 0;
        }
        if !current.is_empty() {
            current.push('\n');
            current_units += 1;
        }
        current.push_str(&line);
        current_units += units;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn truncate_to_units(line: &str, max_units: usize) -> String {
    let mut units = 0;
    line.chars()
        .take_while(|c| {
            units += c.len_utf16();
            units <= max_units
        })
        .collect()
}

pub(super) fn submission_prompt(editing: Option<&str>) -> String {
    match editing {
        Some(name) => format!("Send new details for {} as: {}", name, SUBMISSION_FORMAT),
        None => format!("Enter the product details as: {}", SUBMISSION_FORMAT),
    }
}

pub(super) fn invalid_format_text() -> String {
    format!("Invalid format. Use: {}", SUBMISSION_FORMAT)
}

pub(super) fn submission_reply(outcome: &SubmissionOutcome) -> Option<String> {
    match outcome {
        SubmissionOutcome::Added { name } => {
            Some(format!("✅ Product '{}' added successfully!", name))
        }
        SubmissionOutcome::Updated { old_name } => {
            Some(format!("✅ Product '{}' updated successfully!", old_name))
        }
        SubmissionOutcome::NotFound { .. } => Some(PRODUCT_NOT_FOUND_TEXT.to_string()),
        SubmissionOutcome::InvalidFormat => Some(invalid_format_text()),
        SubmissionOutcome::NameTooLong => Some(format!(
            "Product name is too long. Use at most {} bytes.",
            max_name_bytes()
        )),
        SubmissionOutcome::Ignored => None,
    }
}

pub(super) async fn send_with_keyboard(
    bot: &Bot,
    chat_id: ChatId,
    text: impl Into<String>,
    keyboard: Option<InlineKeyboardMarkup>,
) -> Result<()> {
    let request = bot.send_message(chat_id, text.into());
    match keyboard {
        Some(keyboard) => request.reply_markup(keyboard).await?,
        None => request.await?,
    };
    Ok(())
}
