use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::{info, warn};
use serde::{Deserialize, Deserializer, Serialize};
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use tokio::sync::Mutex;

mod callback_handlers;
mod catalog;
mod helpers;
mod message_handlers;
mod session;


use callback_handlers::*;
use catalog::*;
use helpers::*;
use message_handlers::*;
use session::*;

#[derive(Debug, Clone)]
struct Config {
    token: String,
    admin_id: u64,
    payment_base_url: String,
    products_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    token_file: Option<PathBuf>,
    admin_id: AdminIdInput,
    payment_base_url: String,
    #[serde(default = "default_products_path")]
    products_path: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AdminIdInput {
    Number(u64),
    String(String),
    File { file: PathBuf },
}

fn default_products_path() -> PathBuf {
    PathBuf::from("products.json")
}

#[derive(Parser, Debug)]
struct Args {
    /// Path to the TOML config file.
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
struct Product {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(deserialize_with = "deserialize_price")]
    price: String,
}

/// Where an admin's next free-text message goes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
enum Session {
    #[default]
    Idle,
    AwaitingAdd,
    AwaitingEdit { name: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Command {
    Start,
    Help,
    Add,
    Edit,
    Delete,
    List,
    Cancel,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum CallbackAction {
    Select(String),
    Edit(String),
    Delete(String),
}

#[derive(Debug, PartialEq, Eq)]
enum ModifyOutcome {
    Applied,
    NotFound,
}

#[derive(Debug, PartialEq, Eq)]
enum SubmissionOutcome {
    Added { name: String },
    Updated { old_name: String },
    NotFound { old_name: String },
    InvalidFormat,
    NameTooLong,
    Ignored,
}

struct AppState {
    config: Config,
    write_lock: Mutex<()>,
    sessions: Mutex<Sessions>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = load_config(&args.config)?;

    info!(
        "starting storefront bot (catalog {}, admin {})",
        config.products_path.display(),
        config.admin_id
    );

    let bot = Bot::new(config.token.clone());

    let state = AppState {
        config,
        write_lock: Mutex::new(()),
        sessions: Mutex::new(Sessions::default()),
    };
    let state = std::sync::Arc::new(state);

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(handle_message))
        .branch(Update::filter_callback_query().endpoint(handle_callback));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
