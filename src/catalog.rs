use super::*;

/// Reads the catalog. Anything short of a readable JSON list of products
/// counts as an empty catalog.
pub(super) fn load_products(path: &Path) -> Vec<Product> {
    if !path.exists() {
        return Vec::new();
    }
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            warn!("read catalog {}: {}", path.display(), err);
            return Vec::new();
        }
    };
    match serde_json::from_str::<Vec<Product>>(&contents) {
        Ok(products) => products,
        Err(err) => {
            warn!("parse catalog {}: {}", path.display(), err);
            Vec::new()
        }
    }
}

pub(super) fn save_products(path: &Path, products: &[Product]) -> Result<()> {
    let mut data = serde_json::to_string_pretty(products).context("encode catalog")?;
    data.push('\n');
    atomic_write(path, data.as_bytes())
}

pub(super) fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).with_context(|| format!("create dir {}", dir.display()))?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("create temp file in {}", dir.display()))?;
    tmp.write_all(data).context("write temp file")?;
    tmp.flush().context("flush temp file")?;
    tmp.as_file_mut().sync_all().context("sync temp file")?;
    tmp.persist(path)
        .map_err(|e| anyhow!("persist temp file: {}", e))?;
    Ok(())
}

pub(super) fn find_product<'a>(products: &'a [Product], name: &str) -> Option<&'a Product> {
    products.iter().find(|product| product.name == name)
}

pub(super) fn add_product_sync(path: &Path, product: Product) -> Result<()> {
    let mut products = load_products(path);
    info!("adding product '{}'", product.name);
    products.push(product);
    save_products(path, &products)
}

pub(super) fn update_product_sync(
    path: &Path,
    old_name: &str,
    product: Product,
) -> Result<ModifyOutcome> {
    let mut products = load_products(path);
    let Some(existing) = products.iter_mut().find(|p| p.name == old_name) else {
        return Ok(ModifyOutcome::NotFound);
    };
    info!("updating product '{}' -> '{}'", old_name, product.name);
    *existing = product;
    save_products(path, &products)?;
    Ok(ModifyOutcome::Applied)
}

pub(super) fn delete_products_sync(path: &Path, name: &str) -> Result<ModifyOutcome> {
    let mut products = load_products(path);
    let before = products.len();
    products.retain(|p| p.name != name);
    let removed = before - products.len();
    if removed == 0 {
        return Ok(ModifyOutcome::NotFound);
    }
    info!("deleted {} product(s) named '{}'", removed, name);
    save_products(path, &products)?;
    Ok(ModifyOutcome::Applied)
}

/// Splits `name | description | price` into a product.
pub(super) fn parse_submission(text: &str) -> Option<Product> {
    let fields: Vec<&str> = text.split('|').map(str::trim).collect();
    let [name, description, price] = fields.as_slice() else {
        return None;
    };
    if name.is_empty() {
        return None;
    }
    Some(Product {
        name: name.to_string(),
        description: description.to_string(),
        price: price.to_string(),
    })
}

/// Deletes on behalf of `user_id`; `None` means the user may not delete.
pub(super) fn delete_products_as(
    config: &Config,
    user_id: u64,
    name: &str,
) -> Result<Option<ModifyOutcome>> {
    if !is_action_authorized(config, &CallbackAction::Delete(name.to_string()), user_id) {
        return Ok(None);
    }
    delete_products_sync(&config.products_path, name).map(Some)
}

/// Consumes a pending admin form with the text the admin just sent.
pub(super) fn apply_submission(
    path: &Path,
    pending: Session,
    text: &str,
) -> Result<SubmissionOutcome> {
    match pending {
        Session::Idle => Ok(SubmissionOutcome::Ignored),
        Session::AwaitingAdd => {
            let Some(product) = parse_submission(text) else {
                return Ok(SubmissionOutcome::InvalidFormat);
            };
            if !name_fits_callback_data(&product.name) {
                return Ok(SubmissionOutcome::NameTooLong);
            }
            let name = product.name.clone();
            add_product_sync(path, product)?;
            Ok(SubmissionOutcome::Added { name })
        }
        Session::AwaitingEdit { name: old_name } => {
            let Some(product) = parse_submission(text) else {
                return Ok(SubmissionOutcome::InvalidFormat);
            };
            if !name_fits_callback_data(&product.name) {
                return Ok(SubmissionOutcome::NameTooLong);
            }
            match update_product_sync(path, &old_name, product)? {
                ModifyOutcome::Applied => Ok(SubmissionOutcome::Updated { old_name }),
                ModifyOutcome::NotFound => Ok(SubmissionOutcome::NotFound { old_name }),
            }
        }
    }
}

/// Accepts hand-edited catalogs that store the price as a JSON number.
pub(super) fn deserialize_price<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PriceField {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match PriceField::deserialize(deserializer)? {
        PriceField::Text(text) => text,
        PriceField::Number(number) => number.to_string(),
    })
}
