use std::path::Path;

use menucache_core::profile::Profile;
use menucache_core::utils::{single_line, truncate};
use menucache_core::{CatalogError, StoredItem};

/// Maximum description width in list output
const DESCRIPTION_WIDTH: usize = 60;

pub struct Status<'a> {
    pub endpoint: &'a str,
    pub store_path: Option<&'a Path>,
    pub dishes: usize,
    pub age: String,
    pub stale: bool,
}

pub fn print_items(items: &[StoredItem], term: &str) {
    if items.is_empty() {
        if term.trim().is_empty() {
            println!("The menu is empty.");
        } else {
            println!("No dishes match \"{}\".", term.trim());
        }
        return;
    }

    let name_width = items.iter().map(|i| i.name.chars().count()).max().unwrap_or(0);
    for item in items {
        let image = if item.image_url().is_some() { "" } else { "  [no image]" };
        println!(
            "{:<width$}  {:>8}  {}{}",
            item.name,
            item.display_price(),
            truncate(&single_line(&item.description), DESCRIPTION_WIDTH),
            image,
            width = name_width
        );
    }
}

pub fn print_sync_error(err: &CatalogError, cached: usize) {
    eprintln!("Sync failed ({}): {}", err.kind(), err);
    if cached > 0 {
        eprintln!("The cached menu ({} dishes) is unchanged.", cached);
    }
}

pub fn print_status(status: &Status<'_>) {
    println!("Endpoint:     {}", status.endpoint);
    if let Some(path) = status.store_path {
        println!("Cache file:   {}", path.display());
    }
    println!("Dishes:       {}", status.dishes);
    println!(
        "Last updated: {}{}",
        status.age,
        if status.stale { " (stale)" } else { "" }
    );
}

pub fn print_profile(profile: &Profile) {
    println!("Name:      {}", profile.display_name());
    println!("Email:     {}", profile.email.as_deref().unwrap_or("-"));
    println!("Logged in: {}", if profile.logged_in { "yes" } else { "no" });
}
