//! Collection templates
//!
//! Seeds an inactive template user owning three public example collections
//! (books, comics, keyboards). Each holds one public example item whose
//! `custom_fields` show the kind of schema a collector would use. Running the
//! seed again leaves existing templates untouched.

use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::info;

use crate::access::{CollectionVisibility, ItemVisibility, Principal, UserId};
use crate::config::Config;
use crate::db::collections;
use crate::error::Result;
use crate::services::{CreateCollectionInput, CreateItemInput, RegisterUserInput, Services};

struct Template {
    name: &'static str,
    description: &'static str,
    item_name: &'static str,
    item_description: &'static str,
    fields: fn() -> Value,
}

const TEMPLATES: &[Template] = &[
    Template {
        name: "Book Collection Template",
        description: "Template for organizing your book collection",
        item_name: "Example Book",
        item_description: "This is an example of how to catalog your books",
        fields: book_fields,
    },
    Template {
        name: "Comic Collection Template",
        description: "Template for organizing your comic collection",
        item_name: "Example Comic #1",
        item_description: "This is an example of how to catalog your comics",
        fields: comic_fields,
    },
    Template {
        name: "Keyboard Collection Template",
        description: "Template for organizing your mechanical keyboard collection",
        item_name: "Example Mechanical Keyboard",
        item_description: "This is an example of how to catalog your keyboards",
        fields: keyboard_fields,
    },
];

fn book_fields() -> Value {
    json!({
        "author": "Author Name",
        "isbn": "978-0000000000",
        "pages": 300,
        "genre": "Fiction",
        "publication_year": 2023,
        "rating": 5,
        "read_status": "completed",
        "purchase_date": "2024-01-01",
        "format": "hardcover",
        "publisher": "Publisher Name",
        "language": "English"
    })
}

fn comic_fields() -> Value {
    json!({
        "series": "Comic Series Name",
        "issue_number": 1,
        "publisher": "Marvel",
        "publication_date": "2024-01-01",
        "writer": "Writer Name",
        "artist": "Artist Name",
        "cover_artist": "Cover Artist Name",
        "condition": "Near Mint",
        "variant": false,
        "purchase_price": 4.99,
        "current_value": 5.50,
        "graded": false,
        "bag_and_board": true
    })
}

fn keyboard_fields() -> Value {
    json!({
        "brand": "Keychron",
        "model": "K8",
        "layout": "75%",
        "switches": "Gateron Brown",
        "keycaps": "PBT Double Shot",
        "connection": "Wireless/USB-C",
        "hot_swappable": true,
        "rgb": true,
        "purchase_date": "2024-01-01",
        "purchase_price": 89.99,
        "condition": "Excellent",
        "modifications": []
    })
}

/// What a seed run did
#[derive(Debug, Clone, Serialize)]
pub struct SeedReport {
    pub template_user: UserId,
    pub user_created: bool,
    pub created: Vec<String>,
    pub existing: Vec<String>,
}

/// Create the template user and any missing template collections
pub fn seed_templates(services: &Services, config: &Config) -> Result<SeedReport> {
    let (user, user_created) = match services.users.get_by_username(&config.template_username)? {
        Some(user) => (user, false),
        None => {
            let user = services.users.register(RegisterUserInput {
                username: config.template_username.clone(),
                email: "templates@hammerspace.example".into(),
                first_name: "Template".into(),
                last_name: "User".into(),
                // cannot sign in
                is_active: false,
            })?;
            (user, true)
        }
    };
    let principal = Principal::User(user.id.clone());

    let mut report = SeedReport {
        template_user: user.id.clone(),
        user_created,
        created: Vec::new(),
        existing: Vec::new(),
    };

    for template in TEMPLATES {
        let existing = services.db.with_conn(|conn| {
            collections::get_collection_by_name(conn, &user.id, template.name)
        })?;
        if existing.is_some() {
            report.existing.push(template.name.to_string());
            continue;
        }

        let collection = services.collections.create(
            &principal,
            CreateCollectionInput {
                name: template.name.to_string(),
                description: template.description.to_string(),
                visibility: CollectionVisibility::Public,
            },
        )?;

        let custom_fields = match (template.fields)() {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        services.items.create(
            &principal,
            CreateItemInput {
                collection_id: collection.id,
                name: template.item_name.to_string(),
                description: template.item_description.to_string(),
                image: None,
                custom_fields,
                visibility: ItemVisibility::Public,
            },
        )?;

        report.created.push(template.name.to_string());
    }

    info!(
        created = report.created.len(),
        existing = report.existing.len(),
        "Collection templates seeded"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_is_idempotent() {
        let services = Services::in_memory().unwrap();
        let config = Config::default();

        let first = seed_templates(&services, &config).unwrap();
        assert!(first.user_created);
        assert_eq!(first.created.len(), 3);

        let second = seed_templates(&services, &config).unwrap();
        assert!(!second.user_created);
        assert!(second.created.is_empty());
        assert_eq!(second.existing.len(), 3);
        assert_eq!(second.template_user, first.template_user);

        let stats = services.db.stats().unwrap();
        assert_eq!(stats.collection_count, 3);
        assert_eq!(stats.item_count, 3);
    }

    #[test]
    fn test_templates_are_public_and_counted() {
        let services = Services::in_memory().unwrap();
        seed_templates(&services, &Config::default()).unwrap();

        let public = services.collections.list_public(10, 0).unwrap();
        assert_eq!(public.len(), 3);
        assert!(public.iter().all(|summary| summary.public_item_count == 1));

        let user = services
            .users
            .get_by_username("template_user")
            .unwrap()
            .unwrap();
        assert!(!user.is_active);
    }
}
