//! Hammerspace command line
//!
//! ## Usage
//!
//! ```bash
//! # Create the storage directory, config and database
//! hammerspace init
//!
//! # Seed the public template collections
//! hammerspace seed-templates
//!
//! # Register users and work as one of them
//! hammerspace add-user alice
//! hammerspace --as alice create-collection "Books" --visibility private
//! hammerspace --as alice grant <collection-id> bob --level edit
//!
//! # Ask for a decision
//! hammerspace --as bob check --item <item-id> --action write-update
//! ```
//!
//! Every command prints JSON on stdout. Logs go to stderr. A failed command
//! prints `{"error", "status", "denied"}` and exits 3 when access was denied,
//! 1 otherwise.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use hammerspace::access::{Action, CollectionVisibility, ItemVisibility, Principal};
use hammerspace::db::HammerDb;
use hammerspace::services::{
    parse_custom_fields, CreateCollectionInput, CreateItemInput,
    ObjectRef, RegisterUserInput, Services,
};
use hammerspace::{templates, CollectionId, Config, HammerspaceError, ItemId};
use serde::Serialize;
use serde_json::{json, Map};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hammerspace")]
#[command(about = "Collections of custom-field items with visibility and sharing")]
struct Args {
    /// Path to config file
    #[arg(short, long, env = "HAMMERSPACE_CONFIG")]
    config: Option<PathBuf>,

    /// Storage directory
    #[arg(long, env = "HAMMERSPACE_STORAGE_DIR")]
    storage_dir: Option<PathBuf>,

    /// Act as this user; anonymous when omitted
    #[arg(long = "as", global = true)]
    as_user: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create storage directory, default config and database
    Init,

    /// Create the template user and example collections
    SeedTemplates,

    /// Register a user profile
    AddUser {
        username: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
    },

    /// Create a collection owned by --as
    CreateCollection {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "private")]
        visibility: CollectionVisibility,
    },

    /// Add an item to a collection
    AddItem {
        collection: String,
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        /// JSON object of custom fields
        #[arg(long)]
        fields: Option<String>,
        /// Path or URL of the item's picture
        #[arg(long)]
        image: Option<String>,
        #[arg(long, default_value = "collection")]
        visibility: ItemVisibility,
    },

    /// Share a collection with a user (owner only)
    Grant {
        collection: String,
        username: String,
        #[arg(long, default_value = "view")]
        level: String,
    },

    /// Remove a user's share (owner only)
    Revoke {
        collection: String,
        username: String,
    },

    /// Decide an action on a collection or item
    Check {
        #[arg(long, conflicts_with = "item", required_unless_present = "item")]
        collection: Option<String>,
        #[arg(long)]
        item: Option<String>,
        #[arg(long, default_value = "read")]
        action: Action,
    },

    /// Collections owned by or shared with --as
    List {
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },

    /// Public collections (or public items with --items)
    ListPublic {
        #[arg(long)]
        items: bool,
        /// Unlisted collections instead of public ones
        #[arg(long, conflicts_with = "items")]
        unlisted: bool,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },

    /// Registered users, by username
    ListUsers {
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },

    /// Row counts
    Stats,
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn resolve_principal(services: &Services, username: Option<&str>) -> anyhow::Result<Principal> {
    match username {
        None => Ok(Principal::Anonymous),
        Some(name) => {
            let user = services
                .users
                .require_by_username(name)
                .with_context(|| format!("--as {}", name))?;
            if !user.is_active {
                bail!("user '{}' is inactive", name);
            }
            Ok(Principal::User(user.id))
        }
    }
}

/// Exit status for a failed command: 3 for access denials, 1 otherwise
fn exit_code(err: &HammerspaceError) -> i32 {
    if err.is_denial() {
        3
    } else {
        1
    }
}

fn report_error(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<HammerspaceError>() {
        Some(e) => {
            let body = json!({
                "error": format!("{:#}", err),
                "status": e.status_code(),
                "denied": e.is_denial(),
            });
            if print_json(&body).is_err() {
                eprintln!("error: {:#}", err);
            }
            exit_code(e)
        }
        None => {
            eprintln!("error: {:#}", err);
            1
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("hammerspace=info".parse()?))
        .init();

    if let Err(err) = run(Args::parse()) {
        std::process::exit(report_error(&err));
    }
    Ok(())
}

fn run(args: Args) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => Config::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(dir) = args.storage_dir {
        config.storage_dir = dir;
    }

    if matches!(args.command, Command::Init) && config.init_storage()? {
        info!(path = %config.config_path().display(), "Created default config");
    }

    let db = Arc::new(HammerDb::open(&config.database_path())?);
    let services = Services::new(db);
    let principal = resolve_principal(&services, args.as_user.as_deref())?;

    match args.command {
        Command::Init | Command::Stats => print_json(&services.db.stats()?)?,

        Command::SeedTemplates => print_json(&templates::seed_templates(&services, &config)?)?,

        Command::AddUser {
            username,
            email,
            first_name,
            last_name,
        } => {
            let user = services.users.register(RegisterUserInput {
                username,
                email,
                first_name,
                last_name,
                is_active: true,
            })?;
            print_json(&user)?;
        }

        Command::CreateCollection {
            name,
            description,
            visibility,
        } => {
            let collection = services.collections.create(
                &principal,
                CreateCollectionInput {
                    name,
                    description,
                    visibility,
                },
            )?;
            print_json(&collection)?;
        }

        Command::AddItem {
            collection,
            name,
            description,
            fields,
            image,
            visibility,
        } => {
            let custom_fields = match fields {
                Some(raw) => parse_custom_fields(&raw)?,
                None => Map::new(),
            };
            let item = services.items.create(
                &principal,
                CreateItemInput {
                    collection_id: CollectionId::from(collection),
                    name,
                    description,
                    custom_fields,
                    image,
                    visibility,
                },
            )?;
            print_json(&item)?;
        }

        Command::Grant {
            collection,
            username,
            level,
        } => {
            let outcome = services.shares.grant(
                &principal,
                &CollectionId::from(collection),
                &username,
                &level,
            )?;
            print_json(&outcome)?;
        }

        Command::Revoke {
            collection,
            username,
        } => {
            let removed =
                services
                    .shares
                    .revoke(&principal, &CollectionId::from(collection), &username)?;
            print_json(&json!({ "removed": removed }))?;
        }

        Command::Check {
            collection,
            item,
            action,
        } => {
            let object = match (collection, item) {
                (Some(id), _) => ObjectRef::Collection(CollectionId::from(id)),
                (None, Some(id)) => ObjectRef::Item(ItemId::from(id)),
                (None, None) => bail!("pass --collection or --item"),
            };
            print_json(&services.access.decide(&principal, &object, action)?)?;
        }

        Command::List { limit, offset } => {
            let collections = services.collections.list_accessible(
                &principal,
                config.page_size(limit),
                offset,
            )?;
            print_json(&collections)?;
        }

        Command::ListUsers { limit, offset } => {
            print_json(&services.users.list(config.page_size(limit), offset)?)?;
        }

        Command::ListPublic {
            items,
            unlisted,
            limit,
            offset,
        } => {
            let limit = config.page_size(limit);
            if items {
                print_json(&services.items.list_public(None, limit, offset)?)?;
            } else if unlisted {
                print_json(&services.collections.list_unlisted(limit, offset)?)?;
            } else {
                print_json(&services.collections.list_public(limit, offset)?)?;
            }
        }
    }

    Ok(())
}
