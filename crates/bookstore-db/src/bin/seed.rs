//! # Seed Data Generator
//!
//! Populates a database with a back-office admin and a small catalogue for
//! development.
//!
//! ## Usage
//! ```bash
//! # Seed ./bookstore.db
//! cargo run -p bookstore-db --bin seed
//!
//! # Specify database path
//! cargo run -p bookstore-db --bin seed -- --db ./data/bookstore.db
//!
//! # Admin password (default: changeme)
//! SEED_ADMIN_PASSWORD=s3cret cargo run -p bookstore-db --bin seed
//! ```
//!
//! ## Generated Data
//! - Admin user `admin@bookstore.local`
//! - Authors, categories and books with opening stock
//! - A few customers and suppliers

use std::env;

use bookstore_core::input::{AuthorInput, BookInput, CategoryInput, CustomerInput, SupplierInput};
use bookstore_db::{Database, DbConfig};
use tracing_subscriber::EnvFilter;

const ADMIN_EMAIL: &str = "admin@bookstore.local";
const DEFAULT_ADMIN_PASSWORD: &str = "changeme";

const AUTHORS: &[&str] = &[
    "Chinua Achebe",
    "Chimamanda Ngozi Adichie",
    "Ngũgĩ wa Thiong'o",
    "Jennifer Nansubuga Makumbi",
    "Okot p'Bitek",
    "Frank Herbert",
];

const CATEGORIES: &[(&str, &str)] = &[
    ("Fiction", "Novels and short stories"),
    ("Poetry", "Verse and song"),
    ("Science Fiction", "Speculative fiction"),
    ("Children", "Picture books and early readers"),
];

/// (title, author index, category index, isbn, stock, price in cents)
const BOOKS: &[(&str, usize, usize, &str, i64, i64)] = &[
    ("Things Fall Apart", 0, 0, "978-0-385-47454-2", 24, 3500000),
    ("Arrow of God", 0, 0, "978-0-385-01480-9", 8, 3200000),
    ("Half of a Yellow Sun", 1, 0, "978-1-4000-4416-3", 15, 4500000),
    ("Purple Hibiscus", 1, 0, "978-1-61620-245-4", 3, 3800000),
    ("The River Between", 2, 0, "978-0-435-90548-7", 12, 2800000),
    ("Kintu", 3, 0, "978-1-938073-76-2", 9, 5000000),
    ("Song of Lawino", 4, 1, "978-9966-46-814-2", 30, 1500000),
    ("Dune", 5, 2, "978-0-441-17271-9", 6, 5500000),
];

/// (name, contact, email)
const CUSTOMERS: &[(&str, &str, &str)] = &[
    ("Amina Nakato", "0772 100200", "amina@example.com"),
    ("Brian Okello", "0701 300400", ""),
    ("Grace Atim", "", "grace@example.com"),
];

/// (name, contact, email, address)
const SUPPLIERS: &[(&str, &str, &str, &str)] = &[
    ("Fountain Publishers", "0414 259163", "orders@fountain.example", "Kampala"),
    ("East African Educational Publishers", "", "", "Nairobi"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./bookstore.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Bookstore Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./bookstore.db)");
                println!("  -h, --help         Show this help message");
                println!();
                println!("Environment:");
                println!("  SEED_ADMIN_PASSWORD  Admin password (default: changeme)");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Bookstore Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected, migrations applied");

    // Admin user
    if db.users().find_by_email(ADMIN_EMAIL).await?.is_some() {
        println!("• Admin user already exists");
    } else {
        let password = env::var("SEED_ADMIN_PASSWORD")
            .unwrap_or_else(|_| DEFAULT_ADMIN_PASSWORD.to_string());
        db.users().create("Administrator", ADMIN_EMAIL, &password).await?;
        println!("✓ Admin user {}", ADMIN_EMAIL);
    }

    let existing = db.books().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} books", existing);
        println!("  Skipping catalogue seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let mut author_ids = Vec::with_capacity(AUTHORS.len());
    for name in AUTHORS {
        let author = db
            .authors()
            .create(AuthorInput { name: name.to_string() })
            .await?;
        author_ids.push(author.author_id);
    }
    println!("✓ {} authors", author_ids.len());

    let mut category_ids = Vec::with_capacity(CATEGORIES.len());
    for (name, description) in CATEGORIES {
        let category = db
            .categories()
            .create(CategoryInput {
                name: name.to_string(),
                description: Some(description.to_string()),
            })
            .await?;
        category_ids.push(category.category_id);
    }
    println!("✓ {} categories", category_ids.len());

    for (title, author, category, isbn, stock, price) in BOOKS {
        db.books()
            .create(BookInput {
                title: title.to_string(),
                author_id: author_ids.get(*author).copied(),
                category_id: category_ids.get(*category).copied(),
                isbn: Some(isbn.to_string()),
                stock_quantity: *stock,
                price_cents: *price,
            })
            .await?;
    }
    println!("✓ {} books", BOOKS.len());

    for (name, contact, email) in CUSTOMERS {
        db.customers()
            .create(CustomerInput {
                name: name.to_string(),
                contact: Some(contact.to_string()),
                email: Some(email.to_string()),
            })
            .await?;
    }
    println!("✓ {} customers", CUSTOMERS.len());

    for (name, contact, email, address) in SUPPLIERS {
        db.suppliers()
            .create(SupplierInput {
                name: name.to_string(),
                contact: contact.to_string(),
                email: email.to_string(),
                address: address.to_string(),
            })
            .await?;
    }
    println!("✓ {} suppliers", SUPPLIERS.len());

    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}
