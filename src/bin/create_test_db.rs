use std::error::Error;
use std::path::Path;
use std::process::exit;
use std::str::FromStr;

use clap::Parser;
use email_address::EmailAddress;
use rusqlite::Connection;

use moneyflow_rs::{
    CategoryName, CategoryType, NewCategory, PasswordHash, RegistrationDay, ValidatedPassword,
    create_category, create_user, initialize_db, local_today,
};

/// A utility for creating a test database for the JSON API server of moneyflow_rs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// The canonical timezone used to pick the dates of the sample categories.
    #[arg(long, default_value = "Etc/UTC")]
    timezone: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user test@example.com...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test"),
        PasswordHash::DEFAULT_COST,
    )?;
    let user = create_user(
        EmailAddress::from_str("test@example.com")?,
        password_hash,
        &conn,
    )?;

    println!("Creating sample categories...");

    let today = local_today(&args.timezone)?;
    let categories = [
        NewCategory::new(CategoryName::new("Salary")?, CategoryType::Income)
            .recurring(RegistrationDay::new(15)?, 4200.0)?,
        NewCategory::new(CategoryName::new("Rent")?, CategoryType::Expense)
            .recurring(RegistrationDay::new(1)?, 1800.0)?
            .description("Paid to the landlord on the first"),
        NewCategory::new(CategoryName::new("Streaming")?, CategoryType::Expense)
            .recurring(RegistrationDay::new(31)?, 15.99)?,
        NewCategory::new(CategoryName::new("Groceries")?, CategoryType::Expense),
        NewCategory::new(CategoryName::new("Gifts")?, CategoryType::Income),
    ];

    for category in &categories {
        let category = create_category(Some(user.id), category, today, &conn)?;
        match category.registration_next_date {
            Some(next_date) => println!("  {} (next due {next_date})", category.name),
            None => println!("  {}", category.name),
        }
    }

    println!("Success!");

    Ok(())
}
