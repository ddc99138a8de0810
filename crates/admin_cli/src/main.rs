use std::error::Error;

use clap::{Args, Parser, Subcommand};
use engine::{Currency, Engine, NewPocket};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "pocketbook_admin")]
#[command(about = "Admin utilities for Pocketbook (bootstrap users/pockets)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./pocketbook.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Pocket(Pocket),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create(UserCreateArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    id: String,
    /// Display name, defaults to the id.
    #[arg(long)]
    name: Option<String>,
}

#[derive(Args, Debug)]
struct Pocket {
    #[command(subcommand)]
    command: PocketCommand,
}

#[derive(Subcommand, Debug)]
enum PocketCommand {
    Create(PocketCreateArgs),
    /// Recompute a pocket balance from its spends.
    SyncBalance(SyncBalanceArgs),
}

#[derive(Args, Debug)]
struct PocketCreateArgs {
    #[arg(long)]
    owner: String,
    #[arg(long)]
    name: String,
    #[arg(long, default_value = "IDR")]
    currency: String,
    /// Extra editors; repeat the flag for several users.
    #[arg(long = "editor")]
    editors: Vec<String>,
    /// Extra watchers; repeat the flag for several users.
    #[arg(long = "watcher")]
    watchers: Vec<String>,
}

#[derive(Args, Debug)]
struct SyncBalanceArgs {
    /// A user with write access, usually the owner.
    #[arg(long)]
    user: String,
    #[arg(long)]
    pocket: Uuid,
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            if engine.user_name(&args.id).await?.is_some() {
                eprintln!("user already exists: {}", args.id);
                std::process::exit(1);
            }

            let name = args.name.unwrap_or_else(|| args.id.clone());
            engine.register_user(&args.id, &name).await?;
            println!("created user: {} ({name})", args.id);
        }
        Command::Pocket(Pocket {
            command: PocketCommand::Create(args),
        }) => {
            let currency = match Currency::try_from(args.currency.as_str()) {
                Ok(v) => v,
                Err(err) => {
                    eprintln!("{err}");
                    std::process::exit(2);
                }
            };

            let mut cmd = NewPocket::new(&args.name, currency);
            cmd.editor_ids.extend(args.editors);
            cmd.watcher_ids.extend(args.watchers);
            let pocket = engine.create_pocket(&args.owner, cmd).await?;
            println!("created pocket: {} ({})", pocket.name, pocket.id);
        }
        Command::Pocket(Pocket {
            command: PocketCommand::SyncBalance(args),
        }) => {
            let balance = engine.sync_balance(&args.user, args.pocket).await?;
            println!("pocket {} balance: {balance}", args.pocket);
        }
    }

    Ok(())
}
