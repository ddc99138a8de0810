#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbBackend, Statement};

use engine::{Currency, Engine, EngineBuilder, NewPocket, NewSpend, Pocket, SequentialIdGenerator};
use migration::MigratorTrait;

pub async fn builder() -> EngineBuilder {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Engine::builder()
        .database(db)
        .id_generator(Arc::new(SequentialIdGenerator::default()))
}

/// Like [`engine`], also handing back the connection for direct row edits.
pub async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .id_generator(Arc::new(SequentialIdGenerator::default()))
        .build()
        .await
        .unwrap();
    register_people(&engine).await;
    (engine, db)
}

/// Overwrite the stored balance behind the engine's back.
pub async fn set_stored_balance(db: &DatabaseConnection, pocket: &Pocket, value: i64) {
    db.execute(Statement::from_string(
        DbBackend::Sqlite,
        format!("UPDATE pockets SET balance = {value} WHERE id = '{}'", pocket.id),
    ))
    .await
    .unwrap();
}

/// Engine over a fresh in-memory database with alice, bob and carol registered.
pub async fn engine() -> Engine {
    let engine = builder().await.build().await.unwrap();
    register_people(&engine).await;
    engine
}

pub async fn register_people(engine: &Engine) {
    for (id, name) in [("alice", "Alice"), ("bob", "Bob"), ("carol", "Carol")] {
        engine.register_user(id, name).await.unwrap();
    }
}

pub fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, d, 12, 0, 0).unwrap()
}

pub async fn pocket(engine: &Engine, owner: &str, name: &str) -> Pocket {
    engine
        .create_pocket(owner, NewPocket::new(name, Currency::Idr))
        .await
        .unwrap()
}

pub async fn expense(engine: &Engine, user: &str, pocket: &Pocket, price: i64, d: u32) -> engine::Spend {
    engine
        .create_spend(user, NewSpend::new(pocket.id, "expense", price, day(d)))
        .await
        .unwrap()
}

pub async fn income(engine: &Engine, user: &str, pocket: &Pocket, price: i64, d: u32) -> engine::Spend {
    engine
        .create_spend(user, NewSpend::new(pocket.id, "income", price, day(d)).income())
        .await
        .unwrap()
}

pub async fn balance(engine: &Engine, user: &str, pocket: &Pocket) -> i64 {
    engine
        .pocket_detail(user, pocket.id)
        .await
        .unwrap()
        .pocket
        .balance
}
