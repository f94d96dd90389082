use crate::config::Config;
use crate::entities::{follow, like, tweet, user};
use sea_orm::sea_query::{Alias, ColumnDef, Table, TableAlterStatement};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, DbErr, EntityTrait,
    Schema,
};

pub type DbPool = DatabaseConnection;

pub async fn create_pool(config: &Config) -> Result<DbPool, anyhow::Error> {
    let mut options = ConnectOptions::new(config.database_url());
    options
        .max_connections(config.store.max_connections)
        .sqlx_logging(false);
    let db = Database::connect(options).await?;

    create_schema(&db).await?;

    Ok(db)
}

/// Creates any missing tables from the entity definitions.
///
/// Order matters: foreign keys point at `users` and `tweets`.
pub async fn create_schema(db: &DbPool) -> Result<(), DbErr> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, user::Entity).await?;
    create_table(db, &schema, tweet::Entity).await?;
    create_table(db, &schema, follow::Entity).await?;
    create_table(db, &schema, like::Entity).await?;

    if db.get_database_backend() == DbBackend::MySql {
        widen_timestamps(db).await?;
    }

    Ok(())
}

/// MySQL stores `DateTimeUtc` with whole-second precision, which would make
/// same-second follow and like edges tie on `created_at`.
async fn widen_timestamps(db: &DbPool) -> Result<(), DbErr> {
    for statement in widen_timestamp_statements() {
        db.execute(db.get_database_backend().build(&statement))
            .await?;
    }
    Ok(())
}

fn widen_timestamp_statements() -> Vec<TableAlterStatement> {
    [
        ("users", "created_at"),
        ("users", "updated_at"),
        ("tweets", "created_at"),
        ("tweets", "updated_at"),
        ("follows", "created_at"),
        ("likes", "created_at"),
    ]
    .into_iter()
    .map(|(table, column)| {
        Table::alter()
            .table(Alias::new(table))
            .modify_column(
                ColumnDef::new(Alias::new(column))
                    .custom(Alias::new("DATETIME(6)"))
                    .not_null(),
            )
            .to_owned()
    })
    .collect()
}

async fn create_table<E: EntityTrait>(
    db: &DbPool,
    schema: &Schema,
    entity: E,
) -> Result<(), DbErr> {
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(db.get_database_backend().build(&statement))
        .await?;
    Ok(())
}
