//! Migration: Seed the built-in roles.

use domain::{ROLE_ADMIN, ROLE_USER};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(&format!(
                r#"
                INSERT INTO roles (name, description) VALUES
                    ('{}', 'Standard account'),
                    ('{}', 'Administrator')
                ON CONFLICT (name) DO NOTHING
                "#,
                ROLE_USER, ROLE_ADMIN
            ))
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(&format!(
                "DELETE FROM roles WHERE name IN ('{}', '{}')",
                ROLE_USER, ROLE_ADMIN
            ))
            .await?;

        Ok(())
    }
}
