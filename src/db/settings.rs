use sea_orm::*;
use uuid::Uuid;

use crate::models::settings::{self, UpsertSetting};

/// Fetch one system parameter by name.
pub async fn get_setting(
    db: &DatabaseConnection,
    name: &str,
) -> Result<Option<settings::Model>, DbErr> {
    settings::Entity::find()
        .filter(settings::Column::ParameterName.eq(name))
        .one(db)
        .await
}

/// Fetch all system parameters.
pub async fn get_all_settings(db: &DatabaseConnection) -> Result<Vec<settings::Model>, DbErr> {
    settings::Entity::find()
        .order_by_asc(settings::Column::ParameterName)
        .all(db)
        .await
}

/// Create or overwrite a system parameter (admin operation).
pub async fn upsert_setting(
    db: &DatabaseConnection,
    input: UpsertSetting,
) -> Result<settings::Model, DbErr> {
    if let Some(existing) = get_setting(db, &input.parameter_name).await? {
        let mut active: settings::ActiveModel = existing.into();
        active.parameter_value = Set(input.parameter_value);
        active.description = Set(input.description);
        return active.update(db).await;
    }

    let new_setting = settings::ActiveModel {
        id: Set(Uuid::new_v4()),
        parameter_name: Set(input.parameter_name),
        parameter_value: Set(input.parameter_value),
        description: Set(input.description),
    };

    new_setting.insert(db).await
}
