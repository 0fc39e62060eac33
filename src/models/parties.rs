use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Party role, fixed at creation. Stored as a lowercase string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[sea_orm(string_value = "client")]
    Client,
    #[sea_orm(string_value = "contractor")]
    Contractor,
    #[sea_orm(string_value = "manager")]
    Manager,
    #[sea_orm(string_value = "owner")]
    Owner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "inactive")]
    Inactive,
}

/// SeaORM entity for the `parties` table.
///
/// Clients, contractors, managers and owners share this one table; `role` is
/// the tag and `tariff_id`/`paid` are the client-only attachment. Use
/// [`Model::kind`] to get a typed view instead of poking the nullable columns.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "parties")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub nick: String,
    /// External chat identifier; null until the party first writes to the bot.
    pub chat_id: Option<i64>,
    pub role: Role,
    pub status: Status,
    /// Opaque conversation-state label owned by the session driver.
    pub bot_state: Option<String>,
    pub tariff_id: Option<Uuid>,
    pub paid: Option<bool>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tariffs::Entity",
        from = "Column::TariffId",
        to = "super::tariffs::Column::Id"
    )]
    Tariff,
}

impl Related<super::tariffs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tariff.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Typed view over the role tag and its attachment columns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PartyKind {
    Client { tariff_id: Uuid, paid: bool },
    Contractor,
    Manager,
    Owner,
}

impl Model {
    /// Resolve the tagged-union view. Returns `None` for a client row whose
    /// tariff attachment is missing (a broken row, not a valid state).
    pub fn kind(&self) -> Option<PartyKind> {
        match self.role {
            Role::Client => Some(PartyKind::Client {
                tariff_id: self.tariff_id?,
                paid: self.paid.unwrap_or(false),
            }),
            Role::Contractor => Some(PartyKind::Contractor),
            Role::Manager => Some(PartyKind::Manager),
            Role::Owner => Some(PartyKind::Owner),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == Status::Active
    }
}

/// Chat nicknames are 5–32 word characters (letters, digits, underscore).
pub fn is_valid_nick(nick: &str) -> bool {
    (5..=32).contains(&nick.chars().count())
        && nick.chars().all(|c| c.is_alphanumeric() || c == '_')
}

// ── DTOs ──

#[derive(Debug, Clone, Deserialize)]
pub struct CreateParty {
    pub nick: String,
    pub role: Role,
    pub chat_id: Option<i64>,
    pub tariff_id: Option<Uuid>,
    pub paid: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nick_length_bounds() {
        assert!(!is_valid_nick("abcd")); // 4 chars, too short
        assert!(is_valid_nick("abcde"));
        assert!(is_valid_nick(&"a".repeat(32)));
        assert!(!is_valid_nick(&"a".repeat(33)));
    }

    #[test]
    fn nick_rejects_non_word_characters() {
        assert!(is_valid_nick("good_nick_99"));
        assert!(!is_valid_nick("bad nick"));
        assert!(!is_valid_nick("bad-nick"));
        assert!(!is_valid_nick("bad@nick"));
    }

    #[test]
    fn client_kind_requires_tariff() {
        let mut party = Model {
            id: Uuid::new_v4(),
            nick: "some_client".to_string(),
            chat_id: Some(100),
            role: Role::Client,
            status: Status::Active,
            bot_state: None,
            tariff_id: None,
            paid: Some(true),
            created_at: chrono::Utc::now(),
        };
        assert_eq!(party.kind(), None);

        let tariff_id = Uuid::new_v4();
        party.tariff_id = Some(tariff_id);
        assert_eq!(
            party.kind(),
            Some(PartyKind::Client {
                tariff_id,
                paid: true
            })
        );
    }
}
