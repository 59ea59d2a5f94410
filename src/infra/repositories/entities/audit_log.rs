//! Audit log database entity for SeaORM.

use sea_orm::entity::prelude::*;

use crate::domain::AuditLog;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "audit_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub username: String,
    pub action: String,
    pub entity_name: String,
    pub entity_id: Option<String>,
    pub details: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::Username",
        to = "super::user::Column::Username",
        on_delete = "Restrict"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for AuditLog {
    fn from(model: Model) -> Self {
        AuditLog {
            id: model.id,
            username: model.username,
            action: model.action,
            entity_name: model.entity_name,
            entity_id: model.entity_id,
            details: model.details,
            created_at: model.created_at,
        }
    }
}
