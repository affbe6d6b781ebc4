use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "cart_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub session_id: Uuid,
    pub sku: String,
    pub color: String,
    pub size: String,
    pub quantity: i32,
    /// `reserved` or `waitlist`.
    pub status: String,
    pub expires_at: DateTimeWithTimeZone,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::cart_sessions::Entity",
        from = "Column::SessionId",
        to = "super::cart_sessions::Column::Id"
    )]
    CartSessions,
    #[sea_orm(
        belongs_to = "super::skus::Entity",
        from = "Column::Sku",
        to = "super::skus::Column::Sku"
    )]
    Skus,
}

impl Related<super::cart_sessions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CartSessions.def()
    }
}

impl Related<super::skus::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Skus.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
