use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub sku: String,
    pub customer_name: String,
    pub whatsapp: String,
    pub color: String,
    pub size: String,
    pub quantity: i32,
    /// Unit price captured at booking time.
    pub price: i64,
    pub status: String,
    pub payment_proof_url: Option<String>,
    pub invoice_url: Option<String>,
    pub cart_session_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::skus::Entity",
        from = "Column::Sku",
        to = "super::skus::Column::Sku"
    )]
    Skus,
    #[sea_orm(
        belongs_to = "super::cart_sessions::Entity",
        from = "Column::CartSessionId",
        to = "super::cart_sessions::Column::Id"
    )]
    CartSessions,
}

impl Related<super::skus::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Skus.def()
    }
}

impl Related<super::cart_sessions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CartSessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
