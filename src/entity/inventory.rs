use sea_orm::entity::prelude::*;

/// One color × size slot of a SKU and its booking quota.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "inventory")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub sku: String,
    pub color: String,
    pub size: String,
    pub quota: i32,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::skus::Entity",
        from = "Column::Sku",
        to = "super::skus::Column::Sku"
    )]
    Skus,
}

impl Related<super::skus::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Skus.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
