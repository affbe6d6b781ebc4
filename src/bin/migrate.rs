use flash_sale_storefront::{
    config::AppConfig,
    db::{create_pool, run_migrations},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let database_url = AppConfig::database_url_from_env()?;
    let pool = create_pool(&database_url).await?;
    run_migrations(&pool).await?;
    println!("Migrations applied");
    Ok(())
}
