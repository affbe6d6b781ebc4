use chrono::{Duration, Utc};
use flash_sale_storefront::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    services::auth_service::hash_pin,
};
use serde_json::json;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let database_url = AppConfig::database_url_from_env()?;

    let pool = create_pool(&database_url).await?;
    // Ensure migrations are applied.
    run_migrations(&pool).await?;

    seed_skus(&pool).await?;

    let pin = std::env::var("SEED_ADMIN_PIN").unwrap_or_else(|_| "1234".to_string());
    println!("Seed completed. Put this in .env to log in with PIN {pin}:");
    println!("ADMIN_PIN_HASH='{}'", hash_pin(&pin)?);
    Ok(())
}

struct DemoSku {
    sku: &'static str,
    name: &'static str,
    price: i64,
    colors: &'static [&'static str],
    sizes: &'static [&'static str],
    video_url: Option<&'static str>,
    quota: i32,
}

async fn seed_skus(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let skus = [
        DemoSku {
            sku: "DRS-01",
            name: "Linen Wrap Dress",
            price: 289_000,
            colors: &["Sage", "Black"],
            sizes: &["S", "M", "L"],
            video_url: Some("https://www.instagram.com/reel/demo-drs-01/"),
            quota: 5,
        },
        DemoSku {
            sku: "TOP-02",
            name: "Pleated Blouse",
            price: 159_000,
            colors: &["White", "Dusty Pink"],
            sizes: &["All Size"],
            video_url: Some("https://www.instagram.com/reel/demo-top-02/"),
            quota: 3,
        },
        DemoSku {
            sku: "SKR-03",
            name: "Satin Midi Skirt",
            price: 199_000,
            colors: &["Champagne"],
            sizes: &["S", "M"],
            video_url: None,
            quota: 10,
        },
    ];

    let deadline = Utc::now() + Duration::days(7);

    for demo in skus {
        sqlx::query(
            r#"
            INSERT INTO skus (sku, name, description, price, images, colors, sizes, video_url, deadline)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (sku) DO NOTHING
            "#,
        )
        .bind(demo.sku)
        .bind(demo.name)
        .bind(format!("{} - demo item", demo.name))
        .bind(demo.price)
        .bind(json!([format!("https://picsum.photos/seed/{}/600/800", demo.sku)]))
        .bind(json!(demo.colors))
        .bind(json!(demo.sizes))
        .bind(demo.video_url)
        .bind(demo.video_url.map(|_| deadline))
        .execute(pool)
        .await?;

        for color in demo.colors {
            for size in demo.sizes {
                sqlx::query(
                    r#"
                    INSERT INTO inventory (id, sku, color, size, quota)
                    VALUES ($1, $2, $3, $4, $5)
                    ON CONFLICT (sku, color, size) DO NOTHING
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(demo.sku)
                .bind(*color)
                .bind(*size)
                .bind(demo.quota)
                .execute(pool)
                .await?;
            }
        }

        println!("Ensured SKU {} ({} slots)", demo.sku, demo.colors.len() * demo.sizes.len());
    }

    Ok(())
}
