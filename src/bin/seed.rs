use chrono::Utc;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    sea_query::OnConflict,
};
use sea_orm_migration::MigratorTrait;
use tokobiru_api::{
    config::AppConfig,
    db::create_orm_conn,
    entity::{
        products::{ActiveModel as ProductActive, Entity as Products},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    migration::Migrator,
    models::Role,
    services::credentials::hash_password,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    // Ensure migrations are applied.
    Migrator::up(&orm, None).await?;

    let admin_id = ensure_user(&orm, "Admin User", "admin@tokobiru.com", "admin123").await?;
    let customer_id =
        ensure_user(&orm, "Customer Satu", "customer1@tokobiru.com", "customer123").await?;
    seed_products(&orm).await?;

    println!("Seed completed. Admin ID: {admin_id}, Customer ID: {customer_id}");
    Ok(())
}

async fn ensure_user(
    orm: &DatabaseConnection,
    name: &str,
    email: &str,
    password: &str,
) -> anyhow::Result<Uuid> {
    let role = Role::for_email(email);
    let now = Utc::now();

    Users::insert(UserActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        email: Set(email.to_string()),
        password_hash: Set(hash_password(password)?),
        role: Set(role),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    })
    .on_conflict(OnConflict::column(UserCol::Email).do_nothing().to_owned())
    .exec_without_returning(orm)
    .await
    .or_else(|err| match err {
        sea_orm::DbErr::RecordNotInserted => Ok(0),
        other => Err(other),
    })?;

    let user = Users::find()
        .filter(UserCol::Email.eq(email))
        .one(orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("user {email} missing after seeding"))?;

    println!("Ensured user {email} (role={})", user.role.as_str());
    Ok(user.id)
}

async fn seed_products(orm: &DatabaseConnection) -> anyhow::Result<()> {
    if Products::find().count(orm).await? > 0 {
        println!("Products already seeded, skipping");
        return Ok(());
    }

    let products = [
        (
            "Kaos Polos Biru Dongker",
            "Kaos katun combed 30s, nyaman dan adem.",
            85_000,
            100,
            "Pakaian",
            "https://placehold.co/600x400/1E3A8A/FFFFFF?text=Kaos+Biru",
        ),
        (
            "Kemeja Flanel Kotak-kotak",
            "Kemeja flanel lengan panjang, cocok untuk gaya kasual.",
            175_000,
            50,
            "Pakaian",
            "https://placehold.co/600x400/9CA3AF/FFFFFF?text=Kemeja+Flanel",
        ),
        (
            "Celana Jeans Slim Fit",
            "Celana jeans dengan bahan stretch yang nyaman.",
            250_000,
            75,
            "Celana",
            "https://placehold.co/600x400/374151/FFFFFF?text=Celana+Jeans",
        ),
        (
            "Topi Baseball Biru",
            "Topi baseball dengan logo Toko Biru.",
            60_000,
            200,
            "Aksesoris",
            "https://placehold.co/600x400/3B82F6/FFFFFF?text=Topi+Biru",
        ),
    ];

    let now = Utc::now();
    let models = products
        .into_iter()
        .map(|(name, description, price, stock, category, image_url)| ProductActive {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            description: Set(description.to_string()),
            price: Set(price),
            stock: Set(stock),
            category: Set(category.to_string()),
            image_url: Set(image_url.to_string()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        });

    Products::insert_many(models).exec_without_returning(orm).await?;

    println!("Seeded products");
    Ok(())
}
