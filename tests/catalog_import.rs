use retail_backoffice_api::{
    db::{create_orm_conn, create_pool},
    entity::{categories::Entity as Categories, products::Entity as Products},
    jobs::{self, JobContext},
    middleware::auth::AuthUser,
    services::{catalog_service, import_service},
    state::AppState,
};
use sea_orm::{EntityTrait, PaginatorTrait};
use uuid::Uuid;

const PRICE_LIST: &str = r#"
shop:
  name: "Svyaznoy"

categories:
  - name: "Smartphones"
    products:
      - name: "Galaxy S24"
        description: "6.2-inch flagship"
        price: 799.99
        quantity: 10
        parameters:
          color: "black"
  - name: "Accessories"
    products:
      - name: "USB-C Cable 2m"
        price: 9.90
        quantity: 500
      - name: "Wireless Charger"
        price: 29.50
        quantity: 120
"#;

// Importing the same price list twice must converge instead of duplicating.
#[tokio::test]
async fn import_is_idempotent_and_cascade_delete_works() -> anyhow::Result<()> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;

    let document = import_service::parse_document(PRICE_LIST)?;
    let summary = import_service::apply_document(&state.orm, document).await?;
    assert_eq!(summary.categories_seen, 2);
    assert_eq!(summary.products_created, 3);
    assert_eq!(summary.products_updated, 0);

    let document = import_service::parse_document(PRICE_LIST)?;
    let summary = import_service::apply_document(&state.orm, document).await?;
    assert_eq!(summary.categories_seen, 2);
    assert_eq!(summary.products_created, 0);
    assert_eq!(summary.products_updated, 3);

    assert_eq!(Categories::find().count(&state.orm).await?, 2);
    assert_eq!(Products::find().count(&state.orm).await?, 3);

    // Deleting a category takes its products with it.
    let admin = AuthUser {
        user_id: create_admin(&state).await?,
        role: "admin".into(),
    };
    let accessories = Categories::find()
        .all(&state.orm)
        .await?
        .into_iter()
        .find(|c| c.name == "Accessories")
        .expect("imported category");
    catalog_service::delete_category(&state, &admin, accessories.id).await?;

    assert_eq!(Categories::find().count(&state.orm).await?, 1);
    assert_eq!(Products::find().count(&state.orm).await?, 1);

    Ok(())
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    let orm = create_orm_conn(database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    sqlx::query(
        "TRUNCATE TABLE order_items, orders, cart_items, carts, audit_logs, \
         products, categories, contacts, addresses, users RESTART IDENTITY CASCADE",
    )
    .execute(&pool)
    .await?;

    let jobs = jobs::start_worker(JobContext {
        pool: pool.clone(),
        orm: orm.clone(),
        mailer: None,
    });

    Ok(AppState { pool, orm, jobs })
}

async fn create_admin(state: &AppState) -> anyhow::Result<Uuid> {
    let (id,): (Uuid,) = sqlx::query_as(
        "INSERT INTO users (id, email, password_hash, role) VALUES ($1, 'admin@example.com', 'dummy', 'admin') RETURNING id",
    )
    .bind(Uuid::new_v4())
    .fetch_one(&state.pool)
    .await?;
    Ok(id)
}
