use rust_decimal::Decimal;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    db::OrmConn,
    entity::{
        categories::{ActiveModel as CategoryActive, Column as CategoryCol, Entity as Categories},
        products::{ActiveModel as ProductActive, Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
};

/// Top-level shape of a supplier price list. Unknown keys (shop info
/// and the like) are ignored.
#[derive(Debug, Deserialize)]
pub struct ImportDocument {
    #[serde(default)]
    pub categories: Vec<ImportCategory>,
}

#[derive(Debug, Deserialize)]
pub struct ImportCategory {
    pub name: String,
    #[serde(default)]
    pub products: Vec<ImportProduct>,
}

#[derive(Debug, Deserialize)]
pub struct ImportProduct {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    pub quantity: i32,
    #[serde(default)]
    pub parameters: Option<serde_json::Value>,
}

#[derive(Debug, Default)]
pub struct ImportSummary {
    pub categories_seen: usize,
    pub products_created: usize,
    pub products_updated: usize,
}

pub fn parse_document(content: &str) -> AppResult<ImportDocument> {
    serde_yaml::from_str(content)
        .map_err(|e| AppError::Validation(format!("invalid import document: {e}")))
}

/// Import a YAML price list: categories are get-or-created by unique
/// name, products upserted by name. Running the same document twice
/// changes nothing the second time.
pub async fn import_catalog(orm: &OrmConn, source_path: &str) -> AppResult<ImportSummary> {
    let content = tokio::fs::read_to_string(source_path)
        .await
        .map_err(|e| AppError::Validation(format!("cannot read '{source_path}': {e}")))?;
    let document = parse_document(&content)?;
    apply_document(orm, document).await
}

pub async fn apply_document(orm: &OrmConn, document: ImportDocument) -> AppResult<ImportSummary> {
    let mut summary = ImportSummary::default();

    for category_data in document.categories {
        let category = match Categories::find()
            .filter(CategoryCol::Name.eq(category_data.name.as_str()))
            .one(orm)
            .await?
        {
            Some(existing) => existing,
            None => {
                CategoryActive {
                    id: Set(Uuid::new_v4()),
                    name: Set(category_data.name.clone()),
                }
                .insert(orm)
                .await?
            }
        };
        summary.categories_seen += 1;

        for product_data in category_data.products {
            let existing = Products::find()
                .filter(ProdCol::Name.eq(product_data.name.as_str()))
                .one(orm)
                .await?;

            match existing {
                Some(product) => {
                    let mut active: ProductActive = product.into();
                    active.description = Set(product_data.description);
                    active.category_id = Set(category.id);
                    active.price = Set(product_data.price);
                    active.stock = Set(product_data.quantity);
                    if let Some(parameters) = product_data.parameters {
                        active.parameters = Set(parameters);
                    }
                    active.update(orm).await?;
                    summary.products_updated += 1;
                }
                None => {
                    ProductActive {
                        id: Set(Uuid::new_v4()),
                        name: Set(product_data.name),
                        description: Set(product_data.description),
                        category_id: Set(category.id),
                        price: Set(product_data.price),
                        stock: Set(product_data.quantity),
                        parameters: Set(product_data
                            .parameters
                            .unwrap_or_else(|| serde_json::json!({}))),
                        created_at: NotSet,
                    }
                    .insert(orm)
                    .await?;
                    summary.products_created += 1;
                }
            }
        }
    }

    tracing::info!(
        categories = summary.categories_seen,
        created = summary.products_created,
        updated = summary.products_updated,
        "catalog import finished"
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::parse_document;

    const SAMPLE: &str = r#"
shop:
  name: "Test Shop"
  address: "123 Main St"

categories:
  - name: "Electronics"
    products:
      - name: "Smartphone"
        description: "A high-end smartphone"
        price: 799.99
        quantity: 10
      - name: "Laptop"
        description: "A powerful laptop"
        price: 1199.99
        quantity: 5

  - name: "Books"
    products:
      - name: "Programming Book"
        description: "Learn Rust programming"
        price: 29.99
        quantity: 50
"#;

    #[test]
    fn parses_price_list_and_ignores_shop_header() {
        let doc = parse_document(SAMPLE).unwrap();
        assert_eq!(doc.categories.len(), 2);
        assert_eq!(doc.categories[0].name, "Electronics");
        assert_eq!(doc.categories[0].products.len(), 2);
        assert_eq!(doc.categories[1].products.len(), 1);

        let smartphone = &doc.categories[0].products[0];
        assert_eq!(smartphone.name, "Smartphone");
        assert_eq!(smartphone.price, "799.99".parse().unwrap());
        assert_eq!(smartphone.quantity, 10);
    }

    #[test]
    fn rejects_malformed_documents() {
        assert!(parse_document("categories: 42").is_err());
        assert!(parse_document("categories:\n  - products: []").is_err());
    }

    #[test]
    fn empty_document_has_no_categories() {
        let doc = parse_document("{}").unwrap();
        assert!(doc.categories.is_empty());
    }
}
