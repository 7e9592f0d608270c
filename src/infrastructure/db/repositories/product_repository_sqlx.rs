use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use uuid::Uuid;

use crate::application::ports::product_repository::ProductRepository;
use crate::domain::products::product::{
    GalleryImage, NewProduct, Product, ProductChanges, ProductOwner,
};
use crate::infrastructure::db::{PgPool, map_write_error};

pub struct SqlxProductRepository {
    pub pool: PgPool,
}

impl SqlxProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Columns every product query projects; `p` is the product relation, `u` the owner.
const PRODUCT_COLUMNS: &str = r#"p.id, p.meta_title, p.product_name, p.slug, p.gallery_images,
       p.price, p.discounted_price, p.description, p.is_active, p.created_at, p.updated_at,
       u.id AS owner_id, u.username AS owner_username, u.email AS owner_email"#;

fn product_from_row(r: &PgRow) -> Product {
    let Json(gallery_images): Json<Vec<GalleryImage>> = r.get("gallery_images");
    Product {
        id: r.get("id"),
        meta_title: r.get("meta_title"),
        product_name: r.get("product_name"),
        slug: r.get("slug"),
        gallery_images,
        price: r.get("price"),
        discounted_price: r.get("discounted_price"),
        description: r.get("description"),
        is_active: r.get("is_active"),
        created_by: ProductOwner {
            id: r.get("owner_id"),
            username: r.get("owner_username"),
            email: r.get("owner_email"),
        },
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    }
}

#[async_trait]
impl ProductRepository for SqlxProductRepository {
    async fn list_all(&self) -> anyhow::Result<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p JOIN users u ON u.id = p.created_by
             ORDER BY p.created_at DESC"
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(product_from_row).collect())
    }

    async fn get_by_id(&self, id: Uuid) -> anyhow::Result<Option<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p JOIN users u ON u.id = p.created_by
             WHERE p.id = $1"
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(product_from_row))
    }

    async fn existing_slugs(&self, slugs: &[String]) -> anyhow::Result<Vec<String>> {
        let rows = sqlx::query("SELECT slug FROM products WHERE slug = ANY($1) ORDER BY slug")
            .bind(slugs)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|r| r.get("slug")).collect())
    }

    async fn slug_taken_by_other(&self, slug: &str, exclude_id: Uuid) -> anyhow::Result<bool> {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM products WHERE slug = $1 AND id <> $2)",
        )
        .bind(slug)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn insert_many(
        &self,
        owner_id: Uuid,
        products: &[NewProduct],
    ) -> anyhow::Result<Vec<Product>> {
        let sql = format!(
            r#"WITH p AS (
                   INSERT INTO products (meta_title, product_name, slug, gallery_images, price,
                                         discounted_price, description, is_active, created_by)
                   VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                   RETURNING *
               )
               SELECT {PRODUCT_COLUMNS} FROM p JOIN users u ON u.id = p.created_by"#
        );
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(products.len());
        for product in products {
            let row = sqlx::query(&sql)
                .bind(&product.meta_title)
                .bind(&product.product_name)
                .bind(&product.slug)
                .bind(Json(&product.gallery_images))
                .bind(product.price)
                .bind(product.discounted_price)
                .bind(&product.description)
                .bind(product.is_active)
                .bind(owner_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(map_write_error)?;
            created.push(product_from_row(&row));
        }
        tx.commit().await?;
        Ok(created)
    }

    async fn update(&self, id: Uuid, changes: &ProductChanges) -> anyhow::Result<Option<Product>> {
        let sql = format!(
            r#"WITH p AS (
                   UPDATE products SET
                       meta_title = COALESCE($2, meta_title),
                       product_name = COALESCE($3, product_name),
                       slug = COALESCE($4, slug),
                       gallery_images = COALESCE($5::jsonb, gallery_images),
                       price = COALESCE($6::float8, price),
                       discounted_price = CASE WHEN $7::bool THEN $8::float8 ELSE discounted_price END,
                       description = COALESCE($9, description),
                       is_active = COALESCE($10::bool, is_active),
                       updated_at = now()
                   WHERE id = $1
                   RETURNING *
               )
               SELECT {PRODUCT_COLUMNS} FROM p JOIN users u ON u.id = p.created_by"#
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(changes.meta_title.as_deref())
            .bind(changes.product_name.as_deref())
            .bind(changes.slug.as_deref())
            .bind(changes.gallery_images.as_ref().map(Json))
            .bind(changes.price)
            .bind(changes.discounted_price.is_some())
            .bind(changes.discounted_price.flatten())
            .bind(changes.description.as_deref())
            .bind(changes.is_active)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)?;
        Ok(row.as_ref().map(product_from_row))
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
