//! Document store access: one trait per collection, backed by MongoDB.

use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mockall::automock;
use mongodb::bson::{self, doc, Document};
use mongodb::options::{ClientOptions, FindOneOptions};
use mongodb::{Client, Collection as MongoCollection, Database};
use thiserror::Error;

use crate::config::Config;
use crate::models::{Collection, Coupon, Product, User, UserProfile};

const USERS: &str = "users";
const PRODUCTS: &str = "products";
const COLLECTIONS: &str = "collections";
const COUPONS: &str = "coupons";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Mongo(#[from] mongodb::error::Error),

    #[error(transparent)]
    Encode(#[from] bson::ser::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

pub async fn connect(config: &Config) -> StoreResult<Database> {
    let client_options = ClientOptions::parse(&config.database_url).await?;
    let client = Client::with_options(client_options)?;
    Ok(client.database(&config.database_name))
}

#[automock]
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: &User) -> StoreResult<()>;

    /// Full document lookup, used for credential checks.
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Projection lookup: identity, role, cart and orders only.
    async fn find_profile(&self, id: &str) -> StoreResult<Option<UserProfile>>;

    /// Overwrites the cart and orders lists of the given user.
    async fn save_cart(&self, user: &UserProfile) -> StoreResult<()>;
}

#[automock]
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn insert(&self, product: &Product) -> StoreResult<()>;

    async fn list(&self) -> StoreResult<Vec<Product>>;

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Product>>;

    /// Products whose id is in `ids`; unknown ids are skipped.
    async fn find_many(&self, ids: &[String]) -> StoreResult<Vec<Product>>;

    /// Case-insensitive substring match on name or description.
    async fn search(&self, text: &str) -> StoreResult<Vec<Product>>;
}

#[automock]
#[async_trait]
pub trait CollectionStore: Send + Sync {
    async fn insert(&self, collection: &Collection) -> StoreResult<()>;

    async fn list(&self) -> StoreResult<Vec<Collection>>;

    async fn rename(&self, id: &str, name: &str) -> StoreResult<Option<Collection>>;

    /// Returns `false` when nothing was deleted.
    async fn delete(&self, id: &str) -> StoreResult<bool>;
}

#[automock]
#[async_trait]
pub trait CouponStore: Send + Sync {
    async fn insert(&self, coupon: &Coupon) -> StoreResult<()>;

    async fn find_by_code(&self, code: &str) -> StoreResult<Option<Coupon>>;

    async fn list(&self) -> StoreResult<Vec<Coupon>>;

    async fn delete(&self, id: &str) -> StoreResult<bool>;
}

#[derive(Debug, Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub fn new(db: Database) -> Self {
        MongoStore { db }
    }

    fn users(&self) -> MongoCollection<User> {
        self.db.collection(USERS)
    }

    fn products(&self) -> MongoCollection<Product> {
        self.db.collection(PRODUCTS)
    }

    fn collections(&self) -> MongoCollection<Collection> {
        self.db.collection(COLLECTIONS)
    }

    fn coupons(&self) -> MongoCollection<Coupon> {
        self.db.collection(COUPONS)
    }
}

async fn find_all<T>(collection: &MongoCollection<T>, filter: Document) -> StoreResult<Vec<T>>
where
    T: serde::de::DeserializeOwned + Unpin + Send + Sync,
{
    let cursor = collection.find(filter, None).await?;
    Ok(cursor.try_collect::<Vec<T>>().await?)
}

/// Builds the `$or` filter for a literal, case-insensitive substring search.
fn search_filter(text: &str) -> Document {
    let pattern = regex::escape(text);
    doc! {
        "$or": [
            { "name": { "$regex": &pattern, "$options": "i" } },
            { "description": { "$regex": &pattern, "$options": "i" } },
        ]
    }
}

#[async_trait]
impl UserStore for MongoStore {
    async fn insert(&self, user: &User) -> StoreResult<()> {
        self.users().insert_one(user, None).await?;
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.users().find_one(doc! { "email": email }, None).await?)
    }

    async fn find_profile(&self, id: &str) -> StoreResult<Option<UserProfile>> {
        let options = FindOneOptions::builder()
            .projection(doc! { "name": 1, "email": 1, "role": 1, "cart": 1, "orders": 1 })
            .build();
        let profiles = self.db.collection::<UserProfile>(USERS);
        Ok(profiles.find_one(doc! { "_id": id }, options).await?)
    }

    async fn save_cart(&self, user: &UserProfile) -> StoreResult<()> {
        let update = doc! {
            "$set": {
                "cart": bson::to_bson(&user.cart)?,
                "orders": bson::to_bson(&user.orders)?,
            }
        };
        self.users()
            .update_one(doc! { "_id": &user.id }, update, None)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ProductStore for MongoStore {
    async fn insert(&self, product: &Product) -> StoreResult<()> {
        self.products().insert_one(product, None).await?;
        Ok(())
    }

    async fn list(&self) -> StoreResult<Vec<Product>> {
        find_all(&self.products(), doc! {}).await
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Product>> {
        Ok(self.products().find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_many(&self, ids: &[String]) -> StoreResult<Vec<Product>> {
        find_all(&self.products(), doc! { "_id": { "$in": ids } }).await
    }

    async fn search(&self, text: &str) -> StoreResult<Vec<Product>> {
        find_all(&self.products(), search_filter(text)).await
    }
}

#[async_trait]
impl CollectionStore for MongoStore {
    async fn insert(&self, collection: &Collection) -> StoreResult<()> {
        self.collections().insert_one(collection, None).await?;
        Ok(())
    }

    async fn list(&self) -> StoreResult<Vec<Collection>> {
        find_all(&self.collections(), doc! {}).await
    }

    async fn rename(&self, id: &str, name: &str) -> StoreResult<Option<Collection>> {
        let options = mongodb::options::FindOneAndUpdateOptions::builder()
            .return_document(mongodb::options::ReturnDocument::After)
            .build();
        Ok(self
            .collections()
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": { "name": name } }, options)
            .await?)
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        let result = self.collections().delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count == 1)
    }
}

#[async_trait]
impl CouponStore for MongoStore {
    async fn insert(&self, coupon: &Coupon) -> StoreResult<()> {
        self.coupons().insert_one(coupon, None).await?;
        Ok(())
    }

    async fn find_by_code(&self, code: &str) -> StoreResult<Option<Coupon>> {
        Ok(self.coupons().find_one(doc! { "code": code }, None).await?)
    }

    async fn list(&self) -> StoreResult<Vec<Coupon>> {
        find_all(&self.coupons(), doc! {}).await
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        let result = self.coupons().delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count == 1)
    }
}
