//! `SqliteDatabase` is the concrete SQLite implementation of a checkout engine backend.
//!
//! It implements all the traits defined in the [`crate::traits`] module.
use std::fmt::Debug;

use log::*;
use sqlx::{migrate::MigrateError, SqlitePool};

use super::db::{baskets, db_url, new_pool, orders, records, users};
use crate::{
    db_types::{
        Basket,
        BasketStatus,
        NewBasket,
        NewOrder,
        NewProcessorResponse,
        NewSdnCheckFailure,
        NewUserAccount,
        Order,
        OrderNumber,
        ProcessorResponse,
        SdnCheckFailure,
        UserAccount,
        Voucher,
    },
    traits::{
        AccountError,
        AccountManagement,
        BasketError,
        BasketManagement,
        CheckoutDatabase,
        OrderError,
        OrderManagement,
        PaymentRecords,
        RecordError,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl CheckoutDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }
}

impl AccountManagement for SqliteDatabase {
    async fn fetch_user_account(&self, user_id: i64) -> Result<Option<UserAccount>, AccountError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user_account(user_id, &mut conn).await?;
        Ok(user)
    }
}

impl BasketManagement for SqliteDatabase {
    async fn fetch_basket(&self, basket_id: i64) -> Result<Option<Basket>, BasketError> {
        let mut conn = self.pool.acquire().await?;
        let basket = baskets::fetch_basket(basket_id, &mut conn).await?;
        Ok(basket)
    }

    async fn fetch_open_basket_for_user(&self, user_id: i64, site: &str) -> Result<Option<Basket>, BasketError> {
        let mut conn = self.pool.acquire().await?;
        let basket = baskets::fetch_open_basket_for_user(user_id, site, &mut conn).await?;
        Ok(basket)
    }

    async fn fetch_voucher(&self, code: &str) -> Result<Option<Voucher>, BasketError> {
        let mut conn = self.pool.acquire().await?;
        let voucher = baskets::fetch_voucher(code, &mut conn).await?;
        Ok(voucher)
    }

    async fn freeze_basket(&self, basket_id: i64) -> Result<Basket, BasketError> {
        let mut tx = self.pool.begin().await?;
        let mut basket = baskets::fetch_basket(basket_id, &mut tx).await?.ok_or(BasketError::NotFound(basket_id))?;
        let (from, to) = (basket.status, BasketStatus::Frozen);
        if from != BasketStatus::Open || !baskets::update_status(basket_id, from, to, &mut tx).await? {
            return Err(BasketError::IllegalStatusChange { id: basket_id, from, to });
        }
        tx.commit().await?;
        basket.status = to;
        Ok(basket)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn place_order(&self, order: NewOrder) -> Result<Order, OrderError> {
        let mut tx = self.pool.begin().await?;
        if orders::fetch_order_by_number(&order.number, &mut tx).await?.is_some() {
            return Err(OrderError::OrderAlreadyExists(order.number));
        }
        if let Some(existing) = orders::fetch_order_number_for_basket(order.basket_id, &mut tx).await? {
            debug!("📝️ Basket #{} already has order [{existing}]. Not placing [{}]", order.basket_id, order.number);
            return Err(OrderError::OrderAlreadyExists(existing));
        }
        let basket =
            baskets::fetch_basket(order.basket_id, &mut tx).await?.ok_or(OrderError::BasketNotFound(order.basket_id))?;
        if !basket.status.can_transition_to(BasketStatus::Submitted) {
            return Err(OrderError::BasketNotPayable { id: basket.id, status: basket.status });
        }
        let mut placed = match orders::insert_order(&order, &mut tx).await {
            Ok(placed) => placed,
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(OrderError::OrderAlreadyExists(order.number));
            },
            Err(e) => return Err(e.into()),
        };
        placed.lines = orders::insert_order_lines(placed.id, &order.lines, &mut tx).await?;
        if !baskets::update_status(basket.id, basket.status, BasketStatus::Submitted, &mut tx).await? {
            return Err(OrderError::BasketNotPayable { id: basket.id, status: basket.status });
        }
        tx.commit().await?;
        info!("📝️ Order [{}] placed for basket #{} ({} {})", placed.number, basket.id, placed.total, placed.currency);
        Ok(placed)
    }

    async fn fetch_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, OrderError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_number(number, &mut conn).await?;
        Ok(order)
    }
}

impl PaymentRecords for SqliteDatabase {
    async fn record_processor_response(
        &self,
        response: NewProcessorResponse,
    ) -> Result<ProcessorResponse, RecordError> {
        let mut conn = self.pool.acquire().await?;
        let record = records::insert_processor_response(response, &mut conn).await?;
        trace!("🧾️ Processor response #{} recorded", record.id);
        Ok(record)
    }

    async fn record_sdn_check_failure(&self, failure: NewSdnCheckFailure) -> Result<SdnCheckFailure, RecordError> {
        let mut conn = self.pool.acquire().await?;
        let record = records::insert_sdn_check_failure(failure, &mut conn).await?;
        trace!("🧾️ SDN check failure #{} recorded", record.id);
        Ok(record)
    }
}

impl SqliteDatabase {
    /// Creates a new database connection pool, using the `CHK_DATABASE_URL` environment variable to locate the
    /// database.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    /// Opens (creating it if necessary) the database at `url`.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date using the migrations embedded in this crate.
    pub async fn run_migrations(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Migrations complete");
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn create_user_account(&self, user: NewUserAccount) -> Result<UserAccount, AccountError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::insert_user_account(user, &mut conn).await?;
        Ok(user)
    }

    /// Creates a basket and its lines atomically.
    pub async fn create_basket(&self, basket: NewBasket) -> Result<Basket, BasketError> {
        let mut tx = self.pool.begin().await?;
        let basket = baskets::insert_basket(basket, &mut tx).await?;
        tx.commit().await?;
        Ok(basket)
    }

    pub async fn create_voucher(&self, voucher: Voucher) -> Result<Voucher, BasketError> {
        let mut conn = self.pool.acquire().await?;
        let voucher = baskets::insert_voucher(voucher, &mut conn).await?;
        Ok(voucher)
    }

    pub async fn fetch_processor_responses(&self) -> Result<Vec<ProcessorResponse>, RecordError> {
        let mut conn = self.pool.acquire().await?;
        let records = records::fetch_processor_responses(&mut conn).await?;
        Ok(records)
    }

    pub async fn fetch_sdn_check_failures(&self) -> Result<Vec<SdnCheckFailure>, RecordError> {
        let mut conn = self.pool.acquire().await?;
        let records = records::fetch_sdn_check_failures(&mut conn).await?;
        Ok(records)
    }
}
