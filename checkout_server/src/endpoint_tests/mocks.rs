use checkout_engine::{
    db_types::{
        Basket,
        NewOrder,
        NewProcessorResponse,
        NewSdnCheckFailure,
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
use mockall::mock;

mock! {
    pub CheckoutStore {}
    impl AccountManagement for CheckoutStore {
        async fn fetch_user_account(&self, user_id: i64) -> Result<Option<UserAccount>, AccountError>;
    }
    impl BasketManagement for CheckoutStore {
        async fn fetch_basket(&self, basket_id: i64) -> Result<Option<Basket>, BasketError>;
        async fn fetch_open_basket_for_user(&self, user_id: i64, site: &str) -> Result<Option<Basket>, BasketError>;
        async fn fetch_voucher(&self, code: &str) -> Result<Option<Voucher>, BasketError>;
        async fn freeze_basket(&self, basket_id: i64) -> Result<Basket, BasketError>;
    }
    impl OrderManagement for CheckoutStore {
        async fn place_order(&self, order: NewOrder) -> Result<Order, OrderError>;
        async fn fetch_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, OrderError>;
    }
    impl PaymentRecords for CheckoutStore {
        async fn record_processor_response(&self, response: NewProcessorResponse) -> Result<ProcessorResponse, RecordError>;
        async fn record_sdn_check_failure(&self, failure: NewSdnCheckFailure) -> Result<SdnCheckFailure, RecordError>;
    }
    impl CheckoutDatabase for CheckoutStore {
        fn url(&self) -> &str;
    }
}
