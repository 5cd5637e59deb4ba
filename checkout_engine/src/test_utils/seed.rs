use crate::{
    db_types::{Basket, Money, NewBasket, NewBasketLine, NewUserAccount, UserAccount},
    SqliteDatabase,
};

pub async fn seed_user(db: &SqliteDatabase, username: &str, is_staff: bool) -> UserAccount {
    let user = NewUserAccount {
        username: username.to_string(),
        email: format!("{username}@example.com"),
        first_name: username.to_string(),
        last_name: "Tester".to_string(),
        is_staff,
    };
    db.create_user_account(user).await.expect("Error creating user")
}

/// Creates an open basket on the "edx" site holding one seat per price given (prices in cents).
pub async fn seed_basket(db: &SqliteDatabase, owner: &UserAccount, prices: &[i64], voucher: Option<&str>) -> Basket {
    let mut basket = NewBasket::new(owner.id, "edx");
    for (i, price) in prices.iter().enumerate() {
        let line = NewBasketLine::new(format!("seat-{i}"), format!("Verified seat {i}"), Money::from(*price))
            .with_course_key(format!("course-v1:edX+Demo{i}+2024"));
        basket = basket.with_line(line);
    }
    if let Some(code) = voucher {
        basket = basket.with_voucher(code);
    }
    db.create_basket(basket).await.expect("Error creating basket")
}
