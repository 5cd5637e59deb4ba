mod notifications;
mod prepare_env;
mod seed;

pub use notifications::{signed_notification, test_cybersource, test_site};
pub use prepare_env::{prepare_test_env, random_db_path};
pub use seed::{seed_basket, seed_user};
