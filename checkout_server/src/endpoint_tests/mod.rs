mod checkout;
mod mocks;
mod payments;
mod sdn;
