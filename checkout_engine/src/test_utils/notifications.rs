use checkout_common::Secret;

use crate::{
    db_types::ProcessorFields,
    helpers::SiteConfig,
    processors::{Cybersource, CybersourceConfig},
};

pub fn test_site() -> SiteConfig {
    let mut site = SiteConfig::new("edx", "EDX", "https://lms.example.com", "https://shop.example.com")
        .expect("Invalid site URLs");
    site.payment_support_email = "support@example.com".to_string();
    site
}

pub fn test_cybersource() -> Cybersource {
    let config = CybersourceConfig {
        profile_id: "test-profile".into(),
        access_key: "test-access-key".into(),
        secret_key: Secret::new("test-secret-key".into()),
        payment_page_url: "https://testsecureacceptance.cybersource.com/pay".into(),
        sop_payment_page_url: "https://testsecureacceptance.cybersource.com/silent/pay".into(),
        language_code: "en".into(),
    };
    Cybersource::new(config, test_site())
}

/// Builds a notification the way CyberSource posts it, signed with the key used by [`test_cybersource`].
pub fn signed_notification(order_number: &str, decision: &str, amount: &str) -> ProcessorFields {
    let mut fields = ProcessorFields::new();
    for (k, v) in [
        ("decision", decision),
        ("req_reference_number", order_number),
        ("transaction_id", "4862012345670167904107"),
        ("req_amount", amount),
        ("auth_amount", amount),
        ("req_currency", "USD"),
        ("req_card_number", "xxxxxxxxxxxx1111"),
        ("req_card_type", "001"),
        ("req_bill_to_forename", "Ada"),
        ("req_bill_to_surname", "Lovelace"),
        ("req_bill_to_address_line1", "12 St James's Square"),
        ("req_bill_to_address_city", "London"),
        ("req_bill_to_address_postal_code", "SW1Y 4JH"),
        ("req_bill_to_address_country", "GB"),
    ] {
        fields.insert(k.to_string(), v.to_string());
    }
    let names = fields.keys().cloned().collect::<Vec<String>>().join(",");
    fields.insert("signed_field_names".into(), format!("{names},signed_field_names"));
    let signature = test_cybersource().generate_signature(&fields).expect("Error signing notification");
    fields.insert("signature".into(), signature);
    fields
}
